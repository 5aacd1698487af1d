// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod check;
pub mod check_token;
pub mod config_store;
pub mod extractor;
pub mod fetcher;
pub mod logging;
pub mod matcher;
pub mod notifier;
