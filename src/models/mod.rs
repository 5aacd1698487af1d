// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod check;
pub mod config;
pub mod status;
pub mod version;
