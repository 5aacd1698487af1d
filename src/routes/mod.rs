// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Route handlers for the HTTP API.

pub mod check;

pub use check::{check_router, update_config_handler, CheckApiDoc};
