// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Watches a webpage for keywords and emails an alert when any of them appear.

pub mod app;
pub mod models;
pub mod routes;
pub mod services;
