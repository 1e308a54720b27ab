// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound HTTP helpers.

pub mod deadline;

pub use deadline::{
    fetch_json_with_deadline, fetch_with_deadline, DeadlineGuard, FetchError,
    DEFAULT_FETCH_TIMEOUT,
};
