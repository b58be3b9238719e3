// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Worker process supervisor: spawns a worker, tees its structured log
//! stream, and exposes readiness/exit/kill as async handles.

mod error;
mod options;
mod runtime;
mod waiter;

pub use error::RuntimeError;
pub use options::SpawnOptions;
pub use runtime::Runtime;
pub use waiter::{wait_for_log, WaitError};
