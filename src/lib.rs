// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A timed, per-endpoint message queue with deferred posts, blocking reads,
//! and endpoint-scoped flush.
//!
//! See [`System`] for the entry point: construct one from a [`cfg::config::Config`],
//! then `open`/`write`/`read`/`control`/`flush`/`close` against it.

/// Configuration, CLI path resolution, and logging.
pub mod cfg;
/// The typed failure taxonomy shared by every operation.
pub mod error;
/// The queue core: message, pending post, pending read, session, endpoint,
/// endpoint table, operation surface.
pub mod queue;
/// The process-lifetime owner of the endpoint table.
pub mod system;

pub use error::{Error, Result};
pub use queue::{
    ops::{CTRL_REVOKE_PENDING, CTRL_SET_RECV_WAIT, CTRL_SET_SEND_DELAY},
    session::SessionHandle,
};
pub use system::System;
