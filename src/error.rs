// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Typed failure kinds for every queue operation.
//!
//! `Empty` and `Flushed` are kept distinct here for diagnostics even though
//! they collapse to a single external sentinel at the boundary (see
//! [`Error::to_sentinel`]).

use thiserror::Error;

/// The failure taxonomy of the queue core.
///
/// Only [`Error::Internal`] is meaningfully retryable by a caller; every
/// other variant is deterministic given the endpoint/session state at the
/// time of the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The endpoint id passed to an operation does not name a live endpoint.
    #[error("bad endpoint id {0}")]
    BadEndpoint(usize),

    /// A write exceeded `MAX_MESSAGE`.
    #[error("message of {len} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Size of the rejected message.
        len: usize,
        /// The configured `MAX_MESSAGE`.
        max: usize,
    },

    /// A write would have exceeded `MAX_STORAGE` on its target endpoint.
    #[error("endpoint {endpoint} has no space for {len} more bytes")]
    NoSpace {
        /// Endpoint that rejected the write.
        endpoint: usize,
        /// Size of the rejected message.
        len: usize,
    },

    /// A read found nothing to deliver, either immediately (`recv_wait ==
    /// 0`) or after its deadline elapsed.
    #[error("no message available")]
    Empty,

    /// A blocked read was cancelled by a flush on its endpoint.
    #[error("read cancelled by flush")]
    Flushed,

    /// A scheduling or allocation primitive failed; callers may retry.
    #[error("internal failure: {0}")]
    Internal(String),
}

/// The single negative sentinel external callers see when they do not want
/// the typed kind.
pub const SENTINEL_FAILURE: i64 = -1;

impl Error {
    /// Collapses every kind to the external boundary's sentinel.
    ///
    /// The typed kind is never discarded internally — only a caller that
    /// explicitly asks for the two-valued success/failure contract pays for
    /// this collapse.
    pub fn to_sentinel(&self) -> i64 {
        SENTINEL_FAILURE
    }

    /// True for [`Error::Internal`], the only kind a caller may usefully
    /// retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}

/// Convenience alias used throughout the queue core.
pub type Result<T> = std::result::Result<T, Error>;
