// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C1: the owned immutable byte payload of a queued message.

use bytes::Bytes;

/// An owned, immutable message payload.
///
/// Backed by [`Bytes`] rather than `Vec<u8>` so that moving a message between
/// owners (writer path → endpoint list → pending post → reader path) is a
/// refcount bump, never a deep copy, matching the "no byte copy on publish"
/// requirement for deferred posts.
#[derive(Debug, Clone)]
pub struct Message {
    pub bytes: Bytes,
    pub size: usize,
}

impl Message {
    /// Copies `data` into a freshly owned buffer.
    pub fn new(data: &[u8]) -> Self {
        let bytes = Bytes::copy_from_slice(data);
        Self {
            size: bytes.len(),
            bytes,
        }
    }
}
