// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C3: a reader currently blocked on an endpoint's wake channel.

use std::sync::atomic::{AtomicBool, Ordering};

/// A blocked reader's one-shot cancel flag.
///
/// Flipped exactly once, by `flush`, and observed by the sleeping reader on
/// its next wakeup. There is no other way to cancel a blocked read; a
/// timeout is a regular outcome, not a cancellation.
#[derive(Debug, Default)]
pub struct PendingRead {
    flushed: AtomicBool,
}

impl PendingRead {
    pub fn new() -> Self {
        Self {
            flushed: AtomicBool::new(false),
        }
    }

    pub(crate) fn mark_flushed(&self) {
        self.flushed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_flushed(&self) -> bool {
        self.flushed.load(Ordering::SeqCst)
    }
}
