// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C5: one logical queue — message list, storage accounting, blocked-reader
//! registry, open-session registry, single wake channel.

use std::{collections::VecDeque, sync::Arc};

use tokio::sync::{Mutex, Notify};

use crate::queue::{
    message::Message, pending_post::PendingPost, pending_read::PendingRead,
    session::Session,
};

/// An entry in the endpoint's visible message list.
///
/// `Deferred` keeps the owning [`PendingPost`] alive as the physical
/// container of its payload until a reader drains it — publishing a
/// deferred post never copies its bytes, it only moves the `Arc` into this
/// queue.
#[derive(Debug)]
pub(crate) enum QueueEntry {
    Direct(Message),
    Deferred(Arc<PendingPost>),
}

impl QueueEntry {
    pub(crate) fn message(&self) -> &Message {
        match self {
            QueueEntry::Direct(m) => m,
            QueueEntry::Deferred(p) => &p.payload,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct EndpointState {
    pub messages: VecDeque<QueueEntry>,
    pub storage_bytes: usize,
    pub available_count: usize,
    pub sessions: Vec<Arc<Session>>,
    pub blocked_readers: Vec<Arc<PendingRead>>,
}

/// One logical message queue, identified by a small integer id.
///
/// `state` is the endpoint lock: it covers the message list, the
/// storage/available counters, the session registry, and the blocked-reader
/// registry all at once, matching the single `operation_synchronizer` mutex
/// of the original driver. `wake` is the endpoint-global notify channel,
/// level-triggered on `available_count > 0` and edge-triggered on a reader's
/// `flushed` flag.
#[derive(Debug)]
pub struct Endpoint {
    pub id: usize,
    pub(crate) state: Mutex<EndpointState>,
    pub(crate) wake: Notify,
}

impl Endpoint {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            state: Mutex::new(EndpointState::default()),
            wake: Notify::new(),
        }
    }

    /// Current storage charge, for diagnostics and tests.
    pub async fn storage_bytes(&self) -> usize {
        self.state.lock().await.storage_bytes
    }

    /// Current number of immediately readable messages.
    pub async fn available_count(&self) -> usize {
        self.state.lock().await.available_count
    }

    /// Number of sessions currently open against this endpoint.
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}
