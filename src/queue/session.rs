// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C4: a client's open handle against one endpoint.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::Mutex,
    task::{AbortHandle, JoinHandle},
};

use crate::queue::{endpoint::Endpoint, pending_post::PendingPost};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A still-scheduled deferred post together with the handle that aborts its
/// timer task immediately on a winning cancel, so a revoked or flushed post
/// never keeps its sleeping task alive for the rest of its `send_delay`.
#[derive(Debug)]
struct PendingEntry {
    post: Arc<PendingPost>,
    abort: AbortHandle,
}

/// Per-open-handle state: timing configuration, the list of this session's
/// still-pending deferred posts, and the join handles of their timer tasks —
/// together the session's "timer scope". Guarded by a single lock, matching
/// the original driver's one `session_mutex` over `send_timeout`/
/// `recv_timeout`/`pending_writes`.
#[derive(Debug)]
struct SessionState {
    send_delay: Duration,
    recv_wait: Duration,
    pending_posts: Vec<PendingEntry>,
    timer_tasks: Vec<JoinHandle<()>>,
}

#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub endpoint: Arc<Endpoint>,
    state: Mutex<SessionState>,
}

impl Session {
    pub(crate) fn new(
        endpoint: Arc<Endpoint>,
        send_delay: Duration,
        recv_wait: Duration,
    ) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            endpoint,
            state: Mutex::new(SessionState {
                send_delay,
                recv_wait,
                pending_posts: Vec::new(),
                timer_tasks: Vec::new(),
            }),
        }
    }

    pub async fn send_delay(&self) -> Duration {
        self.state.lock().await.send_delay
    }

    pub async fn set_send_delay(&self, d: Duration) {
        self.state.lock().await.send_delay = d;
    }

    pub async fn recv_wait(&self) -> Duration {
        self.state.lock().await.recv_wait
    }

    pub async fn set_recv_wait(&self, d: Duration) {
        self.state.lock().await.recv_wait = d;
    }

    pub(crate) async fn register_pending_post(
        &self,
        post: Arc<PendingPost>,
        task: JoinHandle<()>,
    ) {
        let mut st = self.state.lock().await;
        st.pending_posts.push(PendingEntry {
            post,
            abort: task.abort_handle(),
        });
        st.timer_tasks.push(task);
    }

    pub(crate) async fn unlink_pending_post(&self, post: &Arc<PendingPost>) {
        let mut st = self.state.lock().await;
        st.pending_posts.retain(|entry| !Arc::ptr_eq(&entry.post, post));
    }

    /// Cancels every still-scheduled post of this session, aborting each
    /// winning cancel's timer task immediately rather than leaving it to
    /// sleep out the rest of its `send_delay`. Returns the number of bytes
    /// released so the caller can settle the endpoint's storage charge.
    async fn cancel_all_pending(&self) -> usize {
        let mut released = 0usize;
        let mut st = self.state.lock().await;
        st.pending_posts.retain(|entry| {
            if entry.post.try_cancel() {
                entry.abort.abort();
                released += entry.post.payload.size;
                false
            } else {
                true
            }
        });
        released
    }

    /// `REVOKE_PENDING`: cancels every still-scheduled post of this session.
    pub(crate) async fn revoke_pending(&self) -> usize {
        self.cancel_all_pending().await
    }

    /// Called only from `close`: cancels every still-scheduled post (so a
    /// cancelled post's task is aborted rather than awaited out), then hands
    /// back every timer task's join handle so the caller can wait for the
    /// session's timer scope to quiesce before the session is destroyed.
    pub(crate) async fn quiesce(&self) -> (usize, Vec<JoinHandle<()>>) {
        let released = self.cancel_all_pending().await;
        let mut st = self.state.lock().await;
        (released, std::mem::take(&mut st.timer_tasks))
    }
}

/// Opaque handle a caller obtains from [`crate::System::open`] and uses in
/// every subsequent operation.
#[derive(Debug, Clone)]
pub struct SessionHandle(pub(crate) Arc<Session>);

impl SessionHandle {
    /// The endpoint id this session was opened against.
    pub fn endpoint_id(&self) -> usize {
        self.0.endpoint.id
    }

    /// The opaque numeric identity of this session, useful for diagnostics.
    pub fn id(&self) -> u64 {
        self.0.id
    }
}
