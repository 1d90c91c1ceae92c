// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C7: the six operations (`open`, `close`, `write`, `read`, `control`,
//! `flush`) that orchestrate C1–C6.
//!
//! Grounded directly on `dev_open`/`dev_release`/`dev_write`/`dev_read`/
//! `dev_ioctl`/`dev_flush` in the original driver, translated from the
//! kernel's list/mutex/waitqueue idiom to `Vec`/`VecDeque` behind
//! `tokio::sync::Mutex`, with `tokio::sync::Notify` standing in for the
//! waitqueue.

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    cfg::config::QueueConfig,
    error::{Error, Result},
    queue::{
        endpoint::QueueEntry,
        message::Message,
        pending_post::PendingPost,
        pending_read::PendingRead,
        session::{Session, SessionHandle},
        table::EndpointTable,
    },
};

/// Sets a session's send delay. Numerically identical to the original
/// driver's `SET_SEND_TIMEOUT` ioctl, kept as a stable wire-level convention.
pub const CTRL_SET_SEND_DELAY: i32 = 0;
/// Sets a session's receive wait. Identical to `SET_RECV_TIMEOUT`.
pub const CTRL_SET_RECV_WAIT: i32 = 1;
/// Cancels every still-pending deferred post of a session. Identical to
/// `REVOKE_DELAYED_MESSAGES`.
pub const CTRL_REVOKE_PENDING: i32 = 2;

pub(crate) async fn open(
    table: &EndpointTable,
    config: &QueueConfig,
    endpoint_id: usize,
) -> Result<SessionHandle> {
    let endpoint = table.get(endpoint_id)?;
    let session = Arc::new(Session::new(
        Arc::clone(&endpoint),
        config.default_send_delay,
        config.default_recv_wait,
    ));

    {
        let mut st = endpoint.state.lock().await;
        st.sessions.push(Arc::clone(&session));
    }

    tracing::debug!(endpoint = endpoint_id, session = session.id, "open");
    Ok(SessionHandle(session))
}

pub(crate) async fn close(handle: SessionHandle) -> Result<()> {
    let session = handle.0;
    let endpoint = Arc::clone(&session.endpoint);

    {
        let mut st = endpoint.state.lock().await;
        st.sessions.retain(|s| !Arc::ptr_eq(s, &session));
    }

    // Cancel every still-scheduled post before destroying the session,
    // aborting its timer task immediately so a cancelled post never keeps
    // close waiting out the rest of its send_delay. Posts that lost the race
    // (already fired/firing) are left for the timer task to deliver; we
    // still wait for that task below so that no task outlives the session.
    let (released, timer_tasks) = session.quiesce().await;
    if released > 0 {
        let mut st = endpoint.state.lock().await;
        st.storage_bytes -= released;
    }

    for task in timer_tasks {
        let _ = task.await;
    }

    tracing::debug!(
        endpoint = endpoint.id,
        session = session.id,
        released,
        "close: timer scope quiesced"
    );
    Ok(())
}

pub(crate) async fn write(
    config: &QueueConfig,
    handle: &SessionHandle,
    data: &[u8],
) -> Result<usize> {
    let session = &handle.0;
    let endpoint = &session.endpoint;
    let len = data.len();

    if len > config.max_message {
        tracing::warn!(
            endpoint = endpoint.id,
            len,
            max = config.max_message,
            "write rejected: message too large"
        );
        return Err(Error::TooLarge {
            len,
            max: config.max_message,
        });
    }

    {
        let mut st = endpoint.state.lock().await;
        if st.storage_bytes + len > config.max_storage {
            tracing::warn!(endpoint = endpoint.id, len, "write rejected: no space");
            return Err(Error::NoSpace {
                endpoint: endpoint.id,
                len,
            });
        }
        st.storage_bytes += len;
    }

    let message = Message::new(data);
    let send_delay = session.send_delay().await;

    if send_delay.is_zero() {
        let mut st = endpoint.state.lock().await;
        st.messages.push_back(QueueEntry::Direct(message));
        st.available_count += 1;
        drop(st);
        endpoint.wake.notify_one();

        tracing::debug!(
            endpoint = endpoint.id,
            session = session.id,
            len,
            "write published immediately"
        );
        return Ok(len);
    }

    let post = Arc::new(PendingPost::new(message, Arc::downgrade(&handle.0), endpoint.id));
    let endpoint_for_task = Arc::clone(endpoint);
    let post_for_task = Arc::clone(&post);
    let delay = send_delay;

    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if post_for_task.try_fire() {
            let mut st = endpoint_for_task.state.lock().await;
            st.messages
                .push_back(QueueEntry::Deferred(Arc::clone(&post_for_task)));
            st.available_count += 1;
            drop(st);
            endpoint_for_task.wake.notify_one();
            tracing::debug!(endpoint = endpoint_for_task.id, "deferred write published");
        } else {
            tracing::debug!(
                endpoint = endpoint_for_task.id,
                "deferred write lost the cancel race"
            );
        }
    });

    session.register_pending_post(post, task).await;
    tracing::debug!(
        endpoint = endpoint.id,
        session = session.id,
        len,
        delay_ms = delay.as_millis() as u64,
        "write deferred"
    );
    Ok(0)
}

pub(crate) async fn read(
    handle: &SessionHandle,
    buf: &mut [u8],
    shutdown: &CancellationToken,
) -> Result<usize> {
    let session = &handle.0;
    let endpoint = Arc::clone(&session.endpoint);
    let recv_wait = session.recv_wait().await;

    {
        let mut st = endpoint.state.lock().await;
        if let Some(entry) = st.messages.pop_front() {
            st.available_count -= 1;
            st.storage_bytes -= entry.message().size;
            drop(st);
            tracing::debug!(
                endpoint = endpoint.id,
                session = session.id,
                "read: delivered immediately"
            );
            return finish_read(entry, buf).await;
        }
        if recv_wait.is_zero() {
            tracing::debug!(endpoint = endpoint.id, session = session.id, "read: empty");
            return Err(Error::Empty);
        }
    }

    let pending_read = Arc::new(PendingRead::new());
    {
        let mut st = endpoint.state.lock().await;
        st.blocked_readers.push(Arc::clone(&pending_read));
    }

    let deadline = tokio::time::Instant::now() + recv_wait;

    let outcome = loop {
        // Register as a waiter before checking the predicate, so a
        // notify_one/notify_waiters that lands between our check and our
        // await is never missed (register-then-check-then-await).
        let notified = endpoint.wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        {
            let mut st = endpoint.state.lock().await;
            if let Some(entry) = st.messages.pop_front() {
                st.available_count -= 1;
                st.storage_bytes -= entry.message().size;
                st.blocked_readers.retain(|r| !Arc::ptr_eq(r, &pending_read));
                break Ok(entry);
            }
            if pending_read.is_flushed() {
                st.blocked_readers.retain(|r| !Arc::ptr_eq(r, &pending_read));
                break Err(Error::Flushed);
            }
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            let mut st = endpoint.state.lock().await;
            st.blocked_readers.retain(|r| !Arc::ptr_eq(r, &pending_read));
            break Err(Error::Empty);
        }

        tokio::select! {
            _ = tokio::time::sleep(remaining) => {
                let mut st = endpoint.state.lock().await;
                st.blocked_readers.retain(|r| !Arc::ptr_eq(r, &pending_read));
                break Err(Error::Empty);
            }
            _ = &mut notified => {
                continue;
            }
            _ = shutdown.cancelled() => {
                let mut st = endpoint.state.lock().await;
                st.blocked_readers.retain(|r| !Arc::ptr_eq(r, &pending_read));
                break Err(Error::Internal("system shutdown while blocked in read".into()));
            }
        }
    };

    match outcome {
        Ok(entry) => {
            tracing::debug!(
                endpoint = endpoint.id,
                session = session.id,
                "read: delivered after blocking"
            );
            finish_read(entry, buf).await
        },
        Err(e) => {
            if e.is_retryable() {
                tracing::error!(
                    endpoint = endpoint.id,
                    session = session.id,
                    error = %e,
                    "read: blocked read ended with an internal failure"
                );
            } else {
                tracing::debug!(
                    endpoint = endpoint.id,
                    session = session.id,
                    error = %e,
                    "read: blocked read ended without a message"
                );
            }
            Err(e)
        },
    }
}

async fn finish_read(entry: QueueEntry, buf: &mut [u8]) -> Result<usize> {
    let n = {
        let message = entry.message();
        let n = std::cmp::min(message.size, buf.len());
        buf[..n].copy_from_slice(&message.bytes[..n]);
        n
    };

    if let QueueEntry::Deferred(post) = &entry
        && let Some(session) = post.owning_session.upgrade()
    {
        session.unlink_pending_post(post).await;
    }

    Ok(n)
}

pub(crate) async fn control(handle: &SessionHandle, cmd: i32, arg: i64) -> Result<()> {
    let session = &handle.0;
    match cmd {
        CTRL_SET_SEND_DELAY => {
            session.set_send_delay(duration_from_ticks(arg)).await;
            tracing::debug!(session = session.id, arg, "control: SET_SEND_DELAY");
        },
        CTRL_SET_RECV_WAIT => {
            session.set_recv_wait(duration_from_ticks(arg)).await;
            tracing::debug!(session = session.id, arg, "control: SET_RECV_WAIT");
        },
        CTRL_REVOKE_PENDING => {
            let released = session.revoke_pending().await;
            if released > 0 {
                let mut st = session.endpoint.state.lock().await;
                st.storage_bytes -= released;
            }
            tracing::debug!(session = session.id, released, "control: REVOKE_PENDING");
        },
        other => {
            tracing::debug!(session = session.id, cmd = other, "control: unknown opcode, no-op");
        },
    }
    Ok(())
}

pub(crate) async fn flush(handle: &SessionHandle) -> Result<()> {
    let endpoint = Arc::clone(&handle.0.endpoint);
    let mut st = endpoint.state.lock().await;

    // Endpoint lock held across each session lock: fixed lock order,
    // and it gives flush a consistent snapshot of the session registry.
    let mut released = 0usize;
    for session in st.sessions.clone() {
        released += session.revoke_pending().await;
    }
    st.storage_bytes -= released;

    for reader in &st.blocked_readers {
        reader.mark_flushed();
    }
    let woke = st.blocked_readers.len();

    drop(st);
    endpoint.wake.notify_waiters();

    tracing::debug!(endpoint = endpoint.id, released, woke, "flush");
    Ok(())
}

fn duration_from_ticks(ticks: i64) -> Duration {
    Duration::from_millis(ticks.max(0) as u64)
}
