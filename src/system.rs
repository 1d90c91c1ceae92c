// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The owner of the endpoint table and its init-once / teardown-once
//! lifecycle.
//!
//! The original driver keeps its endpoints in a process-global static array,
//! initialized once at module load and torn down once at module unload.
//! That pattern has no idiomatic Rust equivalent without `unsafe` global
//! mutable state, so `System` stands in for it: an embedder constructs one
//! (typically behind an `Arc`), holds it for as long as it needs the queue,
//! and calls [`System::shutdown`] once to retire it. The shutdown signal is
//! a `CancellationToken` every blocked read also watches, so a shutdown
//! wakes readers immediately instead of making them wait out their full
//! deadline.

use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use tokio_util::sync::CancellationToken;

use crate::{
    cfg::config::Config,
    error::{Error, Result},
    queue::{ops, session::SessionHandle, table::EndpointTable},
};

const CONSTRUCTED: u8 = 0;
const SHUTTING_DOWN: u8 = 1;
const DOWN: u8 = 2;

/// The process-lifetime owner of every endpoint.
#[derive(Debug)]
pub struct System {
    table: EndpointTable,
    config: Config,
    shutdown: CancellationToken,
    lifecycle: AtomicU8,
}

impl System {
    /// Builds the endpoint table from a validated [`Config`]. No operation
    /// may be invoked on the result before this returns, and none may be
    /// invoked after [`System::shutdown`] begins.
    pub fn new(config: Config) -> Arc<Self> {
        let table = EndpointTable::new(&config.queue);
        tracing::debug!(
            endpoints = table.endpoint_count(),
            max_message = config.queue.max_message,
            max_storage = config.queue.max_storage,
            "system constructed"
        );
        Arc::new(Self {
            table,
            config,
            shutdown: CancellationToken::new(),
            lifecycle: AtomicU8::new(CONSTRUCTED),
        })
    }

    fn ensure_active(&self) -> Result<()> {
        if self.lifecycle.load(Ordering::SeqCst) != CONSTRUCTED {
            tracing::error!("operation rejected: system is shutting down");
            return Err(Error::Internal("system is shutting down".into()));
        }
        Ok(())
    }

    /// The number of endpoints this system was built with (`N`).
    pub fn endpoint_count(&self) -> usize {
        self.table.endpoint_count()
    }

    /// `open(endpoint_id)` — creates a new session against `endpoint_id`.
    pub async fn open(&self, endpoint_id: usize) -> Result<SessionHandle> {
        self.ensure_active()?;
        ops::open(&self.table, &self.config.queue, endpoint_id).await
    }

    /// `close(handle)` — unlinks the session and waits for its timer scope
    /// to quiesce before returning.
    pub async fn close(&self, handle: SessionHandle) -> Result<()> {
        ops::close(handle).await
    }

    /// `write(handle, data)` — posts `data`, immediately or deferred
    /// depending on the session's send delay.
    pub async fn write(&self, handle: &SessionHandle, data: &[u8]) -> Result<usize> {
        self.ensure_active()?;
        ops::write(&self.config.queue, handle, data).await
    }

    /// `read(handle, buf)` — drains the oldest available message, blocking
    /// up to the session's receive wait if none is available.
    pub async fn read(&self, handle: &SessionHandle, buf: &mut [u8]) -> Result<usize> {
        self.ensure_active()?;
        ops::read(handle, buf, &self.shutdown).await
    }

    /// `control(handle, cmd, arg)` — `SET_SEND_DELAY` / `SET_RECV_WAIT` /
    /// `REVOKE_PENDING`. Unknown opcodes are silent no-ops.
    pub async fn control(&self, handle: &SessionHandle, cmd: i32, arg: i64) -> Result<()> {
        self.ensure_active()?;
        ops::control(handle, cmd, arg).await
    }

    /// `flush(handle)` — cancels every pending post and fails every blocked
    /// reader on `handle`'s endpoint.
    pub async fn flush(&self, handle: &SessionHandle) -> Result<()> {
        self.ensure_active()?;
        ops::flush(handle).await
    }

    /// Teardown-once: flips the lifecycle flag so no further operation is
    /// accepted, then wakes every blocked read so it can observe the
    /// shutdown signal instead of waiting out its full deadline. Idempotent.
    pub async fn shutdown(&self) {
        if self
            .lifecycle
            .compare_exchange(CONSTRUCTED, SHUTTING_DOWN, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        self.shutdown.cancel();
        self.lifecycle.store(DOWN, Ordering::SeqCst);
        tracing::debug!("system shutdown complete");
    }
}
