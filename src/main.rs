// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::{Context, Result};
use timed_mailbox::{
    CTRL_SET_SEND_DELAY, System,
    cfg::{cli::resolve_config_path, config::Config, logger::init_logger},
};
use tokio::time::sleep;
use tracing::info;

/// Demo entry point: builds a [`System`] from the packaged config, writes
/// and reads back a message on endpoint 3 both immediately and through a
/// send delay, then shuts the system down cleanly.
#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logger("config/logger.yaml")?;

    let cfg = resolve_config_path("config/mailbox.yaml")
        .and_then(Config::load_from_file)
        .context("failed to resolve or load config")?;

    let shutdown_grace = cfg.runtime.shutdown_grace;
    let system = System::new(cfg);
    info!(endpoints = system.endpoint_count(), "system constructed");

    let endpoint_id = 3.min(system.endpoint_count() - 1);
    let session = system.open(endpoint_id).await?;

    let sent = system.write(&session, b"hello").await?;
    info!(sent, "wrote message");

    let mut buf = [0u8; 8];
    let n = system.read(&session, &mut buf).await?;
    info!(received = n, payload = ?&buf[..n], "read message back");

    // Exercise the deferred-publication path too.
    system.control(&session, CTRL_SET_SEND_DELAY, 50).await?;
    let deferred = system.write(&session, b"later").await?;
    info!(deferred, "deferred write accepted");
    sleep(Duration::from_millis(100)).await;
    let n = system.read(&session, &mut buf).await?;
    info!(received = n, payload = ?&buf[..n], "deferred message delivered");

    system.close(session).await?;
    system.shutdown().await;
    sleep(shutdown_grace.min(Duration::from_millis(50))).await;

    Ok(())
}
