// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use serial_test::serial;
use timed_mailbox::{CTRL_SET_SEND_DELAY, Error};
use tokio::time::{Instant, sleep};

use crate::integration_tests::common::new_system;

/// After a session's `close` returns, no timer task originating in that
/// session subsequently executes — a pending post cancelled by close must
/// never publish, even long after the original delay would have elapsed.
///
/// Close latency must not be controlled by the cancelled post's `send_delay`:
/// the winning cancel aborts its timer task immediately instead of waiting
/// for it to sleep out the rest of a 5 second delay.
#[tokio::test]
#[serial]
async fn close_cancels_its_own_pending_posts_before_returning() -> anyhow::Result<()> {
    let system = new_system();
    let writer = system.open(3).await?;

    system.control(&writer, CTRL_SET_SEND_DELAY, 5_000).await?;
    system.write(&writer, b"never").await?;

    // Close races the still-far-off timer and must win: `close` quiesces
    // the session's timer scope before returning, so the cancel always
    // succeeds here.
    let started = Instant::now();
    system.close(writer).await?;
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "close must not block for the cancelled post's send_delay"
    );

    let reader = system.open(3).await?;
    sleep(Duration::from_millis(50)).await;
    let mut buf = [0u8; 8];
    let err = system.read(&reader, &mut buf).await.unwrap_err();
    assert_eq!(err, Error::Empty);

    system.close(reader).await?;
    Ok(())
}

/// A post that wins the fire race against a racing close is still delivered
/// — close only guarantees it does not outlive its own timer task.
#[tokio::test]
#[serial]
async fn a_post_that_fires_before_close_arrives_is_still_delivered() -> anyhow::Result<()> {
    let system = new_system();
    let writer = system.open(4).await?;

    system.control(&writer, CTRL_SET_SEND_DELAY, 20).await?;
    system.write(&writer, b"raced").await?;
    sleep(Duration::from_millis(60)).await;
    system.close(writer).await?;

    let reader = system.open(4).await?;
    let mut buf = [0u8; 8];
    let n = system.read(&reader, &mut buf).await?;
    assert_eq!(&buf[..n], b"raced");

    system.close(reader).await?;
    Ok(())
}
