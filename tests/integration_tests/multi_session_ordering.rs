// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use serial_test::serial;
use timed_mailbox::CTRL_SET_SEND_DELAY;
use tokio::time::sleep;

use crate::integration_tests::common::new_system;

/// A session with a long send delay and one with none both target the same
/// endpoint; the immediate write is readable straight away, the deferred
/// one only after its delay elapses.
#[tokio::test]
#[serial]
async fn immediate_and_deferred_writers_interleave_by_publication_time() -> anyhow::Result<()> {
    let system = new_system();
    let deferred = system.open(5).await?;
    let immediate = system.open(5).await?;

    system.control(&deferred, CTRL_SET_SEND_DELAY, 200).await?;
    system.write(&deferred, b"A").await?;
    system.write(&immediate, b"B").await?;

    let mut buf = [0u8; 1];
    let n = system.read(&immediate, &mut buf).await?;
    assert_eq!(n, 1);
    assert_eq!(&buf[..1], b"B", "the immediate write publishes first");

    sleep(Duration::from_millis(250)).await;

    let n = system.read(&immediate, &mut buf).await?;
    assert_eq!(n, 1);
    assert_eq!(&buf[..1], b"A", "the deferred write publishes once its delay elapses");

    system.close(deferred).await?;
    system.close(immediate).await?;
    Ok(())
}

#[tokio::test]
async fn a_single_writers_immediate_posts_keep_call_order() -> anyhow::Result<()> {
    let system = new_system();
    let session = system.open(6).await?;

    system.write(&session, b"1").await?;
    system.write(&session, b"2").await?;
    system.write(&session, b"3").await?;

    let mut buf = [0u8; 1];
    for expected in [b'1', b'2', b'3'] {
        let n = system.read(&session, &mut buf).await?;
        assert_eq!(n, 1);
        assert_eq!(buf[0], expected);
    }

    system.close(session).await?;
    Ok(())
}
