// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use serial_test::serial;
use timed_mailbox::{CTRL_REVOKE_PENDING, CTRL_SET_SEND_DELAY, Error};
use tokio::time::sleep;

use crate::integration_tests::common::new_system;

/// A revoked post never publishes and its storage charge is returned.
#[tokio::test]
#[serial]
async fn revoked_post_never_publishes_and_releases_storage() -> anyhow::Result<()> {
    let system = new_system();
    let session = system.open(3).await?;

    system.control(&session, CTRL_SET_SEND_DELAY, 300).await?;
    system.write(&session, b"A").await?;
    system.control(&session, CTRL_REVOKE_PENDING).await?;

    sleep(Duration::from_millis(400)).await;

    let mut buf = [0u8; 1];
    let err = system.read(&session, &mut buf).await.unwrap_err();
    assert_eq!(err, Error::Empty);

    // If the revoke had not returned the reservation, this endpoint would
    // still be charged 1 byte and would run out of room one message early.
    for _ in 0..20 {
        system.write(&session, &[0u8; 64]).await?;
    }

    system.close(session).await?;
    Ok(())
}

/// Revoking twice with no intervening write
/// releases zero additional storage the second time.
#[tokio::test]
async fn second_consecutive_revoke_releases_nothing_new() -> anyhow::Result<()> {
    let system = new_system();
    let session = system.open(2).await?;

    system.control(&session, CTRL_SET_SEND_DELAY, 500).await?;
    system.write(&session, b"A").await?;

    system.control(&session, CTRL_REVOKE_PENDING).await?;
    // Second call walks an already-empty pending-post list: a pure no-op.
    system.control(&session, CTRL_REVOKE_PENDING).await?;

    system.close(session).await?;
    Ok(())
}
