// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use timed_mailbox::Error;

use crate::integration_tests::common::new_system;

#[tokio::test]
async fn open_past_the_last_endpoint_id_fails() -> anyhow::Result<()> {
    let system = new_system();
    let last_valid = system.endpoint_count() - 1;

    let session = system.open(last_valid).await?;
    system.close(session).await?;

    let err = system.open(system.endpoint_count()).await.unwrap_err();
    assert_eq!(err, Error::BadEndpoint(system.endpoint_count()));
    Ok(())
}

#[tokio::test]
async fn open_at_every_valid_id_succeeds() -> anyhow::Result<()> {
    let system = new_system();
    for id in 0..system.endpoint_count() {
        let session = system.open(id).await?;
        assert_eq!(session.endpoint_id(), id);
        system.close(session).await?;
    }
    Ok(())
}
