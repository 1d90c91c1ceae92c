// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use timed_mailbox::{System, cfg::config::Config};

#[tokio::test]
async fn open_reports_the_requested_endpoint_id() -> anyhow::Result<()> {
    let system = System::new(Config::default());
    let session = system.open(2).await?;
    assert_eq!(session.endpoint_id(), 2);
    system.close(session).await?;
    Ok(())
}

#[tokio::test]
async fn distinct_opens_get_distinct_session_ids() -> anyhow::Result<()> {
    let system = System::new(Config::default());
    let a = system.open(0).await?;
    let b = system.open(0).await?;
    assert_ne!(a.id(), b.id());
    system.close(a).await?;
    system.close(b).await?;
    Ok(())
}

#[tokio::test]
async fn open_on_an_out_of_range_endpoint_fails() {
    let system = System::new(Config::default());
    let result = system.open(system.endpoint_count()).await;
    assert!(result.is_err());
}
