// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use timed_mailbox::error::{Error, SENTINEL_FAILURE};

#[test]
fn every_kind_collapses_to_the_same_sentinel() {
    let kinds = [
        Error::BadEndpoint(7),
        Error::TooLarge { len: 100, max: 64 },
        Error::NoSpace { endpoint: 3, len: 10 },
        Error::Empty,
        Error::Flushed,
        Error::Internal("scheduler unavailable".into()),
    ];
    for kind in kinds {
        assert_eq!(kind.to_sentinel(), SENTINEL_FAILURE);
    }
}

#[test]
fn only_internal_is_retryable() {
    assert!(Error::Internal("transient".into()).is_retryable());
    assert!(!Error::BadEndpoint(0).is_retryable());
    assert!(!Error::TooLarge { len: 1, max: 0 }.is_retryable());
    assert!(!Error::NoSpace { endpoint: 0, len: 1 }.is_retryable());
    assert!(!Error::Empty.is_retryable());
    assert!(!Error::Flushed.is_retryable());
}

#[test]
fn empty_and_flushed_remain_distinguishable_internally() {
    assert_ne!(Error::Empty, Error::Flushed);
}
