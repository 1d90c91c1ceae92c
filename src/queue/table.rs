// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! C6: the fixed-size array of endpoints, entry point of every operation.

use std::sync::Arc;

use crate::{
    cfg::config::QueueConfig,
    error::{Error, Result},
    queue::endpoint::Endpoint,
};

/// Fixed-size collection of `N` endpoints, built once and never resized.
///
/// Unlike the original driver's `static struct minor minors[MAX_MINOR_NUMBER]`
/// process-global array, this is an ordinary value an embedder constructs
/// once and holds for as long as it needs the queue — see
/// [`crate::System`] for the init-once/teardown-once lifecycle wrapped
/// around it.
#[derive(Debug)]
pub struct EndpointTable {
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointTable {
    pub fn new(config: &QueueConfig) -> Self {
        let endpoints = (0..config.endpoint_count)
            .map(Endpoint::new)
            .map(Arc::new)
            .collect();
        Self { endpoints }
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub(crate) fn get(&self, id: usize) -> Result<Arc<Endpoint>> {
        self.endpoints.get(id).cloned().ok_or(Error::BadEndpoint(id))
    }
}
