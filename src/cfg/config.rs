// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Top-level, file-backed configuration: every tunable the queue core
/// enforces, plus the runtime knobs the embedded demo/tests need.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Bounds and defaults enforced by the queue core.
    pub queue: QueueConfig,
    /// Implementation parameters that live outside the queue's own model.
    pub runtime: RuntimeConfig,
}

/// The process-wide tunables: `MAX_MESSAGE`, `MAX_STORAGE`, `N`,
/// `DEFAULT_SEND_DELAY`, `DEFAULT_RECV_WAIT`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct QueueConfig {
    #[serde(rename = "MaxMessageSize")]
    /// `MAX_MESSAGE`: maximum payload size accepted by `write`, in bytes.
    pub max_message: usize,

    #[serde(rename = "MaxStorageSize")]
    /// `MAX_STORAGE`: maximum total bytes an endpoint may have reserved
    /// (published messages plus not-yet-cancelled pending posts).
    pub max_storage: usize,

    #[serde(rename = "EndpointCount")]
    /// `N`: number of endpoints in the table, indexed `[0, N)`.
    pub endpoint_count: usize,

    #[serde(rename = "DefaultSendDelayMs", with = "serde_millis")]
    /// `DEFAULT_SEND_DELAY`: send delay a freshly opened session starts
    /// with.
    pub default_send_delay: Duration,

    #[serde(rename = "DefaultRecvWaitMs", with = "serde_millis")]
    /// `DEFAULT_RECV_WAIT`: receive wait a freshly opened session starts
    /// with.
    pub default_recv_wait: Duration,
}

/// Settings that shape the crate's own lifecycle but carry no queue
/// semantics.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RuntimeConfig {
    #[serde(rename = "ShutdownGraceMs", with = "serde_millis")]
    /// Upper bound the demo binary waits for [`crate::System::shutdown`] to
    /// let in-flight timer tasks quiesce before it exits.
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue: QueueConfig {
                max_message: 64,
                max_storage: 1280,
                endpoint_count: 8,
                default_send_delay: Duration::ZERO,
                default_recv_wait: Duration::ZERO,
            },
            runtime: RuntimeConfig {
                shutdown_grace: Duration::from_millis(2_000),
            },
        }
    }
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value. Invalid configurations are rejected here, not at
    /// first use.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: Config =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Validates invariants the queue core relies on.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(self.queue.endpoint_count > 0, "EndpointCount must be >= 1");
        ensure!(self.queue.max_message > 0, "MaxMessageSize must be >= 1");
        ensure!(
            self.queue.max_message <= self.queue.max_storage,
            "MaxMessageSize must not exceed MaxStorageSize"
        );
        Ok(())
    }
}

/// Serde helper representing `Duration` as a number of milliseconds — the
/// host's timer-tick unit by convention.
mod serde_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
