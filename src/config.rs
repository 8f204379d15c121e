//! # Cluster Configuration
//!
//! Node identity and replication-role configuration, persisted across boots.
//!
//! Every node carries a stable `instance_name` (defaulting to a fresh UUID on
//! first boot) which is stamped onto every outgoing message so consumers can
//! ignore their own traffic. The configuration is stored as `cluster.json`
//! in a configurable directory and reloaded on the next boot; environment
//! variables prefixed with `GEOCLUSTER_` override file values, and an
//! override is written back so the file always reflects the effective
//! configuration.

use crate::error::{Result, SyncError};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// File name used for persisted cluster configuration
pub const CONFIG_FILE_NAME: &str = "cluster.json";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "GEOCLUSTER";

/// Replication role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRole {
    /// Publishes local changes, ignores remote ones
    Master,
    /// Consumes remote changes, never publishes
    Slave,
    /// Publishes and consumes (the common clustered deployment)
    MasterSlave,
}

impl NodeRole {
    /// Whether this role publishes local mutations once startup completes
    pub fn produces(&self) -> bool {
        matches!(self, NodeRole::Master | NodeRole::MasterSlave)
    }

    /// Whether this role applies remote mutations
    pub fn consumes(&self) -> bool {
        matches!(self, NodeRole::Slave | NodeRole::MasterSlave)
    }
}

/// Node-level configuration for the synchronization engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Stable node identity, stamped on every outgoing message
    pub instance_name: String,
    /// Topic all cluster members share
    pub topic: String,
    /// Broker endpoint the transport client connects to
    pub broker_url: String,
    /// Replication role deciding the toggle defaults
    pub role: NodeRole,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            instance_name: Uuid::new_v4().to_string(),
            topic: "geocluster.catalog".to_string(),
            broker_url: "inproc://local".to_string(),
            role: NodeRole::MasterSlave,
        }
    }
}

impl ClusterConfig {
    /// Load configuration from `dir/cluster.json`, layered with
    /// `GEOCLUSTER_*` environment overrides.
    ///
    /// A missing file is not an error: defaults are generated (including a
    /// fresh instance name) and stored. When an environment override changes
    /// a value since the last boot the effective configuration is written
    /// back, so the file always mirrors what the node actually runs with.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        let stored = Self::read_file(&path)?;

        let defaults = ClusterConfig::default();
        let mut builder = Config::builder()
            .set_default("instance_name", defaults.instance_name.clone())?
            .set_default("topic", defaults.topic.clone())?
            .set_default("broker_url", defaults.broker_url.clone())?
            .set_default("role", "master-slave")?;

        if path.exists() {
            builder = builder.add_source(
                File::from(path.clone()).format(FileFormat::Json),
            );
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

        let effective: ClusterConfig = builder.build()?.try_deserialize()?;

        // Persist first boot or any override so the next boot sees the same
        // effective values.
        if stored.as_ref() != Some(&effective) {
            effective.store(dir.as_ref())?;
            info!(
                instance_name = %effective.instance_name,
                role = ?effective.role,
                "Stored effective cluster configuration"
            );
        } else {
            debug!(instance_name = %effective.instance_name, "Loaded cluster configuration");
        }

        Ok(effective)
    }

    /// Write configuration to `dir/cluster.json`
    pub fn store(&self, dir: impl AsRef<Path>) -> Result<()> {
        let path = self.file_path(dir.as_ref());
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SyncError::configuration(format!("unable to encode {CONFIG_FILE_NAME}: {e}")))?;
        fs::write(&path, json)
            .map_err(|e| SyncError::configuration(format!("unable to write {}: {e}", path.display())))
    }

    fn file_path(&self, dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    fn read_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| SyncError::configuration(format!("unable to read {}: {e}", path.display())))?;
        let parsed = serde_json::from_str(&raw)
            .map_err(|e| SyncError::configuration(format!("malformed {}: {e}", path.display())))?;
        Ok(Some(parsed))
    }
}
