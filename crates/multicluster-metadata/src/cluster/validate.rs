//!
//! # Admission checks
//!
//! Schema rules a validating webhook applies before a cluster object is persisted.
//!
use thiserror::Error;

use multicluster_types::Reason;
use tracing::debug;

use super::{ClusterSpec, ConnectConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{path}: Secret, Config and Token cannot be empty at the same time")]
    MissingCredentials { path: String },
    #[error("{path}: invalid value {value:?}: {reason}")]
    Invalid {
        path: String,
        value: String,
        reason: Reason,
    },
}

impl ClusterSpec {
    /// validate spec of a newly created cluster
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.connect.validate("spec.connect")
    }

    /// validate update; the new spec must satisfy the same rules as a create
    pub fn validate_update(&self, old: &Self) -> Result<(), ValidationError> {
        if old != self {
            debug!("cluster spec changed");
        }
        self.validate()
    }
}

impl ConnectConfig {
    fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if !self.has_credentials() {
            return Err(ValidationError::MissingCredentials {
                path: path.to_owned(),
            });
        }

        if let Some(token) = &self.token {
            if token.token.is_empty() {
                return Err(ValidationError::Invalid {
                    path: format!("{path}.token.token"),
                    value: String::new(),
                    reason: "token must not be empty".to_owned(),
                });
            }
        }

        if let Some(config) = &self.config {
            if config.secret.is_none() && config.config.is_none() {
                return Err(ValidationError::Invalid {
                    path: format!("{path}.config"),
                    value: String::new(),
                    reason: "either secret or inline config must be set".to_owned(),
                });
            }
        }

        Ok(())
    }
}
