use std::path::PathBuf;

use thiserror::Error;

use multicluster_cluster::{ClusterError, CredentialError, StatusCode};
use multicluster_types::ClusterName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("cluster {name} is {status}, can not replace")]
    Collision { name: ClusterName, status: StatusCode },
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("error creating cluster {name}: {source}")]
    Build { name: ClusterName, source: ClusterError },
    #[error("error adding cluster to pool: {0}")]
    Pool(#[from] PoolError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("kubeconfig {} not found", .0.display())]
    MissingKubeConfig(PathBuf),
    #[error("failed to load kubeconfig {}: {reason}", path.display())]
    LoadKubeConfig { path: PathBuf, reason: String },
    #[error("invalid master connection: {0}")]
    Master(#[from] CredentialError),
    #[error("qps and burst must be positive")]
    InvalidRateLimit,
    #[error("event capacity must be positive")]
    InvalidEventCapacity,
}
