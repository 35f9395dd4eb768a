use thiserror::Error;

use multicluster_mapper::MapperError;

/// Failures of member cluster sub-clients
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Mapping(#[from] MapperError),
}

/// Failures talking to the master cluster
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MasterError {
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },
    #[error("master cluster request failed: {0}")]
    Transport(String),
}

impl MasterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failures turning connection references into connection parameters
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Master(#[from] MasterError),
    #[error("cluster {0} has no secret, config or token reference")]
    MissingCredentials(String),
    #[error("secret {secret} has no key {key}")]
    MissingKey { secret: String, key: &'static str },
    #[error("no api server endpoint for cluster {0}")]
    MissingEndpoint(String),
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("invalid kubeconfig: {0}")]
    InvalidKubeConfig(String),
    #[error("invalid {field}: {reason}")]
    Decode { field: &'static str, reason: String },
}

/// Failures building or configuring a cluster handle
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("{0}")]
    Config(&'static str),
    #[error("failed to load cluster resource: {0}")]
    LoadCluster(#[source] MasterError),
    #[error("failed to load client rest config: {0}")]
    LoadConfig(#[source] CredentialError),
    #[error("failed to create {client}: {source}")]
    CreateClient {
        client: &'static str,
        source: ClientError,
    },
    #[error("failed to initialize options: {0}")]
    InitOption(String),
}
