mod status;
mod error;
mod params;
mod scheme;
mod client;
mod master;
mod kubeconfig;
mod credential;
mod cluster;
mod builder;

pub mod memory;

pub use status::StatusCode;
pub use error::{ClusterError, ClientError, MasterError, CredentialError};
pub use params::ConnectionParameters;
pub use scheme::{Scheme, SharedScheme};
pub use client::*;
pub use master::{MasterClient, SharedMasterClient, SecretData};
pub use kubeconfig::kube_config_parameters;
pub use credential::{CredentialResolver, SecretCredentialResolver};
pub use cluster::{Cluster, ClusterInfo, SharedCluster, InitOption};
pub use builder::ClusterBuilder;

pub use tokio_util::sync::CancellationToken;

pub mod mapper {
    pub use multicluster_mapper::*;
}
