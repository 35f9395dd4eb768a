use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use k8_types::K8Obj;

use multicluster_metadata::cluster::{ClusterSpec, SecretRef};

use crate::MasterError;

/// decoded secret payload by key
pub type SecretData = BTreeMap<String, Vec<u8>>;

pub type SharedMasterClient = Arc<dyn MasterClient>;

/// Read access to the master cluster holding cluster descriptions and their secrets
#[async_trait]
pub trait MasterClient: Debug + Send + Sync {
    async fn get_cluster(&self, name: &str) -> Result<K8Obj<ClusterSpec>, MasterError>;

    async fn get_secret(&self, secret: &SecretRef) -> Result<SecretData, MasterError>;
}
