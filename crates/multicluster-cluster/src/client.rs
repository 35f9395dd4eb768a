//!
//! # Member cluster sub-clients
//!
//! A cluster handle owns one of each: typed client, watch cache, dynamic client,
//! discovery client and api extensions client. They are produced by a [`ClientFactory`]
//! from the resolved connection parameters.
//!
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use multicluster_mapper::{DiscoveryInterface, GroupVersionKind, GroupVersionResource, SharedRestMapper};

use crate::{ClientError, ConnectionParameters, SharedScheme};

/// schemaless object as returned by the api server
pub type DynamicObject = serde_json::Value;

/// namespace and name of an object, namespace is empty for cluster scoped objects
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn cluster_scoped(name: impl Into<String>) -> Self {
        Self::new("", name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// Kind-addressed client, resolves resources through the cluster's mapper
#[async_trait]
pub trait GenericClient: Debug + Send + Sync {
    async fn get(
        &self,
        kind: &GroupVersionKind,
        key: &ObjectKey,
    ) -> Result<DynamicObject, ClientError>;

    async fn list(
        &self,
        kind: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClientError>;
}

/// Resource-addressed client for arbitrary kinds
#[async_trait]
pub trait DynamicClient: Debug + Send + Sync {
    async fn get(
        &self,
        resource: &GroupVersionResource,
        key: &ObjectKey,
    ) -> Result<DynamicObject, ClientError>;

    async fn list(
        &self,
        resource: &GroupVersionResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClientError>;
}

/// Client for custom resource definitions installed in the cluster
#[async_trait]
pub trait ExtensionsClient: Debug + Send + Sync {
    /// names of installed custom resource definitions
    async fn list_definitions(&self) -> Result<Vec<String>, ClientError>;
}

/// Local mirror of cluster objects kept current by watches
#[async_trait]
pub trait WatchCache: Debug + Send + Sync {
    /// run watches until `lifetime` is cancelled
    async fn start(&self, lifetime: CancellationToken) -> Result<(), ClientError>;

    /// resolves once the initial listing completed, false if it never will
    async fn wait_for_cache_sync(&self) -> bool;
}

/// Builds the sub-clients of a member cluster
#[async_trait]
pub trait ClientFactory: Debug + Send + Sync {
    async fn discovery(
        &self,
        params: &ConnectionParameters,
    ) -> Result<Arc<dyn DiscoveryInterface>, ClientError>;

    async fn client(
        &self,
        params: &ConnectionParameters,
        scheme: SharedScheme,
        mapper: SharedRestMapper,
    ) -> Result<Arc<dyn GenericClient>, ClientError>;

    /// `resync` is the period of full relists, never when absent
    async fn cache(
        &self,
        params: &ConnectionParameters,
        scheme: SharedScheme,
        mapper: SharedRestMapper,
        resync: Option<Duration>,
    ) -> Result<Arc<dyn WatchCache>, ClientError>;

    async fn dynamic(
        &self,
        params: &ConnectionParameters,
    ) -> Result<Arc<dyn DynamicClient>, ClientError>;

    async fn extensions(
        &self,
        params: &ConnectionParameters,
    ) -> Result<Arc<dyn ExtensionsClient>, ClientError>;
}
