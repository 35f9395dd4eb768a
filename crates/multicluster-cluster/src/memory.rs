//!
//! # In-memory backends
//!
//! Master client and member sub-clients backed by process memory.
//! Used to run controllers without a live api server and throughout the tests.
//!
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use k8_types::K8Obj;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use multicluster_mapper::{
    DiscoveryInterface, GroupVersionKind, GroupVersionResource, MapperError, SharedRestMapper,
    group_version_resource,
};
use multicluster_metadata::cluster::{ApiEnablement, ClusterSpec, SecretRef};
use multicluster_types::event::StickyEvent;

use crate::{
    ClientError, ClientFactory, ConnectionParameters, DynamicClient, DynamicObject,
    ExtensionsClient, GenericClient, MasterClient, MasterError, ObjectKey, SecretData,
    SharedScheme, WatchCache,
};

/// Master cluster holding cluster descriptions and secrets in memory
#[derive(Debug, Default)]
pub struct MemoryMaster {
    clusters: RwLock<HashMap<String, K8Obj<ClusterSpec>>>,
    secrets: RwLock<HashMap<SecretRef, SecretData>>,
    unreachable: AtomicBool,
}

impl MemoryMaster {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_cluster(&self, name: impl Into<String>, spec: ClusterSpec) {
        let name = name.into();
        self.clusters
            .write()
            .insert(name.clone(), K8Obj::new(name, spec));
    }

    pub fn remove_cluster(&self, name: &str) -> Option<K8Obj<ClusterSpec>> {
        self.clusters.write().remove(name)
    }

    pub fn insert_secret(&self, secret: SecretRef, data: SecretData) {
        self.secrets.write().insert(secret, data);
    }

    /// fail every request with a transport error
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), MasterError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(MasterError::Transport("connection refused".to_owned()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MasterClient for MemoryMaster {
    async fn get_cluster(&self, name: &str) -> Result<K8Obj<ClusterSpec>, MasterError> {
        self.check_reachable()?;
        self.clusters
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| MasterError::NotFound {
                kind: "cluster",
                name: name.to_owned(),
            })
    }

    async fn get_secret(&self, secret: &SecretRef) -> Result<SecretData, MasterError> {
        self.check_reachable()?;
        self.secrets
            .read()
            .get(secret)
            .cloned()
            .ok_or_else(|| MasterError::NotFound {
                kind: "secret",
                name: secret.to_string(),
            })
    }
}

/// Discovery source with a settable api surface
#[derive(Debug)]
pub struct MemoryDiscovery {
    version: String,
    resources: RwLock<Vec<ApiEnablement>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl Default for MemoryDiscovery {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl MemoryDiscovery {
    pub fn new(resources: Vec<ApiEnablement>) -> Self {
        Self {
            version: "v1.28.0".to_owned(),
            resources: RwLock::new(resources),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_resources(&self, resources: Vec<ApiEnablement>) {
        *self.resources.write() = resources;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// number of resource listings served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscoveryInterface for MemoryDiscovery {
    async fn server_version(&self) -> Result<String, MapperError> {
        Ok(self.version.clone())
    }

    async fn server_resources(&self) -> Result<Vec<ApiEnablement>, MapperError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(MapperError::Discovery("server unavailable".to_owned()));
        }
        Ok(self.resources.read().clone())
    }
}

/// Object store addressed by resource
#[derive(Debug, Default)]
pub struct MemoryObjects {
    objects: RwLock<BTreeMap<GroupVersionResource, BTreeMap<ObjectKey, DynamicObject>>>,
}

impl MemoryObjects {
    pub fn insert(&self, resource: GroupVersionResource, key: ObjectKey, object: DynamicObject) {
        self.objects
            .write()
            .entry(resource)
            .or_default()
            .insert(key, object);
    }
}

#[async_trait]
impl DynamicClient for MemoryObjects {
    async fn get(
        &self,
        resource: &GroupVersionResource,
        key: &ObjectKey,
    ) -> Result<DynamicObject, ClientError> {
        self.objects
            .read()
            .get(resource)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{resource} {key}")))
    }

    async fn list(
        &self,
        resource: &GroupVersionResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClientError> {
        Ok(self
            .objects
            .read()
            .get(resource)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(key, _)| namespace.is_none_or(|ns| key.namespace == ns))
                    .map(|(_, object)| object.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Typed client over [`MemoryObjects`], kinds resolved through the cluster mapper
#[derive(Debug)]
pub struct MemoryClient {
    objects: Arc<MemoryObjects>,
    mapper: SharedRestMapper,
}

impl MemoryClient {
    pub fn new(objects: Arc<MemoryObjects>, mapper: SharedRestMapper) -> Self {
        Self { objects, mapper }
    }

    async fn resource(&self, kind: &GroupVersionKind) -> Result<GroupVersionResource, ClientError> {
        Ok(group_version_resource(self.mapper.as_ref(), kind).await?)
    }
}

#[async_trait]
impl GenericClient for MemoryClient {
    async fn get(
        &self,
        kind: &GroupVersionKind,
        key: &ObjectKey,
    ) -> Result<DynamicObject, ClientError> {
        let resource = self.resource(kind).await?;
        DynamicClient::get(self.objects.as_ref(), &resource, key).await
    }

    async fn list(
        &self,
        kind: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClientError> {
        let resource = self.resource(kind).await?;
        DynamicClient::list(self.objects.as_ref(), &resource, namespace).await
    }
}

/// Watch cache whose initial sync is completed by hand
#[derive(Debug, Default)]
pub struct MemoryWatchCache {
    synced: StickyEvent,
    failing: AtomicBool,
    starts: AtomicUsize,
    running: AtomicUsize,
    resync: RwLock<Option<Duration>>,
}

impl MemoryWatchCache {
    pub fn mark_synced(&self) {
        self.synced.notify();
    }

    /// watches fail immediately and the cache never syncs
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// resync period requested by the last cluster built on this cache
    pub fn resync(&self) -> Option<Duration> {
        *self.resync.read()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// number of watch loops currently running
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WatchCache for MemoryWatchCache {
    async fn start(&self, lifetime: CancellationToken) -> Result<(), ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("watch failed".to_owned()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.fetch_add(1, Ordering::SeqCst);
        trace!("watching");
        lifetime.cancelled().await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        debug!("watch cache stopped");
        Ok(())
    }

    async fn wait_for_cache_sync(&self) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }
        self.synced.listen().await;
        true
    }
}

#[derive(Debug, Default)]
pub struct MemoryExtensions {
    definitions: RwLock<Vec<String>>,
}

impl MemoryExtensions {
    pub fn add_definition(&self, name: impl Into<String>) {
        self.definitions.write().push(name.into());
    }
}

#[async_trait]
impl ExtensionsClient for MemoryExtensions {
    async fn list_definitions(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.definitions.read().clone())
    }
}

/// Hands out the same backends to every cluster it builds
#[derive(Debug, Default)]
pub struct MemoryClientFactory {
    pub discovery: Arc<MemoryDiscovery>,
    pub objects: Arc<MemoryObjects>,
    pub cache: Arc<MemoryWatchCache>,
    pub extensions: Arc<MemoryExtensions>,
    fail_on: RwLock<Option<&'static str>>,
}

impl MemoryClientFactory {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_discovery(discovery: MemoryDiscovery) -> Self {
        Self {
            discovery: Arc::new(discovery),
            ..Default::default()
        }
    }

    /// construction of the named sub-client (`client`, `cache`, `dynamic`,
    /// `discovery` or `extensions`) fails until cleared
    pub fn fail_on(&self, client: Option<&'static str>) {
        *self.fail_on.write() = client;
    }

    fn check(&self, client: &'static str) -> Result<(), ClientError> {
        if *self.fail_on.read() == Some(client) {
            Err(ClientError::Transport(format!("{client} unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ClientFactory for MemoryClientFactory {
    async fn discovery(
        &self,
        _params: &ConnectionParameters,
    ) -> Result<Arc<dyn DiscoveryInterface>, ClientError> {
        self.check("discovery")?;
        Ok(self.discovery.clone())
    }

    async fn client(
        &self,
        _params: &ConnectionParameters,
        _scheme: SharedScheme,
        mapper: SharedRestMapper,
    ) -> Result<Arc<dyn GenericClient>, ClientError> {
        self.check("client")?;
        Ok(Arc::new(MemoryClient::new(self.objects.clone(), mapper)))
    }

    async fn cache(
        &self,
        _params: &ConnectionParameters,
        _scheme: SharedScheme,
        _mapper: SharedRestMapper,
        resync: Option<Duration>,
    ) -> Result<Arc<dyn WatchCache>, ClientError> {
        self.check("cache")?;
        *self.cache.resync.write() = resync;
        Ok(self.cache.clone())
    }

    async fn dynamic(
        &self,
        _params: &ConnectionParameters,
    ) -> Result<Arc<dyn DynamicClient>, ClientError> {
        self.check("dynamic")?;
        Ok(self.objects.clone())
    }

    async fn extensions(
        &self,
        _params: &ConnectionParameters,
    ) -> Result<Arc<dyn ExtensionsClient>, ClientError> {
        self.check("extensions")?;
        Ok(self.extensions.clone())
    }
}
