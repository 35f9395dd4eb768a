//!
//! # Member cluster handle
//!
//! A handle bundles the connection parameters and sub-clients of one member
//! cluster with its lifecycle state. Starting a handle launches a sync task
//! that runs the watch cache and promotes the handle to `Ready` once the
//! cache completes its initial sync.
//!
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use fluvio_future::task::spawn;

use multicluster_mapper::{CachedRestMapper, DiscoveryInterface, DiscoveryRestMapper, MapperConfig};
use multicluster_metadata::cluster::{ClusterSpec, Region};

use crate::{
    ClientError, ClientFactory, ClusterError, ConnectionParameters, DynamicClient,
    ExtensionsClient, GenericClient, SharedScheme, StatusCode, WatchCache,
};

pub type SharedCluster = Arc<Cluster>;

/// customization applied to a freshly built handle
pub type InitOption = Box<dyn FnOnce(&mut Cluster) -> Result<(), ClusterError> + Send>;

/// Descriptive attributes carried over from the cluster description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterInfo {
    pub provider: String,
    pub region: Region,
}

impl From<&ClusterSpec> for ClusterInfo {
    fn from(spec: &ClusterSpec) -> Self {
        Self {
            provider: spec.provider.clone(),
            region: spec.region.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Lifecycle {
    status: StatusCode,
    /// cancels the sync task of the current run
    cancel: Option<CancellationToken>,
    /// incremented on each start, fences transitions made by stale sync tasks
    run: u64,
}

impl Lifecycle {
    fn stop(&mut self, cluster: &str) {
        if self.status == StatusCode::Disabled {
            info!(cluster, "cluster is disabled, no need to stop");
            return;
        }
        if self.status.is_running() {
            if let Some(cancel) = self.cancel.take() {
                cancel.cancel();
            }
            self.status = StatusCode::Stopped;
            info!(cluster, "cluster stopped");
        }
    }
}

pub struct Cluster {
    name: String,
    info: ClusterInfo,
    config: ConnectionParameters,
    scheme: SharedScheme,
    lifecycle: Arc<Mutex<Lifecycle>>,
    mapper: Arc<CachedRestMapper>,
    client: Arc<dyn GenericClient>,
    cache: Arc<dyn WatchCache>,
    dynamic: Arc<dyn DynamicClient>,
    discovery: Arc<dyn DiscoveryInterface>,
    extensions: Arc<dyn ExtensionsClient>,
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.name)
            .field("status", &self.status())
            .field("host", &self.config.host.as_str())
            .finish()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "cluster {} is {}", self.name, self.status())
    }
}

fn create_failed(client: &'static str) -> impl FnOnce(ClientError) -> ClusterError {
    move |source| ClusterError::CreateClient { client, source }
}

impl Cluster {
    /// build every sub-client from the connection parameters, the handle starts `Stopped`
    pub async fn new(
        name: impl Into<String>,
        config: ConnectionParameters,
        scheme: SharedScheme,
        factory: &dyn ClientFactory,
        mapper_config: MapperConfig,
        resync: Option<Duration>,
    ) -> Result<Self, ClusterError> {
        let name = name.into();
        debug!(cluster = %name, host = %config.host, "creating cluster clients");

        let discovery = factory
            .discovery(&config)
            .await
            .map_err(create_failed("discovery client"))?;
        let mapper = CachedRestMapper::shared(
            DiscoveryRestMapper::shared(discovery.clone()),
            mapper_config,
        );
        let client = factory
            .client(&config, scheme.clone(), mapper.clone())
            .await
            .map_err(create_failed("client"))?;
        let cache = factory
            .cache(&config, scheme.clone(), mapper.clone(), resync)
            .await
            .map_err(create_failed("cache"))?;
        let dynamic = factory
            .dynamic(&config)
            .await
            .map_err(create_failed("dynamic client"))?;
        let extensions = factory
            .extensions(&config)
            .await
            .map_err(create_failed("api extensions client"))?;

        Ok(Self {
            name,
            info: ClusterInfo::default(),
            config,
            scheme,
            lifecycle: Arc::new(Mutex::new(Lifecycle::default())),
            mapper,
            client,
            cache,
            dynamic,
            discovery,
            extensions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &ClusterInfo {
        &self.info
    }

    pub fn set_info(&mut self, info: ClusterInfo) {
        self.info = info;
    }

    pub fn status(&self) -> StatusCode {
        self.lifecycle.lock().status
    }

    pub fn config(&self) -> &ConnectionParameters {
        &self.config
    }

    pub fn scheme(&self) -> &SharedScheme {
        &self.scheme
    }

    pub fn client(&self) -> &Arc<dyn GenericClient> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<dyn WatchCache> {
        &self.cache
    }

    pub fn dynamic(&self) -> &Arc<dyn DynamicClient> {
        &self.dynamic
    }

    pub fn discovery(&self) -> &Arc<dyn DiscoveryInterface> {
        &self.discovery
    }

    pub fn api_extensions(&self) -> &Arc<dyn ExtensionsClient> {
        &self.extensions
    }

    pub fn rest_mapper(&self) -> &Arc<CachedRestMapper> {
        &self.mapper
    }

    /// Launch the sync task under a child of `parent`.
    /// Only a `Stopped` handle starts, returns true if a task was launched.
    pub fn start(&self, parent: &CancellationToken) -> bool {
        let task = {
            let mut lifecycle = self.lifecycle.lock();
            match lifecycle.status {
                StatusCode::Disabled => {
                    info!(cluster = %self.name, "cluster is disabled, enable it first");
                    return false;
                }
                StatusCode::Started | StatusCode::Waiting | StatusCode::Ready => {
                    debug!(cluster = %self.name, status = %lifecycle.status, "cluster already started");
                    return false;
                }
                StatusCode::Stopped => {
                    let lifetime = parent.child_token();
                    lifecycle.run += 1;
                    lifecycle.cancel = Some(lifetime.clone());
                    lifecycle.status = StatusCode::Started;
                    SyncTask {
                        cluster: self.name.clone(),
                        run: lifecycle.run,
                        lifecycle: self.lifecycle.clone(),
                        cache: self.cache.clone(),
                        lifetime,
                    }
                }
            }
        };

        info!(cluster = %self.name, run = task.run, "cluster started");
        task.start();
        true
    }

    /// cancel the sync task, no-op unless running
    pub fn stop(&self) {
        self.lifecycle.lock().stop(&self.name);
    }

    /// stop if running, then refuse to start until enabled
    pub fn disable(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.status.is_running() {
            lifecycle.stop(&self.name);
        }
        lifecycle.status = StatusCode::Disabled;
        info!(cluster = %self.name, "cluster disabled");
    }

    pub fn enable(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.status == StatusCode::Disabled {
            lifecycle.status = StatusCode::Stopped;
            info!(cluster = %self.name, "cluster enabled");
        }
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        if let Some(cancel) = self.lifecycle.lock().cancel.take() {
            trace!(cluster = %self.name, "cancelling sync task of dropped cluster");
            cancel.cancel();
        }
    }
}

/// Runs the watch cache of one start and tracks its readiness
struct SyncTask {
    cluster: String,
    run: u64,
    lifecycle: Arc<Mutex<Lifecycle>>,
    cache: Arc<dyn WatchCache>,
    lifetime: CancellationToken,
}

impl SyncTask {
    fn start(self) {
        spawn(self.sync_loop());
    }

    #[instrument(skip(self), fields(cluster = %self.cluster, run = self.run))]
    async fn sync_loop(self) {
        let run_cache = async {
            if let Err(err) = self.cache.start(self.lifetime.clone()).await {
                error!(%err, "watch cache terminated");
            }
        };

        tokio::join!(run_cache, self.track_readiness());
        debug!("sync task finished");
    }

    async fn track_readiness(&self) {
        if !self.transition(StatusCode::Started, StatusCode::Waiting) {
            return;
        }

        tokio::select! {
            _ = self.lifetime.cancelled() => {
                debug!("cancelled before cache sync");
            }
            synced = self.cache.wait_for_cache_sync() => {
                if synced {
                    self.transition(StatusCode::Waiting, StatusCode::Ready);
                } else {
                    warn!("watch cache failed to sync");
                }
            }
        }
    }

    /// move from `from` to `to` only if this task's run is still current
    fn transition(&self, from: StatusCode, to: StatusCode) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.run != self.run || lifecycle.status != from {
            trace!(current = %lifecycle.status, %to, "stale transition ignored");
            return false;
        }
        lifecycle.status = to;
        info!(status = %to, "cluster status changed");
        true
    }
}
