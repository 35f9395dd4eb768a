use std::collections::HashMap;
use std::sync::Arc;

use async_lock::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use multicluster_cluster::SharedCluster;

use crate::PoolError;

pub type SharedClusterPool = Arc<ClusterPool>;

/// Member clusters managed by this process, keyed by name.
/// At most one running handle exists per name.
#[derive(Debug, Default)]
pub struct ClusterPool {
    clusters: RwLock<HashMap<String, SharedCluster>>,
}

impl ClusterPool {
    pub fn shared() -> SharedClusterPool {
        Arc::new(Self::default())
    }

    /// insert or overwrite, unless the registered handle of the same name is running
    pub async fn add(&self, cluster: SharedCluster) -> Result<(), PoolError> {
        let mut clusters = self.clusters.write().await;
        if let Some(existing) = clusters.get(cluster.name()) {
            let status = existing.status();
            if status.is_running() {
                warn!(cluster = %cluster.name(), %status, "rejecting replacement of running cluster");
                return Err(PoolError::Collision {
                    name: cluster.name().to_owned(),
                    status,
                });
            }
        }
        debug!(cluster = %cluster.name(), "cluster added");
        clusters.insert(cluster.name().to_owned(), cluster);
        Ok(())
    }

    /// stop and swap out the handle of the same name, returns the replaced handle
    pub async fn replace(&self, cluster: SharedCluster) -> Option<SharedCluster> {
        let mut clusters = self.clusters.write().await;
        let old = clusters.insert(cluster.name().to_owned(), cluster);
        if let Some(old) = &old {
            old.stop();
            info!(cluster = %old.name(), "cluster replaced");
        }
        old
    }

    /// stop and drop the handle, no-op if absent
    pub async fn remove(&self, name: &str) -> Option<SharedCluster> {
        let mut clusters = self.clusters.write().await;
        let removed = clusters.remove(name);
        if let Some(cluster) = &removed {
            cluster.stop();
            info!(cluster = %name, "cluster removed");
        }
        removed
    }

    pub async fn get(&self, name: &str) -> Option<SharedCluster> {
        self.clusters.read().await.get(name).cloned()
    }

    /// point in time copy of the registry
    pub async fn list(&self) -> HashMap<String, SharedCluster> {
        self.clusters.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.clusters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clusters.read().await.is_empty()
    }

    /// start every registered handle, returns the number actually started
    #[instrument(skip(self, lifetime))]
    pub async fn start_all(&self, lifetime: &CancellationToken) -> usize {
        let clusters = self.clusters.write().await;
        let started = clusters
            .values()
            .filter(|cluster| cluster.start(lifetime))
            .count();
        info!(started, total = clusters.len(), "started clusters");
        started
    }

    #[instrument(skip(self))]
    pub async fn stop_all(&self) {
        let clusters = self.clusters.write().await;
        for cluster in clusters.values() {
            cluster.stop();
        }
        info!(total = clusters.len(), "stopped clusters");
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;
    use url::Url;

    use multicluster_cluster::memory::MemoryClientFactory;
    use multicluster_cluster::{Cluster, ConnectionParameters, Scheme, SharedCluster, StatusCode};
    use multicluster_mapper::MapperConfig;

    use crate::PoolError;

    use super::ClusterPool;

    async fn cluster(name: &str, factory: &MemoryClientFactory) -> SharedCluster {
        let params = ConnectionParameters::new(
            Url::parse(&format!("https://{name}:6443")).expect("url"),
        );
        let cluster = Cluster::new(
            name,
            params,
            Scheme::multicluster().shared(),
            factory,
            MapperConfig::default(),
            None,
        )
        .await
        .expect("cluster");
        Arc::new(cluster)
    }

    #[fluvio_future::test]
    async fn test_add_collision() {
        let factory = MemoryClientFactory::default();
        let pool = ClusterPool::default();
        let lifetime = CancellationToken::new();

        let original = cluster("a", &factory).await;
        pool.add(original.clone()).await.expect("add");
        assert!(original.start(&lifetime));

        let replacement = cluster("a", &factory).await;
        let err = pool.add(replacement).await.expect_err("collision");
        assert!(matches!(err, PoolError::Collision { ref name, .. } if name == "a"));

        let registered = pool.get("a").await.expect("registered");
        assert!(Arc::ptr_eq(&registered, &original));
        assert!(registered.status().is_running());
        pool.stop_all().await;
    }

    #[fluvio_future::test]
    async fn test_add_overwrites_stopped() {
        let factory = MemoryClientFactory::default();
        let pool = ClusterPool::default();

        let first = cluster("a", &factory).await;
        pool.add(first.clone()).await.expect("add");

        let second = cluster("a", &factory).await;
        pool.add(second.clone()).await.expect("overwrite");

        let registered = pool.get("a").await.expect("registered");
        assert!(Arc::ptr_eq(&registered, &second));
        assert_eq!(pool.len().await, 1);
    }

    #[fluvio_future::test]
    async fn test_remove_is_idempotent() {
        let factory = MemoryClientFactory::default();
        let pool = ClusterPool::default();
        pool.add(cluster("a", &factory).await).await.expect("add");

        assert!(pool.remove("missing").await.is_none());
        assert_eq!(pool.len().await, 1);

        let lifetime = CancellationToken::new();
        pool.get("a").await.expect("a").start(&lifetime);
        let removed = pool.remove("a").await.expect("removed");
        assert_eq!(removed.status(), StatusCode::Stopped);
        assert!(pool.remove("a").await.is_none());
        assert!(pool.is_empty().await);
    }

    #[fluvio_future::test]
    async fn test_stop_all_then_remove() {
        let factory = MemoryClientFactory::default();
        let pool = ClusterPool::default();
        let lifetime = CancellationToken::new();

        let a = cluster("a", &factory).await;
        let b = cluster("b", &factory).await;
        pool.add(a.clone()).await.expect("add a");
        pool.add(b.clone()).await.expect("add b");
        assert!(a.start(&lifetime));
        assert_eq!(b.status(), StatusCode::Stopped);

        pool.stop_all().await;
        assert_eq!(a.status(), StatusCode::Stopped);
        assert_eq!(b.status(), StatusCode::Stopped);

        pool.remove("a").await;
        assert!(pool.get("a").await.is_none());
        assert!(pool.get("b").await.is_some());
    }

    #[fluvio_future::test]
    async fn test_start_all_visits_every_handle() {
        let factory = MemoryClientFactory::default();
        let pool = ClusterPool::default();
        let lifetime = CancellationToken::new();

        let disabled = cluster("disabled", &factory).await;
        disabled.disable();
        let running = cluster("running", &factory).await;
        assert!(running.start(&lifetime));

        pool.add(disabled.clone()).await.expect("add");
        pool.add(running).await.expect("add");
        pool.add(cluster("c", &factory).await).await.expect("add");
        pool.add(cluster("d", &factory).await).await.expect("add");

        assert_eq!(pool.start_all(&lifetime).await, 2);
        assert_eq!(disabled.status(), StatusCode::Disabled);
        for (name, cluster) in pool.list().await {
            if name != "disabled" {
                assert!(cluster.status().is_running(), "{name} not running");
            }
        }
        pool.stop_all().await;
    }

    #[fluvio_future::test]
    async fn test_list_is_snapshot() {
        let factory = MemoryClientFactory::default();
        let pool = ClusterPool::default();
        pool.add(cluster("a", &factory).await).await.expect("add");

        let snapshot = pool.list().await;
        pool.add(cluster("b", &factory).await).await.expect("add");
        pool.remove("a").await;

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key("a"));
        assert_eq!(pool.len().await, 1);
    }

    #[fluvio_future::test]
    async fn test_replace_stops_previous() {
        let factory = MemoryClientFactory::default();
        let pool = ClusterPool::default();
        let lifetime = CancellationToken::new();

        let old = cluster("a", &factory).await;
        pool.add(old.clone()).await.expect("add");
        assert!(old.start(&lifetime));

        let new = cluster("a", &factory).await;
        let replaced = pool.replace(new.clone()).await.expect("replaced");
        assert!(Arc::ptr_eq(&replaced, &old));
        assert_eq!(old.status(), StatusCode::Stopped);
        assert!(Arc::ptr_eq(&pool.get("a").await.expect("a"), &new));
    }
}
