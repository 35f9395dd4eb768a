//!
//! # Cluster controller
//!
//! Consumes cluster description events from a channel, builds handles and
//! keeps the pool in line with the descriptions found in the master cluster.
//!
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use fluvio_future::task::spawn;

use multicluster_types::ClusterName;

use multicluster_cluster::{
    ClientFactory, ClusterBuilder, SecretCredentialResolver, SharedCluster, SharedMasterClient,
    SharedScheme,
};

use crate::{ControllerError, PoolConfig, SharedClusterPool};

/// Change of a cluster description in the master cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterEvent {
    Created(ClusterName),
    Updated(ClusterName),
    Deleted(ClusterName),
}

impl ClusterEvent {
    pub fn name(&self) -> &str {
        match self {
            Self::Created(name) | Self::Updated(name) | Self::Deleted(name) => name,
        }
    }
}

pub struct ClusterController {
    pool: SharedClusterPool,
    master: SharedMasterClient,
    scheme: SharedScheme,
    factory: Arc<dyn ClientFactory>,
    config: PoolConfig,
    lifetime: CancellationToken,
}

impl ClusterController {
    pub fn new(
        pool: SharedClusterPool,
        master: SharedMasterClient,
        scheme: SharedScheme,
        factory: Arc<dyn ClientFactory>,
        config: PoolConfig,
        lifetime: CancellationToken,
    ) -> Self {
        Self {
            pool,
            master,
            scheme,
            factory,
            config,
            lifetime,
        }
    }

    pub fn pool(&self) -> &SharedClusterPool {
        &self.pool
    }

    /// spawn the event loop, events are fed through the returned sender
    pub fn start(self) -> Sender<ClusterEvent> {
        let (sender, receiver) = async_channel::bounded(self.config.event_capacity.max(1));
        info!("starting cluster controller");
        spawn(self.dispatch_loop(receiver));
        sender
    }

    /// Process events until the lifetime is cancelled or every sender is dropped.
    /// Clusters are stopped when the lifetime ends.
    #[instrument(skip(self, events), name = "ClusterControllerLoop")]
    pub async fn dispatch_loop(self, events: Receiver<ClusterEvent>) {
        loop {
            tokio::select! {
                _ = self.lifetime.cancelled() => {
                    info!("lifetime ended, stopping clusters");
                    self.pool.stop_all().await;
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Err(err) = self.process(event).await {
                            error!(%err, "failed to process cluster event");
                        }
                    }
                    Err(_) => {
                        debug!("event channel closed");
                        break;
                    }
                }
            }
        }
        info!("cluster controller terminated");
    }

    /// apply a single event to the pool
    #[instrument(skip(self), fields(cluster = %event.name()))]
    pub async fn process(&self, event: ClusterEvent) -> Result<(), ControllerError> {
        match event {
            ClusterEvent::Created(name) => self.create(&name).await,
            ClusterEvent::Updated(name) => self.update(&name).await,
            ClusterEvent::Deleted(name) => {
                self.pool.remove(&name).await;
                Ok(())
            }
        }
    }

    async fn build(&self, name: &str) -> Result<SharedCluster, ControllerError> {
        let resolver = SecretCredentialResolver::new(self.master.clone())
            .with_rate_limit(self.config.qps, self.config.burst)
            .with_user_agent(self.config.user_agent.clone());

        ClusterBuilder::by(self.master.clone())
            .with_scheme(self.scheme.clone())
            .with_factory(self.factory.clone())
            .with_resolver(Arc::new(resolver))
            .with_mapper_config(self.config.mapper.clone())
            .with_informer_sync(self.config.informer_sync)
            .named(name)
            .complete()
            .await
            .map_err(|source| ControllerError::Build {
                name: name.to_owned(),
                source,
            })
    }

    fn launch(&self, cluster: &SharedCluster) {
        if self.config.auto_start {
            cluster.start(&self.lifetime);
        }
    }

    async fn create(&self, name: &str) -> Result<(), ControllerError> {
        let cluster = self.build(name).await?;
        self.pool.add(cluster.clone()).await?;
        self.launch(&cluster);
        Ok(())
    }

    /// the running handle stays in place unless its replacement builds
    async fn update(&self, name: &str) -> Result<(), ControllerError> {
        let cluster = self.build(name).await?;
        if self.pool.replace(cluster.clone()).await.is_none() {
            debug!("updated cluster was not registered");
        }
        self.launch(&cluster);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use fluvio_future::timer::sleep;

    use multicluster_cluster::memory::{MemoryClientFactory, MemoryMaster};
    use multicluster_cluster::{Scheme, StatusCode};
    use multicluster_metadata::cluster::{ClusterSpec, ConnectConfig, SecretRef};

    use crate::{ClusterPool, ControllerError, PoolConfig, PoolError};

    use super::{ClusterController, ClusterEvent};

    fn spec(endpoint: &str) -> ClusterSpec {
        let mut connect = ConnectConfig::with_endpoint(endpoint);
        connect.secret = Some(SecretRef::new("kube-system", "member"));
        ClusterSpec::new(connect)
    }

    fn master() -> Arc<MemoryMaster> {
        let master = MemoryMaster::shared();
        master.insert_secret(
            SecretRef::new("kube-system", "member"),
            BTreeMap::from([("token".to_owned(), b"abc".to_vec())]),
        );
        master.insert_cluster("a", spec("https://a:6443"));
        master.insert_cluster("b", spec("https://b:6443"));
        master
    }

    fn controller(master: Arc<MemoryMaster>, auto_start: bool) -> ClusterController {
        let config = PoolConfig {
            kube_config: None,
            auto_start,
            ..Default::default()
        };
        ClusterController::new(
            ClusterPool::shared(),
            master,
            Scheme::multicluster().shared(),
            MemoryClientFactory::shared(),
            config,
            CancellationToken::new(),
        )
    }

    #[fluvio_future::test]
    async fn test_created_and_deleted() {
        let controller = controller(master(), true);

        controller
            .process(ClusterEvent::Created("a".to_owned()))
            .await
            .expect("create");
        let a = controller.pool().get("a").await.expect("a");
        assert!(a.status().is_running());

        controller
            .process(ClusterEvent::Deleted("a".to_owned()))
            .await
            .expect("delete");
        assert!(controller.pool().get("a").await.is_none());
        assert_eq!(a.status(), StatusCode::Stopped);

        controller
            .process(ClusterEvent::Deleted("a".to_owned()))
            .await
            .expect("delete again");
    }

    #[fluvio_future::test]
    async fn test_duplicate_create_keeps_running_handle() {
        let controller = controller(master(), true);

        controller
            .process(ClusterEvent::Created("a".to_owned()))
            .await
            .expect("create");
        let original = controller.pool().get("a").await.expect("a");

        let err = controller
            .process(ClusterEvent::Created("a".to_owned()))
            .await
            .expect_err("collision");
        assert!(matches!(err, ControllerError::Pool(PoolError::Collision { .. })));

        let registered = controller.pool().get("a").await.expect("a");
        assert!(Arc::ptr_eq(&registered, &original));
        assert!(registered.status().is_running());
        controller.pool().stop_all().await;
    }

    #[fluvio_future::test]
    async fn test_failed_build_registers_nothing() {
        let master = master();
        let controller = controller(master.clone(), false);

        let err = controller
            .process(ClusterEvent::Created("missing".to_owned()))
            .await
            .expect_err("no description");
        assert!(matches!(err, ControllerError::Build { ref name, .. } if name == "missing"));
        assert!(controller.pool().is_empty().await);

        controller
            .process(ClusterEvent::Created("b".to_owned()))
            .await
            .expect("create");
        let b = controller.pool().get("b").await.expect("b");
        assert_eq!(b.status(), StatusCode::Stopped);

        master.remove_cluster("b");
        assert!(controller
            .process(ClusterEvent::Updated("b".to_owned()))
            .await
            .is_err());
        let registered = controller.pool().get("b").await.expect("b");
        assert!(Arc::ptr_eq(&registered, &b));
    }

    #[fluvio_future::test]
    async fn test_update_replaces_handle() {
        let master = master();
        let controller = controller(master.clone(), true);

        controller
            .process(ClusterEvent::Created("a".to_owned()))
            .await
            .expect("create");
        let old = controller.pool().get("a").await.expect("a");

        let mut disabled = spec("https://a-new:6443");
        disabled.disabled = true;
        master.insert_cluster("a", disabled);

        controller
            .process(ClusterEvent::Updated("a".to_owned()))
            .await
            .expect("update");
        let new = controller.pool().get("a").await.expect("a");

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(old.status(), StatusCode::Stopped);
        assert_eq!(new.status(), StatusCode::Disabled);
        assert_eq!(new.config().host.as_str(), "https://a-new:6443/");
    }

    #[fluvio_future::test]
    async fn test_clients_follow_pool_config() {
        let factory = MemoryClientFactory::shared();
        let config = PoolConfig {
            kube_config: None,
            qps: 25.0,
            burst: 50,
            informer_sync: Some(Duration::from_secs(45)),
            user_agent: "pool-test".to_owned(),
            auto_start: false,
            ..Default::default()
        };
        let controller = ClusterController::new(
            ClusterPool::shared(),
            master(),
            Scheme::multicluster().shared(),
            factory.clone(),
            config,
            CancellationToken::new(),
        );

        controller
            .process(ClusterEvent::Created("a".to_owned()))
            .await
            .expect("create");
        let a = controller.pool().get("a").await.expect("a");
        assert_eq!(a.config().user_agent, "pool-test");
        assert_eq!(a.config().qps, 25.0);
        assert_eq!(a.config().burst, 50);
        assert_eq!(factory.cache.resync(), Some(Duration::from_secs(45)));
    }

    #[fluvio_future::test]
    async fn test_event_loop() {
        let controller = controller(master(), true);
        let pool = controller.pool().clone();
        let lifetime = controller.lifetime.clone();

        let events = controller.start();
        events
            .send(ClusterEvent::Created("a".to_owned()))
            .await
            .expect("send");
        events
            .send(ClusterEvent::Created("b".to_owned()))
            .await
            .expect("send");

        for _ in 0..100 {
            if pool.len().await == 2 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(pool.len().await, 2);

        lifetime.cancel();
        sleep(Duration::from_millis(50)).await;
        for (name, cluster) in pool.list().await {
            assert_eq!(cluster.status(), StatusCode::Stopped, "{name} still running");
        }
        assert!(events.is_closed());
    }
}
