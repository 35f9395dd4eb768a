use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use multicluster_mapper::MapperConfig;

use crate::{
    Cluster, ClusterError, ClusterInfo, ClientFactory, CredentialResolver, InitOption,
    SecretCredentialResolver, SharedCluster, SharedMasterClient, SharedScheme,
};

/// Builds a member cluster handle from its description in the master cluster.
///
/// ```ignore
/// let cluster = ClusterBuilder::by(master)
///     .with_scheme(scheme)
///     .with_factory(factory)
///     .named("member-1")
///     .complete()
///     .await?;
/// ```
#[derive(Default)]
pub struct ClusterBuilder {
    name: String,
    master: Option<SharedMasterClient>,
    scheme: Option<SharedScheme>,
    factory: Option<Arc<dyn ClientFactory>>,
    resolver: Option<Arc<dyn CredentialResolver>>,
    mapper_config: MapperConfig,
    resync: Option<Duration>,
    options: Vec<InitOption>,
}

impl ClusterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// builder reading descriptions through `master`
    pub fn by(master: SharedMasterClient) -> Self {
        Self::new().with_master(master)
    }

    pub fn with_master(mut self, master: SharedMasterClient) -> Self {
        self.master = Some(master);
        self
    }

    pub fn with_scheme(mut self, scheme: SharedScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// defaults to [`SecretCredentialResolver`] over the master client
    pub fn with_resolver(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_mapper_config(mut self, config: MapperConfig) -> Self {
        self.mapper_config = config;
        self
    }

    /// resync period of the watch cache
    pub fn with_informer_sync(mut self, resync: Option<Duration>) -> Self {
        self.resync = resync;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// options are applied in order after the handle is constructed
    pub fn with_options(mut self, options: impl IntoIterator<Item = InitOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn with_option(
        self,
        option: impl FnOnce(&mut Cluster) -> Result<(), ClusterError> + Send + 'static,
    ) -> Self {
        self.with_options([Box::new(option) as InitOption])
    }

    /// Validate the builder, load the description, resolve credentials and
    /// construct the handle. Configuration errors are reported before any
    /// request reaches the master cluster.
    #[instrument(skip(self), fields(cluster = %self.name))]
    pub async fn complete(self) -> Result<SharedCluster, ClusterError> {
        let scheme = self
            .scheme
            .ok_or(ClusterError::Config("must provide a non-nil scheme"))?;
        let master = self
            .master
            .ok_or(ClusterError::Config("must provide a non-nil master cluster client"))?;
        if self.name.is_empty() {
            return Err(ClusterError::Config("must provide a non-empty cluster name"));
        }
        let factory = self
            .factory
            .ok_or(ClusterError::Config("must provide a client factory"))?;

        let description = master
            .get_cluster(&self.name)
            .await
            .map_err(ClusterError::LoadCluster)?;
        let spec = &description.spec;

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(SecretCredentialResolver::new(master.clone())));
        let config = resolver
            .resolve(&self.name, &spec.connect)
            .await
            .map_err(ClusterError::LoadConfig)?;

        let mut cluster = Cluster::new(
            self.name,
            config,
            scheme,
            factory.as_ref(),
            self.mapper_config,
            self.resync,
        )
        .await?;
        cluster.set_info(ClusterInfo::from(spec));

        if spec.is_disabled() {
            cluster.disable();
        }

        for option in self.options {
            option(&mut cluster)?;
        }

        debug!(status = %cluster.status(), "cluster built");
        Ok(Arc::new(cluster))
    }
}
