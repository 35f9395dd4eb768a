//!
//! # Cached mapper
//!
//! Memoizes kind lookups of an underlying mapper.
//! Successful lookups are kept until the api surface changes. Failed lookups are
//! remembered for the recheck window, during which the recorded error is returned
//! without querying the source again.
//!
//! A resource has at most one entry, resolved or failed. A failure never replaces a
//! resolved kind, so a slow failing lookup can not shadow a concurrent success.
//!
//! All entries of one cache generation live together; a surface change swaps in a
//! fresh generation so a lookup never mixes entries from before and after the change.
//!
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::{
    GroupKind, GroupVersionKind, GroupVersionResource, MapperConfig, MapperError, RestMapper,
    RestMapping, SharedRestMapper, SurfaceChangeListener,
};

#[derive(Debug, Clone)]
struct FailedLookup {
    at: Instant,
    error: MapperError,
}

#[derive(Debug, Clone)]
enum Lookup {
    Resolved(GroupVersionKind),
    Failed(FailedLookup),
}

#[derive(Debug, Default)]
struct Generation {
    kinds: DashMap<GroupVersionResource, Lookup>,
    gvk_to_mapping: DashMap<GroupVersionKind, RestMapping>,
}

type GenerationSlot = Arc<RwLock<Arc<Generation>>>;

fn reset_slot(slot: &GenerationSlot) {
    *slot.write() = Arc::new(Generation::default());
}

pub struct CachedRestMapper {
    inner: SharedRestMapper,
    config: MapperConfig,
    generation: GenerationSlot,
}

impl fmt::Debug for CachedRestMapper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let generation = self.current();
        f.debug_struct("CachedRestMapper")
            .field("inner", &self.inner)
            .field("recheck_window", &self.config.recheck_window)
            .field("kinds", &generation.kinds.len())
            .field("mappings", &generation.gvk_to_mapping.len())
            .finish()
    }
}

impl CachedRestMapper {
    /// wrap `inner`; the cache resets itself whenever `inner` reports a surface change
    pub fn new(inner: SharedRestMapper, config: MapperConfig) -> Self {
        let generation: GenerationSlot = Arc::new(RwLock::new(Arc::new(Generation::default())));

        let slot = generation.clone();
        inner.on_surface_change(Box::new(move || {
            debug!("surface changed, resetting mapping cache");
            reset_slot(&slot);
        }));

        Self {
            inner,
            config,
            generation,
        }
    }

    pub fn shared(inner: SharedRestMapper, config: MapperConfig) -> Arc<Self> {
        Arc::new(Self::new(inner, config))
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// the mapper lookups are delegated to
    pub fn inner(&self) -> &SharedRestMapper {
        &self.inner
    }

    /// drop all resolved and failed entries
    pub fn reset(&self) {
        reset_slot(&self.generation);
    }

    fn current(&self) -> Arc<Generation> {
        self.generation.read().clone()
    }
}

#[async_trait]
impl RestMapper for CachedRestMapper {
    async fn kind_for(
        &self,
        resource: &GroupVersionResource,
    ) -> Result<GroupVersionKind, MapperError> {
        let generation = self.current();

        let cached = generation
            .kinds
            .get(resource)
            .map(|entry| entry.value().clone());
        match cached {
            Some(Lookup::Resolved(kind)) => {
                trace!(%resource, "kind cache hit");
                return Ok(kind);
            }
            Some(Lookup::Failed(failed)) if failed.at.elapsed() < self.config.recheck_window => {
                trace!(%resource, "recent lookup failed, not querying source");
                return Err(failed.error);
            }
            _ => {}
        }

        match self.inner.kind_for(resource).await {
            Ok(kind) => {
                generation
                    .kinds
                    .insert(resource.clone(), Lookup::Resolved(kind.clone()));
                Ok(kind)
            }
            Err(error) => {
                debug!(%resource, %error, "kind lookup failed");
                let failed = Lookup::Failed(FailedLookup {
                    at: Instant::now(),
                    error: error.clone(),
                });
                match generation.kinds.entry(resource.clone()) {
                    Entry::Occupied(entry) if matches!(entry.get(), Lookup::Resolved(_)) => {
                        trace!(%resource, "kind resolved meanwhile, keeping it");
                    }
                    Entry::Occupied(mut entry) => {
                        entry.insert(failed);
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(failed);
                    }
                }
                Err(error)
            }
        }
    }

    async fn kinds_for(
        &self,
        resource: &GroupVersionResource,
    ) -> Result<Vec<GroupVersionKind>, MapperError> {
        self.inner.kinds_for(resource).await
    }

    async fn resource_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<GroupVersionResource, MapperError> {
        self.inner.resource_for(input).await
    }

    async fn resources_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<Vec<GroupVersionResource>, MapperError> {
        self.inner.resources_for(input).await
    }

    async fn rest_mapping(
        &self,
        group_kind: &GroupKind,
        versions: &[&str],
    ) -> Result<RestMapping, MapperError> {
        let version = match versions {
            [] => return Err(MapperError::MissingVersion),
            [version] => *version,
            // ambiguous request, not memoized
            _ => return self.inner.rest_mapping(group_kind, versions).await,
        };

        let generation = self.current();
        let gvk = group_kind.with_version(version);

        let cached = generation
            .gvk_to_mapping
            .get(&gvk)
            .map(|mapping| mapping.value().clone());
        if let Some(mapping) = cached {
            trace!(%gvk, "mapping cache hit");
            return Ok(mapping);
        }

        let mapping = self.inner.rest_mapping(group_kind, versions).await?;
        generation.gvk_to_mapping.insert(gvk, mapping.clone());
        Ok(mapping)
    }

    async fn rest_mappings(
        &self,
        group_kind: &GroupKind,
        versions: &[&str],
    ) -> Result<Vec<RestMapping>, MapperError> {
        self.inner.rest_mappings(group_kind, versions).await
    }

    fn resource_singularizer(&self, resource: &str) -> Result<String, MapperError> {
        self.inner.resource_singularizer(resource)
    }

    fn on_surface_change(&self, listener: SurfaceChangeListener) {
        self.inner.on_surface_change(listener);
    }
}
