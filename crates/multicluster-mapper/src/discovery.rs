//!
//! # Discovery backed mapper
//!
//! Answers mapping queries from the api enablements a cluster advertises.
//! The index is loaded lazily, reloaded once when a lookup finds no match,
//! and every reload that changes the served surface fires the registered listeners.
//!
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace};

use multicluster_metadata::cluster::ApiEnablement;

use crate::{
    DiscoveryInterface, GroupKind, GroupVersion, GroupVersionKind, GroupVersionResource,
    MapperError, RestMapper, RestMapping, Scope, SurfaceChangeListener,
};

#[derive(Debug, Clone)]
struct IndexEntry {
    resource: GroupVersionResource,
    kind: GroupVersionKind,
    singular: String,
    scope: Scope,
}

impl IndexEntry {
    fn matches_resource(&self, input: &GroupVersionResource) -> bool {
        let name = input.resource.to_lowercase();
        (self.resource.resource == name || self.singular == name)
            && (input.group.is_empty() || input.group == self.resource.group)
            && (input.version.is_empty() || input.version == self.resource.version)
    }

    fn mapping(&self) -> RestMapping {
        RestMapping {
            resource: self.resource.clone(),
            group_version_kind: self.kind.clone(),
            scope: self.scope,
        }
    }
}

/// Entries in discovery order, so the first match of a partial lookup is the preferred version
#[derive(Debug, Default)]
struct ResourceIndex {
    enablements: Vec<ApiEnablement>,
    entries: Vec<IndexEntry>,
}

impl ResourceIndex {
    fn build(enablements: Vec<ApiEnablement>) -> Self {
        let mut entries = vec![];
        for enablement in &enablements {
            let group_version = GroupVersion::parse(&enablement.group_version);
            for resource in &enablement.resources {
                // subresources such as pods/log are not addressable collections
                if resource.name.contains('/') {
                    continue;
                }
                entries.push(IndexEntry {
                    resource: group_version.with_resource(&resource.name),
                    kind: group_version.with_kind(&resource.kind),
                    singular: resource.kind.to_lowercase(),
                    scope: if resource.namespaced {
                        Scope::Namespaced
                    } else {
                        Scope::Cluster
                    },
                });
            }
        }
        Self {
            enablements,
            entries,
        }
    }

    fn matching<'a>(
        &'a self,
        input: &'a GroupVersionResource,
    ) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.matches_resource(input))
    }

    fn kinds_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<Vec<GroupVersionKind>, MapperError> {
        let mut kinds: Vec<GroupVersionKind> = vec![];
        for entry in self.matching(input) {
            if !kinds.contains(&entry.kind) {
                kinds.push(entry.kind.clone());
            }
        }
        if kinds.is_empty() {
            Err(MapperError::NoResourceMatch(input.clone()))
        } else {
            Ok(kinds)
        }
    }

    fn kind_for(&self, input: &GroupVersionResource) -> Result<GroupVersionKind, MapperError> {
        let mut kinds = self.kinds_for(input)?;
        let preferred = kinds.remove(0);
        if kinds
            .iter()
            .any(|kind| kind.group_kind() != preferred.group_kind())
        {
            return Err(MapperError::Ambiguous(input.clone()));
        }
        Ok(preferred)
    }

    fn resources_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<Vec<GroupVersionResource>, MapperError> {
        let mut resources: Vec<GroupVersionResource> = vec![];
        for entry in self.matching(input) {
            if !resources.contains(&entry.resource) {
                resources.push(entry.resource.clone());
            }
        }
        if resources.is_empty() {
            Err(MapperError::NoResourceMatch(input.clone()))
        } else {
            Ok(resources)
        }
    }

    fn resource_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<GroupVersionResource, MapperError> {
        let mut resources = self.resources_for(input)?;
        let preferred = resources.remove(0);
        if resources.iter().any(|resource| {
            resource.group != preferred.group || resource.resource != preferred.resource
        }) {
            return Err(MapperError::Ambiguous(input.clone()));
        }
        Ok(preferred)
    }

    fn rest_mappings(
        &self,
        group_kind: &GroupKind,
        versions: &[&str],
    ) -> Result<Vec<RestMapping>, MapperError> {
        let of_kind = |entry: &&IndexEntry| {
            entry.kind.group == group_kind.group && entry.kind.kind == group_kind.kind
        };

        let mappings: Vec<RestMapping> = if versions.is_empty() {
            self.entries
                .iter()
                .filter(of_kind)
                .map(IndexEntry::mapping)
                .collect()
        } else {
            versions
                .iter()
                .flat_map(|version| {
                    self.entries
                        .iter()
                        .filter(of_kind)
                        .filter(move |entry| entry.kind.version == *version)
                })
                .map(IndexEntry::mapping)
                .collect()
        };

        if mappings.is_empty() {
            Err(MapperError::NoKindMatch {
                group_kind: group_kind.clone(),
                versions: versions.iter().map(|v| v.to_string()).collect(),
            })
        } else {
            Ok(mappings)
        }
    }

    fn singular(&self, resource: &str) -> Result<String, MapperError> {
        let name = resource.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.resource.resource == name || entry.singular == name)
            .map(|entry| entry.singular.clone())
            .ok_or_else(|| {
                MapperError::NoResourceMatch(GroupVersionResource::new("", "", resource))
            })
    }
}

pub struct DiscoveryRestMapper {
    discovery: Arc<dyn DiscoveryInterface>,
    index: RwLock<Option<Arc<ResourceIndex>>>,
    listeners: Mutex<Vec<SurfaceChangeListener>>,
}

impl fmt::Debug for DiscoveryRestMapper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DiscoveryRestMapper")
            .field("loaded", &self.index.read().is_some())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl DiscoveryRestMapper {
    pub fn new(discovery: Arc<dyn DiscoveryInterface>) -> Self {
        Self {
            discovery,
            index: RwLock::new(None),
            listeners: Mutex::new(vec![]),
        }
    }

    pub fn shared(discovery: Arc<dyn DiscoveryInterface>) -> Arc<Self> {
        Arc::new(Self::new(discovery))
    }

    /// Fetch discovery data again.
    /// Returns true if the served surface changed, in which case listeners have been fired.
    pub async fn refresh(&self) -> Result<bool, MapperError> {
        let enablements = self.discovery.server_resources().await?;
        let index = Arc::new(ResourceIndex::build(enablements));

        let changed = {
            let mut current = self.index.write();
            let changed = current
                .as_ref()
                .map(|old| old.enablements != index.enablements)
                .unwrap_or(false);
            trace!(entries = index.entries.len(), changed, "discovery loaded");
            *current = Some(index);
            changed
        };

        if changed {
            info!("api surface changed");
            for listener in self.listeners.lock().iter() {
                listener();
            }
        }
        Ok(changed)
    }

    async fn index(&self) -> Result<Arc<ResourceIndex>, MapperError> {
        let loaded = self.index.read().clone();
        if let Some(index) = loaded {
            return Ok(index);
        }
        self.refresh().await?;
        self.index
            .read()
            .clone()
            .ok_or_else(|| MapperError::Discovery("discovery index not loaded".to_owned()))
    }

    /// run lookup, on no match reload discovery once and retry if the surface changed
    async fn lookup<T, F>(&self, lookup: F) -> Result<T, MapperError>
    where
        F: Fn(&ResourceIndex) -> Result<T, MapperError> + Send,
        T: Send,
    {
        let index = self.index().await?;
        match lookup(&index) {
            Err(err) if err.is_no_match() => {
                debug!(%err, "no match, reloading discovery");
                if self.refresh().await? {
                    let index = self.index().await?;
                    lookup(&index)
                } else {
                    Err(err)
                }
            }
            result => result,
        }
    }
}

#[async_trait]
impl RestMapper for DiscoveryRestMapper {
    async fn kind_for(
        &self,
        resource: &GroupVersionResource,
    ) -> Result<GroupVersionKind, MapperError> {
        self.lookup(|index| index.kind_for(resource)).await
    }

    async fn kinds_for(
        &self,
        resource: &GroupVersionResource,
    ) -> Result<Vec<GroupVersionKind>, MapperError> {
        self.lookup(|index| index.kinds_for(resource)).await
    }

    async fn resource_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<GroupVersionResource, MapperError> {
        self.lookup(|index| index.resource_for(input)).await
    }

    async fn resources_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<Vec<GroupVersionResource>, MapperError> {
        self.lookup(|index| index.resources_for(input)).await
    }

    async fn rest_mapping(
        &self,
        group_kind: &GroupKind,
        versions: &[&str],
    ) -> Result<RestMapping, MapperError> {
        self.lookup(|index| {
            index
                .rest_mappings(group_kind, versions)
                .map(|mut mappings| mappings.remove(0))
        })
        .await
    }

    async fn rest_mappings(
        &self,
        group_kind: &GroupKind,
        versions: &[&str],
    ) -> Result<Vec<RestMapping>, MapperError> {
        self.lookup(|index| index.rest_mappings(group_kind, versions))
            .await
    }

    fn resource_singularizer(&self, resource: &str) -> Result<String, MapperError> {
        match self.index.read().as_ref() {
            Some(index) => index.singular(resource),
            None => Err(MapperError::NoResourceMatch(GroupVersionResource::new(
                "", "", resource,
            ))),
        }
    }

    fn on_surface_change(&self, listener: SurfaceChangeListener) {
        self.listeners.lock().push(listener);
    }
}
