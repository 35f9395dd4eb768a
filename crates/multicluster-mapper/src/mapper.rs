use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use multicluster_metadata::cluster::ApiEnablement;

use crate::{GroupKind, GroupVersionKind, GroupVersionResource, MapperError, RestMapping};

pub type SharedRestMapper = Arc<dyn RestMapper>;

/// invoked when the set of kinds/resources served by a cluster changes
pub type SurfaceChangeListener = Box<dyn Fn() + Send + Sync>;

/// Translate between kinds and resources of one cluster
#[async_trait]
pub trait RestMapper: Debug + Send + Sync {
    /// kind of a fully or partially specified resource
    async fn kind_for(
        &self,
        resource: &GroupVersionResource,
    ) -> Result<GroupVersionKind, MapperError>;

    async fn kinds_for(
        &self,
        resource: &GroupVersionResource,
    ) -> Result<Vec<GroupVersionKind>, MapperError>;

    async fn resource_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<GroupVersionResource, MapperError>;

    async fn resources_for(
        &self,
        input: &GroupVersionResource,
    ) -> Result<Vec<GroupVersionResource>, MapperError>;

    /// mapping for the first version in `versions` that serves the kind
    async fn rest_mapping(
        &self,
        group_kind: &GroupKind,
        versions: &[&str],
    ) -> Result<RestMapping, MapperError>;

    async fn rest_mappings(
        &self,
        group_kind: &GroupKind,
        versions: &[&str],
    ) -> Result<Vec<RestMapping>, MapperError>;

    fn resource_singularizer(&self, resource: &str) -> Result<String, MapperError>;

    /// register a listener fired whenever the served api surface changes
    fn on_surface_change(&self, listener: SurfaceChangeListener);
}

/// Source of discovery data of a member cluster
#[async_trait]
pub trait DiscoveryInterface: Debug + Send + Sync {
    async fn server_version(&self) -> Result<String, MapperError>;

    async fn server_resources(&self) -> Result<Vec<ApiEnablement>, MapperError>;
}
