mod gvk;
mod error;
mod mapper;
mod discovery;
mod cache;
mod config;

pub use gvk::*;
pub use error::MapperError;
pub use mapper::{RestMapper, SharedRestMapper, DiscoveryInterface, SurfaceChangeListener};
pub use discovery::DiscoveryRestMapper;
pub use cache::CachedRestMapper;
pub use config::MapperConfig;

/// map a kind to its resource through a mapper
pub async fn group_version_resource(
    mapper: &dyn RestMapper,
    gvk: &GroupVersionKind,
) -> Result<GroupVersionResource, MapperError> {
    let mapping = mapper
        .rest_mapping(&gvk.group_kind(), &[gvk.version.as_str()])
        .await?;
    Ok(mapping.resource)
}
