pub mod cluster;

pub use k8_types;

pub(crate) fn is_false(b: &bool) -> bool {
    !b
}

/// API group served by the control plane
pub const GROUP: &str = "multicluster.io";
pub const V1BETA1: &str = "v1beta1";
