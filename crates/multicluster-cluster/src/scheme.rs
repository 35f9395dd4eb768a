use std::collections::BTreeSet;
use std::sync::Arc;

use k8_types::Spec;

use multicluster_mapper::GroupVersionKind;
use multicluster_metadata::cluster::ClusterSpec;

pub type SharedScheme = Arc<Scheme>;

/// Registry of object kinds a cluster client can decode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scheme {
    kinds: BTreeSet<GroupVersionKind>,
}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// scheme with the kinds served by this project
    pub fn multicluster() -> Self {
        Self::new().with::<ClusterSpec>()
    }

    pub fn with<S: Spec>(mut self) -> Self {
        self.register::<S>();
        self
    }

    /// register the kind described by a custom resource definition
    pub fn register<S: Spec>(&mut self) {
        let crd = S::metadata();
        self.add_known_kind(GroupVersionKind::new(
            crd.group,
            crd.version,
            crd.names.kind,
        ));
    }

    pub fn add_known_kind(&mut self, gvk: GroupVersionKind) -> bool {
        self.kinds.insert(gvk)
    }

    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.kinds.contains(gvk)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.kinds.iter()
    }

    pub fn shared(self) -> SharedScheme {
        Arc::new(self)
    }
}
