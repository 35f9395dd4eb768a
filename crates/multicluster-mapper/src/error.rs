use thiserror::Error;

use crate::{GroupKind, GroupVersionResource};

/// Mapping failures. Cloneable so a failed lookup can be replayed from the negative cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
    #[error("no matches for {0}")]
    NoResourceMatch(GroupVersionResource),
    #[error("no matches for kind {group_kind} in versions {versions:?}")]
    NoKindMatch {
        group_kind: GroupKind,
        versions: Vec<String>,
    },
    #[error("{0} matches multiple kinds")]
    Ambiguous(GroupVersionResource),
    #[error("expected at least one version")]
    MissingVersion,
    #[error("discovery failed: {0}")]
    Discovery(String),
}

impl MapperError {
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoResourceMatch(_) | Self::NoKindMatch { .. })
    }
}
