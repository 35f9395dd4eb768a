pub mod defaults;
pub mod config_file;

#[cfg(feature = "events")]
pub mod event;

//
// Types
//
pub type ClusterName = String;
pub type Reason = String;

pub type SecretNamespace = String;
pub type SecretName = String;

/// plural resource name, e.g. `deployments`
pub type ResourceName = String;
/// kind name, e.g. `Deployment`
pub type KindName = String;
