mod error;
mod pool;
mod config;
mod cli;
mod controller;

pub use error::{PoolError, ControllerError, ConfigError};
pub use pool::{ClusterPool, SharedClusterPool};
pub use config::PoolConfig;
pub use cli::PoolOpt;
pub use controller::{ClusterController, ClusterEvent};
