use std::path::PathBuf;
use std::time::Duration;

use k8_config::KubeConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use multicluster_cluster::{ConnectionParameters, CredentialError, kube_config_parameters};
use multicluster_mapper::MapperConfig;
use multicluster_types::defaults::{
    CLIENT_DEFAULT_BURST, CLIENT_DEFAULT_QPS, CLIENT_USER_AGENT, CONTROLLER_EVENT_CAPACITY,
    KUBE_CONFIG_ENV, KUBE_CONFIG_HOME_PATH,
};

use crate::ConfigError;

/// Options of the process managing the member cluster pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolConfig {
    /// kubeconfig of the master cluster, in-cluster configuration when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kube_config: Option<PathBuf>,
    /// overrides the master api server found in the kubeconfig
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,
    pub qps: f32,
    pub burst: u32,
    /// resync period of member cluster watch caches
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub informer_sync: Option<Duration>,
    /// user agent of every client created by the pool
    pub user_agent: String,
    /// start clusters as soon as they are registered
    pub auto_start: bool,
    pub event_capacity: usize,
    pub mapper: MapperConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            kube_config: default_kube_config(),
            master: None,
            qps: CLIENT_DEFAULT_QPS,
            burst: CLIENT_DEFAULT_BURST,
            informer_sync: None,
            user_agent: CLIENT_USER_AGENT.to_owned(),
            auto_start: true,
            event_capacity: CONTROLLER_EVENT_CAPACITY,
            mapper: MapperConfig::default(),
        }
    }
}

/// `$KUBECONFIG`, else `$HOME/.kube/config` when the file exists
fn default_kube_config() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(KUBE_CONFIG_ENV).filter(|path| !path.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let path = dirs::home_dir()?.join(KUBE_CONFIG_HOME_PATH);
    if path.exists() {
        debug!(path = %path.display(), "found kubeconfig in home directory");
        Some(path)
    } else {
        None
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.kube_config {
            if !path.exists() {
                return Err(ConfigError::MissingKubeConfig(path.clone()));
            }
        }
        if self.qps.is_nan() || self.qps <= 0.0 || self.burst == 0 {
            return Err(ConfigError::InvalidRateLimit);
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidEventCapacity);
        }
        Ok(())
    }

    /// Connection parameters of the master cluster, from the kubeconfig with `master`
    /// replacing its api server. `None` when neither is set, the caller then
    /// falls back to in-cluster configuration.
    #[instrument(skip(self))]
    pub fn master_parameters(&self) -> Result<Option<ConnectionParameters>, ConfigError> {
        let params = match (&self.kube_config, &self.master) {
            (Some(path), master) => {
                let kube_config =
                    KubeConfig::from_file(path).map_err(|err| ConfigError::LoadKubeConfig {
                        path: path.clone(),
                        reason: err.to_string(),
                    })?;
                kube_config_parameters(&kube_config, master.as_deref())?
            }
            (None, Some(master)) => {
                let host = Url::parse(master).map_err(|source| CredentialError::InvalidUrl {
                    url: master.clone(),
                    source,
                })?;
                ConnectionParameters::new(host)
            }
            (None, None) => return Ok(None),
        };

        let mut params = params.with_rate_limit(self.qps, self.burst);
        params.user_agent = self.user_agent.clone();
        debug!(host = %params.host, "master connection");
        Ok(Some(params))
    }
}
