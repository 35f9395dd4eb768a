//!
//! # CLI for the cluster pool
//!
//! Parameters are overwritten in the following sequence:
//!     1) default values
//!     2) configuration file if provided, or `controller.toml` in the working directory
//!     3) cli parameters
//!
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use humantime_serde::re::humantime::parse_duration;
use tracing::debug;

use multicluster_types::config_file::SaveLoadConfig;
use multicluster_types::defaults::CONTROLLER_CONFIG_FILE;

use crate::PoolConfig;

#[derive(Debug, Default, Args)]
pub struct PoolOpt {
    /// Controller configuration file in TOML
    #[arg(long = "config", value_name = "path", env = "MULTICLUSTER_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Path for kubernetes kubeconfig file, if left blank, will use in cluster way
    #[arg(long = "kubeconfig", value_name = "path")]
    pub kube_config: Option<PathBuf>,

    /// Master api server, if not specified, will use host in kubeconfig
    #[arg(long)]
    pub master: Option<String>,

    /// Queries per second allowed against each member cluster
    #[arg(long)]
    pub qps: Option<f32>,

    #[arg(long)]
    pub burst: Option<u32>,

    /// Resync period of member cluster watch caches, e.g. `30s`
    #[arg(long, value_parser = parse_duration)]
    pub informer_sync: Option<Duration>,

    /// How long a failed kind lookup is answered from cache, e.g. `5m`
    #[arg(long, value_parser = parse_duration)]
    pub recheck_window: Option<Duration>,

    /// Register clusters without starting them
    #[arg(long)]
    pub no_auto_start: bool,
}

impl PoolOpt {
    #[allow(clippy::wrong_self_convention)]
    pub fn as_pool_config(self) -> Result<PoolConfig> {
        let default_file = Path::new(CONTROLLER_CONFIG_FILE);
        let config_file = match &self.config_file {
            Some(path) => Some(path.as_path()),
            None => Some(default_file).filter(|path| path.exists()),
        };
        let mut config = match config_file {
            Some(path) => PoolConfig::load_from(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => PoolConfig::default(),
        };

        if let Some(kube_config) = self.kube_config {
            config.kube_config = Some(kube_config);
        }
        if let Some(master) = self.master {
            config.master = Some(master);
        }
        if let Some(qps) = self.qps {
            config.qps = qps;
        }
        if let Some(burst) = self.burst {
            config.burst = burst;
        }
        if let Some(informer_sync) = self.informer_sync {
            config.informer_sync = Some(informer_sync);
        }
        if let Some(recheck_window) = self.recheck_window {
            config.mapper.recheck_window = recheck_window;
        }
        if self.no_auto_start {
            config.auto_start = false;
        }

        config.validate()?;
        debug!(?config, "pool config");
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use clap::Parser;

    use super::PoolOpt;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        pool: PoolOpt,
    }

    fn parse(args: &[&str]) -> PoolOpt {
        TestCli::try_parse_from(std::iter::once("pool").chain(args.iter().copied()))
            .expect("parse")
            .pool
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kube_config = dir.path().join("kubeconfig");
        std::fs::write(&kube_config, "apiVersion: v1").expect("write");
        let config_file = dir.path().join("controller.toml");
        std::fs::write(
            &config_file,
            "qps = 50.0\nburst = 500\nmaster = \"https://file:6443\"\n",
        )
        .expect("write");

        let config = parse(&[
            "--config",
            config_file.to_str().expect("path"),
            "--kubeconfig",
            kube_config.to_str().expect("path"),
            "--qps",
            "10",
            "--recheck-window",
            "2m",
            "--no-auto-start",
        ])
        .as_pool_config()
        .expect("config");

        assert_eq!(config.qps, 10.0);
        assert_eq!(config.burst, 500);
        assert_eq!(config.master.as_deref(), Some("https://file:6443"));
        assert_eq!(config.mapper.recheck_window, Duration::from_secs(120));
        assert!(!config.auto_start);
        assert_eq!(config.kube_config, Some(kube_config));
    }

    #[test]
    fn test_invalid_inputs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing");

        let err = parse(&["--kubeconfig", missing.to_str().expect("path")])
            .as_pool_config()
            .expect_err("missing kubeconfig");
        assert!(err.to_string().contains("not found"));

        let err = parse(&["--config", missing.to_str().expect("path")])
            .as_pool_config()
            .expect_err("missing config file");
        assert!(err.to_string().contains("failed to load"));

        assert!(TestCli::try_parse_from(["pool", "--informer-sync", "soon"]).is_err());
    }
}
