use std::fmt::Debug;
use std::io::Error as IoError;
use std::io::Write;
use std::path::Path;
use std::fs::{File, create_dir_all, read_to_string};

use tracing::debug;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] IoError),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Persist and restore any serde config as TOML
pub trait SaveLoadConfig {
    /// missing parent directories are created
    fn save_to<T: AsRef<Path>>(&self, path: T) -> Result<(), IoError>;
    fn load_from<T: AsRef<Path>>(path: T) -> Result<Self, LoadConfigError>
    where
        Self: Sized;
    fn load_str(config: &str) -> Result<Self, LoadConfigError>
    where
        Self: Sized;
}

impl<S> SaveLoadConfig for S
where
    S: Serialize + DeserializeOwned + Debug,
{
    fn save_to<T: AsRef<Path>>(&self, path: T) -> Result<(), IoError> {
        let path_ref = path.as_ref();
        debug!("saving config: {:#?} to: {:#?}", self, path_ref);
        let toml = toml::to_string(self).map_err(IoError::other)?;

        if let Some(parent) = path_ref.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }
        let mut file = File::create(path_ref)?;
        file.write_all(toml.as_bytes())?;
        file.sync_all()
    }

    fn load_from<T: AsRef<Path>>(path: T) -> Result<Self, LoadConfigError> {
        let path_ref = path.as_ref();
        debug!(?path_ref, "loading from");

        Self::load_str(&read_to_string(path_ref)?)
    }

    fn load_str(config: &str) -> Result<Self, LoadConfigError>
    where
        Self: Sized,
    {
        Ok(toml::from_str(config)?)
    }
}

#[cfg(test)]
mod test {

    use serde::{Deserialize, Serialize};

    use super::{LoadConfigError, SaveLoadConfig};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        master: String,
        burst: u32,
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("etc").join("multicluster").join("sample.toml");
        let sample = Sample {
            master: "https://10.10.0.1:6443".to_owned(),
            burst: 20,
        };
        sample.save_to(&path).expect("save");

        let loaded = Sample::load_from(&path).expect("load");
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_load_invalid() {
        assert!(matches!(
            Sample::load_str("master = 1"),
            Err(LoadConfigError::Toml(_))
        ));

        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            Sample::load_from(dir.path().join("absent.toml")),
            Err(LoadConfigError::Io(_))
        ));
    }
}
