//!
//! Reads the cluster of the current context (or the first context) out of a kubeconfig
//! and turns it into credentials: server, certificate authority, token and tls verification.
//!
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use k8_config::{Cluster, KubeConfig, User};
use url::Url;

use crate::{ConnectionParameters, CredentialError};

/// Credentials found in a kubeconfig or a secret, before the endpoint is settled
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Credentials {
    pub server: Option<String>,
    pub token: Option<String>,
    pub ca_data: Option<Vec<u8>>,
    pub insecure_skip_tls_verify: bool,
}

impl Credentials {
    fn from_kube_config(config: &KubeConfig) -> Result<Self, CredentialError> {
        let (cluster, user) = if config.current_context().is_some() {
            (config.current_cluster(), config.current_user())
        } else {
            first_context(config)
        };
        let cluster = cluster
            .or_else(|| config.clusters.first())
            .ok_or_else(|| CredentialError::InvalidKubeConfig("no clusters defined".to_owned()))?;
        let user = user.or_else(|| config.users.first());

        let ca_data = match &cluster.cluster.certificate_authority_data {
            Some(encoded) => Some(decode_base64("certificate-authority-data", encoded)?),
            None => None,
        };

        Ok(Self {
            server: Some(cluster.cluster.server.clone()).filter(|server| !server.is_empty()),
            token: user.and_then(|user| user.user.token.clone()),
            ca_data,
            insecure_skip_tls_verify: cluster.cluster.insecure_skip_tls_verify.unwrap_or(false),
        })
    }
}

/// current context is missing or unknown, use the first one
fn first_context(config: &KubeConfig) -> (Option<&Cluster>, Option<&User>) {
    match config.contexts.first() {
        Some(ctx) => (
            config.clusters.iter().find(|c| c.name == ctx.context.cluster),
            config.users.iter().find(|u| u.name == ctx.context.user),
        ),
        None => (None, None),
    }
}

pub(crate) fn parse(raw: &[u8]) -> Result<Credentials, CredentialError> {
    let config: KubeConfig = serde_yaml::from_slice(raw)
        .map_err(|err| CredentialError::InvalidKubeConfig(err.to_string()))?;
    Credentials::from_kube_config(&config)
}

/// Connection parameters for the cluster selected by `config`.
/// A non-empty `server` replaces the api server found in the kubeconfig.
pub fn kube_config_parameters(
    config: &KubeConfig,
    server: Option<&str>,
) -> Result<ConnectionParameters, CredentialError> {
    let credentials = Credentials::from_kube_config(config)?;
    let host = server
        .filter(|server| !server.is_empty())
        .map(str::to_owned)
        .or(credentials.server)
        .ok_or_else(|| CredentialError::MissingEndpoint(config.current_context.clone()))?;
    let host = Url::parse(&host).map_err(|source| CredentialError::InvalidUrl {
        url: host.clone(),
        source,
    })?;

    let mut params = ConnectionParameters::new(host);
    params.bearer_token = credentials.token;
    params.ca_data = credentials.ca_data;
    params.insecure_skip_tls_verify = credentials.insecure_skip_tls_verify;
    Ok(params)
}

pub(crate) fn decode_base64(field: &'static str, encoded: &str) -> Result<Vec<u8>, CredentialError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|err| CredentialError::Decode {
            field,
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod test {
    use k8_config::KubeConfig;

    use crate::CredentialError;

    use super::{kube_config_parameters, parse};

    const KUBE_CONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: member
clusters:
- name: other
  cluster:
    server: https://other:6443
- name: member-cluster
  cluster:
    server: https://member:6443
    certificate-authority-data: Y2EtZGF0YQ==
contexts:
- name: other
  context:
    cluster: other
    user: other
- name: member
  context:
    cluster: member-cluster
    user: admin
users:
- name: other
  user:
    token: other-token
- name: admin
  user:
    token: admin-token
"#;

    #[test]
    fn test_current_context() {
        let credentials = parse(KUBE_CONFIG.as_bytes()).expect("parse");
        assert_eq!(credentials.server.as_deref(), Some("https://member:6443"));
        assert_eq!(credentials.token.as_deref(), Some("admin-token"));
        assert_eq!(credentials.ca_data.as_deref(), Some("ca-data".as_bytes()));
        assert!(!credentials.insecure_skip_tls_verify);
    }

    #[test]
    fn test_first_context_fallback() {
        let raw = KUBE_CONFIG.replace("current-context: member", "current-context: gone");
        let credentials = parse(raw.as_bytes()).expect("parse");
        assert_eq!(credentials.server.as_deref(), Some("https://other:6443"));
        assert_eq!(credentials.token.as_deref(), Some("other-token"));
        assert!(credentials.ca_data.is_none());
    }

    #[test]
    fn test_no_clusters() {
        let empty = "apiVersion: v1\nkind: Config\ncurrent-context: ''\nclusters: []\ncontexts: []\nusers: []\n";
        assert!(matches!(
            parse(empty.as_bytes()),
            Err(CredentialError::InvalidKubeConfig(_))
        ));
        assert!(parse(b"clusters: [").is_err());
    }

    #[test]
    fn test_parameters_with_server_override() {
        let config: KubeConfig = serde_yaml::from_str(KUBE_CONFIG).expect("kubeconfig");

        let params = kube_config_parameters(&config, None).expect("params");
        assert_eq!(params.host.as_str(), "https://member:6443/");
        assert_eq!(params.bearer_token.as_deref(), Some("admin-token"));
        assert_eq!(params.ca_data.as_deref(), Some("ca-data".as_bytes()));

        let params =
            kube_config_parameters(&config, Some("https://10.10.0.1:6443")).expect("params");
        assert_eq!(params.host.as_str(), "https://10.10.0.1:6443/");
        assert_eq!(params.bearer_token.as_deref(), Some("admin-token"));

        let params = kube_config_parameters(&config, Some("")).expect("params");
        assert_eq!(params.host.as_str(), "https://member:6443/");
    }
}
