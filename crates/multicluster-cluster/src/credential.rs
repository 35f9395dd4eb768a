use std::fmt::Debug;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use multicluster_metadata::cluster::{ConfigRef, ConnectConfig, SecretRef, TokenRef};
use multicluster_types::defaults::{
    CLIENT_DEFAULT_QPS, CLIENT_DEFAULT_BURST, CLIENT_USER_AGENT, SECRET_CA_BUNDLE_KEY,
    SECRET_CONFIG_KEY, SECRET_TOKEN_KEY,
};

use crate::kubeconfig::{self, Credentials};
use crate::{ConnectionParameters, CredentialError, SecretData, SharedMasterClient};

/// Turns the connection references of a cluster description into connection parameters
#[async_trait]
pub trait CredentialResolver: Debug + Send + Sync {
    async fn resolve(
        &self,
        cluster: &str,
        connect: &ConnectConfig,
    ) -> Result<ConnectionParameters, CredentialError>;
}

/// Resolves credentials from secrets stored in the master cluster.
///
/// Precedence: `config` (kubeconfig in a secret under key `config`, or inlined base64),
/// then `secret` (keys `token` and `caBundle`), then the inline `token`.
/// A non-empty `endpoint` always overrides the server found in a kubeconfig.
#[derive(Debug)]
pub struct SecretCredentialResolver {
    master: SharedMasterClient,
    qps: f32,
    burst: u32,
    user_agent: String,
}

impl SecretCredentialResolver {
    pub fn new(master: SharedMasterClient) -> Self {
        Self {
            master,
            qps: CLIENT_DEFAULT_QPS,
            burst: CLIENT_DEFAULT_BURST,
            user_agent: CLIENT_USER_AGENT.to_owned(),
        }
    }

    pub fn with_rate_limit(mut self, qps: f32, burst: u32) -> Self {
        self.qps = qps;
        self.burst = burst;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    async fn secret_data(&self, secret: &SecretRef) -> Result<SecretData, CredentialError> {
        Ok(self.master.get_secret(secret).await?)
    }

    async fn load_config(&self, config: &ConfigRef) -> Result<Credentials, CredentialError> {
        let raw = match (&config.secret, &config.config) {
            (Some(secret), _) => {
                let mut data = self.secret_data(secret).await?;
                data.remove(SECRET_CONFIG_KEY)
                    .ok_or_else(|| CredentialError::MissingKey {
                        secret: secret.to_string(),
                        key: SECRET_CONFIG_KEY,
                    })?
            }
            (None, Some(inline)) => kubeconfig::decode_base64("config", inline)?,
            (None, None) => {
                return Err(CredentialError::InvalidKubeConfig(
                    "config reference has neither secret nor config".to_owned(),
                ));
            }
        };
        kubeconfig::parse(&raw)
    }

    async fn load_secret(&self, secret: &SecretRef) -> Result<Credentials, CredentialError> {
        let mut data = self.secret_data(secret).await?;
        let token = data
            .remove(SECRET_TOKEN_KEY)
            .ok_or_else(|| CredentialError::MissingKey {
                secret: secret.to_string(),
                key: SECRET_TOKEN_KEY,
            })?;
        let token = String::from_utf8(token).map_err(|err| CredentialError::Decode {
            field: SECRET_TOKEN_KEY,
            reason: err.to_string(),
        })?;

        Ok(Credentials {
            token: Some(token.trim().to_owned()),
            ca_data: data.remove(SECRET_CA_BUNDLE_KEY),
            ..Default::default()
        })
    }

    fn load_token(token: &TokenRef) -> Result<Credentials, CredentialError> {
        let ca_data = match &token.ca_bundle {
            Some(bundle) => Some(kubeconfig::decode_base64(SECRET_CA_BUNDLE_KEY, bundle)?),
            None => None,
        };
        Ok(Credentials {
            token: Some(token.token.clone()),
            ca_data,
            ..Default::default()
        })
    }
}

fn parse_url(url: &str) -> Result<Url, CredentialError> {
    Url::parse(url).map_err(|source| CredentialError::InvalidUrl {
        url: url.to_owned(),
        source,
    })
}

#[async_trait]
impl CredentialResolver for SecretCredentialResolver {
    #[instrument(skip(self, connect))]
    async fn resolve(
        &self,
        cluster: &str,
        connect: &ConnectConfig,
    ) -> Result<ConnectionParameters, CredentialError> {
        let credentials = if let Some(config) = &connect.config {
            debug!("using kubeconfig reference");
            self.load_config(config).await?
        } else if let Some(secret) = &connect.secret {
            debug!(%secret, "using secret reference");
            self.load_secret(secret).await?
        } else if let Some(token) = &connect.token {
            debug!("using inline token");
            Self::load_token(token)?
        } else {
            return Err(CredentialError::MissingCredentials(cluster.to_owned()));
        };

        let endpoint = if connect.endpoint.is_empty() {
            credentials
                .server
                .ok_or_else(|| CredentialError::MissingEndpoint(cluster.to_owned()))?
        } else {
            connect.endpoint.clone()
        };

        let mut params = ConnectionParameters::new(parse_url(&endpoint)?)
            .with_rate_limit(self.qps, self.burst);
        params.bearer_token = credentials.token;
        params.ca_data = credentials.ca_data;
        params.insecure_skip_tls_verify =
            connect.insecure_skip_tls_verification || credentials.insecure_skip_tls_verify;
        if !connect.proxy_url.is_empty() {
            params.proxy_url = Some(parse_url(&connect.proxy_url)?);
        }
        params.proxy_headers = connect.proxy_header.clone();
        params.user_agent = self.user_agent.clone();

        Ok(params)
    }
}
