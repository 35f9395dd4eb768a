//!
//! # Cluster Spec
//!
//! Declarative description of a member cluster: where it lives and how to reach it.
//!
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use multicluster_types::{SecretName, SecretNamespace};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterSpec {
    /// Provider of the cluster, this field is just for description
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provider: String,
    /// Administratively disabled clusters are never started
    #[serde(skip_serializing_if = "crate::is_false")]
    pub disabled: bool,
    pub connect: ConnectConfig,
    pub region: Region,
}

impl ClusterSpec {
    pub fn new(connect: ConnectConfig) -> Self {
        Self {
            connect,
            ..Default::default()
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// How to connect to the member cluster api server.
/// At least one of `secret`, `config` or `token` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenRef>,
    #[serde(
        rename = "insecureSkipTLSVerification",
        skip_serializing_if = "crate::is_false"
    )]
    pub insecure_skip_tls_verification: bool,
    /// Kubernetes API Server endpoint, e.g. `https://10.10.0.1:6443`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    /// Proxy used to talk to the cluster
    #[serde(rename = "proxyURL", skip_serializing_if = "String::is_empty")]
    pub proxy_url: String,
    /// HTTP headers required by the proxy server.
    /// Multiple values for one header are separated by comma (e.g. 'k1': 'v1,v2,v3').
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub proxy_header: BTreeMap<String, String>,
}

impl ConnectConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.secret.is_some() || self.config.is_some() || self.token.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub namespace: SecretNamespace,
    pub name: SecretName,
}

impl SecretRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Layered kubeconfig, either stored in a secret or inlined
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretRef>,
    /// base64 encoded kubeconfig
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenRef {
    /// base64 encoded PEM bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<String>,
    pub token: String,
}

impl fmt::Debug for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenRef")
            .field("ca_bundle", &self.ca_bundle.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Region {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub zone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub province: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
}
