use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use multicluster_types::defaults::{CLIENT_DEFAULT_QPS, CLIENT_DEFAULT_BURST, CLIENT_USER_AGENT};

/// Resolved connection parameters of a member cluster api server
#[derive(Clone, PartialEq)]
pub struct ConnectionParameters {
    pub host: Url,
    pub bearer_token: Option<String>,
    /// PEM encoded certificate authority bundle
    pub ca_data: Option<Vec<u8>>,
    pub insecure_skip_tls_verify: bool,
    pub proxy_url: Option<Url>,
    pub proxy_headers: BTreeMap<String, String>,
    pub qps: f32,
    pub burst: u32,
    pub user_agent: String,
}

impl ConnectionParameters {
    pub fn new(host: Url) -> Self {
        Self {
            host,
            bearer_token: None,
            ca_data: None,
            insecure_skip_tls_verify: false,
            proxy_url: None,
            proxy_headers: BTreeMap::new(),
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

    /// values of a proxy header, split on commas
    pub fn proxy_header_values(&self, header: &str) -> Vec<&str> {
        self.proxy_headers
            .get(header)
            .map(|values| values.split(',').map(str::trim).collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host.as_str())
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("ca_data", &self.ca_data.as_ref().map(|ca| ca.len()))
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .field("proxy_url", &self.proxy_url.as_ref().map(Url::as_str))
            .field("proxy_headers", &self.proxy_headers)
            .field("qps", &self.qps)
            .field("burst", &self.burst)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use url::Url;

    use super::ConnectionParameters;

    #[test]
    fn test_debug_hides_token() {
        let mut params =
            ConnectionParameters::new(Url::parse("https://10.10.0.1:6443").expect("url"));
        params.bearer_token = Some("super-secret".to_owned());

        let output = format!("{params:?}");
        assert!(!output.contains("super-secret"));
        assert!(output.contains("10.10.0.1"));
    }

    #[test]
    fn test_proxy_header_values() {
        let mut params =
            ConnectionParameters::new(Url::parse("https://10.10.0.1:6443").expect("url"));
        params
            .proxy_headers
            .insert("X-Forward".to_owned(), "v1, v2,v3".to_owned());

        assert_eq!(params.proxy_header_values("X-Forward"), vec!["v1", "v2", "v3"]);
        assert!(params.proxy_header_values("missing").is_empty());
    }
}
