// Mapping cache
pub const MAPPER_RECHECK_WINDOW_SECS: u64 = 300; // 5 min

// Member cluster clients
pub const CLIENT_DEFAULT_QPS: f32 = 1e6;
pub const CLIENT_DEFAULT_BURST: u32 = 1_000_000;
pub const CLIENT_USER_AGENT: &str = "multi-cluster-controller";

// Master kubeconfig lookup
pub const KUBE_CONFIG_HOME_PATH: &str = ".kube/config";
pub const KUBE_CONFIG_ENV: &str = "KUBECONFIG";

// Secret keys used by connection references
pub const SECRET_TOKEN_KEY: &str = "token";
pub const SECRET_CA_BUNDLE_KEY: &str = "caBundle";
pub const SECRET_CONFIG_KEY: &str = "config";

// Controller
pub const CONTROLLER_EVENT_CAPACITY: usize = 100;
pub const CONTROLLER_CONFIG_FILE: &str = "controller.toml";
