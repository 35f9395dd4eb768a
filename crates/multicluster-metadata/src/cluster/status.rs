use std::fmt;

use serde::{Deserialize, Serialize};

use multicluster_types::{KindName, Reason, ResourceName};

/// Observed state of a member cluster, reported by its consumers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterStatus {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// APIs installed in the member cluster
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub api_enablements: Vec<ApiEnablement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_summary: Option<NodeSummary>,
}

impl ClusterStatus {
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|condition| condition.condition_type == condition_type)
    }

    pub fn is_ready(&self) -> bool {
        self.condition(Condition::READY)
            .map(|condition| condition.status == ConditionStatus::True)
            .unwrap_or(false)
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ready = if self.is_ready() { "Ready" } else { "NotReady" };
        match &self.node_summary {
            Some(summary) => write!(f, "{ready} {summary}"),
            None => write!(f, "{ready}"),
        }
    }
}

/// Resources served by one group version, e.g. `apps/v1`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiEnablement {
    pub group_version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ApiResource>,
}

impl ApiEnablement {
    pub fn new(group_version: impl Into<String>, resources: Vec<ApiResource>) -> Self {
        Self {
            group_version: group_version.into(),
            resources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiResource {
    /// plural name of the resource, e.g. `deployments`
    pub name: ResourceName,
    /// kind of the resource, e.g. `Deployment`
    pub kind: KindName,
    pub namespaced: bool,
}

impl Default for ApiResource {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: String::new(),
            namespaced: true,
        }
    }
}

impl ApiResource {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            namespaced: true,
        }
    }

    pub fn cluster_scoped(mut self) -> Self {
        self.namespaced = false;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: Reason,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Condition {
    pub const READY: &'static str = "Ready";

    pub fn new(condition_type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSummary {
    /// total number of nodes in the cluster
    #[serde(rename = "total")]
    pub total_nodes: i32,
    /// number of ready nodes in the cluster
    #[serde(rename = "ready")]
    pub ready_nodes: i32,
}

impl fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.ready_nodes, self.total_nodes)
    }
}
