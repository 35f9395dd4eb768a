use k8_types::{Crd, CrdNames, Spec, Status, DefaultHeader};

use crate::{GROUP, V1BETA1};

use super::ClusterSpec;
use super::ClusterStatus;

pub const CLUSTER_API: Crd = Crd {
    group: GROUP,
    version: V1BETA1,
    names: CrdNames {
        kind: "Cluster",
        plural: "clusters",
        singular: "cluster",
    },
};

impl Spec for ClusterSpec {
    type Header = DefaultHeader;
    type Status = ClusterStatus;
    fn metadata() -> &'static Crd {
        &CLUSTER_API
    }
}

impl Status for ClusterStatus {}

#[cfg(test)]
mod test_v1beta1_spec {
    use std::{io::BufReader, fs::File};

    use k8_types::K8Obj;

    use crate::cluster::{ConditionStatus, SecretRef};

    use super::ClusterSpec;

    type K8ClusterSpec = K8Obj<ClusterSpec>;

    #[test]
    fn read_k8_cluster_json() {
        let reader: BufReader<File> =
            BufReader::new(File::open("tests/k8_cluster_v1beta1.json").expect("spec"));
        let cluster: K8ClusterSpec =
            serde_json::from_reader(reader).expect("failed to parse cluster");
        assert_eq!(cluster.metadata.name, "test-cluster");
        assert_eq!(cluster.spec.provider, "mock-provider");
        assert!(!cluster.spec.disabled);
        assert_eq!(
            cluster.spec.connect.secret,
            Some(SecretRef::new("default", "test-secret"))
        );
        assert_eq!(cluster.spec.connect.endpoint, "https://10.10.0.1:6443");
        assert_eq!(
            cluster.spec.connect.token.as_ref().map(|t| t.token.as_str()),
            Some("A78DDS464Z")
        );
        assert_eq!(cluster.spec.region.city, "mock-city");

        assert_eq!(cluster.status.version, "1.19.2");
        assert_eq!(cluster.status.api_enablements.len(), 1);
        assert_eq!(cluster.status.api_enablements[0].resources[0].kind, "Deployment");
        assert_eq!(cluster.status.conditions[0].status, ConditionStatus::True);
        assert!(cluster.status.is_ready());
        let summary = cluster.status.node_summary.as_ref().expect("summary");
        assert_eq!(summary.total_nodes, 10);
        assert_eq!(summary.ready_nodes, 5);
    }

    #[test]
    fn write_skips_empty_fields() {
        let spec = ClusterSpec::default();
        let value = serde_json::to_value(&spec).expect("serialize");
        let connect = value.get("connect").expect("connect");
        assert!(connect.get("proxyURL").is_none());
        assert!(value.get("disabled").is_none());
    }
}
