//! Well-formed v1 resources for tests

use serde_json::{json, Value};

use crate::api::v1::V1Resource;

pub fn resource(value: Value) -> V1Resource {
    V1Resource::from_value(value).expect("fixture should decode")
}

pub fn node(name: &str) -> V1Resource {
    resource(json!({
        "apiVersion": "v1",
        "kind": "node",
        "metadata": {"name": name},
        "spec": {
            "bgp": {"asNumber": 64512, "ipv4Address": "10.0.0.1/24"}
        }
    }))
}

pub fn host_endpoint(node: &str, name: &str) -> V1Resource {
    resource(json!({
        "apiVersion": "v1",
        "kind": "hostEndpoint",
        "metadata": {"name": name, "node": node, "labels": {"type": "production"}},
        "spec": {
            "interfaceName": name,
            "expectedIPs": ["192.168.0.1"],
            "profiles": ["web"]
        }
    }))
}

pub fn workload_endpoint(node: &str) -> V1Resource {
    resource(json!({
        "apiVersion": "v1",
        "kind": "workloadEndpoint",
        "metadata": {
            "name": "eth0",
            "workload": "default.frontend-5d8f",
            "orchestrator": "k8s",
            "node": node,
            "labels": {"app": "frontend", "calico/k8s_ns": "default"}
        },
        "spec": {
            "interfaceName": "cali0ef24ba",
            "ipNetworks": ["10.244.1.5/32"],
            "mac": "ca:fe:1d:52:bb:e9",
            "profiles": ["k8s_ns.default"]
        }
    }))
}

pub fn profile(name: &str) -> V1Resource {
    resource(json!({
        "apiVersion": "v1",
        "kind": "profile",
        "metadata": {"name": name, "labels": {"profile": name}},
        "spec": {
            "ingress": [{"action": "allow", "source": {"tag": name}}],
            "egress": [{"action": "allow"}]
        }
    }))
}

pub fn policy(name: &str) -> V1Resource {
    resource(json!({
        "apiVersion": "v1",
        "kind": "policy",
        "metadata": {"name": name},
        "spec": {
            "order": 100,
            "selector": "all()",
            "egress": [{
                "action": "allow",
                "protocol": "udp",
                "destination": {"ports": [53]}
            }]
        }
    }))
}

pub fn ip_pool(cidr: &str) -> V1Resource {
    resource(json!({
        "apiVersion": "v1",
        "kind": "ipPool",
        "metadata": {"cidr": cidr},
        "spec": {"nat-outgoing": true}
    }))
}

pub fn bgp_peer_global(peer_ip: &str) -> V1Resource {
    resource(json!({
        "apiVersion": "v1",
        "kind": "bgpPeer",
        "metadata": {"scope": "global", "peerIP": peer_ip},
        "spec": {"asNumber": 64567}
    }))
}

pub fn unrecognized(kind: &str) -> V1Resource {
    resource(json!({
        "apiVersion": "v1",
        "kind": kind,
        "metadata": {"name": "something"}
    }))
}
