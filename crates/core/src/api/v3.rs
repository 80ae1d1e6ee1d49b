//! v3 API resources, the output of the conversion
//!
//! These types are only ever built by the second conversion stage and
//! serialized by a printer, so they derive `Serialize` alone.

use std::collections::BTreeMap;

use serde::Serialize;

use super::numorstring::{AsNumber, Port, Protocol};

pub const API_VERSION: &str = "projectcalico.org/v3";

pub const KIND_NODE: &str = "Node";
pub const KIND_HOST_ENDPOINT: &str = "HostEndpoint";
pub const KIND_WORKLOAD_ENDPOINT: &str = "WorkloadEndpoint";
pub const KIND_PROFILE: &str = "Profile";
pub const KIND_GLOBAL_NETWORK_POLICY: &str = "GlobalNetworkPolicy";
pub const KIND_IP_POOL: &str = "IPPool";
pub const KIND_BGP_PEER: &str = "BGPPeer";

/// Label carrying the namespace of a workload endpoint.
pub const LABEL_NAMESPACE: &str = "projectcalico.org/namespace";
/// Label carrying the orchestrator of a workload endpoint.
pub const LABEL_ORCHESTRATOR: &str = "projectcalico.org/orchestrator";

/// A converted resource of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum V3Resource {
    Node(Node),
    HostEndpoint(HostEndpoint),
    WorkloadEndpoint(WorkloadEndpoint),
    Profile(Profile),
    GlobalNetworkPolicy(GlobalNetworkPolicy),
    IpPool(IpPool),
    BgpPeer(BgpPeer),
}

impl V3Resource {
    pub fn kind(&self) -> &str {
        match self {
            V3Resource::Node(r) => &r.kind,
            V3Resource::HostEndpoint(r) => &r.kind,
            V3Resource::WorkloadEndpoint(r) => &r.kind,
            V3Resource::Profile(r) => &r.kind,
            V3Resource::GlobalNetworkPolicy(r) => &r.kind,
            V3Resource::IpPool(r) => &r.kind,
            V3Resource::BgpPeer(r) => &r.kind,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            V3Resource::Node(r) => &r.metadata,
            V3Resource::HostEndpoint(r) => &r.metadata,
            V3Resource::WorkloadEndpoint(r) => &r.metadata,
            V3Resource::Profile(r) => &r.metadata,
            V3Resource::GlobalNetworkPolicy(r) => &r.metadata,
            V3Resource::IpPool(r) => &r.metadata,
            V3Resource::BgpPeer(r) => &r.metadata,
        }
    }
}

/// A v3 object: type metadata, object metadata and a kind-specific spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Object<S> {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: S,
}

impl<S> Object<S> {
    pub fn new(kind: &str, metadata: ObjectMeta, spec: S) -> Self {
        Object {
            api_version: API_VERSION.to_string(),
            kind: kind.to_string(),
            metadata,
            spec,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        ObjectMeta {
            name: name.into(),
            ..Default::default()
        }
    }
}

pub type Node = Object<NodeSpec>;
pub type HostEndpoint = Object<HostEndpointSpec>;
pub type WorkloadEndpoint = Object<WorkloadEndpointSpec>;
pub type Profile = Object<ProfileSpec>;
pub type GlobalNetworkPolicy = Object<GlobalNetworkPolicySpec>;
pub type IpPool = Object<IpPoolSpec>;
pub type BgpPeer = Object<BgpPeerSpec>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp: Option<NodeBgpSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orch_refs: Vec<OrchRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBgpSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_number: Option<AsNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    pub orchestrator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEndpointSpec {
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(rename = "expectedIPs", skip_serializing_if = "Vec::is_empty")]
    pub expected_ips: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<EndpointPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointPort {
    pub name: String,
    pub protocol: Protocol,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadEndpointSpec {
    pub orchestrator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,
    pub node: String,
    #[serde(rename = "containerID", skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip_networks: Vec<String>,
    #[serde(rename = "ipNATs", skip_serializing_if = "Vec::is_empty")]
    pub ip_nats: Vec<IpNat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_gateway: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<String>,
    pub interface_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<EndpointPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpNat {
    #[serde(rename = "internalIP")]
    pub internal_ip: String,
    #[serde(rename = "externalIP")]
    pub external_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<Rule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<Rule>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels_to_apply: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalNetworkPolicySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<Rule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<Rule>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub selector: String,
    pub types: Vec<PolicyType>,
    #[serde(skip_serializing_if = "is_false")]
    pub do_not_track: bool,
    #[serde(rename = "preDNAT", skip_serializing_if = "is_false")]
    pub pre_dnat: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub apply_on_forward: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PolicyType {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpPoolSpec {
    pub cidr: String,
    pub ipip_mode: IpipMode,
    pub nat_outgoing: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IpipMode {
    Always,
    CrossSubnet,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BgpPeerSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(rename = "peerIP")]
    pub peer_ip: String,
    pub as_number: AsNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp: Option<IcmpFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_protocol: Option<Protocol>,
    #[serde(rename = "notICMP", skip_serializing_if = "Option::is_none")]
    pub not_icmp: Option<IcmpFields>,
    #[serde(skip_serializing_if = "EntityRule::is_empty")]
    pub source: EntityRule,
    #[serde(skip_serializing_if = "EntityRule::is_empty")]
    pub destination: EntityRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Allow,
    Deny,
    Log,
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IcmpFields {
    #[serde(rename = "type")]
    pub icmp_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nets: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub selector: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<Port>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_nets: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub not_selector: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_ports: Vec<Port>,
}

impl EntityRule {
    pub fn is_empty(&self) -> bool {
        self == &EntityRule::default()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_serializes_type_metadata() {
        let pool = IpPool::new(
            KIND_IP_POOL,
            ObjectMeta::named("10-0-0-0-8"),
            IpPoolSpec {
                cidr: "10.0.0.0/8".to_string(),
                ipip_mode: IpipMode::CrossSubnet,
                nat_outgoing: true,
                disabled: false,
            },
        );

        assert_eq!(
            serde_json::to_value(&pool).unwrap(),
            json!({
                "apiVersion": "projectcalico.org/v3",
                "kind": "IPPool",
                "metadata": {"name": "10-0-0-0-8"},
                "spec": {
                    "cidr": "10.0.0.0/8",
                    "ipipMode": "CrossSubnet",
                    "natOutgoing": true,
                    "disabled": false
                }
            })
        );
    }

    #[test]
    fn test_empty_entity_rules_are_omitted() {
        let rule = Rule {
            action: Action::Pass,
            ip_version: None,
            protocol: Some(Protocol::Udp),
            icmp: None,
            not_protocol: None,
            not_icmp: None,
            source: EntityRule::default(),
            destination: EntityRule {
                ports: vec![Port::single(53)],
                ..Default::default()
            },
        };

        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({"action": "Pass", "protocol": "UDP", "destination": {"ports": [53]}})
        );
    }

    #[test]
    fn test_v3_resource_accessors() {
        let peer = V3Resource::BgpPeer(BgpPeer::new(
            KIND_BGP_PEER,
            ObjectMeta::named("192-0-2-1"),
            BgpPeerSpec {
                node: None,
                peer_ip: "192.0.2.1".to_string(),
                as_number: AsNumber(64512),
            },
        ));

        assert_eq!(peer.kind(), "BGPPeer");
        assert_eq!(peer.metadata().name, "192-0-2-1");
    }
}
