//! v1 API resources, as decoded from user documents
//!
//! Fields that need validation stay in their textual form here. Parsing
//! happens in the first conversion stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::numorstring::NumOrString;
use crate::convert::ResourceKind;
use crate::error::DecodeError;

/// An explicit `null` decodes like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Type metadata shared by every v1 resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMetadata {
    pub kind: String,
    #[serde(rename = "apiVersion", default, deserialize_with = "null_as_default")]
    pub api_version: String,
}

impl TypeMetadata {
    pub fn new(kind: &str) -> Self {
        TypeMetadata {
            kind: kind.to_string(),
            api_version: "v1".to_string(),
        }
    }
}

/// A decoded v1 document.
///
/// Documents whose kind is not convertible still decode, as
/// [`V1Resource::Unrecognized`], so that the dispatcher reports them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum V1Resource {
    Node(Node),
    HostEndpoint(HostEndpoint),
    WorkloadEndpoint(WorkloadEndpoint),
    Profile(Profile),
    Policy(Policy),
    IpPool(IpPool),
    BgpPeer(BgpPeer),
    Unrecognized(Unrecognized),
}

impl V1Resource {
    /// Decode one document into a typed resource, choosing the shape from
    /// its `kind` field.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DecodeError> {
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or(DecodeError::MissingKind)?
            .to_string();

        let malformed = |source| DecodeError::Malformed {
            kind: kind.clone(),
            source,
        };

        let resource = match ResourceKind::parse(&kind) {
            Some(ResourceKind::Node) => {
                V1Resource::Node(serde_json::from_value(value).map_err(malformed)?)
            }
            Some(ResourceKind::HostEndpoint) => {
                V1Resource::HostEndpoint(serde_json::from_value(value).map_err(malformed)?)
            }
            Some(ResourceKind::WorkloadEndpoint) => {
                V1Resource::WorkloadEndpoint(serde_json::from_value(value).map_err(malformed)?)
            }
            Some(ResourceKind::Profile) => {
                V1Resource::Profile(serde_json::from_value(value).map_err(malformed)?)
            }
            Some(ResourceKind::Policy) => {
                V1Resource::Policy(serde_json::from_value(value).map_err(malformed)?)
            }
            Some(ResourceKind::IpPool) => {
                V1Resource::IpPool(serde_json::from_value(value).map_err(malformed)?)
            }
            Some(ResourceKind::BgpPeer) => {
                V1Resource::BgpPeer(serde_json::from_value(value).map_err(malformed)?)
            }
            None => {
                V1Resource::Unrecognized(serde_json::from_value(value).map_err(malformed)?)
            }
        };

        Ok(resource)
    }

    pub fn type_metadata(&self) -> &TypeMetadata {
        match self {
            V1Resource::Node(r) => &r.type_metadata,
            V1Resource::HostEndpoint(r) => &r.type_metadata,
            V1Resource::WorkloadEndpoint(r) => &r.type_metadata,
            V1Resource::Profile(r) => &r.type_metadata,
            V1Resource::Policy(r) => &r.type_metadata,
            V1Resource::IpPool(r) => &r.type_metadata,
            V1Resource::BgpPeer(r) => &r.type_metadata,
            V1Resource::Unrecognized(r) => &r.type_metadata,
        }
    }

    /// The kind exactly as declared in the document.
    pub fn kind(&self) -> &str {
        &self.type_metadata().kind
    }
}

/// A document of a kind this tool does not convert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unrecognized {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(flatten)]
    pub body: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Node
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: NodeMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: NodeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    #[serde(default)]
    pub bgp: Option<NodeBgpSpec>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub orch_refs: Vec<OrchRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBgpSpec {
    #[serde(default)]
    pub as_number: Option<NumOrString>,
    #[serde(rename = "ipv4Address", default)]
    pub ipv4_address: Option<String>,
    #[serde(rename = "ipv6Address", default)]
    pub ipv6_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchRef {
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub orchestrator: String,
}

// ============================================================================
// HostEndpoint
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEndpoint {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HostEndpointMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: HostEndpointSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostEndpointMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEndpointSpec {
    #[serde(default)]
    pub interface_name: Option<String>,
    #[serde(rename = "expectedIPs", default, deserialize_with = "null_as_default")]
    pub expected_ips: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profiles: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<EndpointPort>,
}

/// A named port exposed by an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPort {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub protocol: Option<NumOrString>,
    #[serde(default)]
    pub port: Option<u64>,
}

// ============================================================================
// WorkloadEndpoint
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadEndpoint {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: WorkloadEndpointMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: WorkloadEndpointSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadEndpointMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workload: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub orchestrator: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node: String,
    #[serde(rename = "activeInstanceID", default)]
    pub active_instance_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadEndpointSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip_networks: Vec<String>,
    #[serde(rename = "ipNATs", default, deserialize_with = "null_as_default")]
    pub ip_nats: Vec<IpNat>,
    #[serde(rename = "ipv4Gateway", default)]
    pub ipv4_gateway: Option<String>,
    #[serde(rename = "ipv6Gateway", default)]
    pub ipv6_gateway: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub interface_name: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<EndpointPort>,
}

/// A one-to-one NAT mapping on a workload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpNat {
    #[serde(rename = "internalIP", default, deserialize_with = "null_as_default")]
    pub internal_ip: String,
    #[serde(rename = "externalIP", default, deserialize_with = "null_as_default")]
    pub external_ip: String,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ProfileMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: ProfileSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingress: Vec<Rule>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub egress: Vec<Rule>,
}

// ============================================================================
// Policy
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: PolicyMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: PolicySpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingress: Vec<Rule>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub egress: Vec<Rule>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub do_not_track: bool,
    #[serde(rename = "preDNAT", default, deserialize_with = "null_as_default")]
    pub pre_dnat: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub apply_on_forward: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub types: Vec<String>,
}

// ============================================================================
// IPPool
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpPool {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: IpPoolMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: IpPoolSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPoolMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cidr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPoolSpec {
    #[serde(default)]
    pub ipip: Option<IpipConfiguration>,
    #[serde(rename = "nat-outgoing", default, deserialize_with = "null_as_default")]
    pub nat_outgoing: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpipConfiguration {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: String,
}

// ============================================================================
// BGPPeer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpPeer {
    #[serde(flatten)]
    pub type_metadata: TypeMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BgpPeerMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: BgpPeerSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BgpPeerMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope: String,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(rename = "peerIP", default, deserialize_with = "null_as_default")]
    pub peer_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BgpPeerSpec {
    #[serde(default)]
    pub as_number: Option<NumOrString>,
}

// ============================================================================
// Policy rules, shared by profiles and policies
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default)]
    pub ip_version: Option<u8>,
    #[serde(default)]
    pub protocol: Option<NumOrString>,
    #[serde(default)]
    pub icmp: Option<IcmpFields>,
    #[serde(default)]
    pub not_protocol: Option<NumOrString>,
    #[serde(rename = "notICMP", default)]
    pub not_icmp: Option<IcmpFields>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: EntityRule,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destination: EntityRule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcmpFields {
    #[serde(rename = "type", default)]
    pub icmp_type: Option<u8>,
    #[serde(default)]
    pub code: Option<u8>,
}

/// Source or destination match criteria of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRule {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub net: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nets: Vec<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<NumOrString>,
    #[serde(default)]
    pub not_tag: Option<String>,
    #[serde(default)]
    pub not_net: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub not_nets: Vec<String>,
    #[serde(default)]
    pub not_selector: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub not_ports: Vec<NumOrString>,
}
