//! Back-end key/value representation
//!
//! This is the storage-layer shape of the v1 generation. A [`KvPair`] only
//! lives between the two conversion stages: the first stage builds it from a
//! v1 resource and the second turns it into a v3 resource.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

use crate::api::numorstring::{AsNumber, Port, Protocol};

/// A structured storage key paired with the value stored under it.
#[derive(Debug, Clone, PartialEq)]
pub struct KvPair {
    pub key: Key,
    pub value: Value,
}

impl KvPair {
    pub fn new(key: Key, value: Value) -> Self {
        KvPair { key, value }
    }
}

/// Storage key of a v1 resource.
///
/// Displays as the key's path in the v1 datastore layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Node(NodeKey),
    HostEndpoint(HostEndpointKey),
    WorkloadEndpoint(WorkloadEndpointKey),
    Profile(ProfileKey),
    Policy(PolicyKey),
    IpPool(IpPoolKey),
    GlobalBgpPeer(GlobalBgpPeerKey),
    NodeBgpPeer(NodeBgpPeerKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEndpointKey {
    pub hostname: String,
    pub endpoint_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadEndpointKey {
    pub hostname: String,
    pub orchestrator_id: String,
    pub workload_id: String,
    pub endpoint_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileKey {
    pub name: String,
}

/// Policies of the v1 generation all live in the `default` tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyKey {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPoolKey {
    pub cidr: IpNet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalBgpPeerKey {
    pub peer_ip: IpAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBgpPeerKey {
    pub nodename: String,
    pub peer_ip: IpAddr,
}

impl Key {
    pub fn default_path(&self) -> String {
        match self {
            Key::Node(k) => format!("/calico/v1/host/{}/metadata", k.hostname),
            Key::HostEndpoint(k) => format!(
                "/calico/v1/host/{}/endpoint/{}",
                k.hostname,
                escape_segment(&k.endpoint_id)
            ),
            Key::WorkloadEndpoint(k) => format!(
                "/calico/v1/host/{}/workload/{}/{}/endpoint/{}",
                k.hostname,
                k.orchestrator_id,
                escape_segment(&k.workload_id),
                escape_segment(&k.endpoint_id)
            ),
            Key::Profile(k) => format!("/calico/v1/policy/profile/{}", escape_segment(&k.name)),
            Key::Policy(k) => format!(
                "/calico/v1/policy/tier/default/policy/{}",
                escape_segment(&k.name)
            ),
            Key::IpPool(k) => format!(
                "/calico/v1/ipam/v{}/pool/{}",
                ip_version(&k.cidr.addr()),
                k.cidr.to_string().replace('/', "-")
            ),
            Key::GlobalBgpPeer(k) => format!(
                "/calico/bgp/v1/global/peer_v{}/{}",
                ip_version(&k.peer_ip),
                k.peer_ip
            ),
            Key::NodeBgpPeer(k) => format!(
                "/calico/bgp/v1/host/{}/peer_v{}/{}",
                k.nodename,
                ip_version(&k.peer_ip),
                k.peer_ip
            ),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.default_path())
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('/', "%2f")
}

fn ip_version(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 4,
        IpAddr::V6(_) => 6,
    }
}

/// Stored data of a v1 resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Node(Node),
    HostEndpoint(HostEndpoint),
    WorkloadEndpoint(WorkloadEndpoint),
    Profile(Profile),
    Policy(Policy),
    IpPool(IpPool),
    BgpPeer(BgpPeer),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub bgp_ipv4_net: Option<Ipv4Net>,
    pub bgp_ipv6_net: Option<Ipv6Net>,
    pub bgp_as_number: Option<AsNumber>,
    pub orch_refs: Vec<OrchRef>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchRef {
    pub node_name: Option<String>,
    pub orchestrator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEndpoint {
    /// Interface name.
    pub name: Option<String>,
    pub expected_ipv4_addrs: Vec<Ipv4Addr>,
    pub expected_ipv6_addrs: Vec<Ipv6Addr>,
    pub labels: BTreeMap<String, String>,
    pub profile_ids: Vec<String>,
    pub ports: Vec<EndpointPort>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPort {
    pub name: String,
    pub protocol: Protocol,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadEndpoint {
    pub state: String,
    /// Interface name.
    pub name: String,
    pub active_instance_id: Option<String>,
    pub mac: Option<String>,
    pub profile_ids: Vec<String>,
    pub ipv4_nets: Vec<Ipv4Net>,
    pub ipv6_nets: Vec<Ipv6Net>,
    pub ipv4_nat: Vec<IpNat>,
    pub ipv6_nat: Vec<IpNat>,
    pub ipv4_gateway: Option<Ipv4Addr>,
    pub ipv6_gateway: Option<Ipv6Addr>,
    pub labels: BTreeMap<String, String>,
    pub ports: Vec<EndpointPort>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpNat {
    pub int_ip: IpAddr,
    pub ext_ip: IpAddr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub inbound_rules: Vec<Rule>,
    pub outbound_rules: Vec<Rule>,
    pub tags: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    pub order: Option<f64>,
    pub inbound_rules: Vec<Rule>,
    pub outbound_rules: Vec<Rule>,
    pub selector: String,
    pub do_not_track: bool,
    pub pre_dnat: bool,
    pub apply_on_forward: bool,
    pub types: Vec<PolicyType>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyType {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPool {
    pub cidr: IpNet,
    /// Set to the tunnel device when IPIP is enabled.
    pub ipip_interface: Option<String>,
    pub ipip_mode: EncapMode,
    pub masquerade: bool,
    pub ipam: bool,
    pub disabled: bool,
}

/// IPIP encapsulation mode as stored by the v1 back end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EncapMode {
    #[default]
    Undefined,
    Always,
    CrossSubnet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgpPeer {
    pub peer_ip: IpAddr,
    pub as_number: AsNumber,
}

/// A policy rule in the flat back-end layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    pub action: Action,
    pub ip_version: Option<u8>,

    pub protocol: Option<Protocol>,
    pub not_protocol: Option<Protocol>,

    pub icmp_type: Option<u8>,
    pub icmp_code: Option<u8>,
    pub not_icmp_type: Option<u8>,
    pub not_icmp_code: Option<u8>,

    pub src_tag: Option<String>,
    pub src_nets: Vec<IpNet>,
    pub src_selector: Option<String>,
    pub src_ports: Vec<Port>,
    pub dst_tag: Option<String>,
    pub dst_nets: Vec<IpNet>,
    pub dst_selector: Option<String>,
    pub dst_ports: Vec<Port>,

    pub not_src_tag: Option<String>,
    pub not_src_nets: Vec<IpNet>,
    pub not_src_selector: Option<String>,
    pub not_src_ports: Vec<Port>,
    pub not_dst_tag: Option<String>,
    pub not_dst_nets: Vec<IpNet>,
    pub not_dst_selector: Option<String>,
    pub not_dst_ports: Vec<Port>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    Allow,
    Deny,
    Log,
    NextTier,
}
