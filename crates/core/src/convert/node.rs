//! Node conversion
//!
//! The v1 BGP addresses are stored as networks so that both the address and
//! its subnet survive; v3 writes them back in CIDR form.

use ipnet::IpNet;

use super::fields::{non_empty, parse_as_number, parse_net, require};
use super::names::convert_node_name;
use super::{unexpected_kvp, unexpected_resource, Converter, ResourceKind};
use crate::api::v1::{self, V1Resource};
use crate::api::v3::{self, ObjectMeta, V3Resource};
use crate::backend::{self, Key, KvPair, NodeKey, Value};
use crate::error::ConversionError;

const KIND: &str = ResourceKind::Node.name();

pub struct NodeConverter;

impl Converter for NodeConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Node
    }

    fn to_backend(&self, resource: &V1Resource) -> Result<KvPair, ConversionError> {
        let V1Resource::Node(node) = resource else {
            return Err(unexpected_resource(KIND, resource));
        };

        let hostname = require(KIND, "metadata.name", &node.metadata.name)?;

        let mut value = backend::Node {
            labels: node.metadata.labels.clone(),
            ..Default::default()
        };

        if let Some(bgp) = &node.spec.bgp {
            if let Some(address) = non_empty(bgp.ipv4_address.as_deref()) {
                value.bgp_ipv4_net = match parse_net(KIND, "spec.bgp.ipv4Address", address)? {
                    IpNet::V4(net) => Some(net),
                    IpNet::V6(_) => {
                        return Err(ConversionError::invalid(
                            KIND,
                            "spec.bgp.ipv4Address",
                            format!("'{address}' is not an IPv4 address"),
                        ))
                    }
                };
            }
            if let Some(address) = non_empty(bgp.ipv6_address.as_deref()) {
                value.bgp_ipv6_net = match parse_net(KIND, "spec.bgp.ipv6Address", address)? {
                    IpNet::V6(net) => Some(net),
                    IpNet::V4(_) => {
                        return Err(ConversionError::invalid(
                            KIND,
                            "spec.bgp.ipv6Address",
                            format!("'{address}' is not an IPv6 address"),
                        ))
                    }
                };
            }
            value.bgp_as_number = bgp
                .as_number
                .as_ref()
                .map(|asn| parse_as_number(KIND, "spec.bgp.asNumber", asn))
                .transpose()?;
        }

        value.orch_refs = node
            .spec
            .orch_refs
            .iter()
            .enumerate()
            .map(|(i, orch_ref)| orch_ref_to_backend(i, orch_ref))
            .collect::<Result<_, _>>()?;

        Ok(KvPair::new(
            Key::Node(NodeKey {
                hostname: hostname.to_string(),
            }),
            Value::Node(value),
        ))
    }

    fn to_v3(&self, kvp: KvPair) -> Result<V3Resource, ConversionError> {
        let (key, value) = match kvp {
            KvPair {
                key: Key::Node(key),
                value: Value::Node(value),
            } => (key, value),
            other => return Err(unexpected_kvp(KIND, &other)),
        };

        let bgp = if value.bgp_ipv4_net.is_some() || value.bgp_ipv6_net.is_some() {
            Some(v3::NodeBgpSpec {
                as_number: value.bgp_as_number,
                ipv4_address: value.bgp_ipv4_net.map(|net| net.to_string()),
                ipv6_address: value.bgp_ipv6_net.map(|net| net.to_string()),
            })
        } else {
            None
        };

        let metadata = ObjectMeta {
            labels: value.labels,
            ..ObjectMeta::named(convert_node_name(&key.hostname))
        };

        let spec = v3::NodeSpec {
            bgp,
            orch_refs: value
                .orch_refs
                .into_iter()
                .map(|orch_ref| v3::OrchRef {
                    node_name: orch_ref.node_name,
                    orchestrator: orch_ref.orchestrator,
                })
                .collect(),
        };

        Ok(V3Resource::Node(v3::Node::new(v3::KIND_NODE, metadata, spec)))
    }
}

fn orch_ref_to_backend(
    index: usize,
    orch_ref: &v1::OrchRef,
) -> Result<backend::OrchRef, ConversionError> {
    let orchestrator = require(
        KIND,
        &format!("spec.orchRefs[{index}].orchestrator"),
        &orch_ref.orchestrator,
    )?;

    Ok(backend::OrchRef {
        node_name: non_empty(orch_ref.node_name.as_deref()).map(str::to_string),
        orchestrator: orchestrator.to_string(),
    })
}
