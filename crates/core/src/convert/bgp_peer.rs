//! BGPPeer conversion
//!
//! v1 peers are either global or scoped to one node, and that scope picks
//! the back-end key. v3 keeps the node in `spec.node` and in the name.

use std::net::IpAddr;

use super::fields::{parse_as_number, parse_ip, require, require_some};
use super::names::{convert_ip_to_name, convert_node_name};
use super::{unexpected_kvp, unexpected_resource, Converter, ResourceKind};
use crate::api::v1::V1Resource;
use crate::api::v3::{self, ObjectMeta, V3Resource};
use crate::backend::{self, GlobalBgpPeerKey, Key, KvPair, NodeBgpPeerKey, Value};
use crate::error::ConversionError;

const KIND: &str = ResourceKind::BgpPeer.name();

const SCOPE_GLOBAL: &str = "global";
const SCOPE_NODE: &str = "node";

pub struct BgpPeerConverter;

impl Converter for BgpPeerConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::BgpPeer
    }

    fn to_backend(&self, resource: &V1Resource) -> Result<KvPair, ConversionError> {
        let V1Resource::BgpPeer(peer) = resource else {
            return Err(unexpected_resource(KIND, resource));
        };

        let metadata = &peer.metadata;
        let scope = require(KIND, "metadata.scope", &metadata.scope)?;
        let peer_ip = require(KIND, "metadata.peerIP", &metadata.peer_ip)?;
        let peer_ip = parse_ip(KIND, "metadata.peerIP", peer_ip)?;
        let as_number = peer
            .spec
            .as_number
            .as_ref()
            .ok_or_else(|| ConversionError::missing(KIND, "spec.asNumber"))?;
        let as_number = parse_as_number(KIND, "spec.asNumber", as_number)?;

        let key = match scope.to_lowercase().as_str() {
            SCOPE_GLOBAL => {
                if metadata.node.as_deref().is_some_and(|n| !n.trim().is_empty()) {
                    return Err(ConversionError::invalid(
                        KIND,
                        "metadata.node",
                        "a global peer cannot name a node",
                    ));
                }
                Key::GlobalBgpPeer(GlobalBgpPeerKey { peer_ip })
            }
            SCOPE_NODE => {
                let node = require_some(KIND, "metadata.node", metadata.node.as_deref())?;
                Key::NodeBgpPeer(NodeBgpPeerKey {
                    nodename: node.to_string(),
                    peer_ip,
                })
            }
            _ => {
                return Err(ConversionError::invalid(
                    KIND,
                    "metadata.scope",
                    format!("'{scope}' is neither '{SCOPE_GLOBAL}' nor '{SCOPE_NODE}'"),
                ))
            }
        };

        Ok(KvPair::new(
            key,
            Value::BgpPeer(backend::BgpPeer { peer_ip, as_number }),
        ))
    }

    fn to_v3(&self, kvp: KvPair) -> Result<V3Resource, ConversionError> {
        let (node, peer_ip, value) = match kvp {
            KvPair {
                key: Key::GlobalBgpPeer(key),
                value: Value::BgpPeer(value),
            } => (None, key.peer_ip, value),
            KvPair {
                key: Key::NodeBgpPeer(key),
                value: Value::BgpPeer(value),
            } => (Some(convert_node_name(&key.nodename)), key.peer_ip, value),
            other => return Err(unexpected_kvp(KIND, &other)),
        };

        let spec = v3::BgpPeerSpec {
            node: node.clone(),
            peer_ip: peer_ip.to_string(),
            as_number: value.as_number,
        };

        Ok(V3Resource::BgpPeer(v3::BgpPeer::new(
            v3::KIND_BGP_PEER,
            ObjectMeta::named(peer_name(node.as_deref(), &peer_ip)),
            spec,
        )))
    }
}

fn peer_name(node: Option<&str>, peer_ip: &IpAddr) -> String {
    match node {
        Some(node) => format!("{node}.{}", convert_ip_to_name(peer_ip)),
        None => convert_ip_to_name(peer_ip),
    }
}
