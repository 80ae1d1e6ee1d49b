//! HostEndpoint conversion

use std::net::IpAddr;

use super::fields::{endpoint_ports_to_v3, non_empty, parse_endpoint_ports, parse_ip, require};
use super::names::{convert_name, convert_node_name, convert_profile_name};
use super::{unexpected_kvp, unexpected_resource, Converter, ResourceKind};
use crate::api::v1::V1Resource;
use crate::api::v3::{self, ObjectMeta, V3Resource};
use crate::backend::{self, HostEndpointKey, Key, KvPair, Value};
use crate::error::ConversionError;

const KIND: &str = ResourceKind::HostEndpoint.name();

pub struct HostEndpointConverter;

impl Converter for HostEndpointConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::HostEndpoint
    }

    fn to_backend(&self, resource: &V1Resource) -> Result<KvPair, ConversionError> {
        let V1Resource::HostEndpoint(hep) = resource else {
            return Err(unexpected_resource(KIND, resource));
        };

        let name = require(KIND, "metadata.name", &hep.metadata.name)?;
        let node = require(KIND, "metadata.node", &hep.metadata.node)?;
        let interface_name = non_empty(hep.spec.interface_name.as_deref());

        if interface_name.is_none() && hep.spec.expected_ips.is_empty() {
            return Err(ConversionError::invalid(
                KIND,
                "spec.interfaceName",
                "either an interface name or an expected IP must be given",
            ));
        }

        let mut value = backend::HostEndpoint {
            name: interface_name.map(str::to_string),
            labels: hep.metadata.labels.clone(),
            profile_ids: hep.spec.profiles.clone(),
            ports: parse_endpoint_ports(KIND, "spec.ports", &hep.spec.ports)?,
            ..Default::default()
        };

        for (i, ip) in hep.spec.expected_ips.iter().enumerate() {
            match parse_ip(KIND, &format!("spec.expectedIPs[{i}]"), ip)? {
                IpAddr::V4(addr) => value.expected_ipv4_addrs.push(addr),
                IpAddr::V6(addr) => value.expected_ipv6_addrs.push(addr),
            }
        }

        Ok(KvPair::new(
            Key::HostEndpoint(HostEndpointKey {
                hostname: node.to_string(),
                endpoint_id: name.to_string(),
            }),
            Value::HostEndpoint(value),
        ))
    }

    fn to_v3(&self, kvp: KvPair) -> Result<V3Resource, ConversionError> {
        let (key, value) = match kvp {
            KvPair {
                key: Key::HostEndpoint(key),
                value: Value::HostEndpoint(value),
            } => (key, value),
            other => return Err(unexpected_kvp(KIND, &other)),
        };

        let expected_ips = value
            .expected_ipv4_addrs
            .iter()
            .map(ToString::to_string)
            .chain(value.expected_ipv6_addrs.iter().map(ToString::to_string))
            .collect();

        let metadata = ObjectMeta {
            labels: value.labels,
            ..ObjectMeta::named(convert_name(&format!(
                "{}.{}",
                key.hostname, key.endpoint_id
            )))
        };

        let spec = v3::HostEndpointSpec {
            node: convert_node_name(&key.hostname),
            interface_name: value.name,
            expected_ips,
            profiles: value
                .profile_ids
                .iter()
                .map(|profile| convert_profile_name(profile))
                .collect(),
            ports: endpoint_ports_to_v3(value.ports),
        };

        Ok(V3Resource::HostEndpoint(v3::HostEndpoint::new(
            v3::KIND_HOST_ENDPOINT,
            metadata,
            spec,
        )))
    }
}
