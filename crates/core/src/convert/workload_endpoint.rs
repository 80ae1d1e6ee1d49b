//! WorkloadEndpoint conversion
//!
//! v1 identified a workload endpoint by node, orchestrator, workload and
//! endpoint id. v3 endpoints are namespaced, so the namespace is recovered
//! from the workload id for Kubernetes endpoints and defaults otherwise.

use std::net::IpAddr;

use ipnet::IpNet;

use super::fields::{
    endpoint_ports_to_v3, non_empty, parse_endpoint_ports, parse_ip, parse_mac, parse_net,
    require, require_some,
};
use super::names::{convert_node_name, convert_profile_name, WorkloadEndpointIdentifiers};
use super::rules::V1_NAMESPACE_LABEL;
use super::{unexpected_kvp, unexpected_resource, Converter, ResourceKind};
use crate::api::v1::{self, V1Resource};
use crate::api::v3::{self, ObjectMeta, V3Resource};
use crate::backend::{self, Key, KvPair, Value, WorkloadEndpointKey};
use crate::error::ConversionError;

const KIND: &str = ResourceKind::WorkloadEndpoint.name();

const ORCHESTRATOR_K8S: &str = "k8s";
const DEFAULT_NAMESPACE: &str = "default";
const STATE_ACTIVE: &str = "active";

pub struct WorkloadEndpointConverter;

impl Converter for WorkloadEndpointConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::WorkloadEndpoint
    }

    fn to_backend(&self, resource: &V1Resource) -> Result<KvPair, ConversionError> {
        let V1Resource::WorkloadEndpoint(wep) = resource else {
            return Err(unexpected_resource(KIND, resource));
        };

        let metadata = &wep.metadata;
        let spec = &wep.spec;

        let endpoint_id = require(KIND, "metadata.name", &metadata.name)?;
        let workload_id = require(KIND, "metadata.workload", &metadata.workload)?;
        let orchestrator_id = require(KIND, "metadata.orchestrator", &metadata.orchestrator)?;
        let hostname = require(KIND, "metadata.node", &metadata.node)?;
        let interface_name =
            require_some(KIND, "spec.interfaceName", spec.interface_name.as_deref())?;

        let mut value = backend::WorkloadEndpoint {
            state: STATE_ACTIVE.to_string(),
            name: interface_name.to_string(),
            active_instance_id: non_empty(metadata.active_instance_id.as_deref())
                .map(str::to_string),
            mac: non_empty(spec.mac.as_deref())
                .map(|mac| parse_mac(KIND, "spec.mac", mac))
                .transpose()?,
            profile_ids: spec.profiles.clone(),
            labels: metadata.labels.clone(),
            ports: parse_endpoint_ports(KIND, "spec.ports", &spec.ports)?,
            ..Default::default()
        };

        for (i, network) in spec.ip_networks.iter().enumerate() {
            match parse_net(KIND, &format!("spec.ipNetworks[{i}]"), network)? {
                IpNet::V4(net) => value.ipv4_nets.push(net),
                IpNet::V6(net) => value.ipv6_nets.push(net),
            }
        }

        for (i, nat) in spec.ip_nats.iter().enumerate() {
            let nat = ip_nat_to_backend(&format!("spec.ipNATs[{i}]"), nat)?;
            match nat.int_ip {
                IpAddr::V4(_) => value.ipv4_nat.push(nat),
                IpAddr::V6(_) => value.ipv6_nat.push(nat),
            }
        }

        if let Some(gateway) = non_empty(spec.ipv4_gateway.as_deref()) {
            match parse_ip(KIND, "spec.ipv4Gateway", gateway)? {
                IpAddr::V4(addr) => value.ipv4_gateway = Some(addr),
                IpAddr::V6(_) => {
                    return Err(ConversionError::invalid(
                        KIND,
                        "spec.ipv4Gateway",
                        format!("'{gateway}' is not an IPv4 address"),
                    ))
                }
            }
        }

        if let Some(gateway) = non_empty(spec.ipv6_gateway.as_deref()) {
            match parse_ip(KIND, "spec.ipv6Gateway", gateway)? {
                IpAddr::V6(addr) => value.ipv6_gateway = Some(addr),
                IpAddr::V4(_) => {
                    return Err(ConversionError::invalid(
                        KIND,
                        "spec.ipv6Gateway",
                        format!("'{gateway}' is not an IPv6 address"),
                    ))
                }
            }
        }

        Ok(KvPair::new(
            Key::WorkloadEndpoint(WorkloadEndpointKey {
                hostname: hostname.to_string(),
                orchestrator_id: orchestrator_id.to_string(),
                workload_id: workload_id.to_string(),
                endpoint_id: endpoint_id.to_string(),
            }),
            Value::WorkloadEndpoint(value),
        ))
    }

    fn to_v3(&self, kvp: KvPair) -> Result<V3Resource, ConversionError> {
        let (key, value) = match kvp {
            KvPair {
                key: Key::WorkloadEndpoint(key),
                value: Value::WorkloadEndpoint(value),
            } => (key, value),
            other => return Err(unexpected_kvp(KIND, &other)),
        };

        let is_k8s = key.orchestrator_id == ORCHESTRATOR_K8S;
        let (namespace, pod) = if is_k8s {
            let (namespace, pod) = key.workload_id.split_once('.').ok_or_else(|| {
                ConversionError::invalid(
                    KIND,
                    "metadata.workload",
                    format!(
                        "'{}' is not of the form <namespace>.<pod>",
                        key.workload_id
                    ),
                )
            })?;
            (namespace.to_string(), Some(pod.to_string()))
        } else {
            (DEFAULT_NAMESPACE.to_string(), None)
        };

        let node = convert_node_name(&key.hostname);
        let container_id = value.active_instance_id.clone();

        let name = WorkloadEndpointIdentifiers {
            node: &node,
            orchestrator: &key.orchestrator_id,
            workload: &key.workload_id,
            pod: pod.as_deref().unwrap_or_default(),
            container_id: container_id.as_deref().unwrap_or_default(),
            endpoint: &key.endpoint_id,
        }
        .name();

        let mut labels = value.labels;
        if is_k8s {
            labels.remove(V1_NAMESPACE_LABEL);
        }
        labels.insert(v3::LABEL_NAMESPACE.to_string(), namespace.clone());
        labels.insert(
            v3::LABEL_ORCHESTRATOR.to_string(),
            key.orchestrator_id.clone(),
        );

        let metadata = ObjectMeta {
            namespace: Some(namespace),
            labels,
            ..ObjectMeta::named(name)
        };

        let ip_networks = value
            .ipv4_nets
            .iter()
            .map(ToString::to_string)
            .chain(value.ipv6_nets.iter().map(ToString::to_string))
            .collect();

        let ip_nats = value
            .ipv4_nat
            .into_iter()
            .chain(value.ipv6_nat)
            .map(|nat| v3::IpNat {
                internal_ip: nat.int_ip.to_string(),
                external_ip: nat.ext_ip.to_string(),
            })
            .collect();

        let spec = v3::WorkloadEndpointSpec {
            orchestrator: key.orchestrator_id,
            workload: (!is_k8s).then_some(key.workload_id),
            node,
            container_id,
            pod,
            endpoint: key.endpoint_id,
            ip_networks,
            ip_nats,
            ipv4_gateway: value.ipv4_gateway.map(|gw| gw.to_string()),
            ipv6_gateway: value.ipv6_gateway.map(|gw| gw.to_string()),
            profiles: value
                .profile_ids
                .iter()
                .map(|profile| convert_profile_name(profile))
                .collect(),
            interface_name: value.name,
            mac: value.mac,
            ports: endpoint_ports_to_v3(value.ports),
        };

        Ok(V3Resource::WorkloadEndpoint(v3::WorkloadEndpoint::new(
            v3::KIND_WORKLOAD_ENDPOINT,
            metadata,
            spec,
        )))
    }
}

/// Both sides of a NAT mapping must be in the same family.
fn ip_nat_to_backend(field: &str, nat: &v1::IpNat) -> Result<backend::IpNat, ConversionError> {
    let internal = require(KIND, &format!("{field}.internalIP"), &nat.internal_ip)?;
    let external = require(KIND, &format!("{field}.externalIP"), &nat.external_ip)?;
    let int_ip = parse_ip(KIND, &format!("{field}.internalIP"), internal)?;
    let ext_ip = parse_ip(KIND, &format!("{field}.externalIP"), external)?;

    if int_ip.is_ipv4() != ext_ip.is_ipv4() {
        return Err(ConversionError::invalid(
            KIND,
            format!("{field}.externalIP"),
            format!("'{ext_ip}' is not in the same IP family as '{int_ip}'"),
        ));
    }

    Ok(backend::IpNat { int_ip, ext_ip })
}
