//! IPPool conversion

use super::fields::{parse_network, require};
use super::names::convert_net_to_name;
use super::{unexpected_kvp, unexpected_resource, Converter, ResourceKind};
use crate::api::v1::{IpipConfiguration, V1Resource};
use crate::api::v3::{self, ObjectMeta, V3Resource};
use crate::backend::{self, EncapMode, IpPoolKey, Key, KvPair, Value};
use crate::error::ConversionError;

const KIND: &str = ResourceKind::IpPool.name();

/// Tunnel device used for IPIP traffic.
const IPIP_INTERFACE: &str = "tunl0";

pub struct IpPoolConverter;

impl Converter for IpPoolConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IpPool
    }

    fn to_backend(&self, resource: &V1Resource) -> Result<KvPair, ConversionError> {
        let V1Resource::IpPool(pool) = resource else {
            return Err(unexpected_resource(KIND, resource));
        };

        let cidr = require(KIND, "metadata.cidr", &pool.metadata.cidr)?;
        let cidr = parse_network(KIND, "metadata.cidr", cidr)?;

        let (ipip_interface, ipip_mode) = match &pool.spec.ipip {
            Some(ipip) if ipip.enabled => (Some(IPIP_INTERFACE.to_string()), parse_ipip_mode(ipip)?),
            Some(ipip) => {
                // The mode must still be valid when IPIP is off.
                parse_ipip_mode(ipip)?;
                (None, EncapMode::Undefined)
            }
            None => (None, EncapMode::Undefined),
        };

        let value = backend::IpPool {
            cidr,
            ipip_interface,
            ipip_mode,
            masquerade: pool.spec.nat_outgoing,
            ipam: true,
            disabled: pool.spec.disabled,
        };

        Ok(KvPair::new(
            Key::IpPool(IpPoolKey { cidr }),
            Value::IpPool(value),
        ))
    }

    fn to_v3(&self, kvp: KvPair) -> Result<V3Resource, ConversionError> {
        let (key, value) = match kvp {
            KvPair {
                key: Key::IpPool(key),
                value: Value::IpPool(value),
            } => (key, value),
            other => return Err(unexpected_kvp(KIND, &other)),
        };

        let ipip_mode = match (&value.ipip_interface, value.ipip_mode) {
            (None, _) => v3::IpipMode::Never,
            (Some(_), EncapMode::CrossSubnet) => v3::IpipMode::CrossSubnet,
            (Some(_), EncapMode::Always | EncapMode::Undefined) => v3::IpipMode::Always,
        };

        let spec = v3::IpPoolSpec {
            cidr: value.cidr.to_string(),
            ipip_mode,
            nat_outgoing: value.masquerade,
            disabled: value.disabled,
        };

        Ok(V3Resource::IpPool(v3::IpPool::new(
            v3::KIND_IP_POOL,
            ObjectMeta::named(convert_net_to_name(&key.cidr)),
            spec,
        )))
    }
}

fn parse_ipip_mode(ipip: &IpipConfiguration) -> Result<EncapMode, ConversionError> {
    match ipip.mode.to_lowercase().as_str() {
        "" => Ok(EncapMode::Undefined),
        "always" => Ok(EncapMode::Always),
        "cross-subnet" => Ok(EncapMode::CrossSubnet),
        other => Err(ConversionError::invalid(
            KIND,
            "spec.ipip.mode",
            format!("unknown IPIP mode '{other}'"),
        )),
    }
}
