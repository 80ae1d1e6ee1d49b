//! Field validation shared by the first conversion stage

use std::net::IpAddr;

use ipnet::IpNet;

use crate::api::numorstring::{AsNumber, NumOrString, Port, Protocol};
use crate::api::{v1, v3};
use crate::backend;
use crate::error::ConversionError;

/// Return the value of a required string field, rejecting empty values.
pub fn require<'a>(
    kind: &'static str,
    field: &str,
    value: &'a str,
) -> Result<&'a str, ConversionError> {
    if value.trim().is_empty() {
        return Err(ConversionError::missing(kind, field));
    }
    Ok(value)
}

/// Like [`require`] for optional fields.
pub fn require_some<'a>(
    kind: &'static str,
    field: &str,
    value: Option<&'a str>,
) -> Result<&'a str, ConversionError> {
    require(kind, field, value.unwrap_or_default())
}

/// Treat an empty optional string as absent.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_ip(kind: &'static str, field: &str, value: &str) -> Result<IpAddr, ConversionError> {
    value
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| ConversionError::invalid(kind, field, format!("'{value}' is not an IP address")))
}

/// Parse a CIDR. A bare address is accepted and given a host-length prefix.
pub fn parse_net(kind: &'static str, field: &str, value: &str) -> Result<IpNet, ConversionError> {
    let value = value.trim();
    if let Ok(net) = value.parse::<IpNet>() {
        return Ok(net);
    }
    let addr = value
        .parse::<IpAddr>()
        .map_err(|_| ConversionError::invalid(kind, field, format!("'{value}' is not a CIDR")))?;
    let prefix_len = if addr.is_ipv4() { 32 } else { 128 };
    IpNet::new(addr, prefix_len).map_err(|e| ConversionError::invalid(kind, field, e))
}

/// Parse a CIDR and reject host bits below the prefix.
pub fn parse_network(
    kind: &'static str,
    field: &str,
    value: &str,
) -> Result<IpNet, ConversionError> {
    let net = value
        .trim()
        .parse::<IpNet>()
        .map_err(|_| ConversionError::invalid(kind, field, format!("'{value}' is not a CIDR")))?;
    if net.trunc() != net {
        return Err(ConversionError::invalid(
            kind,
            field,
            format!("'{value}' has host bits set, expected {}", net.trunc()),
        ));
    }
    Ok(net)
}

pub fn parse_port(
    kind: &'static str,
    field: &str,
    value: &NumOrString,
) -> Result<Port, ConversionError> {
    Port::parse(value).map_err(|reason| ConversionError::invalid(kind, field, reason))
}

pub fn parse_protocol(
    kind: &'static str,
    field: &str,
    value: &NumOrString,
) -> Result<Protocol, ConversionError> {
    Protocol::parse(value).map_err(|reason| ConversionError::invalid(kind, field, reason))
}

pub fn parse_as_number(
    kind: &'static str,
    field: &str,
    value: &NumOrString,
) -> Result<AsNumber, ConversionError> {
    AsNumber::parse(value).map_err(|reason| ConversionError::invalid(kind, field, reason))
}

/// Convert the named ports of an endpoint. Every port needs a name, a
/// protocol and a number.
pub fn parse_endpoint_ports(
    kind: &'static str,
    field: &str,
    ports: &[v1::EndpointPort],
) -> Result<Vec<backend::EndpointPort>, ConversionError> {
    ports
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let field = format!("{field}[{i}]");
            let name = require(kind, &format!("{field}.name"), &port.name)?;
            let protocol = port
                .protocol
                .as_ref()
                .ok_or_else(|| ConversionError::missing(kind, format!("{field}.protocol")))?;
            let number = port
                .port
                .ok_or_else(|| ConversionError::missing(kind, format!("{field}.port")))?;

            Ok(backend::EndpointPort {
                name: name.to_string(),
                protocol: parse_protocol(kind, &format!("{field}.protocol"), protocol)?,
                port: u16::try_from(number).map_err(|_| {
                    ConversionError::invalid(
                        kind,
                        format!("{field}.port"),
                        format!("port {number} is out of range"),
                    )
                })?,
            })
        })
        .collect()
}

pub fn endpoint_ports_to_v3(ports: Vec<backend::EndpointPort>) -> Vec<v3::EndpointPort> {
    ports
        .into_iter()
        .map(|port| v3::EndpointPort {
            name: port.name,
            protocol: port.protocol,
            port: port.port,
        })
        .collect()
}

/// Parse a 48-bit MAC address written with `:` or `-` separators.
///
/// Returns the canonical lower-case, colon-separated form.
pub fn parse_mac(kind: &'static str, field: &str, value: &str) -> Result<String, ConversionError> {
    let invalid = || ConversionError::invalid(kind, field, format!("'{value}' is not a MAC address"));

    let octets: Vec<&str> = value.trim().split([':', '-']).collect();
    if octets.len() != 6 {
        return Err(invalid());
    }

    let mut canonical = Vec::with_capacity(6);
    for octet in octets {
        if octet.len() != 2 || !octet.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let byte = u8::from_str_radix(octet, 16).map_err(|_| invalid())?;
        canonical.push(format!("{byte:02x}"));
    }

    Ok(canonical.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        let err = require("Node", "metadata.name", "  ").unwrap_err();
        assert_eq!(err, ConversionError::missing("Node", "metadata.name"));
    }

    #[test]
    fn test_require_some_rejects_absent() {
        assert!(require_some("Node", "spec.x", None).is_err());
        assert_eq!(require_some("Node", "spec.x", Some("v")).unwrap(), "v");
    }

    #[test]
    fn test_parse_net_accepts_bare_address() {
        let net = parse_net("Policy", "source.net", "10.1.2.3").unwrap();
        assert_eq!(net.to_string(), "10.1.2.3/32");
        let net = parse_net("Policy", "source.net", "2001:db8::1").unwrap();
        assert_eq!(net.to_string(), "2001:db8::1/128");
    }

    #[test]
    fn test_parse_net_rejects_garbage() {
        let err = parse_net("Policy", "source.net", "10.0.0.0/99").unwrap_err();
        assert_eq!(err.field(), Some("source.net"));
    }

    #[test]
    fn test_parse_network_rejects_host_bits() {
        assert!(parse_network("IPPool", "metadata.cidr", "10.0.0.0/8").is_ok());
        let err = parse_network("IPPool", "metadata.cidr", "10.0.0.1/8").unwrap_err();
        assert!(err.to_string().contains("expected 10.0.0.0/8"));
    }

    #[test]
    fn test_parse_ip() {
        assert!(parse_ip("BGPPeer", "metadata.peerIP", "192.0.2.1").is_ok());
        assert!(parse_ip("BGPPeer", "metadata.peerIP", "192.0.2.1/32").is_err());
    }

    #[test]
    fn test_parse_endpoint_ports() {
        let ports = vec![v1::EndpointPort {
            name: "http".to_string(),
            protocol: Some(NumOrString::from("tcp")),
            port: Some(8080),
        }];
        let parsed = parse_endpoint_ports("HostEndpoint", "spec.ports", &ports).unwrap();
        assert_eq!(
            parsed,
            vec![backend::EndpointPort {
                name: "http".to_string(),
                protocol: Protocol::Tcp,
                port: 8080
            }]
        );
    }

    #[test]
    fn test_parse_endpoint_ports_rejects_incomplete() {
        let ports = vec![v1::EndpointPort {
            name: "http".to_string(),
            protocol: None,
            port: Some(80),
        }];
        let err = parse_endpoint_ports("HostEndpoint", "spec.ports", &ports).unwrap_err();
        assert_eq!(err, ConversionError::missing("HostEndpoint", "spec.ports[0].protocol"));

        let ports = vec![v1::EndpointPort {
            name: "http".to_string(),
            protocol: Some(NumOrString::from(6)),
            port: Some(70000),
        }];
        let err = parse_endpoint_ports("HostEndpoint", "spec.ports", &ports).unwrap_err();
        assert_eq!(err.field(), Some("spec.ports[0].port"));
    }

    #[test]
    fn test_parse_mac_normalizes() {
        assert_eq!(
            parse_mac("WorkloadEndpoint", "spec.mac", "EE-EE-EE-00-01-0A").unwrap(),
            "ee:ee:ee:00:01:0a"
        );
    }

    #[test]
    fn test_parse_mac_rejects_malformed() {
        assert!(parse_mac("WorkloadEndpoint", "spec.mac", "ee:ee:ee").is_err());
        assert!(parse_mac("WorkloadEndpoint", "spec.mac", "ee:ee:ee:00:01:zz").is_err());
        assert!(parse_mac("WorkloadEndpoint", "spec.mac", "eee:e:ee:00:01:0a").is_err());
    }
}
