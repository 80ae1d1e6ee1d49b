//! Loosely-typed v1 values and their parsed forms
//!
//! v1 documents accept ports, protocols and AS numbers either as numbers or
//! as strings. They are decoded as [`NumOrString`] and parsed during the
//! first conversion stage, so a failure can name the offending field.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// A value written either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumOrString {
    Num(u64),
    Str(String),
}

impl fmt::Display for NumOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumOrString::Num(n) => write!(f, "{n}"),
            NumOrString::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for NumOrString {
    fn from(value: u64) -> Self {
        NumOrString::Num(value)
    }
}

impl From<&str> for NumOrString {
    fn from(value: &str) -> Self {
        NumOrString::Str(value.to_string())
    }
}

/// A single port or an inclusive port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    pub min: u16,
    pub max: u16,
}

impl Port {
    pub fn single(port: u16) -> Self {
        Port {
            min: port,
            max: port,
        }
    }

    /// Parse a port number, or a `"min:max"` range string.
    pub fn parse(value: &NumOrString) -> Result<Self, String> {
        match value {
            NumOrString::Num(n) => parse_port_number(*n).map(Port::single),
            NumOrString::Str(s) => match s.split_once(':') {
                Some((min, max)) => {
                    let min = parse_port_str(min)?;
                    let max = parse_port_str(max)?;
                    if min > max {
                        return Err(format!("port range '{s}' has min greater than max"));
                    }
                    Ok(Port { min, max })
                }
                None => parse_port_str(s).map(Port::single),
            },
        }
    }
}

fn parse_port_number(n: u64) -> Result<u16, String> {
    u16::try_from(n).map_err(|_| format!("port {n} is out of range"))
}

fn parse_port_str(s: &str) -> Result<u16, String> {
    let n = s
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("'{s}' is not a port number"))?;
    parse_port_number(n)
}

impl Serialize for Port {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.min == self.max {
            serializer.serialize_u16(self.min)
        } else {
            serializer.serialize_str(&format!("{}:{}", self.min, self.max))
        }
    }
}

/// An IP protocol, by well-known name or by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    IcmpV6,
    Sctp,
    UdpLite,
    Number(u8),
}

impl Protocol {
    /// Parse a v1 protocol. Names are case-insensitive.
    pub fn parse(value: &NumOrString) -> Result<Self, String> {
        match value {
            NumOrString::Num(n) => u8::try_from(*n)
                .map(Protocol::Number)
                .map_err(|_| format!("protocol number {n} is out of range")),
            NumOrString::Str(s) => match s.to_lowercase().as_str() {
                "tcp" => Ok(Protocol::Tcp),
                "udp" => Ok(Protocol::Udp),
                "icmp" => Ok(Protocol::Icmp),
                "icmpv6" => Ok(Protocol::IcmpV6),
                "sctp" => Ok(Protocol::Sctp),
                "udplite" => Ok(Protocol::UdpLite),
                other => other
                    .parse::<u8>()
                    .map(Protocol::Number)
                    .map_err(|_| format!("unknown protocol '{s}'")),
            },
        }
    }
}

impl fmt::Display for Protocol {
    /// The v3 spelling of the protocol.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("TCP"),
            Protocol::Udp => f.write_str("UDP"),
            Protocol::Icmp => f.write_str("ICMP"),
            Protocol::IcmpV6 => f.write_str("ICMPv6"),
            Protocol::Sctp => f.write_str("SCTP"),
            Protocol::UdpLite => f.write_str("UDPLite"),
            Protocol::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Protocol::Number(n) => serializer.serialize_u8(*n),
            named => serializer.collect_str(named),
        }
    }
}

/// A BGP autonomous system number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AsNumber(pub u32);

impl AsNumber {
    /// Parse a plain AS number or the dotted `high.low` notation.
    pub fn parse(value: &NumOrString) -> Result<Self, String> {
        match value {
            NumOrString::Num(n) => u32::try_from(*n)
                .map(AsNumber)
                .map_err(|_| format!("AS number {n} is out of range")),
            NumOrString::Str(s) => match s.split_once('.') {
                Some((high, low)) => {
                    let high = high
                        .parse::<u16>()
                        .map_err(|_| format!("'{s}' is not a valid AS number"))?;
                    let low = low
                        .parse::<u16>()
                        .map_err(|_| format!("'{s}' is not a valid AS number"))?;
                    Ok(AsNumber((u32::from(high) << 16) | u32::from(low)))
                }
                None => s
                    .parse::<u32>()
                    .map(AsNumber)
                    .map_err(|_| format!("'{s}' is not a valid AS number")),
            },
        }
    }
}
