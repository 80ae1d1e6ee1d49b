//! Name rules between the v1 and v3 generations
//!
//! v3 names must be valid DNS subdomains. v1 names were free-form, so every
//! converter funnels its names through these functions.

use std::net::IpAddr;
use std::sync::LazyLock;

use ipnet::IpNet;
use regex::Regex;

static NON_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-.a-z0-9]+").expect("valid regex"));
static DOT_DASH_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.-]*\.[.-]*").expect("valid regex"));
static NON_NAME_NO_DOT_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-a-z0-9]+").expect("valid regex"));
static DASH_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Prefix of v1 profiles generated for Kubernetes namespaces.
const V1_NAMESPACE_PROFILE_PREFIX: &str = "k8s_ns.";
/// Prefix of the same profiles in v3.
const V3_NAMESPACE_PROFILE_PREFIX: &str = "kns.";

/// Convert a free-form v1 name into a valid v3 name.
///
/// Lower-cases the name, replaces runs of invalid characters with `-`,
/// collapses any run of `.`/`-` containing a `.` into a single `.`, and
/// strips leading and trailing separators.
///
/// ```
/// use calicoconv_core::convert::names::convert_name;
///
/// assert_eq!(convert_name("My_Host.Example..COM"), "my-host.example.com");
/// ```
pub fn convert_name(name: &str) -> String {
    let name = name.to_lowercase();
    let name = NON_NAME_CHARS.replace_all(&name, "-");
    let name = DOT_DASH_SEQUENCE.replace_all(&name, ".");
    trim_separators(&name)
}

/// Like [`convert_name`], but dots are not allowed in the result.
pub fn convert_name_no_dots(name: &str) -> String {
    let name = name.to_lowercase();
    let name = NON_NAME_NO_DOT_CHARS.replace_all(&name, "-");
    let name = DASH_SEQUENCE.replace_all(&name, "-");
    trim_separators(&name)
}

fn trim_separators(name: &str) -> String {
    name.trim_matches(|c| c == '-' || c == '.').to_string()
}

pub fn convert_node_name(hostname: &str) -> String {
    convert_name(hostname)
}

/// Profile names keep the namespace profile convention of each generation.
pub fn convert_profile_name(name: &str) -> String {
    match name.strip_prefix(V1_NAMESPACE_PROFILE_PREFIX) {
        Some(namespace) => convert_name(&format!("{V3_NAMESPACE_PROFILE_PREFIX}{namespace}")),
        None => convert_name(name),
    }
}

/// `192.0.2.1` becomes `192-0-2-1`, `2001:db8::1` becomes `2001-db8--1`.
pub fn convert_ip_to_name(ip: &IpAddr) -> String {
    ip.to_string().replace(['.', ':'], "-")
}

/// `10.0.0.0/8` becomes `10-0-0-0-8`.
pub fn convert_net_to_name(net: &IpNet) -> String {
    net.to_string().replace(['.', ':', '/'], "-")
}

/// Identity of a workload endpoint, used to derive its v3 name.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadEndpointIdentifiers<'a> {
    pub node: &'a str,
    pub orchestrator: &'a str,
    pub workload: &'a str,
    pub pod: &'a str,
    pub container_id: &'a str,
    pub endpoint: &'a str,
}

impl WorkloadEndpointIdentifiers<'_> {
    /// Join the identifying segments with `-`, doubling any `-` inside a
    /// segment so that the name stays unambiguous.
    pub fn name(&self) -> String {
        let segments = match self.orchestrator {
            "k8s" => [self.node, "k8s", self.pod, self.endpoint],
            "cni" => [self.node, "cni", self.container_id, self.endpoint],
            other => [self.node, other, self.workload, self.endpoint],
        };

        segments
            .iter()
            .map(|segment| segment.replace('-', "--"))
            .collect::<Vec<_>>()
            .join("-")
    }
}
