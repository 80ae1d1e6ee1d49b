//! Kind dispatch and the two-stage conversion pipeline
//!
//! Every convertible kind has a [`Converter`]: stage one turns a v1 resource
//! into a back-end [`KvPair`], stage two turns that pair into a v3 resource.
//! [`convert_all`] drives both stages over a batch and stops at the first
//! error, returning no partial output.

pub mod bgp_peer;
pub mod fields;
pub mod host_endpoint;
pub mod ip_pool;
pub mod names;
pub mod node;
pub mod policy;
pub mod profile;
pub mod rules;
pub mod workload_endpoint;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::api::v1::V1Resource;
use crate::api::v3::{self, V3Resource};
use crate::backend::KvPair;
use crate::error::{ConversionError, Error};
use crate::printer::Printer;

pub use bgp_peer::BgpPeerConverter;
pub use host_endpoint::HostEndpointConverter;
pub use ip_pool::IpPoolConverter;
pub use node::NodeConverter;
pub use policy::PolicyConverter;
pub use profile::ProfileConverter;
pub use workload_endpoint::WorkloadEndpointConverter;

/// The two-stage v1 → back end → v3 transformation of one kind.
///
/// Implementations hold no state, so one instance serves every resource of
/// its kind.
pub trait Converter: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Validate a v1 resource and restructure it into its storage form.
    fn to_backend(&self, resource: &V1Resource) -> Result<KvPair, ConversionError>;

    /// Map a storage form into the v3 resource.
    fn to_v3(&self, kvp: KvPair) -> Result<V3Resource, ConversionError>;
}

/// The closed set of convertible kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Node,
    HostEndpoint,
    WorkloadEndpoint,
    Profile,
    Policy,
    IpPool,
    BgpPeer,
}

/// Lower-case v1 kind names and the kind each one selects.
const KIND_TABLE: [(&str, ResourceKind); 7] = [
    ("node", ResourceKind::Node),
    ("hostendpoint", ResourceKind::HostEndpoint),
    ("workloadendpoint", ResourceKind::WorkloadEndpoint),
    ("profile", ResourceKind::Profile),
    ("policy", ResourceKind::Policy),
    ("ippool", ResourceKind::IpPool),
    ("bgppeer", ResourceKind::BgpPeer),
];

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Node,
        ResourceKind::HostEndpoint,
        ResourceKind::WorkloadEndpoint,
        ResourceKind::Profile,
        ResourceKind::Policy,
        ResourceKind::IpPool,
        ResourceKind::BgpPeer,
    ];

    /// Look up a declared kind, ignoring case.
    pub fn parse(kind: &str) -> Option<Self> {
        let kind = kind.to_lowercase();
        KIND_TABLE
            .iter()
            .find(|(name, _)| *name == kind)
            .map(|(_, resource_kind)| *resource_kind)
    }

    /// The lower-case name this kind is dispatched on.
    pub fn v1_name(self) -> &'static str {
        KIND_TABLE
            .iter()
            .find(|(_, resource_kind)| *resource_kind == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }

    /// Display name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::Node => "Node",
            ResourceKind::HostEndpoint => "HostEndpoint",
            ResourceKind::WorkloadEndpoint => "WorkloadEndpoint",
            ResourceKind::Profile => "Profile",
            ResourceKind::Policy => "Policy",
            ResourceKind::IpPool => "IPPool",
            ResourceKind::BgpPeer => "BGPPeer",
        }
    }

    /// The v3 kind resources of this kind convert to.
    pub const fn v3_kind(self) -> &'static str {
        match self {
            ResourceKind::Node => v3::KIND_NODE,
            ResourceKind::HostEndpoint => v3::KIND_HOST_ENDPOINT,
            ResourceKind::WorkloadEndpoint => v3::KIND_WORKLOAD_ENDPOINT,
            ResourceKind::Profile => v3::KIND_PROFILE,
            ResourceKind::Policy => v3::KIND_GLOBAL_NETWORK_POLICY,
            ResourceKind::IpPool => v3::KIND_IP_POOL,
            ResourceKind::BgpPeer => v3::KIND_BGP_PEER,
        }
    }

    pub fn converter(self) -> &'static dyn Converter {
        match self {
            ResourceKind::Node => &NodeConverter,
            ResourceKind::HostEndpoint => &HostEndpointConverter,
            ResourceKind::WorkloadEndpoint => &WorkloadEndpointConverter,
            ResourceKind::Profile => &ProfileConverter,
            ResourceKind::Policy => &PolicyConverter,
            ResourceKind::IpPool => &IpPoolConverter,
            ResourceKind::BgpPeer => &BgpPeerConverter,
        }
    }
}

/// Resolve the converter for a declared kind.
///
/// Fails with [`Error::UnsupportedKind`] carrying `kind` verbatim.
pub fn dispatch(kind: &str) -> Result<&'static dyn Converter, Error> {
    ResourceKind::parse(kind)
        .map(ResourceKind::converter)
        .ok_or_else(|| Error::UnsupportedKind(kind.to_string()))
}

/// Run both conversion stages on a single resource.
pub fn convert_resource(resource: &V1Resource) -> Result<V3Resource, Error> {
    let converter = dispatch(resource.kind())?;
    let kvp = converter.to_backend(resource)?;
    let converted = converter.to_v3(kvp)?;
    Ok(converted)
}

/// Convert a batch in order.
///
/// Either every resource converts and the output lines up one-to-one with
/// the input, or the first error is returned and nothing else.
pub fn convert_all(resources: &[V1Resource]) -> Result<Vec<V3Resource>, Error> {
    resources.iter().map(convert_resource).collect()
}

/// Convert a batch and hand the result to `printer`.
///
/// The printer is only called when the whole batch converted. Its failure is
/// returned as [`Error::Printer`].
pub fn convert_and_print<P: Printer + ?Sized>(
    resources: &[V1Resource],
    printer: &mut P,
) -> Result<(), Error> {
    let converted = convert_all(resources)?;
    printer.print(&converted)?;
    Ok(())
}

/// Error for a converter handed a v1 resource of another kind.
pub(crate) fn unexpected_resource(kind: &'static str, resource: &V1Resource) -> ConversionError {
    ConversionError::unexpected(kind, format!("a v1 '{}' resource", resource.kind()))
}

/// Error for a converter handed a back-end pair of another kind.
pub(crate) fn unexpected_kvp(kind: &'static str, kvp: &KvPair) -> ConversionError {
    ConversionError::unexpected(kind, format!("the back-end key {}", kvp.key))
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::printer::PrinterError;

    // ============================================================================
    // dispatch tests
    // ============================================================================

    #[test]
    fn test_dispatch_all_kinds_in_any_case() {
        for (name, expected) in KIND_TABLE {
            for spelling in [
                name.to_string(),
                name.to_uppercase(),
                expected.name().to_string(),
            ] {
                let converter = dispatch(&spelling).unwrap();
                assert_eq!(converter.kind(), expected, "dispatching '{spelling}'");
            }
        }
    }

    #[test]
    fn test_dispatch_camel_case_v1_kinds() {
        for (spelling, expected) in [
            ("hostEndpoint", ResourceKind::HostEndpoint),
            ("workloadEndpoint", ResourceKind::WorkloadEndpoint),
            ("ipPool", ResourceKind::IpPool),
            ("bgpPeer", ResourceKind::BgpPeer),
            ("NoDe", ResourceKind::Node),
        ] {
            assert_eq!(dispatch(spelling).unwrap().kind(), expected);
        }
    }

    #[test]
    fn test_dispatch_unsupported_kind_keeps_spelling() {
        match dispatch("Widget") {
            Err(Error::UnsupportedKind(kind)) => assert_eq!(kind, "Widget"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(converter) => panic!("unexpected converter for {:?}", converter.kind()),
        }
    }

    #[test]
    fn test_dispatch_rejects_v3_only_kinds() {
        assert!(dispatch("GlobalNetworkPolicy").is_err());
        assert!(dispatch("").is_err());
        assert!(dispatch("node ").is_err());
    }

    #[test]
    fn test_dispatch_twice_is_equivalent() {
        let profile = fixtures::profile("web");
        let first = dispatch("profile").unwrap();
        let second = dispatch("PROFILE").unwrap();

        let a = first.to_v3(first.to_backend(&profile).unwrap()).unwrap();
        let b = second.to_v3(second.to_backend(&profile).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resource_kind_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(kind.v1_name()), Some(kind));
            assert_eq!(kind.converter().kind(), kind);
        }
        assert_eq!(ResourceKind::Policy.v3_kind(), "GlobalNetworkPolicy");
        assert_eq!(ResourceKind::IpPool.name(), "IPPool");
    }

    // ============================================================================
    // convert_all tests
    // ============================================================================

    #[test]
    fn test_convert_all_empty_batch() {
        let converted = convert_all(&[]).unwrap();
        assert!(converted.is_empty());
    }

    #[test]
    fn test_convert_all_preserves_order() {
        let batch = vec![
            fixtures::ip_pool("10.0.0.0/16"),
            fixtures::node("node1"),
            fixtures::policy("allow-dns"),
            fixtures::profile("web"),
            fixtures::bgp_peer_global("192.0.2.1"),
            fixtures::host_endpoint("node1", "eth0"),
            fixtures::workload_endpoint("node1"),
        ];

        let converted = convert_all(&batch).unwrap();
        assert_eq!(converted.len(), batch.len());

        let kinds: Vec<&str> = converted.iter().map(V3Resource::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "IPPool",
                "Node",
                "GlobalNetworkPolicy",
                "Profile",
                "BGPPeer",
                "HostEndpoint",
                "WorkloadEndpoint"
            ]
        );

        for (input, output) in batch.iter().zip(&converted) {
            assert_eq!(&convert_resource(input).unwrap(), output);
        }
    }

    #[test]
    fn test_convert_all_mixed_batch_with_bad_kind() {
        let batch = vec![
            fixtures::node("node1"),
            fixtures::unrecognized("widget"),
            fixtures::policy("allow-dns"),
        ];

        match convert_all(&batch) {
            Err(Error::UnsupportedKind(kind)) => assert_eq!(kind, "widget"),
            other => panic!("expected unsupported kind, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_all_fails_on_last_resource() {
        let mut bad_node = fixtures::node("node1");
        if let V1Resource::Node(node) = &mut bad_node {
            node.metadata.name.clear();
        }
        let batch = vec![
            fixtures::profile("a"),
            fixtures::profile("b"),
            fixtures::profile("c"),
            bad_node,
        ];

        match convert_all(&batch) {
            Err(Error::Conversion(err)) => {
                assert_eq!(err, ConversionError::missing("Node", "metadata.name"));
            }
            other => panic!("expected conversion error, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_all_stops_at_first_error() {
        let batch = vec![
            fixtures::unrecognized("First"),
            fixtures::unrecognized("Second"),
        ];

        match convert_all(&batch) {
            Err(Error::UnsupportedKind(kind)) => assert_eq!(kind, "First"),
            other => panic!("expected unsupported kind, got {other:?}"),
        }
    }

    // ============================================================================
    // convert_and_print tests
    // ============================================================================

    #[derive(Default)]
    struct RecordingPrinter {
        batches: Vec<Vec<V3Resource>>,
    }

    impl Printer for RecordingPrinter {
        fn print(&mut self, resources: &[V3Resource]) -> Result<(), PrinterError> {
            self.batches.push(resources.to_vec());
            Ok(())
        }
    }

    struct FailingPrinter;

    impl Printer for FailingPrinter {
        fn print(&mut self, _: &[V3Resource]) -> Result<(), PrinterError> {
            Err(PrinterError::new("stdout closed"))
        }
    }

    #[test]
    fn test_convert_and_print_hands_over_batch() {
        let mut printer = RecordingPrinter::default();
        convert_and_print(&[fixtures::profile("web"), fixtures::node("node1")], &mut printer)
            .unwrap();

        assert_eq!(printer.batches.len(), 1);
        let kinds: Vec<&str> = printer.batches[0].iter().map(V3Resource::kind).collect();
        assert_eq!(kinds, vec!["Profile", "Node"]);
    }

    #[test]
    fn test_convert_and_print_skips_printer_on_error() {
        let mut printer = RecordingPrinter::default();
        let result = convert_and_print(
            &[fixtures::profile("web"), fixtures::unrecognized("Widget")],
            &mut printer,
        );
        assert!(matches!(result, Err(Error::UnsupportedKind(_))));
        assert!(printer.batches.is_empty());
    }

    #[test]
    fn test_convert_and_print_surfaces_printer_error() {
        match convert_and_print(&[fixtures::profile("web")], &mut FailingPrinter) {
            Err(Error::Printer(err)) => assert_eq!(err, PrinterError::new("stdout closed")),
            other => panic!("expected printer error, got {other:?}"),
        }
    }

    #[test]
    fn test_converter_rejects_other_kind() {
        let err = NodeConverter
            .to_backend(&fixtures::profile("web"))
            .unwrap_err();
        assert_eq!(
            err,
            ConversionError::unexpected("Node", "a v1 'profile' resource")
        );
    }

    #[test]
    fn test_converter_rejects_other_kvp() {
        let kvp = ProfileConverter
            .to_backend(&fixtures::profile("web"))
            .unwrap();
        let err = IpPoolConverter.to_v3(kvp).unwrap_err();
        assert_eq!(
            err,
            ConversionError::unexpected("IPPool", "the back-end key /calico/v1/policy/profile/web")
        );
    }
}
