//! Policy rules and selectors, shared by profiles and policies
//!
//! v1 rules are nested (`source`/`destination`), the back end stores them
//! flat, and v3 nests them again without tags.

use ipnet::IpNet;

use super::fields::{non_empty, parse_net, parse_port, parse_protocol};
use crate::api::numorstring::{NumOrString, Port};
use crate::api::{v1, v3};
use crate::backend;
use crate::error::ConversionError;

/// v1 label holding a workload's Kubernetes namespace.
pub(crate) const V1_NAMESPACE_LABEL: &str = "calico/k8s_ns";
/// v1 prefix for labels copied from Kubernetes namespaces.
const V1_NAMESPACE_LABEL_PREFIX: &str = "k8s_ns/label/";
/// v3 prefix for labels copied from Kubernetes namespaces.
const V3_NAMESPACE_LABEL_PREFIX: &str = "pcns.";

/// Rewrite the namespace labels a v1 selector refers to.
pub fn convert_selector(selector: &str) -> String {
    selector
        .replace(V1_NAMESPACE_LABEL_PREFIX, V3_NAMESPACE_LABEL_PREFIX)
        .replace(V1_NAMESPACE_LABEL, v3::LABEL_NAMESPACE)
}

/// Convert a list of v1 rules. `field` names the list for diagnostics.
pub fn rules_to_backend(
    kind: &'static str,
    field: &str,
    rules: &[v1::Rule],
) -> Result<Vec<backend::Rule>, ConversionError> {
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| rule_to_backend(kind, &format!("{field}[{i}]"), rule))
        .collect()
}

pub fn rule_to_backend(
    kind: &'static str,
    field: &str,
    rule: &v1::Rule,
) -> Result<backend::Rule, ConversionError> {
    let action = match rule.action.to_lowercase().as_str() {
        "allow" => backend::Action::Allow,
        "deny" => backend::Action::Deny,
        "log" => backend::Action::Log,
        "nexttier" | "pass" => backend::Action::NextTier,
        "" => return Err(ConversionError::missing(kind, format!("{field}.action"))),
        other => {
            return Err(ConversionError::invalid(
                kind,
                format!("{field}.action"),
                format!("unknown action '{other}'"),
            ))
        }
    };

    if let Some(version) = rule.ip_version {
        if version != 4 && version != 6 {
            return Err(ConversionError::invalid(
                kind,
                format!("{field}.ipVersion"),
                format!("must be 4 or 6, got {version}"),
            ));
        }
    }

    let protocol = rule
        .protocol
        .as_ref()
        .map(|p| parse_protocol(kind, &format!("{field}.protocol"), p))
        .transpose()?;
    let not_protocol = rule
        .not_protocol
        .as_ref()
        .map(|p| parse_protocol(kind, &format!("{field}.notProtocol"), p))
        .transpose()?;

    let (icmp_type, icmp_code) = icmp_to_backend(kind, &format!("{field}.icmp"), &rule.icmp)?;
    let (not_icmp_type, not_icmp_code) =
        icmp_to_backend(kind, &format!("{field}.notICMP"), &rule.not_icmp)?;

    let src = Entity::from_v1(kind, &format!("{field}.source"), &rule.source)?;
    let dst = Entity::from_v1(kind, &format!("{field}.destination"), &rule.destination)?;

    Ok(backend::Rule {
        action,
        ip_version: rule.ip_version,
        protocol,
        not_protocol,
        icmp_type,
        icmp_code,
        not_icmp_type,
        not_icmp_code,
        src_tag: src.tag,
        src_nets: src.nets,
        src_selector: src.selector,
        src_ports: src.ports,
        dst_tag: dst.tag,
        dst_nets: dst.nets,
        dst_selector: dst.selector,
        dst_ports: dst.ports,
        not_src_tag: src.not_tag,
        not_src_nets: src.not_nets,
        not_src_selector: src.not_selector,
        not_src_ports: src.not_ports,
        not_dst_tag: dst.not_tag,
        not_dst_nets: dst.not_nets,
        not_dst_selector: dst.not_selector,
        not_dst_ports: dst.not_ports,
    })
}

fn icmp_to_backend(
    kind: &'static str,
    field: &str,
    icmp: &Option<v1::IcmpFields>,
) -> Result<(Option<u8>, Option<u8>), ConversionError> {
    match icmp {
        None => Ok((None, None)),
        Some(v1::IcmpFields {
            icmp_type: None,
            code: Some(_),
        }) => Err(ConversionError::invalid(
            kind,
            format!("{field}.code"),
            "an ICMP code requires an ICMP type",
        )),
        Some(fields) => Ok((fields.icmp_type, fields.code)),
    }
}

/// One side of a rule, parsed but not yet flattened.
struct Entity {
    tag: Option<String>,
    nets: Vec<IpNet>,
    selector: Option<String>,
    ports: Vec<Port>,
    not_tag: Option<String>,
    not_nets: Vec<IpNet>,
    not_selector: Option<String>,
    not_ports: Vec<Port>,
}

impl Entity {
    fn from_v1(
        kind: &'static str,
        field: &str,
        entity: &v1::EntityRule,
    ) -> Result<Self, ConversionError> {
        let owned = |value: &Option<String>| non_empty(value.as_deref()).map(str::to_string);

        Ok(Entity {
            tag: owned(&entity.tag),
            nets: merge_nets(kind, field, "net", &entity.net, "nets", &entity.nets)?,
            selector: owned(&entity.selector),
            ports: parse_ports(kind, &format!("{field}.ports"), &entity.ports)?,
            not_tag: owned(&entity.not_tag),
            not_nets: merge_nets(kind, field, "notNet", &entity.not_net, "notNets", &entity.not_nets)?,
            not_selector: owned(&entity.not_selector),
            not_ports: parse_ports(kind, &format!("{field}.notPorts"), &entity.not_ports)?,
        })
    }
}

/// `net` comes first, followed by `nets`.
fn merge_nets(
    kind: &'static str,
    field: &str,
    single_name: &str,
    single: &Option<String>,
    list_name: &str,
    list: &[String],
) -> Result<Vec<IpNet>, ConversionError> {
    let mut nets = Vec::with_capacity(list.len() + 1);
    if let Some(net) = non_empty(single.as_deref()) {
        nets.push(parse_net(kind, &format!("{field}.{single_name}"), net)?);
    }
    for (i, net) in list.iter().enumerate() {
        nets.push(parse_net(kind, &format!("{field}.{list_name}[{i}]"), net)?);
    }
    Ok(nets)
}

fn parse_ports(
    kind: &'static str,
    field: &str,
    ports: &[NumOrString],
) -> Result<Vec<Port>, ConversionError> {
    ports
        .iter()
        .enumerate()
        .map(|(i, port)| parse_port(kind, &format!("{field}[{i}]"), port))
        .collect()
}

pub fn rule_to_v3(rule: &backend::Rule) -> v3::Rule {
    let action = match rule.action {
        backend::Action::Allow => v3::Action::Allow,
        backend::Action::Deny => v3::Action::Deny,
        backend::Action::Log => v3::Action::Log,
        backend::Action::NextTier => v3::Action::Pass,
    };

    v3::Rule {
        action,
        ip_version: rule.ip_version,
        protocol: rule.protocol,
        icmp: icmp_to_v3(rule.icmp_type, rule.icmp_code),
        not_protocol: rule.not_protocol,
        not_icmp: icmp_to_v3(rule.not_icmp_type, rule.not_icmp_code),
        source: v3::EntityRule {
            nets: nets_to_v3(&rule.src_nets),
            selector: and_has_tag(rule.src_selector.as_deref(), rule.src_tag.as_deref()),
            ports: rule.src_ports.clone(),
            not_nets: nets_to_v3(&rule.not_src_nets),
            not_selector: or_has_tag(rule.not_src_selector.as_deref(), rule.not_src_tag.as_deref()),
            not_ports: rule.not_src_ports.clone(),
        },
        destination: v3::EntityRule {
            nets: nets_to_v3(&rule.dst_nets),
            selector: and_has_tag(rule.dst_selector.as_deref(), rule.dst_tag.as_deref()),
            ports: rule.dst_ports.clone(),
            not_nets: nets_to_v3(&rule.not_dst_nets),
            not_selector: or_has_tag(rule.not_dst_selector.as_deref(), rule.not_dst_tag.as_deref()),
            not_ports: rule.not_dst_ports.clone(),
        },
    }
}

pub fn rules_to_v3(rules: &[backend::Rule]) -> Vec<v3::Rule> {
    rules.iter().map(rule_to_v3).collect()
}

fn icmp_to_v3(icmp_type: Option<u8>, code: Option<u8>) -> Option<v3::IcmpFields> {
    icmp_type.map(|icmp_type| v3::IcmpFields { icmp_type, code })
}

fn nets_to_v3(nets: &[IpNet]) -> Vec<String> {
    nets.iter().map(IpNet::to_string).collect()
}

/// A matching tag must be present in addition to the selector.
fn and_has_tag(selector: Option<&str>, tag: Option<&str>) -> String {
    match (selector.map(convert_selector), tag) {
        (None, None) => String::new(),
        (Some(selector), None) => selector,
        (None, Some(tag)) => format!("has({tag})"),
        (Some(selector), Some(tag)) => format!("({selector}) && has({tag})"),
    }
}

/// Either the not-selector or the not-tag excludes a match.
fn or_has_tag(selector: Option<&str>, tag: Option<&str>) -> String {
    match (selector.map(convert_selector), tag) {
        (None, None) => String::new(),
        (Some(selector), None) => selector,
        (None, Some(tag)) => format!("has({tag})"),
        (Some(selector), Some(tag)) => format!("({selector}) || has({tag})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::numorstring::Protocol;

    fn v1_rule(value: serde_json::Value) -> v1::Rule {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_convert_selector_namespace_labels() {
        assert_eq!(
            convert_selector("calico/k8s_ns == 'prod' && k8s_ns/label/team == 'a'"),
            "projectcalico.org/namespace == 'prod' && pcns.team == 'a'"
        );
    }

    #[test]
    fn test_convert_selector_untouched() {
        assert_eq!(convert_selector("role == 'db'"), "role == 'db'");
    }

    #[test]
    fn test_rule_actions() {
        for (v1_action, expected) in [
            ("allow", v3::Action::Allow),
            ("Deny", v3::Action::Deny),
            ("log", v3::Action::Log),
            ("nextTier", v3::Action::Pass),
            ("pass", v3::Action::Pass),
        ] {
            let rule = v1_rule(serde_json::json!({"action": v1_action}));
            let backend = rule_to_backend("Policy", "spec.ingress[0]", &rule).unwrap();
            assert_eq!(rule_to_v3(&backend).action, expected, "action {v1_action}");
        }
    }

    #[test]
    fn test_rule_unknown_action() {
        let rule = v1_rule(serde_json::json!({"action": "drop"}));
        let err = rule_to_backend("Policy", "spec.ingress[0]", &rule).unwrap_err();
        assert_eq!(err.field(), Some("spec.ingress[0].action"));
    }

    #[test]
    fn test_rule_missing_action() {
        let rule = v1_rule(serde_json::json!({}));
        let err = rule_to_backend("Profile", "spec.egress[2]", &rule).unwrap_err();
        assert_eq!(err, ConversionError::missing("Profile", "spec.egress[2].action"));
    }

    #[test]
    fn test_rule_invalid_ip_version() {
        let rule = v1_rule(serde_json::json!({"action": "allow", "ipVersion": 5}));
        let err = rule_to_backend("Policy", "spec.ingress[0]", &rule).unwrap_err();
        assert_eq!(err.field(), Some("spec.ingress[0].ipVersion"));
    }

    #[test]
    fn test_rule_icmp_code_without_type() {
        let rule = v1_rule(serde_json::json!({"action": "allow", "icmp": {"code": 0}}));
        let err = rule_to_backend("Policy", "spec.ingress[0]", &rule).unwrap_err();
        assert_eq!(err.field(), Some("spec.ingress[0].icmp.code"));
    }

    #[test]
    fn test_rule_flattens_and_renests() {
        let rule = v1_rule(serde_json::json!({
            "action": "allow",
            "ipVersion": 4,
            "protocol": "tcp",
            "icmp": null,
            "notICMP": {"type": 8, "code": 0},
            "source": {
                "tag": "frontend",
                "net": "10.0.0.0/8",
                "nets": ["172.16.0.0/12"],
                "notTag": "quarantine",
                "notSelector": "calico/k8s_ns == 'test'"
            },
            "destination": {
                "selector": "role == 'db'",
                "ports": [5432, "8000:8080"],
                "notNet": "10.9.9.9"
            }
        }));

        let backend = rule_to_backend("Policy", "spec.ingress[0]", &rule).unwrap();
        assert_eq!(backend.src_tag.as_deref(), Some("frontend"));
        assert_eq!(backend.src_nets.len(), 2);
        assert_eq!(backend.dst_ports, vec![Port::single(5432), Port { min: 8000, max: 8080 }]);
        assert_eq!(backend.protocol, Some(Protocol::Tcp));

        let converted = rule_to_v3(&backend);
        assert_eq!(converted.protocol, Some(Protocol::Tcp));
        assert_eq!(converted.icmp, None);
        assert_eq!(
            converted.not_icmp,
            Some(v3::IcmpFields {
                icmp_type: 8,
                code: Some(0)
            })
        );
        assert_eq!(converted.source.nets, vec!["10.0.0.0/8", "172.16.0.0/12"]);
        assert_eq!(converted.source.selector, "has(frontend)");
        assert_eq!(
            converted.source.not_selector,
            "(projectcalico.org/namespace == 'test') || has(quarantine)"
        );
        assert_eq!(converted.destination.selector, "role == 'db'");
        assert_eq!(converted.destination.not_nets, vec!["10.9.9.9/32"]);
    }

    #[test]
    fn test_rule_selector_and_tag_combined() {
        let rule = v1_rule(serde_json::json!({
            "action": "deny",
            "destination": {"selector": "app == 'web'", "tag": "public"}
        }));
        let converted = rule_to_v3(&rule_to_backend("Profile", "spec.ingress[0]", &rule).unwrap());
        assert_eq!(converted.destination.selector, "(app == 'web') && has(public)");
    }

    #[test]
    fn test_rule_invalid_net_names_field() {
        let rule = v1_rule(serde_json::json!({
            "action": "allow",
            "source": {"nets": ["10.0.0.0/8", "bogus"]}
        }));
        let err = rule_to_backend("Policy", "spec.egress[1]", &rule).unwrap_err();
        assert_eq!(err.field(), Some("spec.egress[1].source.nets[1]"));
    }

    #[test]
    fn test_rule_invalid_port_names_field() {
        let rule = v1_rule(serde_json::json!({
            "action": "allow",
            "destination": {"notPorts": [99999]}
        }));
        let err = rule_to_backend("Policy", "spec.ingress[0]", &rule).unwrap_err();
        assert_eq!(err.field(), Some("spec.ingress[0].destination.notPorts[0]"));
    }

    #[test]
    fn test_rules_to_backend_indexes_fields() {
        let rules = vec![
            v1_rule(serde_json::json!({"action": "allow"})),
            v1_rule(serde_json::json!({"action": "explode"})),
        ];
        let err = rules_to_backend("Profile", "spec.ingress", &rules).unwrap_err();
        assert_eq!(err.field(), Some("spec.ingress[1].action"));
    }
}
