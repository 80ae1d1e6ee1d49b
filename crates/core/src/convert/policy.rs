//! Policy conversion
//!
//! v1 policies are cluster-wide, so they become v3 `GlobalNetworkPolicy`
//! resources.

use super::fields::{non_empty, require};
use super::names::convert_name;
use super::rules::{convert_selector, rules_to_backend, rules_to_v3};
use super::{unexpected_kvp, unexpected_resource, Converter, ResourceKind};
use crate::api::v1::V1Resource;
use crate::api::v3::{self, ObjectMeta, V3Resource};
use crate::backend::{self, Key, KvPair, PolicyKey, PolicyType, Value};
use crate::error::ConversionError;

const KIND: &str = ResourceKind::Policy.name();

pub struct PolicyConverter;

impl Converter for PolicyConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Policy
    }

    fn to_backend(&self, resource: &V1Resource) -> Result<KvPair, ConversionError> {
        let V1Resource::Policy(policy) = resource else {
            return Err(unexpected_resource(KIND, resource));
        };

        let name = require(KIND, "metadata.name", &policy.metadata.name)?;
        let spec = &policy.spec;

        if let Some(order) = spec.order {
            if !order.is_finite() {
                return Err(ConversionError::invalid(
                    KIND,
                    "spec.order",
                    format!("{order} is not a finite number"),
                ));
            }
        }

        let types = spec
            .types
            .iter()
            .enumerate()
            .map(|(i, policy_type)| parse_policy_type(&format!("spec.types[{i}]"), policy_type))
            .collect::<Result<Vec<_>, _>>()?;

        let value = backend::Policy {
            order: spec.order,
            inbound_rules: rules_to_backend(KIND, "spec.ingress", &spec.ingress)?,
            outbound_rules: rules_to_backend(KIND, "spec.egress", &spec.egress)?,
            selector: non_empty(spec.selector.as_deref())
                .unwrap_or_default()
                .to_string(),
            do_not_track: spec.do_not_track,
            pre_dnat: spec.pre_dnat,
            apply_on_forward: spec.apply_on_forward,
            types,
            annotations: policy.metadata.annotations.clone(),
        };

        Ok(KvPair::new(
            Key::Policy(PolicyKey {
                name: name.to_string(),
            }),
            Value::Policy(value),
        ))
    }

    fn to_v3(&self, kvp: KvPair) -> Result<V3Resource, ConversionError> {
        let (key, value) = match kvp {
            KvPair {
                key: Key::Policy(key),
                value: Value::Policy(value),
            } => (key, value),
            other => return Err(unexpected_kvp(KIND, &other)),
        };

        let types = if value.types.is_empty() {
            let mut types = vec![v3::PolicyType::Ingress];
            if !value.outbound_rules.is_empty() {
                types.push(v3::PolicyType::Egress);
            }
            types
        } else {
            value
                .types
                .iter()
                .map(|policy_type| match policy_type {
                    PolicyType::Ingress => v3::PolicyType::Ingress,
                    PolicyType::Egress => v3::PolicyType::Egress,
                })
                .collect()
        };

        let metadata = ObjectMeta {
            annotations: value.annotations,
            ..ObjectMeta::named(convert_name(&key.name))
        };

        let spec = v3::GlobalNetworkPolicySpec {
            order: value.order,
            ingress: rules_to_v3(&value.inbound_rules),
            egress: rules_to_v3(&value.outbound_rules),
            selector: convert_selector(&value.selector),
            types,
            do_not_track: value.do_not_track,
            pre_dnat: value.pre_dnat,
            apply_on_forward: value.apply_on_forward,
        };

        Ok(V3Resource::GlobalNetworkPolicy(
            v3::GlobalNetworkPolicy::new(v3::KIND_GLOBAL_NETWORK_POLICY, metadata, spec),
        ))
    }
}

fn parse_policy_type(field: &str, value: &str) -> Result<PolicyType, ConversionError> {
    match value.to_lowercase().as_str() {
        "ingress" => Ok(PolicyType::Ingress),
        "egress" => Ok(PolicyType::Egress),
        _ => Err(ConversionError::invalid(
            KIND,
            field,
            format!("unknown policy type '{value}'"),
        )),
    }
}
