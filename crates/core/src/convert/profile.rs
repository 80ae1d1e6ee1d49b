//! Profile conversion
//!
//! v3 profiles have no tags. Each tag becomes an empty-valued label in
//! `labelsToApply`, next to the profile's own labels.

use super::fields::require;
use super::names::convert_profile_name;
use super::rules::{rules_to_backend, rules_to_v3};
use super::{unexpected_kvp, unexpected_resource, Converter, ResourceKind};
use crate::api::v1::V1Resource;
use crate::api::v3::{self, ObjectMeta, V3Resource};
use crate::backend::{self, Key, KvPair, ProfileKey, Value};
use crate::error::ConversionError;

const KIND: &str = ResourceKind::Profile.name();

pub struct ProfileConverter;

impl Converter for ProfileConverter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Profile
    }

    fn to_backend(&self, resource: &V1Resource) -> Result<KvPair, ConversionError> {
        let V1Resource::Profile(profile) = resource else {
            return Err(unexpected_resource(KIND, resource));
        };

        let name = require(KIND, "metadata.name", &profile.metadata.name)?;

        for (i, tag) in profile.metadata.tags.iter().enumerate() {
            require(KIND, &format!("metadata.tags[{i}]"), tag)?;
        }

        let value = backend::Profile {
            inbound_rules: rules_to_backend(KIND, "spec.ingress", &profile.spec.ingress)?,
            outbound_rules: rules_to_backend(KIND, "spec.egress", &profile.spec.egress)?,
            tags: profile.metadata.tags.clone(),
            labels: profile.metadata.labels.clone(),
        };

        Ok(KvPair::new(
            Key::Profile(ProfileKey {
                name: name.to_string(),
            }),
            Value::Profile(value),
        ))
    }

    fn to_v3(&self, kvp: KvPair) -> Result<V3Resource, ConversionError> {
        let (key, value) = match kvp {
            KvPair {
                key: Key::Profile(key),
                value: Value::Profile(value),
            } => (key, value),
            other => return Err(unexpected_kvp(KIND, &other)),
        };

        let mut labels_to_apply = value.labels;
        for tag in value.tags {
            labels_to_apply.entry(tag).or_default();
        }

        let spec = v3::ProfileSpec {
            ingress: rules_to_v3(&value.inbound_rules),
            egress: rules_to_v3(&value.outbound_rules),
            labels_to_apply,
        };

        Ok(V3Resource::Profile(v3::Profile::new(
            v3::KIND_PROFILE,
            ObjectMeta::named(convert_profile_name(&key.name)),
            spec,
        )))
    }
}
