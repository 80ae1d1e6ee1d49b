//! Reading v1 manifests into typed resources
//!
//! A manifest is either a stream of JSON values or a multi-document YAML
//! file. Each document holds one resource or a list of them.

use std::io::Read;

use calicoconv_core::api::v1::V1Resource;
use serde::Deserialize;
use serde_json::Value;

use crate::prelude::*;

/// Filename that selects standard input.
pub const STDIN: &str = "-";

/// Read the whole manifest from a file, or from stdin for `-`.
pub fn read_input(filename: &str) -> std::result::Result<String, Error> {
    let result = if filename == STDIN {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input).map(|_| input)
    } else {
        std::fs::read_to_string(filename)
    };

    result.map_err(|source| Error::Read {
        path: filename.to_string(),
        source,
    })
}

/// Split a manifest into documents and decode every resource in them.
///
/// Documents are numbered from 1 in errors. Empty documents are skipped.
pub fn parse_resources(input: &str) -> std::result::Result<Vec<V1Resource>, Error> {
    let documents = if is_json(input) {
        json_documents(input)?
    } else {
        yaml_documents(input)?
    };

    let mut resources = Vec::new();
    for (index, document) in documents.into_iter().enumerate() {
        let document_number = index + 1;
        for value in expand_list(document) {
            let resource =
                V1Resource::from_value(value).map_err(|source| Error::InvalidDocument {
                    document: document_number,
                    source,
                })?;
            log::debug!(
                "Document {document_number}: decoded a '{}' resource",
                resource.kind()
            );
            resources.push(resource);
        }
    }

    Ok(resources)
}

fn is_json(input: &str) -> bool {
    matches!(input.trim_start().chars().next(), Some('{') | Some('['))
}

fn json_documents(input: &str) -> std::result::Result<Vec<Value>, Error> {
    serde_json::Deserializer::from_str(input)
        .into_iter::<Value>()
        .enumerate()
        .map(|(index, document)| {
            document.map_err(|source| Error::Json {
                document: index + 1,
                source,
            })
        })
        .collect()
}

fn yaml_documents(input: &str) -> std::result::Result<Vec<Value>, Error> {
    serde_yaml::Deserializer::from_str(input)
        .enumerate()
        .map(|(index, document)| {
            Value::deserialize(document).map_err(|source| Error::Yaml {
                document: index + 1,
                source,
            })
        })
        .collect()
}

/// A document is a single resource, a sequence of resources, or a `List`
/// object carrying them in `items`.
fn expand_list(document: Value) -> Vec<Value> {
    match document {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().filter(|item| !item.is_null()).collect(),
        Value::Object(mut object) if is_list_kind(&object) => match object.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        other => vec![other],
    }
}

fn is_list_kind(object: &serde_json::Map<String, Value>) -> bool {
    object
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.eq_ignore_ascii_case("list"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn kinds(resources: &[V1Resource]) -> Vec<&str> {
        resources.iter().map(V1Resource::kind).collect()
    }

    #[test]
    fn test_yaml_multi_document() {
        let input = r#"
apiVersion: v1
kind: profile
metadata:
  name: web
---
apiVersion: v1
kind: ipPool
metadata:
  cidr: 10.0.0.0/8
"#;
        let resources = parse_resources(input).unwrap();
        assert_eq!(kinds(&resources), vec!["profile", "ipPool"]);
    }

    #[test]
    fn test_yaml_skips_empty_documents() {
        let input = "---\n---\nkind: node\nmetadata:\n  name: node1\n---\n";
        let resources = parse_resources(input).unwrap();
        assert_eq!(kinds(&resources), vec!["node"]);
    }

    #[test]
    fn test_yaml_list_document() {
        let input = r#"
- apiVersion: v1
  kind: node
  metadata:
    name: node1
- apiVersion: v1
  kind: bgpPeer
  metadata:
    scope: global
    peerIP: 192.0.2.1
"#;
        let resources = parse_resources(input).unwrap();
        assert_eq!(kinds(&resources), vec!["node", "bgpPeer"]);
    }

    #[test]
    fn test_list_kind_document() {
        let input = r#"
apiVersion: v1
kind: List
items:
  - kind: profile
    metadata:
      name: a
  - kind: profile
    metadata:
      name: b
"#;
        let resources = parse_resources(input).unwrap();
        assert_eq!(kinds(&resources), vec!["profile", "profile"]);
    }

    #[test]
    fn test_json_stream() {
        let input = r#"{"kind": "policy", "metadata": {"name": "a"}}
[{"kind": "profile", "metadata": {"name": "b"}}, {"kind": "Widget"}]"#;
        let resources = parse_resources(input).unwrap();
        assert_eq!(kinds(&resources), vec!["policy", "profile", "Widget"]);
    }

    #[test]
    fn test_yaml_empty_keys() {
        let input = r#"
kind: profile
metadata:
  name: web
  labels:
spec:
---
kind: policy
metadata:
  name: allow-all
spec:
  ingress:
  egress:
"#;
        let resources = parse_resources(input).unwrap();
        assert_eq!(kinds(&resources), vec!["profile", "policy"]);
        match &resources[0] {
            V1Resource::Profile(profile) => {
                assert!(profile.metadata.labels.is_empty());
                assert!(profile.spec.ingress.is_empty());
            }
            other => panic!("expected a profile, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_resources("").unwrap().is_empty());
        assert!(parse_resources("[]").unwrap().is_empty());
    }

    #[test]
    fn test_document_without_kind_names_document() {
        let input = "kind: node\nmetadata:\n  name: a\n---\nmetadata:\n  name: b\n";
        match parse_resources(input) {
            Err(Error::InvalidDocument { document, .. }) => assert_eq!(document, 2),
            other => panic!("expected an invalid document, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_names_document() {
        let input = r#"{"kind": "node"} {"kind": "#;
        match parse_resources(input) {
            Err(Error::Json { document, .. }) => assert_eq!(document, 2),
            other => panic!("expected a JSON error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let input = "kind: node\nmetadata: [unclosed\n";
        assert!(matches!(parse_resources(input), Err(Error::Yaml { .. })));
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "kind: profile\nmetadata:\n  name: web\n").unwrap();

        let input = read_input(file.path().to_str().unwrap()).unwrap();
        let resources = parse_resources(&input).unwrap();
        assert_eq!(kinds(&resources), vec!["profile"]);
    }

    #[test]
    fn test_read_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let path = path.to_str().unwrap();

        match read_input(path) {
            Err(Error::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a read error, got {other:?}"),
        }
    }
}
