//! Typed extraction of required fields from upstream objects.
//!
//! Every required field is looked up by its dotted path and either yields a
//! typed value or a [`DecodeError`] naming that path.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::serde_json::Value;
use kube::api::DynamicObject;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

impl DecodeError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Returns the object's name or `MissingField("metadata.name")`.
pub fn require_name(meta: &ObjectMeta) -> Result<&str, DecodeError> {
    meta.name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| DecodeError::MissingField("metadata.name".into()))
}

/// Walks `path` (dot separated) inside `root`.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Result<&'a Value, DecodeError> {
    let mut cur = root;
    for seg in path.split('.') {
        cur = match cur {
            Value::Object(map) => map
                .get(seg)
                .ok_or_else(|| DecodeError::MissingField(path.to_string()))?,
            Value::Null => return Err(DecodeError::MissingField(path.to_string())),
            other => {
                return Err(DecodeError::invalid(
                    path,
                    format!("expected object, found {}", type_name(other)),
                ))
            }
        };
    }
    if cur.is_null() {
        return Err(DecodeError::MissingField(path.to_string()));
    }
    Ok(cur)
}

pub fn require_str<'a>(root: &'a Value, path: &str) -> Result<&'a str, DecodeError> {
    let v = lookup(root, path)?;
    v.as_str()
        .ok_or_else(|| DecodeError::invalid(path, format!("expected string, found {}", type_name(v))))
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Identity of a custom resource definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrdMeta {
    pub name: String,
    pub group: String,
    pub version: String,
    pub versions: Vec<String>,
    pub namespaced: bool,
    pub kind: String,
    pub singular: String,
    pub plural: String,
    pub short_names: Vec<String>,
}

impl CrdMeta {
    #[tracing::instrument(skip(obj), fields(name = obj.metadata.name.as_deref().unwrap_or("<none>")))]
    pub fn decode(obj: &DynamicObject) -> Result<Self, DecodeError> {
        let name = require_name(&obj.metadata)?.to_string();
        let spec = lookup(&obj.data, "spec")?;

        let group = require_str(spec, "group")
            .map_err(|e| scoped("spec", e))?
            .to_string();
        let scope = require_str(spec, "scope").map_err(|e| scoped("spec", e))?;

        let names = lookup(spec, "names").map_err(|e| scoped("spec", e))?;
        let kind = require_str(names, "kind")
            .map_err(|e| scoped("spec.names", e))?
            .to_string();
        let plural = require_str(names, "plural")
            .map_err(|e| scoped("spec.names", e))?
            .to_string();
        let singular = match names.get("singular").and_then(Value::as_str) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => kind.to_lowercase(),
        };
        let short_names = names
            .get("shortNames")
            .and_then(Value::as_array)
            .map(|aa| aa.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        let (version, versions) = decode_versions(spec)?;

        Ok(Self {
            name,
            group,
            version,
            versions,
            namespaced: scope == "Namespaced",
            kind,
            singular,
            plural,
            short_names,
        })
    }
}

/// Storage version plus every served version (deprecated ones suffixed with `!`).
fn decode_versions(spec: &Value) -> Result<(String, Vec<String>), DecodeError> {
    let Some(list) = spec.get("versions") else {
        // v1beta1 objects carry a single top-level version.
        let v = require_str(spec, "version").map_err(|e| scoped("spec", e))?;
        return Ok((v.to_string(), vec![v.to_string()]));
    };
    let list = list
        .as_array()
        .ok_or_else(|| DecodeError::invalid("spec.versions", "expected array"))?;

    let mut storage = None;
    let mut served = Vec::with_capacity(list.len());
    for (i, v) in list.iter().enumerate() {
        let name = require_str(v, "name").map_err(|e| scoped(&format!("spec.versions[{i}]"), e))?;
        if v.get("storage").and_then(Value::as_bool).unwrap_or(false) {
            storage = Some(name.to_string());
        }
        if v.get("served").and_then(Value::as_bool).unwrap_or(true) {
            let deprecated = v.get("deprecated").and_then(Value::as_bool).unwrap_or(false);
            served.push(if deprecated { format!("{name}!") } else { name.to_string() });
        }
    }

    let version = storage
        .or_else(|| served.first().map(|s| s.trim_end_matches('!').to_string()))
        .ok_or_else(|| DecodeError::MissingField("spec.versions".into()))?;
    Ok((version, served))
}

fn scoped(prefix: &str, err: DecodeError) -> DecodeError {
    match err {
        DecodeError::MissingField(f) => DecodeError::MissingField(format!("{prefix}.{f}")),
        DecodeError::InvalidField { field, reason } => DecodeError::InvalidField {
            field: format!("{prefix}.{field}"),
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::serde_json::{self, json};

    fn crd(value: Value) -> DynamicObject {
        serde_json::from_value(value).expect("dynamic object")
    }

    fn full_crd() -> Value {
        json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": {"name": "widgets.example.com"},
            "spec": {
                "group": "example.com",
                "scope": "Namespaced",
                "names": {"kind": "Widget", "plural": "widgets", "shortNames": ["wd"]},
                "versions": [
                    {"name": "v1alpha1", "served": true, "storage": false, "deprecated": true},
                    {"name": "v1", "served": true, "storage": true}
                ]
            }
        })
    }

    #[test]
    fn test_decode_crd() {
        let meta = CrdMeta::decode(&crd(full_crd())).expect("decodes");
        assert_eq!(meta.name, "widgets.example.com");
        assert_eq!(meta.group, "example.com");
        assert_eq!(meta.version, "v1");
        assert_eq!(meta.versions, vec!["v1alpha1!", "v1"]);
        assert!(meta.namespaced);
        assert_eq!(meta.singular, "widget");
        assert_eq!(meta.short_names, vec!["wd"]);
    }

    #[test]
    fn test_decode_crd_missing_group() {
        let mut v = full_crd();
        v["spec"].as_object_mut().expect("spec").remove("group");
        assert_eq!(
            CrdMeta::decode(&crd(v)),
            Err(DecodeError::MissingField("spec.group".into()))
        );
    }

    #[test]
    fn test_decode_crd_missing_names_kind() {
        let mut v = full_crd();
        v["spec"]["names"].as_object_mut().expect("names").remove("kind");
        assert_eq!(
            CrdMeta::decode(&crd(v)),
            Err(DecodeError::MissingField("spec.names.kind".into()))
        );
    }

    #[test]
    fn test_decode_crd_wrong_type() {
        let mut v = full_crd();
        v["spec"]["scope"] = json!(42);
        assert!(matches!(
            CrdMeta::decode(&crd(v)),
            Err(DecodeError::InvalidField { field, .. }) if field == "spec.scope"
        ));
    }

    #[test]
    fn test_decode_crd_missing_spec() {
        let v = json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": {"name": "broken.example.com"}
        });
        assert_eq!(
            CrdMeta::decode(&crd(v)),
            Err(DecodeError::MissingField("spec".into()))
        );
    }
}
