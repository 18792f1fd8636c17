//! Version upgrades on the raw JSON document.
//!
//! Upgrades run before typed parsing, one version step at a time:
//!
//! | From | To | Change |
//! |------|----|--------|
//! | 1 | 2 | node key `type` renamed to `kind` |
//! | 2 | 3 | inline scalar properties moved under `attributes` |
//!
//! A document without a `version` key is version 1.

use serde_json::{Map, Value as Json};

use crate::error::{FormatError, Result};
use crate::record::CURRENT_VERSION;

/// Keys that describe node structure rather than node properties.
const STRUCTURAL_KEYS: &[&str] = &["kind", "name", "hidden", "attributes", "children"];

/// Reads the document's declared version.
pub fn document_version(raw: &Json) -> Result<u64> {
    let object = raw
        .as_object()
        .ok_or_else(|| FormatError::Malformed("document is not an object".into()))?;
    match object.get("version") {
        None => Ok(1),
        Some(version) => version
            .as_u64()
            .ok_or_else(|| FormatError::Malformed(format!("invalid version {version}"))),
    }
}

/// Upgrades `raw` in place to [`CURRENT_VERSION`]. Returns the version it started at.
pub fn upgrade(raw: &mut Json) -> Result<u64> {
    let from = document_version(raw)?;
    if from > u64::from(CURRENT_VERSION) {
        return Err(FormatError::UnsupportedVersion {
            found: from,
            supported: CURRENT_VERSION,
        });
    }
    if from == 0 {
        return Err(FormatError::Malformed("version 0 does not exist".into()));
    }

    let mut version = from;
    while version < u64::from(CURRENT_VERSION) {
        let root = raw
            .get_mut("root")
            .ok_or_else(|| FormatError::Malformed("document has no root node".into()))?;
        match version {
            1 => walk(root, &rename_type_to_kind)?,
            2 => walk(root, &move_inline_properties)?,
            other => {
                return Err(FormatError::Malformed(format!(
                    "no upgrade step from version {other}"
                )));
            }
        }
        version += 1;
        tracing::debug!(version, "upgraded document");
    }

    if let Some(object) = raw.as_object_mut() {
        object.insert("version".into(), Json::from(CURRENT_VERSION));
    }
    if from < u64::from(CURRENT_VERSION) {
        tracing::info!(from, to = CURRENT_VERSION, "document upgraded");
    }
    Ok(from)
}

/// Applies `step` to every node object, children after their parent.
fn walk(node: &mut Json, step: &dyn Fn(&mut Map<String, Json>) -> Result<()>) -> Result<()> {
    let object = node
        .as_object_mut()
        .ok_or_else(|| FormatError::Malformed("node is not an object".into()))?;
    step(object)?;
    if let Some(children) = object.get_mut("children") {
        let children = children
            .as_array_mut()
            .ok_or_else(|| FormatError::Malformed("children is not an array".into()))?;
        for child in children {
            walk(child, step)?;
        }
    }
    Ok(())
}

fn rename_type_to_kind(node: &mut Map<String, Json>) -> Result<()> {
    if let Some(kind) = node.remove("type") {
        node.insert("kind".into(), kind);
    }
    Ok(())
}

fn move_inline_properties(node: &mut Map<String, Json>) -> Result<()> {
    let inline: Vec<String> = node
        .keys()
        .filter(|key| !STRUCTURAL_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();
    if inline.is_empty() {
        return Ok(());
    }

    let mut attributes = match node.remove("attributes") {
        Some(Json::Object(existing)) => existing,
        Some(_) => return Err(FormatError::Malformed("attributes is not an object".into())),
        None => Map::new(),
    };
    for key in inline {
        if let Some(value) = node.remove(&key) {
            attributes.insert(key, value);
        }
    }
    node.insert("attributes".into(), Json::Object(attributes));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_version_is_version_one() {
        assert_eq!(document_version(&json!({"root": {}})).unwrap(), 1);
    }

    #[test]
    fn version_one_is_upgraded_through_every_step() {
        let mut raw = json!({
            "root": {
                "type": "Simulations",
                "name": "Simulations",
                "Version": 1,
                "children": [
                    { "type": "Clock", "name": "Clock", "Start": "2000-01-01", "hidden": true }
                ]
            }
        });

        assert_eq!(upgrade(&mut raw).unwrap(), 1);

        assert_eq!(
            raw,
            json!({
                "version": 3,
                "root": {
                    "kind": "Simulations",
                    "name": "Simulations",
                    "attributes": { "Version": 1 },
                    "children": [
                        {
                            "kind": "Clock",
                            "name": "Clock",
                            "hidden": true,
                            "attributes": { "Start": "2000-01-01" }
                        }
                    ]
                }
            })
        );
    }

    #[test]
    fn inline_properties_merge_with_existing_attributes() {
        let mut raw = json!({
            "version": 2,
            "root": { "kind": "Model", "name": "M", "A": 1, "attributes": { "B": 2 } }
        });
        upgrade(&mut raw).unwrap();
        assert_eq!(raw["root"]["attributes"], json!({ "A": 1, "B": 2 }));
    }

    #[test]
    fn current_version_is_left_alone() {
        let original = json!({
            "version": 3,
            "root": { "kind": "Model", "name": "M", "attributes": { "A": 1 } }
        });
        let mut raw = original.clone();
        assert_eq!(upgrade(&mut raw).unwrap(), 3);
        assert_eq!(raw, original);
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut raw = json!({ "version": 9, "root": {} });
        assert!(matches!(
            upgrade(&mut raw),
            Err(FormatError::UnsupportedVersion { found: 9, supported: 3 })
        ));
    }

    #[test]
    fn non_object_children_are_malformed() {
        let mut raw = json!({ "root": { "type": "Model", "name": "M", "children": 4 } });
        assert!(matches!(upgrade(&mut raw), Err(FormatError::Malformed(_))));
    }
}
