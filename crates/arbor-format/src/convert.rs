//! Conversion between live trees and node records.

use arbor_kernel::{Registry, Tree};
use arbor_types::{Attributes, NodeId};

use crate::error::{FormatError, Result};
use crate::record::NodeRecord;

/// Captures the persisted part of a subtree: kinds, names, hidden flags,
/// attributes and child order. Bindings and runtime state are not recorded.
pub fn to_record(tree: &Tree, id: NodeId) -> Result<NodeRecord> {
    let node = tree
        .node(id)
        .ok_or(arbor_kernel::TreeError::StaleNode(id))?;
    let children = node
        .children()
        .iter()
        .map(|&child| to_record(tree, child))
        .collect::<Result<Vec<_>>>()?;
    if let Some((attribute, _)) = node.attributes().iter().find(|(_, v)| !v.is_finite()) {
        return Err(FormatError::NonFinite {
            path: tree.full_path(id),
            attribute: attribute.clone(),
        });
    }
    Ok(NodeRecord {
        kind: node.kind().to_string(),
        name: node.name().to_string(),
        hidden: node.hidden(),
        attributes: node.attributes().clone(),
        children,
    })
}

/// Builds a tree from a record, creating each component through `registry`.
///
/// Parents are assigned by construction. No lifecycle hook runs here.
pub fn build_tree(record: &NodeRecord, registry: &Registry) -> Result<Tree> {
    let path = format!(".{}", record.name);
    let component = create(record, registry, &path)?;
    let mut tree = Tree::new(component, record.name.clone());
    let root = tree.root();
    apply_record(&mut tree, root, record, &path)?;
    for child in &record.children {
        add_record(&mut tree, root, child, registry, &path)?;
    }
    Ok(tree)
}

fn add_record(
    tree: &mut Tree,
    parent: NodeId,
    record: &NodeRecord,
    registry: &Registry,
    parent_path: &str,
) -> Result<()> {
    let path = format!("{parent_path}.{}", record.name);
    let component = create(record, registry, &path)?;
    let id = tree.add_child(parent, component, record.name.clone())?;
    apply_record(tree, id, record, &path)?;
    for child in &record.children {
        add_record(tree, id, child, registry, &path)?;
    }
    Ok(())
}

fn create(
    record: &NodeRecord,
    registry: &Registry,
    path: &str,
) -> Result<Box<dyn arbor_kernel::Component>> {
    registry
        .create(&record.kind)
        .ok_or_else(|| FormatError::UnknownKind {
            kind: record.kind.clone(),
            path: path.to_string(),
        })
}

/// Overlays persisted attributes on the component's defaults.
///
/// An attribute the component declares must keep its declared type;
/// attributes it does not declare are kept as they are.
fn apply_record(tree: &mut Tree, id: NodeId, record: &NodeRecord, path: &str) -> Result<()> {
    let mut attributes: Attributes = tree
        .node(id)
        .map(|node| node.attributes().clone())
        .unwrap_or_default();
    for (name, value) in &record.attributes {
        if let Some(default) = attributes.get(name)
            && !default.same_type(value)
        {
            return Err(FormatError::AttributeType {
                path: path.to_string(),
                attribute: name.clone(),
                expected: default.value_type(),
                found: value.value_type(),
            });
        }
        attributes.insert(name.clone(), value.clone());
    }
    tree.replace_attributes(id, attributes)?;
    tree.set_hidden(id, record.hidden)?;
    Ok(())
}
