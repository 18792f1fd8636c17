//! Address resolution.
//!
//! Turns an [`Address`] into a [`VariableHandle`] that can read and write the
//! node or member it names. Resolution starts at the requesting node, or at
//! the tree root for absolute addresses, and walks one segment at a time:
//!
//! - `ident` selects a child by name, else a member of the current node
//!   (attributes, then component members, then `Name`, `Kind`, `FullPath`,
//!   `Hidden`), else a field of the current record value.
//! - `[q]` after a node selects its child named `q`; after a list it indexes
//!   the list; after a record it selects a field.
//! - A bare `[Name]` segment finds the first node with that name visible from
//!   the current node's scope.
//!
//! Handles are never cached by the locator. A handle whose node has since
//! been removed fails with [`PathError::Stale`].

use arbor_types::{NodeId, Value, ValueType};

use crate::{address::Address, component::MemberWrite, error::PathError, tree::Tree};

/// Result of reading an address.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Node(NodeId),
    Value(Value),
}

/// Step into a member value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Field(String),
    Index(usize),
}

/// What a handle points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    Member {
        node: NodeId,
        member: String,
        path: Vec<Accessor>,
    },
}

/// A resolved address with live read/write access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableHandle {
    address: String,
    target: Target,
}

impl VariableHandle {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The node that owns the target.
    pub fn node(&self) -> NodeId {
        match &self.target {
            Target::Node(id) | Target::Member { node: id, .. } => *id,
        }
    }

    pub fn get(&self, tree: &Tree) -> Result<Resolved, PathError> {
        if !tree.contains(self.node()) {
            return Err(self.stale());
        }
        match &self.target {
            Target::Node(id) => Ok(Resolved::Node(*id)),
            Target::Member { node, member, path } => {
                let whole = read_member(tree, *node, member).ok_or_else(|| self.not_found(member))?;
                let mut current = &whole;
                for accessor in path {
                    current = access(current, accessor).ok_or_else(|| self.not_found(member))?;
                }
                Ok(Resolved::Value(current.clone()))
            }
        }
    }

    /// Writes `value` to the target. The value must have the target's exact type.
    pub fn set(&self, tree: &mut Tree, value: Value) -> Result<(), PathError> {
        if !tree.contains(self.node()) {
            return Err(self.stale());
        }
        if !value.is_finite() {
            return Err(PathError::NonFinite {
                address: self.address.clone(),
            });
        }
        let Target::Member { node, member, path } = &self.target else {
            return Err(PathError::NotAValue {
                address: self.address.clone(),
            });
        };
        if path.is_empty() {
            return write_member(tree, *node, member, value, &self.address);
        }

        let mut whole = read_member(tree, *node, member).ok_or_else(|| self.not_found(member))?;
        let mut leaf = &mut whole;
        for accessor in path {
            leaf = access_mut(leaf, accessor).ok_or_else(|| self.not_found(member))?;
        }
        check_type(&self.address, leaf.value_type(), &value)?;
        *leaf = value;
        write_member(tree, *node, member, whole, &self.address)
    }

    fn stale(&self) -> PathError {
        PathError::Stale {
            address: self.address.clone(),
        }
    }

    fn not_found(&self, segment: &str) -> PathError {
        PathError::NotFound {
            address: self.address.clone(),
            segment: segment.to_string(),
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

enum Cursor {
    Node(NodeId),
    Member {
        node: NodeId,
        member: String,
        path: Vec<Accessor>,
        value: Value,
    },
}

impl Cursor {
    fn into_target(self) -> Target {
        match self {
            Cursor::Node(id) => Target::Node(id),
            Cursor::Member {
                node, member, path, ..
            } => Target::Member { node, member, path },
        }
    }
}

/// Resolves `address` relative to `from`.
pub fn resolve(tree: &Tree, from: NodeId, address: &str) -> Result<VariableHandle, PathError> {
    let parsed = Address::parse(address)?;
    if !tree.contains(from) {
        return Err(PathError::Stale {
            address: address.to_string(),
        });
    }
    let not_found = |segment: String| PathError::NotFound {
        address: address.to_string(),
        segment,
    };

    let mut segments = parsed.segments().iter();
    let mut cursor = Cursor::Node(from);

    if parsed.is_absolute() {
        let root = tree.root();
        let first = segments
            .next()
            .ok_or_else(|| not_found(address.to_string()))?;
        if first.name.as_deref() != tree.name(root) {
            return Err(not_found(first.to_string()));
        }
        cursor = Cursor::Node(root);
        for qualifier in &first.qualifiers {
            cursor = step_qualifier(tree, cursor, qualifier)
                .ok_or_else(|| not_found(first.to_string()))?;
        }
    }

    for segment in segments {
        let mut qualifiers = segment.qualifiers.as_slice();
        cursor = match &segment.name {
            Some(name) => step_name(tree, cursor, name),
            None => match (cursor, qualifiers.split_first()) {
                (Cursor::Node(id), Some((first, rest))) => {
                    qualifiers = rest;
                    find_by_name(tree, id, first).map(Cursor::Node)
                }
                _ => None,
            },
        }
        .ok_or_else(|| not_found(segment.to_string()))?;

        for qualifier in qualifiers {
            cursor = step_qualifier(tree, cursor, qualifier)
                .ok_or_else(|| not_found(segment.to_string()))?;
        }
    }

    Ok(VariableHandle {
        address: address.to_string(),
        target: cursor.into_target(),
    })
}

fn step_name(tree: &Tree, cursor: Cursor, name: &str) -> Option<Cursor> {
    match cursor {
        Cursor::Node(id) => {
            if let Some(child) = tree.child_by_name(id, name) {
                return Some(Cursor::Node(child));
            }
            let value = read_member(tree, id, name)?;
            Some(Cursor::Member {
                node: id,
                member: name.to_string(),
                path: Vec::new(),
                value,
            })
        }
        member => descend(member, Accessor::Field(name.to_string())),
    }
}

fn step_qualifier(tree: &Tree, cursor: Cursor, qualifier: &str) -> Option<Cursor> {
    match cursor {
        Cursor::Node(id) => tree.child_by_name(id, qualifier).map(Cursor::Node),
        Cursor::Member { ref value, .. } => {
            let accessor = match value {
                Value::List(_) => Accessor::Index(qualifier.parse().ok()?),
                _ => Accessor::Field(qualifier.to_string()),
            };
            descend(cursor, accessor)
        }
    }
}

fn descend(cursor: Cursor, accessor: Accessor) -> Option<Cursor> {
    let Cursor::Member {
        node,
        member,
        mut path,
        value,
    } = cursor
    else {
        return None;
    };
    let next = access(&value, &accessor)?.clone();
    path.push(accessor);
    Some(Cursor::Member {
        node,
        member,
        path,
        value: next,
    })
}

fn access<'v>(value: &'v Value, accessor: &Accessor) -> Option<&'v Value> {
    match (value, accessor) {
        (Value::Record(fields), Accessor::Field(name)) => fields.get(name),
        (Value::List(items), Accessor::Index(i)) => items.get(*i),
        _ => None,
    }
}

fn access_mut<'v>(value: &'v mut Value, accessor: &Accessor) -> Option<&'v mut Value> {
    match (value, accessor) {
        (Value::Record(fields), Accessor::Field(name)) => fields.get_mut(name),
        (Value::List(items), Accessor::Index(i)) => items.get_mut(*i),
        _ => None,
    }
}

// ============================================================================
// Members
// ============================================================================

fn read_member(tree: &Tree, id: NodeId, member: &str) -> Option<Value> {
    let node = tree.node(id)?;
    if let Some(value) = node.attribute(member) {
        return Some(value.clone());
    }
    if let Some(value) = node.component().and_then(|c| c.member(member)) {
        return Some(value);
    }
    match member {
        "Name" => Some(Value::Text(node.name().to_string())),
        "Kind" => Some(Value::Text(node.kind().to_string())),
        "FullPath" => Some(Value::Text(tree.full_path(id))),
        "Hidden" => Some(Value::Bool(node.hidden())),
        _ => None,
    }
}

fn write_member(
    tree: &mut Tree,
    id: NodeId,
    member: &str,
    value: Value,
    address: &str,
) -> Result<(), PathError> {
    let stale = || PathError::Stale {
        address: address.to_string(),
    };
    let node = tree.node_mut(id).ok_or_else(stale)?;

    if let Some(current) = node.attributes.get_mut(member) {
        check_type(address, current.value_type(), &value)?;
        *current = value;
        return Ok(());
    }

    if let Some(component) = node.component_mut() {
        let found = value.value_type();
        match component.set_member(member, value.clone()) {
            MemberWrite::Written => return Ok(()),
            MemberWrite::Unknown => {}
            MemberWrite::ReadOnly => {
                return Err(PathError::ReadOnly {
                    address: address.to_string(),
                });
            }
            MemberWrite::Mismatch(expected) => {
                return Err(PathError::TypeMismatch {
                    address: address.to_string(),
                    expected,
                    found,
                });
            }
        }
    }

    match (member, value) {
        ("Name", Value::Text(name)) => node.name = name,
        ("Hidden", Value::Bool(hidden)) => node.hidden = hidden,
        ("Name", other) => return check_type(address, ValueType::Text, &other),
        ("Hidden", other) => return check_type(address, ValueType::Bool, &other),
        ("Kind" | "FullPath", _) => {
            return Err(PathError::ReadOnly {
                address: address.to_string(),
            });
        }
        _ => {
            return Err(PathError::NotFound {
                address: address.to_string(),
                segment: member.to_string(),
            });
        }
    }
    Ok(())
}

fn check_type(address: &str, expected: ValueType, value: &Value) -> Result<(), PathError> {
    let found = value.value_type();
    if found == expected {
        Ok(())
    } else {
        Err(PathError::TypeMismatch {
            address: address.to_string(),
            expected,
            found,
        })
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Reads the node or value at `address`.
pub fn get(tree: &Tree, from: NodeId, address: &str) -> Result<Resolved, PathError> {
    resolve(tree, from, address)?.get(tree)
}

/// Reads a value, failing if the address names a node.
pub fn get_value(tree: &Tree, from: NodeId, address: &str) -> Result<Value, PathError> {
    match get(tree, from, address)? {
        Resolved::Value(value) => Ok(value),
        Resolved::Node(_) => Err(PathError::NotAValue {
            address: address.to_string(),
        }),
    }
}

/// Finds the node at `address`, failing if the address names a value.
pub fn find(tree: &Tree, from: NodeId, address: &str) -> Result<NodeId, PathError> {
    match resolve(tree, from, address)?.target {
        Target::Node(id) => Ok(id),
        Target::Member { .. } => Err(PathError::NotANode {
            address: address.to_string(),
        }),
    }
}

/// Writes `value` at `address` with a strict type check.
pub fn set(tree: &mut Tree, from: NodeId, address: &str, value: Value) -> Result<(), PathError> {
    let handle = resolve(tree, from, address)?;
    handle.set(tree, value)?;
    tracing::debug!(address, node = %tree.full_path(handle.node()), "set value");
    Ok(())
}

/// First node named `name` visible from `from`, in pre-order.
pub fn find_by_name(tree: &Tree, from: NodeId, name: &str) -> Option<NodeId> {
    tree.visible_from(from)
        .into_iter()
        .find(|&id| tree.name(id) == Some(name))
}

/// First node satisfying `declared` visible from `from`, in pre-order.
pub fn find_by_type(tree: &Tree, from: NodeId, declared: &str) -> Option<NodeId> {
    tree.visible_from(from)
        .into_iter()
        .find(|&id| tree.node(id).is_some_and(|n| n.satisfies(declared)))
}

/// Every node satisfying `declared` visible from `from`, in pre-order.
pub fn find_all_by_type(tree: &Tree, from: NodeId, declared: &str) -> Vec<NodeId> {
    tree.visible_from(from)
        .into_iter()
        .filter(|&id| tree.node(id).is_some_and(|n| n.satisfies(declared)))
        .collect()
}
