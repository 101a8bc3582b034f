//! Runtime mounting and removal of schema fragments.
//!
//! A schema tree is static by construction, but fragments can be attached
//! or detached between command invocations. Mounting under a missing
//! intermediate path is a schema-construction bug and surfaces as an
//! error rather than being swallowed.

use thiserror::Error;

use crate::types::SchemaNode;

/// Mount/unmount path errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    /// Path is empty.
    #[error("mount path cannot be empty")]
    EmptyPath,
    /// An intermediate or final path segment does not exist.
    #[error("path segment '{segment}' not found under '{parent}'")]
    MissingSegment {
        /// The missing segment.
        segment: String,
        /// Name of the node the lookup ran against.
        parent: String,
    },
    /// A path segment resolved to a leaf field, which cannot hold children.
    #[error("'{segment}' is a field, not a namespace")]
    NotANamespace {
        /// The offending segment.
        segment: String,
    },
}

/// Attaches `node` as the final path segment's child under an existing
/// path prefix.
///
/// The node is renamed to the final segment. If a child with that name
/// already exists it is replaced. All non-terminal segments must already
/// exist and be namespaces.
///
/// # Examples
///
/// ```
/// use schema_shell_core::{FieldSchema, SchemaNode, mount};
///
/// let mut root = SchemaNode::namespace("root");
/// let extra = SchemaNode::namespace("fragment")
///     .with_child(SchemaNode::field("param", FieldSchema::string()));
///
/// mount(&mut root, &["extra"], extra, Some("Mounted fragment")).unwrap();
/// assert!(root.child("extra").is_some());
/// ```
pub fn mount(
    root: &mut SchemaNode,
    path: &[&str],
    mut node: SchemaNode,
    description: Option<&str>,
) -> Result<(), MountError> {
    let (last, prefix) = path.split_last().ok_or(MountError::EmptyPath)?;
    let parent = walk_mut(root, prefix)?;
    let ns = parent
        .as_namespace_mut()
        .ok_or_else(|| MountError::NotANamespace {
            segment: last.to_string(),
        })?;

    node.name = last.to_string();
    if let Some(desc) = description {
        node.description = Some(desc.to_string());
    }
    match ns.children.iter_mut().find(|c| c.name == *last) {
        Some(existing) => *existing = node,
        None => ns.children.push(node),
    }
    Ok(())
}

/// Detaches and returns the node at `path`.
///
/// Fails if any segment along the path is absent.
///
/// # Examples
///
/// ```
/// use schema_shell_core::{SchemaNode, mount, remove};
///
/// let mut root = SchemaNode::namespace("root");
/// mount(&mut root, &["extra"], SchemaNode::namespace("x"), None).unwrap();
///
/// let removed = remove(&mut root, &["extra"]).unwrap();
/// assert_eq!(removed.name, "extra");
/// assert!(root.child("extra").is_none());
/// ```
pub fn remove(root: &mut SchemaNode, path: &[&str]) -> Result<SchemaNode, MountError> {
    let (last, prefix) = path.split_last().ok_or(MountError::EmptyPath)?;
    let parent = walk_mut(root, prefix)?;
    let parent_name = parent.name.clone();
    let ns = parent
        .as_namespace_mut()
        .ok_or_else(|| MountError::NotANamespace {
            segment: last.to_string(),
        })?;

    let index = ns
        .children
        .iter()
        .position(|c| c.name == *last)
        .ok_or_else(|| MountError::MissingSegment {
            segment: last.to_string(),
            parent: parent_name,
        })?;
    Ok(ns.children.remove(index))
}

fn walk_mut<'a>(
    root: &'a mut SchemaNode,
    path: &[&str],
) -> Result<&'a mut SchemaNode, MountError> {
    let mut current = root;
    for segment in path {
        let name = current.name.clone();
        let ns = current
            .as_namespace_mut()
            .ok_or_else(|| MountError::NotANamespace {
                segment: segment.to_string(),
            })?;
        current = ns
            .children
            .iter_mut()
            .find(|c| c.name == *segment)
            .ok_or_else(|| MountError::MissingSegment {
                segment: segment.to_string(),
                parent: name,
            })?;
    }
    Ok(current)
}
