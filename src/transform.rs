//! Structural transforms over document trees
//!
//! All in-place transforms take `&mut Node`, so the borrow checker
//! guarantees exclusive ownership of the tree for the duration of the
//! mutation; the codec encoders are pure and return fresh trees.

use crate::node::{Node, Object};

/// Merge each element's attributes into its child entries, recursively.
/// An attribute key colliding with an existing child overwrites it; the
/// transform is a no-op on an already collapsed tree.
pub fn collapse_attributes(node: &mut Node) {
    match node {
        Node::Object(obj) => {
            let attrs = std::mem::take(obj.attributes_mut());
            for (key, value) in attrs {
                obj.insert(key, Node::Scalar(value));
            }
            for (_name, child) in obj.iter_mut() {
                collapse_attributes(child);
            }
        }
        Node::Array(items) => {
            for item in items {
                collapse_attributes(item);
            }
        }
        Node::Scalar(_) => {}
    }
}

/// Promote the elements stored under `element` to named siblings keyed by
/// each element's `key` field.
///
/// A single object carrying the key counts as a one-element list. Elements
/// are processed from the last index down to the first and prepended on
/// name collision, which keeps colliding elements in their original
/// relative order; distinct new names end up in reverse encounter order.
/// With `compress`, an element reduced to a single scalar field after key
/// removal collapses to that scalar. Once any element has been promoted
/// the whole `element` slot is removed, dropping elements that lacked the
/// key. `recursive` descends depth-first into every remaining child.
pub fn index_by(node: &mut Node, element: &str, key: &str, recursive: bool, compress: bool) {
    if let Node::Object(obj) = node {
        reindex(obj, element, key, compress);
    }
    if recursive {
        match node {
            Node::Object(obj) => {
                for (_name, child) in obj.iter_mut() {
                    index_by(child, element, key, recursive, compress);
                }
            }
            Node::Array(items) => {
                for item in items {
                    index_by(item, element, key, recursive, compress);
                }
            }
            Node::Scalar(_) => {}
        }
    }
}

fn reindex(obj: &mut Object, element: &str, key: &str, compress: bool) {
    // a single object that carries the key counts as a one-element list
    if let Some(child) = obj.get_mut(element) {
        if matches!(child, Node::Object(o) if o.scalar_field(key).is_some()) {
            let single = std::mem::take(child);
            *child = Node::Array(vec![single]);
        }
    }

    let keyed = match obj.get(element) {
        Some(Node::Array(items)) => items
            .iter()
            .any(|e| e.as_object().is_some_and(|o| o.scalar_field(key).is_some())),
        _ => false,
    };
    if !keyed {
        return;
    }

    let Some(Node::Array(items)) = obj.remove(element) else {
        return;
    };
    for elem in items.into_iter().rev() {
        let Node::Object(mut inner) = elem else {
            continue;
        };
        let Some(new_name) = inner.remove_field(key) else {
            continue;
        };
        let payload = if compress {
            compress_single(inner)
        } else {
            Node::Object(inner)
        };
        obj.prepend_child(new_name, payload);
    }
}

/// Collapse an element down to its value when exactly one scalar field
/// remains: a lone scalar child, a lone attribute, or the own text
fn compress_single(obj: Object) -> Node {
    if obj.field_count() == 1 {
        if let Some(text) = obj.text() {
            return Node::Scalar(text.to_owned());
        }
        if let Some((_name, value)) = obj.attributes().iter().next() {
            return Node::Scalar(value.clone());
        }
        if let Some((_name, Node::Scalar(value))) = obj.iter().next() {
            return Node::Scalar(value.clone());
        }
    }
    Node::Object(obj)
}

/// Expand `ParameterGroup`/`Parameter` encodings into a natural nested
/// mapping: groups are promoted by their `Name` field, then parameters,
/// the latter compressing down to bare scalar values
pub fn expand_parameter_nodes(node: &mut Node) {
    index_by(node, "ParameterGroup", "Name", true, false);
    index_by(node, "Parameter", "Name", true, true);
}

/// Encode a nested mapping as `ParameterGroup`/`Parameter` elements.
///
/// Nested mappings become groups carrying a `Name` attribute, recursing
/// with a decremented depth budget (a non-positive budget yields an empty
/// object). Lists repeat the encoding per element in order. Scalars become
/// parameters carrying `Name` and `Value` attributes, except values
/// containing a newline or a double quote, which are carried as element
/// text instead.
pub fn make_parameter_nodes(tree: &Node, max_depth: i32) -> Node {
    let mut out = Object::new();
    if max_depth <= 0 {
        return Node::Object(out);
    }
    let Some(src) = tree.as_object() else {
        return Node::Object(out);
    };

    for (key, value) in src.iter() {
        encode_entry(&mut out, key, value, max_depth);
    }
    Node::Object(out)
}

fn encode_entry(out: &mut Object, key: &str, value: &Node, max_depth: i32) {
    match value {
        Node::Object(_) => {
            let mut group = match make_parameter_nodes(value, max_depth - 1) {
                Node::Object(obj) => obj,
                _ => Object::new(),
            };
            group.set_attribute("Name", key);
            out.append_child("ParameterGroup", Node::Object(group));
        }
        Node::Array(items) => {
            for item in items {
                encode_entry(out, key, item, max_depth);
            }
        }
        Node::Scalar(value) => {
            let mut param = Object::new();
            param.set_attribute("Name", key);
            if value.contains('\n') || value.contains('"') {
                // attribute encoding is unsafe for such content
                param.set_text(value.clone());
            } else {
                param.set_attribute("Value", value.clone());
            }
            out.append_child("Parameter", Node::Object(param));
        }
    }
}

/// Shallow merge of two objects; `b` wins on key collision
pub fn merge_objects(a: &Object, b: &Object) -> Object {
    let mut merged = a.clone();
    for (key, value) in b.iter() {
        merged.insert(key.clone(), value.clone());
    }
    for (key, value) in b.attributes() {
        merged.set_attribute(key.clone(), value.clone());
    }
    if let Some(text) = b.text() {
        merged.set_text(text);
    }
    merged
}

/// Recursive copy of a tree with every object key lower-cased; scalars
/// and array structure are left unchanged
pub fn deep_copy_lowercase_keys(node: &Node) -> Node {
    match node {
        Node::Object(obj) => {
            let mut out = Object::new();
            for (key, value) in obj.iter() {
                out.insert(key.to_lowercase(), deep_copy_lowercase_keys(value));
            }
            for (key, value) in obj.attributes() {
                out.set_attribute(key.to_lowercase(), value.clone());
            }
            if let Some(text) = obj.text() {
                out.set_text(text);
            }
            Node::Object(out)
        }
        Node::Array(items) => Node::Array(items.iter().map(deep_copy_lowercase_keys).collect()),
        Node::Scalar(s) => Node::Scalar(s.clone()),
    }
}

/// Whether every criterion must match, or any one of them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    All,
    Any,
}

/// Find the first element, in list order, whose fields or attributes
/// satisfy the criteria under the given mode
pub fn find_by_criteria<'a>(
    elements: &'a Node,
    criteria: &[(&str, &str)],
    mode: MatchMode,
) -> Option<&'a Node> {
    let min_matches = match mode {
        MatchMode::All => criteria.len(),
        MatchMode::Any => 1,
    };
    elements.as_list().iter().find(|elem| {
        elem.as_object().is_some_and(|obj| {
            let matches = criteria
                .iter()
                .filter(|(key, value)| obj.matches_field(key, value))
                .count();
            matches >= min_matches
        })
    })
}
