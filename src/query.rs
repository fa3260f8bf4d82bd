//! Restricted path queries over document trees
//!
//! Paths are `/`-separated segments evaluated left to right against a
//! current context node. Supported segment forms:
//!
//! - `name` descends into the child of that name
//! - `name[N]` descends and takes the 0-based index of the coerced list
//! - `name[@attr='value']` descends and takes the first list element whose
//!   `attr` field or attribute equals the value
//! - `@attr` switches to the current node's attributes

use tracing::debug;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::node::Node;

/// One parsed path segment
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Child(&'a str),
    Index { name: &'a str, index: usize },
    Predicate { name: &'a str, attr: &'a str, value: &'a str },
    Attribute(&'a str),
}

/// Evaluate a path against a tree, returning the final context node.
///
/// Evaluation stops at the first segment that cannot be resolved; no
/// partial result is returned. An attribute segment yields the attribute
/// value as a scalar.
pub fn lookup(tree: &Node, path: &str) -> Result<Node> {
    debug!(path, "evaluating path query");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    eval(tree, &segments, path)
}

fn eval(node: &Node, segments: &[&str], path: &str) -> Result<Node> {
    let Some((piece, rest)) = segments.split_first() else {
        return Ok(node.clone());
    };

    match parse_segment(piece) {
        Segment::Child(name) => {
            let child = node
                .as_object()
                .and_then(|obj| obj.get(name))
                .ok_or_else(|| not_found(path, piece))?;
            eval(child, rest, path)
        }
        Segment::Index { name, index } => {
            let child = node
                .as_object()
                .and_then(|obj| obj.get(name))
                .ok_or_else(|| not_found(path, piece))?;
            let elem = child
                .as_list()
                .get(index)
                .ok_or_else(|| not_found(path, piece))?;
            eval(elem, rest, path)
        }
        Segment::Predicate { name, attr, value } => {
            let child = node
                .as_object()
                .and_then(|obj| obj.get(name))
                .ok_or_else(|| not_found(path, piece))?;
            // first match in list order wins
            let found = child
                .as_list()
                .iter()
                .find(|elem| {
                    elem.as_object()
                        .is_some_and(|obj| obj.matches_field(attr, value))
                })
                .ok_or_else(|| not_found(path, piece))?;
            eval(found, rest, path)
        }
        Segment::Attribute(attr) => {
            let obj = node.as_object().ok_or_else(|| not_found(path, piece))?;
            if obj.attributes().is_empty() {
                // collapsed trees carry former attributes as children
                let child = obj.get(attr).ok_or_else(|| not_found(path, piece))?;
                eval(child, rest, path)
            } else {
                let value = obj.attribute(attr).ok_or_else(|| not_found(path, piece))?;
                eval(&Node::Scalar(value.to_owned()), rest, path)
            }
        }
    }
}

fn parse_segment(piece: &str) -> Segment<'_> {
    if let Some(attr) = piece.strip_prefix('@') {
        if is_name(attr) {
            return Segment::Attribute(attr);
        }
    }

    if let Some((name, rest)) = piece.split_once('[') {
        if is_name(name) {
            if let Some(inner) = rest.strip_suffix(']') {
                if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(index) = inner.parse::<usize>() {
                        return Segment::Index { name, index };
                    }
                }
                if let Some(cond) = inner.strip_prefix('@') {
                    if let Some((attr, quoted)) = cond.split_once("='") {
                        if let Some(value) = quoted.strip_suffix('\'') {
                            if is_name(attr) && !value.contains('\'') {
                                return Segment::Predicate { name, attr, value };
                            }
                        }
                    }
                }
            }
        }
    }

    Segment::Child(piece)
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ':'))
}

fn not_found(path: &str, segment: &str) -> Error {
    Error::new(
        ErrorKind::PathNotFound {
            path: path.to_owned(),
            segment: segment.to_owned(),
        },
        Span::empty(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segment_forms() {
        assert_eq!(parse_segment("Config"), Segment::Child("Config"));
        assert_eq!(
            parse_segment("Item[2]"),
            Segment::Index { name: "Item", index: 2 }
        );
        assert_eq!(
            parse_segment("Item[@Name='x']"),
            Segment::Predicate {
                name: "Item",
                attr: "Name",
                value: "x"
            }
        );
        assert_eq!(parse_segment("@Value"), Segment::Attribute("Value"));
    }

    #[test]
    fn test_malformed_predicates_fall_back_to_child() {
        assert_eq!(parse_segment("Item[2"), Segment::Child("Item[2"));
        assert_eq!(parse_segment("Item[@a=b]"), Segment::Child("Item[@a=b]"));
        assert_eq!(parse_segment("Item[]"), Segment::Child("Item[]"));
    }

    #[test]
    fn test_empty_predicate_value_allowed() {
        assert_eq!(
            parse_segment("Item[@Name='']"),
            Segment::Predicate {
                name: "Item",
                attr: "Name",
                value: ""
            }
        );
    }
}
