//! Tree model for parsed markup documents

use indexmap::map::{IntoIter, Iter, IterMut, Keys, Values};
use indexmap::IndexMap;
use std::ops::Index;

/// A value in the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A leaf text value
    Scalar(String),
    /// An element with named children, attributes, and optional own text
    Object(Object),
    /// Repeated same-named siblings; non-empty, only created by promotion
    Array(Vec<Node>),
}

impl Default for Node {
    fn default() -> Self {
        Self::Scalar(String::new())
    }
}

impl Node {
    /// Returns true if this node is a scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Returns true if this node is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns true if this node is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns the text if this node is a scalar, None otherwise
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object if this node is an object, None otherwise
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns a mutable reference to the object if this node is an object
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the elements if this node is an array, None otherwise
    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a mutable reference to the elements if this node is an array
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// View any node as a list: arrays pass through, everything else
    /// becomes a one-element slice
    pub fn as_list(&self) -> &[Node] {
        match self {
            Self::Array(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Consuming counterpart of [`Node::as_list`]
    pub fn into_list(self) -> Vec<Node> {
        match self {
            Self::Array(items) => items,
            other => vec![other],
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Object> for Node {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(values: Vec<Node>) -> Self {
        Self::Array(values)
    }
}

/// An element value: ordered named children, attributes, and optional
/// own text (set only when the element carried attributes but no child
/// elements)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    children: IndexMap<String, Node>,
    attributes: IndexMap<String, String>,
    text: Option<String>,
}

impl Object {
    /// Creates a new empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of named children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the object has no named children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns a reference to the child under the key
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    /// Returns a mutable reference to the child under the key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.children.get_mut(key)
    }

    /// Inserts a child, overwriting any existing child of the same name.
    /// Returns the previous child if the key already existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.children.insert(key.into(), value.into())
    }

    /// Removes a child, preserving the order of the remaining children
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.children.shift_remove(key)
    }

    /// Returns true if a child of that name exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.children.contains_key(key)
    }

    /// Attaches a child under a name, promoting repeated names to an array:
    /// the first occurrence is stored directly, the second converts the
    /// slot to an array, further occurrences append
    pub fn append_child(&mut self, key: impl Into<String>, node: Node) {
        let key = key.into();
        match self.children.get_mut(&key) {
            None => {
                self.children.insert(key, node);
            }
            Some(Node::Array(items)) => items.push(node),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Node::Array(vec![first, node]);
            }
        }
    }

    /// Like [`Object::append_child`] but new nodes go to the front of the
    /// promoted array
    pub fn prepend_child(&mut self, key: impl Into<String>, node: Node) {
        let key = key.into();
        match self.children.get_mut(&key) {
            None => {
                self.children.insert(key, node);
            }
            Some(Node::Array(items)) => items.insert(0, node),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Node::Array(vec![node, first]);
            }
        }
    }

    /// Returns an iterator over the child names
    pub fn keys(&self) -> Keys<'_, String, Node> {
        self.children.keys()
    }

    /// Returns an iterator over the child values
    pub fn values(&self) -> Values<'_, String, Node> {
        self.children.values()
    }

    /// Returns an iterator over named children
    pub fn iter(&self) -> Iter<'_, String, Node> {
        self.children.iter()
    }

    /// Returns an iterator that allows modifying each child
    pub fn iter_mut(&mut self) -> IterMut<'_, String, Node> {
        self.children.iter_mut()
    }

    /// Attribute mapping of the element
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Mutable attribute mapping of the element
    pub fn attributes_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.attributes
    }

    /// Returns the attribute value under the key
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Sets an attribute, overwriting any existing value
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Own text of the element, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Sets the element's own text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Removes and returns the element's own text
    pub fn take_text(&mut self) -> Option<String> {
        self.text.take()
    }

    /// Total field count: named children plus attributes plus own text
    pub fn field_count(&self) -> usize {
        self.children.len() + self.attributes.len() + usize::from(self.text.is_some())
    }

    /// Scalar value of a field, checking scalar children first and falling
    /// back to attributes when no child of that name exists
    pub fn scalar_field(&self, key: &str) -> Option<&str> {
        match self.children.get(key) {
            Some(Node::Scalar(s)) => Some(s),
            Some(_) => None,
            None => self.attribute(key),
        }
    }

    /// Removes a scalar field, from the children or from the attributes
    pub fn remove_field(&mut self, key: &str) -> Option<String> {
        match self.children.get(key) {
            Some(Node::Scalar(_)) => match self.children.shift_remove(key) {
                Some(Node::Scalar(s)) => Some(s),
                _ => None,
            },
            Some(_) => None,
            None => self.attributes.shift_remove(key),
        }
    }

    /// Returns true if the scalar child or the attribute under the key
    /// equals the given value
    pub fn matches_field(&self, key: &str, value: &str) -> bool {
        if let Some(Node::Scalar(s)) = self.children.get(key) {
            if s == value {
                return true;
            }
        }
        self.attribute(key) == Some(value)
    }
}

impl Index<&str> for Object {
    type Output = Node;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, key: &str) -> &Self::Output {
        &self.children[key]
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Node);
    type IntoIter = Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

impl IntoIterator for Object {
    type Item = (String, Node);
    type IntoIter = IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}

impl From<IndexMap<String, Node>> for Object {
    fn from(children: IndexMap<String, Node>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }
}

impl FromIterator<(String, Node)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        Self {
            children: IndexMap::from_iter(iter),
            ..Self::default()
        }
    }
}

/// A parsed document: the root element name plus the root value
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub root: Node,
}

impl Document {
    /// Wraps the document in an object keyed by its root name, so path
    /// queries can start at the document level
    pub fn into_tree(self) -> Node {
        let mut wrapper = Object::new();
        wrapper.insert(self.name, self.root);
        Node::Object(wrapper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_predicates() {
        assert!(Node::Scalar("x".into()).is_scalar());
        assert!(Node::Object(Object::new()).is_object());
        assert!(Node::Array(vec![Node::default()]).is_array());
        assert!(!Node::Scalar("x".into()).is_object());
    }

    #[test]
    fn test_node_accessors() {
        assert_eq!(Node::Scalar("x".into()).as_scalar(), Some("x"));
        assert_eq!(Node::Object(Object::new()).as_scalar(), None);
        assert!(Node::Object(Object::new()).as_object().is_some());
        assert!(Node::Scalar("x".into()).as_array().is_none());
    }

    #[test]
    fn test_as_list_wraps_single_values() {
        let scalar = Node::Scalar("x".into());
        assert_eq!(scalar.as_list(), &[Node::Scalar("x".into())]);

        let arr = Node::Array(vec![Node::Scalar("a".into()), Node::Scalar("b".into())]);
        assert_eq!(arr.as_list().len(), 2);

        assert_eq!(scalar.into_list().len(), 1);
    }

    #[test]
    fn test_append_child_promotion() {
        let mut obj = Object::new();
        obj.append_child("Item", Node::Scalar("a".into()));
        assert_eq!(obj.get("Item"), Some(&Node::Scalar("a".into())));

        obj.append_child("Item", Node::Scalar("b".into()));
        obj.append_child("Item", Node::Scalar("c".into()));
        let items = obj.get("Item").and_then(Node::as_array).map(<[Node]>::to_vec);
        assert_eq!(
            items,
            Some(vec![
                Node::Scalar("a".into()),
                Node::Scalar("b".into()),
                Node::Scalar("c".into()),
            ])
        );
    }

    #[test]
    fn test_prepend_child_promotion() {
        let mut obj = Object::new();
        obj.prepend_child("Item", Node::Scalar("a".into()));
        obj.prepend_child("Item", Node::Scalar("b".into()));
        let items = obj.get("Item").and_then(Node::as_array).map(<[Node]>::to_vec);
        assert_eq!(
            items,
            Some(vec![Node::Scalar("b".into()), Node::Scalar("a".into())])
        );
    }

    #[test]
    fn test_order_preservation() {
        let mut obj = Object::new();
        obj.insert("first", "1");
        obj.insert("second", "2");
        obj.insert("third", "3");
        let keys: Vec<_> = obj.keys().collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_scalar_field_prefers_children() {
        let mut obj = Object::new();
        obj.insert("Name", "child");
        obj.set_attribute("Name", "attr");
        assert_eq!(obj.scalar_field("Name"), Some("child"));

        let mut attrs_only = Object::new();
        attrs_only.set_attribute("Name", "attr");
        assert_eq!(attrs_only.scalar_field("Name"), Some("attr"));
    }

    #[test]
    fn test_matches_field_checks_both_sides() {
        let mut obj = Object::new();
        obj.insert("Type", "http");
        obj.set_attribute("Port", "80");
        assert!(obj.matches_field("Type", "http"));
        assert!(obj.matches_field("Port", "80"));
        assert!(!obj.matches_field("Type", "ftp"));

        // a non-matching child does not shadow a matching attribute
        let mut both = Object::new();
        both.insert("Name", "child");
        both.set_attribute("Name", "attr");
        assert!(both.matches_field("Name", "attr"));
    }

    #[test]
    fn test_remove_field() {
        let mut obj = Object::new();
        obj.insert("Name", "child");
        obj.set_attribute("Value", "attr");
        assert_eq!(obj.remove_field("Name"), Some("child".to_string()));
        assert_eq!(obj.remove_field("Value"), Some("attr".to_string()));
        assert_eq!(obj.remove_field("Missing"), None);
        assert_eq!(obj.field_count(), 0);
    }

    #[test]
    fn test_field_count() {
        let mut obj = Object::new();
        obj.insert("a", "1");
        obj.set_attribute("b", "2");
        obj.set_text("t");
        assert_eq!(obj.field_count(), 3);
    }

    #[test]
    fn test_document_into_tree() {
        let doc = Document {
            name: "Config".to_string(),
            root: Node::Scalar("x".into()),
        };
        let tree = doc.into_tree();
        let obj = tree.as_object().map(|o| o.get("Config").cloned());
        assert_eq!(obj, Some(Some(Node::Scalar("x".into()))));
    }
}
