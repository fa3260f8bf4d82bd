//! treemark - markup-to-tree parsing, composing, path queries, and a
//! parameter codec
//!
//! This crate provides functionality to:
//! - Parse XML-like markup into a generic, dynamically shaped tree
//! - Compose a tree back into markup or script-literal text
//! - Evaluate restricted path queries over a tree
//! - Convert between nested mappings and `Parameter`/`ParameterGroup`
//!   encodings
//!
//! # Examples
//! ```
//! use treemark::{lookup, parse, Node};
//!
//! # fn main() -> treemark::Result<()> {
//! let doc = parse("<Config><Host>example.com</Host></Config>")?;
//! assert_eq!(doc.name, "Config");
//! let host = lookup(&doc.root, "/Host")?;
//! assert_eq!(host, Node::Scalar("example.com".into()));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod compose;
pub mod cursor;
pub mod error;
pub mod node;
pub mod parser;
pub mod query;
pub mod transform;

pub use compose::{compose, compose_literal, ComposeConfig};
pub use error::{Error, ErrorKind, Pos, Result, Span};
pub use node::{Document, Node, Object};
pub use parser::{ParseConfig, Parser};
pub use query::lookup;
pub use transform::{
    collapse_attributes, deep_copy_lowercase_keys, expand_parameter_nodes, find_by_criteria,
    index_by, make_parameter_nodes, merge_objects, MatchMode,
};

use tracing::debug;

/// Parse a markup document into a named tree
pub fn parse(input: &str) -> Result<Document> {
    parse_with_config(input, ParseConfig::default())
}

/// Parse with custom configuration
pub fn parse_with_config(input: &str, config: ParseConfig) -> Result<Document> {
    debug!(
        bytes = input.len(),
        collapse = config.collapse_attributes,
        "parsing document"
    );
    Parser::with_config(input, config).parse()
}

/// Parse with attributes collapsed into child entries
pub fn parse_collapsed(input: &str) -> Result<Document> {
    parse_with_config(
        input,
        ParseConfig {
            collapse_attributes: true,
            ..ParseConfig::default()
        },
    )
}
