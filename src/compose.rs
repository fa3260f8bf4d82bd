//! Composing trees back into markup or literal text

use tracing::debug;

use crate::node::Node;

/// Configuration for the composers
#[derive(Clone, Debug)]
pub struct ComposeConfig {
    /// Omit all line breaks and indentation
    pub compress: bool,
    /// Indent unit repeated per nesting level
    pub indent: String,
    /// Opaque doctype fragment inserted verbatim before the root element
    pub dtd: Option<String>,
    /// Quote every literal value, bypassing the bare-number heuristic
    pub force_strings: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            compress: false,
            indent: "\t".to_string(),
            dtd: None,
            force_strings: false,
        }
    }
}

/// Render a tree as markup text under the given root name.
///
/// Never fails: a scalar found where an element was expected renders as a
/// text leaf.
pub fn compose(name: &str, node: &Node, config: &ComposeConfig) -> String {
    debug!(root = name, compress = config.compress, "composing markup");
    let mut out = String::from("<?xml version=\"1.0\"?>");
    newline(&mut out, config);
    if let Some(dtd) = &config.dtd {
        out.push_str(dtd);
        newline(&mut out, config);
    }
    compose_node(name, node, 0, config, &mut out);
    out
}

fn compose_node(name: &str, node: &Node, depth: usize, config: &ComposeConfig, out: &mut String) {
    match node {
        // repeated siblings render at the same name and depth
        Node::Array(items) => {
            for item in items {
                compose_node(name, item, depth, config, out);
            }
        }
        Node::Scalar(value) => {
            push_indent(out, depth, config);
            out.push('<');
            out.push_str(name);
            out.push('>');
            out.push_str(&escape_text(value));
            out.push_str("</");
            out.push_str(name);
            out.push('>');
            newline(out, config);
        }
        Node::Object(obj) => {
            push_indent(out, depth, config);
            out.push('<');
            out.push_str(name);
            for (key, value) in obj.attributes() {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_attribute(value));
                out.push('"');
            }
            if !obj.is_empty() {
                out.push('>');
                newline(out, config);
                for (key, value) in obj.iter() {
                    compose_node(key, value, depth + 1, config, out);
                }
                push_indent(out, depth, config);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
                newline(out, config);
            } else if let Some(text) = obj.text() {
                out.push('>');
                out.push_str(&escape_text(text));
                out.push_str("</");
                out.push_str(name);
                out.push('>');
                newline(out, config);
            } else {
                out.push_str("/>");
                newline(out, config);
            }
        }
    }
}

/// Render a tree as a script-literal expression statement.
///
/// Objects become `{...}` maps (attributes render as ordinary keys, own
/// text under the reserved key `"#text"`), arrays become `[...]`, and the
/// top-level output ends with a statement terminator.
pub fn compose_literal(node: &Node, config: &ComposeConfig) -> String {
    debug!(compress = config.compress, "composing literal");
    let mut out = String::new();
    match node {
        Node::Scalar(value) => {
            out.push_str(&escape_literal(value, config.force_strings));
            out.push(';');
            newline(&mut out, config);
        }
        container => {
            literal_node(container, 1, config, &mut out);
            finish_statement(&mut out, config);
        }
    }
    out
}

fn literal_node(node: &Node, depth: usize, config: &ComposeConfig, out: &mut String) {
    let indent = indent_text(depth, config);
    let closing = indent_text(depth.saturating_sub(1), config);
    match node {
        Node::Object(obj) => {
            out.push('{');
            newline(out, config);
            for (name, value) in obj.attributes() {
                push_entry(out, &indent, name, &escape_literal(value, config.force_strings), config);
            }
            if let Some(text) = obj.text() {
                push_entry(out, &indent, "#text", &escape_literal(text, config.force_strings), config);
            }
            for (name, value) in obj.iter() {
                match value {
                    Node::Scalar(s) => {
                        push_entry(out, &indent, name, &escape_literal(s, config.force_strings), config);
                    }
                    container => {
                        out.push_str(&indent);
                        out.push('"');
                        out.push_str(name);
                        out.push_str("\": ");
                        literal_node(container, depth + 1, config, out);
                    }
                }
            }
            trim_trailing_entry(out, config);
            out.push_str(&closing);
            out.push_str("},");
            newline(out, config);
        }
        Node::Array(items) => {
            out.push('[');
            newline(out, config);
            for item in items {
                match item {
                    Node::Scalar(s) => {
                        out.push_str(&indent);
                        out.push_str(&escape_literal(s, config.force_strings));
                        out.push(',');
                        newline(out, config);
                    }
                    container => {
                        out.push_str(&indent);
                        literal_node(container, depth + 1, config, out);
                    }
                }
            }
            trim_trailing_entry(out, config);
            out.push_str(&closing);
            out.push_str("],");
            newline(out, config);
        }
        // a scalar where a container was expected renders as a bare literal
        Node::Scalar(s) => {
            out.push_str(&escape_literal(s, config.force_strings));
            out.push(',');
            newline(out, config);
        }
    }
}

fn push_entry(out: &mut String, indent: &str, key: &str, value: &str, config: &ComposeConfig) {
    out.push_str(indent);
    out.push('"');
    out.push_str(key);
    out.push_str("\": ");
    out.push_str(value);
    out.push(',');
    newline(out, config);
}

/// Drop the separator after the last entry of a container
fn trim_trailing_entry(out: &mut String, config: &ComposeConfig) {
    if config.compress {
        if out.ends_with(',') {
            out.pop();
        }
    } else if out.ends_with(",\n") {
        out.truncate(out.len() - 2);
        out.push('\n');
    }
}

/// Swap the top-level trailing separator for a statement terminator
fn finish_statement(out: &mut String, config: &ComposeConfig) {
    let (tail, replacement) = if config.compress { (",", ";") } else { (",\n", ";\n") };
    if out.ends_with(tail) {
        out.truncate(out.len() - tail.len());
        out.push_str(replacement);
    }
}

fn indent_text(depth: usize, config: &ComposeConfig) -> String {
    if config.compress {
        String::new()
    } else {
        config.indent.repeat(depth)
    }
}

fn push_indent(out: &mut String, depth: usize, config: &ComposeConfig) {
    if !config.compress {
        out.push_str(&config.indent.repeat(depth));
    }
}

fn newline(out: &mut String, config: &ComposeConfig) {
    if !config.compress {
        out.push('\n');
    }
}

/// Escape text content; quotes pass through literally
fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value for a double-quoted position
fn escape_attribute(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape a value for embedding in script-literal text.
///
/// Values matching a plain decimal-number shape are emitted bare unless
/// `force_strings` is set; everything else is quoted with backslashes
/// doubled before quotes and newlines are escaped, and any closing script
/// tag split so it cannot terminate an enclosing script block.
fn escape_literal(value: &str, force_strings: bool) -> String {
    if !force_strings && is_bare_number(value) {
        return value.to_owned();
    }
    let normalized = value.replace("\r\n", "\n").replace('\r', "\n");
    let escaped = normalized
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    let mut quoted = String::with_capacity(escaped.len() + 2);
    quoted.push('"');
    quoted.push_str(&split_script_close(&escaped));
    quoted.push('"');
    quoted
}

/// Plain decimal number: optional sign, up to 15 integer digits, optional
/// fraction of up to 15 digits, and no octal-looking leading zero
fn is_bare_number(value: &str) -> bool {
    let rest = value.strip_prefix('-').unwrap_or(value);
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let digits = |s: &str| (1..=15).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(int_part) || !frac_part.map_or(true, digits) {
        return false;
    }
    let bytes = value.as_bytes();
    !(bytes.first() == Some(&b'0') && bytes.get(1).is_some_and(|b| *b != b'.'))
}

fn split_script_close(input: &str) -> String {
    const NEEDLE: &str = "</script>";
    let lower = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while let Some(found) = lower.get(pos..).and_then(|rest| rest.find(NEEDLE)) {
        let at = pos + found;
        out.push_str(input.get(pos..at).unwrap_or_default());
        out.push_str("</scr\" + \"ipt>");
        pos = at + NEEDLE.len();
    }
    out.push_str(input.get(pos..).unwrap_or_default());
    out
}
