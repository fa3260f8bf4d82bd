//! Streaming markup parser building the document tree
//!
//! A single pass over the input drives an explicit stack of open frames:
//! attributes are captured when a tag opens, character data accumulates in
//! the innermost frame, and closing a tag trims, collapses, and attaches
//! the frame's payload to its parent. No recursion is involved, so nesting
//! depth is bounded only by the configured ceiling, not the call stack.

use indexmap::IndexMap;

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Result, Span};
use crate::node::{Document, Node, Object};

/// Configuration for the parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseConfig {
    /// Merge attributes into child entries at open time, last write wins
    pub collapse_attributes: bool,
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            collapse_attributes: false,
            max_depth: 128,
        }
    }
}

impl ParseConfig {
    /// Create a config with unlimited nesting depth
    pub const fn unlimited() -> Self {
        Self {
            collapse_attributes: false,
            max_depth: 0,
        }
    }
}

/// An open element awaiting its closing tag
#[derive(Debug)]
struct Frame {
    name: String,
    node: Object,
    text: String,
}

/// Markup parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: ParseConfig,
    stack: Vec<Frame>,
}

impl<'a> Parser<'a> {
    /// Create a new parser with default configuration
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, ParseConfig::default())
    }

    /// Create a new parser with custom configuration
    pub fn with_config(input: &'a str, config: ParseConfig) -> Self {
        Self {
            cursor: Cursor::new(input.as_bytes()),
            config,
            stack: Vec::new(),
        }
    }

    /// Parse the input into a named document tree
    pub fn parse(&mut self) -> Result<Document> {
        if self.cursor.remaining().iter().all(u8::is_ascii_whitespace) {
            return Err(Error::new(ErrorKind::EmptyInput, Span::empty()));
        }

        loop {
            match self.cursor.current() {
                None => {
                    return Err(self.error_kind(ErrorKind::UnexpectedEof, "unterminated document"));
                }
                Some(b'<') => {
                    if let Some(doc) = self.markup()? {
                        self.trailing()?;
                        return Ok(doc);
                    }
                }
                Some(_) => self.character_data()?,
            }
        }
    }

    /// Handle one markup construct; returns the document when the root closes
    fn markup(&mut self) -> Result<Option<Document>> {
        self.cursor.advance(); // consume '<'
        match self.cursor.current() {
            Some(b'?') => {
                self.skip_processing_instruction()?;
                Ok(None)
            }
            Some(b'!') => {
                self.declaration()?;
                Ok(None)
            }
            Some(b'/') => {
                self.cursor.advance();
                self.close_tag()
            }
            Some(_) => self.open_tag(),
            None => Err(self.error_kind(ErrorKind::UnexpectedEof, "unexpected end of input")),
        }
    }

    fn open_tag(&mut self) -> Result<Option<Document>> {
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;
        let self_closing = self.cursor.consume(b'/');
        self.expect_byte(b'>')?;

        if self.config.max_depth > 0 && self.stack.len() >= usize::from(self.config.max_depth) {
            return Err(self.error_kind(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                "maximum nesting depth exceeded",
            ));
        }

        let mut node = Object::new();
        if self.config.collapse_attributes {
            for (key, value) in attributes {
                node.insert(key, Node::Scalar(value));
            }
        } else {
            *node.attributes_mut() = attributes;
        }

        self.stack.push(Frame {
            name,
            node,
            text: String::new(),
        });

        if self_closing {
            self.close_frame()
        } else {
            Ok(None)
        }
    }

    fn close_tag(&mut self) -> Result<Option<Document>> {
        let name = self.parse_name()?;
        self.cursor.skip_whitespace();
        self.expect_byte(b'>')?;

        let Some(frame) = self.stack.last() else {
            return Err(self.error_here("unexpected closing tag"));
        };
        if frame.name != name {
            let expected = frame.name.clone();
            return Err(self.error_kind(
                ErrorKind::MismatchedTag {
                    expected,
                    found: name,
                },
                "mismatched closing tag",
            ));
        }
        self.close_frame()
    }

    /// Pop the innermost frame, collapse it, and attach it to its parent.
    /// A frame with no attributes and no children collapses to a bare
    /// scalar of its trimmed text (an empty element becomes `Scalar("")`).
    fn close_frame(&mut self) -> Result<Option<Document>> {
        let Some(frame) = self.stack.pop() else {
            return Err(self.error_here("unexpected closing tag"));
        };
        let Frame { name, mut node, text } = frame;

        let trimmed = text.trim();
        let payload = if node.is_empty() && node.attributes().is_empty() {
            Node::Scalar(trimmed.to_owned())
        } else {
            if !trimmed.is_empty() {
                node.set_text(trimmed);
            }
            Node::Object(node)
        };

        match self.stack.last_mut() {
            Some(parent) => {
                parent.node.append_child(name, payload);
                Ok(None)
            }
            None => Ok(Some(Document { name, root: payload })),
        }
    }

    /// Accumulate one run of character data into the innermost frame
    fn character_data(&mut self) -> Result<()> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }
        let raw = bytes_to_string(self.cursor.slice_from(start))?;
        let text = decode_entities(&raw)?;

        match self.stack.last_mut() {
            Some(frame) => {
                frame.text.push_str(&text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::new(start_pos, self.cursor.position()),
                "text outside of the document element".to_string(),
            )),
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) => {}
                None => {
                    return Err(self.error_kind(ErrorKind::UnexpectedEof, "unexpected end of input"))
                }
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_here("duplicate attribute"));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_string(raw)?;
                return decode_entities(&text);
            }
            self.cursor.advance();
        }

        Err(self.error_kind(ErrorKind::UnexpectedEof, "unterminated attribute value"))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();

        let Some(first) = self.cursor.current() else {
            return Err(self.error_kind(ErrorKind::UnexpectedEof, "expected name"));
        };
        if !is_name_start(first) {
            return Err(self.error_here("expected name"));
        }

        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start))
    }

    /// Handle a `<!...>` construct: comment, CDATA section, or declaration
    fn declaration(&mut self) -> Result<()> {
        // cursor currently at '!'
        if self.cursor.peek_bytes(3) == Some(b"!--") {
            self.cursor.advance_by(3);
            self.skip_until(b"-->")?;
            return Ok(());
        }

        if self.cursor.peek_bytes(8) == Some(b"![CDATA[") {
            self.cursor.advance_by(8);
            let start_pos = self.cursor.position();
            let raw = self.take_until(b"]]>")?;
            let text = bytes_to_string(raw)?;
            return match self.stack.last_mut() {
                Some(frame) => {
                    frame.text.push_str(&text);
                    Ok(())
                }
                None if text.trim().is_empty() => Ok(()),
                None => Err(Error::with_message(
                    ErrorKind::InvalidToken,
                    Span::new(start_pos, self.cursor.position()),
                    "text outside of the document element".to_string(),
                )),
            };
        }

        // a doctype declaration may carry an internal subset with nested
        // markup declarations; balance angle brackets instead of stopping
        // at the first '>'
        let mut depth = 1u32;
        while let Some(b) = self.cursor.current() {
            match b {
                b'<' => depth += 1,
                b'>' => {
                    depth -= 1;
                    if depth == 0 {
                        self.cursor.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.cursor.advance();
        }
        Err(self.error_kind(ErrorKind::UnexpectedEof, "unterminated markup declaration"))
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        // cursor currently at '?'
        self.cursor.advance();
        self.skip_until(b"?>")
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        self.take_until(pattern).map(|_| ())
    }

    fn take_until(&mut self, pattern: &[u8]) -> Result<&'a [u8]> {
        let start = self.cursor.pos();
        while self.cursor.current().is_some() {
            if self.cursor.peek_bytes(pattern.len()) == Some(pattern) {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                return Ok(raw);
            }
            self.cursor.advance();
        }
        Err(self.error_kind(ErrorKind::UnexpectedEof, "unterminated markup"))
    }

    /// Only whitespace, comments, and processing instructions may follow
    /// the document element
    fn trailing(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                None => return Ok(()),
                Some(b'<') => match self.cursor.peek(1) {
                    Some(b'?') => {
                        self.cursor.advance();
                        self.skip_processing_instruction()?;
                    }
                    Some(b'!') => {
                        self.cursor.advance();
                        self.declaration()?;
                    }
                    _ => return Err(self.error_here("content after document element")),
                },
                Some(_) => return Err(self.error_here("content after document element")),
            }
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.error_here("unexpected token"))
        }
    }

    fn error_here(&self, message: &str) -> Error {
        self.error_kind(ErrorKind::InvalidToken, message)
    }

    fn error_kind(&self, kind: ErrorKind, message: &str) -> Error {
        let pos = self.cursor.position();
        Error::with_message(kind, Span::new(pos, pos), message.to_string())
    }
}

fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| {
            Error::with_message(
                ErrorKind::InvalidToken,
                Span::empty(),
                "invalid utf-8".to_string(),
            )
        })
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':')
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }

        let mut entity = String::new();
        for next in chars.by_ref() {
            if next == ';' {
                break;
            }
            entity.push(next);
        }

        let decoded = match entity.as_str() {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(&entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::with_message(
                    ErrorKind::InvalidEntity,
                    Span::empty(),
                    format!("invalid entity reference: &{entity};"),
                ));
            }
        }
    }

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
