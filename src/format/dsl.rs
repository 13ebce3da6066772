// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;
use std::fmt;

use smallvec::SmallVec;

use super::cursor::{Cursor, SourcePos};
use super::ident::{is_ident_char, is_key_char};
use crate::model::{
    Attributes, Edge, Graph, IdError, NodeId, ATTR_LABEL, ATTR_SHAPE, ATTR_STYLE,
};

/// Modifier words that style the adjacent edge instead of shaping the node.
const EDGE_STYLE_KEYWORDS: [&str; 4] = ["solid", "dashed", "dotted", "bold"];

const GRAPH_KEYWORD: &str = "graph";
const MAX_TOKEN_CHARS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Reject edges whose endpoints were not declared by an earlier node statement.
    pub strict_references: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DslParseError {
    UnmatchedOpenBracket { line: usize, column: usize },
    UnmatchedCloseBracket { line: usize, column: usize },
    UnmatchedBrace { line: usize, column: usize },
    MalformedArrow { line: usize, column: usize, token: String },
    DanglingArrow { line: usize, column: usize },
    MissingAttributeValue { line: usize, column: usize, key: String },
    UnterminatedQuote { line: usize, column: usize },
    UnexpectedToken { line: usize, column: usize, token: String },
    InvalidNodeId { line: usize, column: usize, name: String, reason: IdError },
    UndeclaredNode { line: usize, column: usize, name: String },
}

impl DslParseError {
    pub fn line(&self) -> usize {
        self.pos().line
    }

    pub fn column(&self) -> usize {
        self.pos().column
    }

    /// Error family: `"ReferenceError"` for strict-mode undeclared nodes, else `"SyntaxError"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UndeclaredNode { .. } => "ReferenceError",
            _ => "SyntaxError",
        }
    }

    fn pos(&self) -> SourcePos {
        let (line, column) = match self {
            Self::UnmatchedOpenBracket { line, column }
            | Self::UnmatchedCloseBracket { line, column }
            | Self::UnmatchedBrace { line, column }
            | Self::MalformedArrow { line, column, .. }
            | Self::DanglingArrow { line, column }
            | Self::MissingAttributeValue { line, column, .. }
            | Self::UnterminatedQuote { line, column }
            | Self::UnexpectedToken { line, column, .. }
            | Self::InvalidNodeId { line, column, .. }
            | Self::UndeclaredNode { line, column, .. } => (*line, *column),
        };
        SourcePos { line, column }
    }
}

impl fmt::Display for DslParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let SourcePos { line, column } = self.pos();
        write!(f, "{} at line {line}, column {column}: ", self.kind())?;
        match self {
            Self::UnmatchedOpenBracket { .. } => f.write_str("unmatched '[' (missing ']')"),
            Self::UnmatchedCloseBracket { .. } => f.write_str("unmatched ']' (missing '[')"),
            Self::UnmatchedBrace { .. } => f.write_str("unmatched '{' (missing '}')"),
            Self::MalformedArrow { token, .. } => {
                write!(f, "malformed arrow '{token}' (expected '->' or '--')")
            }
            Self::DanglingArrow { .. } => f.write_str("arrow without a node on both sides"),
            Self::MissingAttributeValue { key, .. } => {
                write!(f, "attribute '{key}' has no value (expected '{key}=<value>')")
            }
            Self::UnterminatedQuote { .. } => f.write_str("unterminated quoted string"),
            Self::UnexpectedToken { token, .. } => write!(f, "unexpected token '{token}'"),
            Self::InvalidNodeId { name, reason, .. } => {
                write!(f, "invalid node id {name:?} ({reason})")
            }
            Self::UndeclaredNode { name, .. } => {
                write!(f, "node '{name}' is referenced before it is declared")
            }
        }
    }
}

impl std::error::Error for DslParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrowKind {
    Directed,
    Undirected,
}

#[derive(Debug, Clone)]
struct NodeRef {
    id: NodeId,
    pos: SourcePos,
    quoted: bool,
    modifier: Option<String>,
}

impl NodeRef {
    fn edge_style_modifier(&self) -> Option<&str> {
        self.modifier.as_deref().filter(|word| EDGE_STYLE_KEYWORDS.contains(word))
    }

    fn shape_modifier(&self) -> Option<&str> {
        self.modifier.as_deref().filter(|word| !EDGE_STYLE_KEYWORDS.contains(word))
    }
}

#[derive(Debug, Clone, Copy)]
struct Arrow {
    kind: ArrowKind,
    pos: SourcePos,
}

/// Parse dotflow DSL text into a [`Graph`] with default options.
///
/// Supported (one statement per line; `[...]` may span lines):
/// - `# comment`
/// - `A` and `A [key=value, key="quoted", key='quoted']`
/// - `graph [key=value]` for graph-level attributes
/// - `A -> B`, `A -- B`, chains `A -> B -> C`, trailing `[edge attrs]` and `: Label`
/// - `A{word}` sugar: node shape, or edge style for `solid|dashed|dotted|bold`
///
/// An edge `label` attribute labels every segment; `: Label` overrides it on the last one.
///
/// The first error aborts the parse; no partial graph is returned.
pub fn parse_dsl(input: &str) -> Result<Graph, DslParseError> {
    parse_dsl_with(input, ParseOptions::default())
}

pub fn parse_dsl_with(input: &str, options: ParseOptions) -> Result<Graph, DslParseError> {
    let mut parser = DslParser {
        cursor: Cursor::new(input),
        graph: Graph::new(),
        options,
        declared: BTreeSet::new(),
    };
    parser.parse()?;

    tracing::debug!(
        nodes = parser.graph.node_count(),
        edges = parser.graph.edge_count(),
        "parsed dotflow source"
    );
    Ok(parser.graph)
}

struct DslParser<'a> {
    cursor: Cursor<'a>,
    graph: Graph,
    options: ParseOptions,
    declared: BTreeSet<NodeId>,
}

impl<'a> DslParser<'a> {
    fn parse(&mut self) -> Result<(), DslParseError> {
        loop {
            self.cursor.skip_inline_whitespace();
            match self.cursor.peek() {
                None => return Ok(()),
                Some('\n') => {
                    self.cursor.bump();
                }
                Some('#') => {
                    self.cursor.take_line_rest();
                }
                Some(_) => self.parse_statement()?,
            }
        }
    }

    fn parse_statement(&mut self) -> Result<(), DslParseError> {
        let start = self.cursor.pos();
        match self.cursor.peek() {
            Some(']') => {
                return Err(DslParseError::UnmatchedCloseBracket {
                    line: start.line,
                    column: start.column,
                })
            }
            Some('-' | '<' | '=' | '>') => {
                return Err(DslParseError::DanglingArrow { line: start.line, column: start.column })
            }
            _ => {}
        }

        let first = self.parse_node_ref()?;
        self.cursor.skip_inline_whitespace();

        if !first.quoted
            && first.modifier.is_none()
            && first.id.as_str() == GRAPH_KEYWORD
            && self.cursor.peek() == Some('[')
        {
            let attributes = self.parse_attribute_list()?;
            self.graph.merge_attributes(attributes);
            return self.expect_statement_end();
        }

        match self.cursor.peek() {
            None | Some('\n') => {
                self.declare_node(&first, Attributes::new());
                Ok(())
            }
            Some('[') => {
                let attributes = self.parse_attribute_list()?;
                self.declare_node(&first, attributes);
                self.expect_statement_end()
            }
            Some('-' | '<' | '=' | '>') => self.parse_edge_statement(first),
            Some(_) => Err(self.unexpected_here()),
        }
    }

    fn parse_edge_statement(&mut self, first: NodeRef) -> Result<(), DslParseError> {
        let mut refs = SmallVec::<[NodeRef; 4]>::new();
        let mut arrows = SmallVec::<[Arrow; 4]>::new();
        refs.push(first);

        loop {
            self.cursor.skip_inline_whitespace();
            if !matches!(self.cursor.peek(), Some('-' | '<' | '=' | '>')) {
                break;
            }
            let arrow = self.parse_arrow()?;
            arrows.push(arrow);

            self.cursor.skip_inline_whitespace();
            match self.cursor.peek() {
                None | Some('\n' | ':' | '[' | ']' | '-' | '<' | '=' | '>') => {
                    return Err(DslParseError::DanglingArrow {
                        line: arrow.pos.line,
                        column: arrow.pos.column,
                    });
                }
                Some(_) => refs.push(self.parse_node_ref()?),
            }
        }

        self.cursor.skip_inline_whitespace();
        let mut edge_attributes = if self.cursor.peek() == Some('[') {
            self.parse_attribute_list()?
        } else {
            Attributes::new()
        };

        self.cursor.skip_inline_whitespace();
        let label = if self.cursor.eat(':') {
            let text = self.cursor.take_line_rest().trim();
            (!text.is_empty()).then(|| text.to_owned())
        } else {
            None
        };
        self.expect_statement_end()?;
        let attribute_label = edge_attributes.remove(ATTR_LABEL);

        if self.options.strict_references {
            if let Some(undeclared) = refs.iter().find(|r| !self.declared.contains(&r.id)) {
                return Err(DslParseError::UndeclaredNode {
                    line: undeclared.pos.line,
                    column: undeclared.pos.column,
                    name: undeclared.id.to_string(),
                });
            }
        }

        for node_ref in &refs {
            let node = self.graph.ensure_node(node_ref.id.clone());
            if let Some(shape) = node_ref.shape_modifier() {
                node.set_attribute_if_absent(ATTR_SHAPE, shape);
            }
        }

        let segment_count = arrows.len();
        for (idx, arrow) in arrows.iter().enumerate() {
            let from = &refs[idx];
            let to = &refs[idx + 1];
            let is_last = idx + 1 == segment_count;

            let mut edge = Edge::new_with(
                from.id.clone(),
                to.id.clone(),
                match (is_last, &label) {
                    (true, Some(text)) => Some(text.clone()),
                    _ => attribute_label.clone(),
                },
                arrow.kind == ArrowKind::Directed,
            );

            // Outgoing modifier wins; a target-only modifier styles its incoming segment.
            let style = from.edge_style_modifier().or_else(|| {
                let to_has_outgoing = idx + 1 < segment_count;
                (!to_has_outgoing).then(|| to.edge_style_modifier()).flatten()
            });
            if let Some(style) = style {
                edge.set_attribute(ATTR_STYLE, style);
            }
            edge.merge_attributes(edge_attributes.clone());
            self.graph.add_edge(edge);
        }

        Ok(())
    }

    fn declare_node(&mut self, node_ref: &NodeRef, attributes: Attributes) {
        let node = self.graph.merge_node_attributes(node_ref.id.clone(), attributes);
        if let Some(word) = node_ref.modifier.as_deref() {
            node.set_attribute_if_absent(ATTR_SHAPE, word);
        }
        self.declared.insert(node_ref.id.clone());
    }

    fn parse_node_ref(&mut self) -> Result<NodeRef, DslParseError> {
        let pos = self.cursor.pos();
        let (name, quoted) = match self.cursor.peek() {
            Some('"') => {
                let Some(text) = self.cursor.take_quoted_on_line(b'"') else {
                    return Err(DslParseError::UnterminatedQuote {
                        line: pos.line,
                        column: pos.column,
                    });
                };
                (text, true)
            }
            Some(ch) if is_ident_char(ch) => (self.cursor.take_while(is_ident_char), false),
            _ => return Err(self.unexpected_here()),
        };

        let id = NodeId::new(name).map_err(|reason| DslParseError::InvalidNodeId {
            line: pos.line,
            column: pos.column,
            name: name.to_owned(),
            reason,
        })?;

        let mut lookahead = self.cursor;
        lookahead.skip_inline_whitespace();
        let modifier = if lookahead.peek() == Some('{') {
            self.cursor = lookahead;
            Some(self.parse_modifier()?)
        } else {
            None
        };

        Ok(NodeRef { id, pos, quoted, modifier })
    }

    fn parse_modifier(&mut self) -> Result<String, DslParseError> {
        let open = self.cursor.pos();
        self.cursor.bump();

        let Some(end) = self.cursor.line_rest().find('}') else {
            return Err(DslParseError::UnmatchedBrace { line: open.line, column: open.column });
        };
        let raw = &self.cursor.line_rest()[..end];
        let word = raw.trim();
        if word.is_empty() || !word.chars().all(is_key_char) {
            self.cursor.skip_inline_whitespace();
            return Err(DslParseError::UnexpectedToken {
                line: open.line,
                column: open.column,
                token: format!("{{{raw}}}"),
            });
        }
        let word = word.to_owned();
        self.cursor.advance_bytes(end + 1);
        Ok(word)
    }

    fn parse_arrow(&mut self) -> Result<Arrow, DslParseError> {
        let pos = self.cursor.pos();
        let token = self.cursor.take_while(|ch| matches!(ch, '-' | '<' | '=' | '>'));
        let kind = match token {
            "->" => ArrowKind::Directed,
            "--" => ArrowKind::Undirected,
            _ => {
                return Err(DslParseError::MalformedArrow {
                    line: pos.line,
                    column: pos.column,
                    token: token.to_owned(),
                })
            }
        };
        Ok(Arrow { kind, pos })
    }

    /// Parses `[key=value, ...]`. Newlines inside the brackets continue the list.
    fn parse_attribute_list(&mut self) -> Result<Attributes, DslParseError> {
        let open = self.cursor.pos();
        self.cursor.bump();
        let unmatched = DslParseError::UnmatchedOpenBracket { line: open.line, column: open.column };

        let mut attributes = Attributes::new();
        loop {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => return Err(unmatched),
                Some(']') => {
                    self.cursor.bump();
                    return Ok(attributes);
                }
                Some(',') => {
                    self.cursor.bump();
                    continue;
                }
                Some('#') => {
                    self.cursor.take_line_rest();
                    continue;
                }
                Some(ch) if is_key_char(ch) => {}
                Some(_) => return Err(self.unexpected_here()),
            }

            let key_pos = self.cursor.pos();
            let key = self.cursor.take_while(is_key_char);
            let missing_value = || DslParseError::MissingAttributeValue {
                line: key_pos.line,
                column: key_pos.column,
                key: key.to_owned(),
            };

            self.cursor.skip_inline_whitespace();
            if !self.cursor.eat('=') {
                return Err(missing_value());
            }
            self.cursor.skip_inline_whitespace();

            let value = match self.cursor.peek() {
                Some(quote @ ('"' | '\'')) => {
                    let quote_pos = self.cursor.pos();
                    let Some(text) = self.cursor.take_quoted_on_line(quote as u8) else {
                        return Err(DslParseError::UnterminatedQuote {
                            line: quote_pos.line,
                            column: quote_pos.column,
                        });
                    };
                    text.to_owned()
                }
                _ => {
                    let text = self.cursor.take_while(|ch| !matches!(ch, ',' | ']' | '\n'));
                    let text = text.trim();
                    if text.is_empty() {
                        return Err(missing_value());
                    }
                    text.to_owned()
                }
            };
            attributes.insert(key.into(), value);

            self.cursor.skip_inline_whitespace();
            match self.cursor.peek() {
                None => return Err(unmatched),
                Some(',' | '\n') => {
                    self.cursor.bump();
                }
                Some(']') => {
                    self.cursor.bump();
                    return Ok(attributes);
                }
                Some(_) => return Err(self.unexpected_here()),
            }
        }
    }

    fn expect_statement_end(&mut self) -> Result<(), DslParseError> {
        self.cursor.skip_inline_whitespace();
        if self.cursor.at_line_end() {
            return Ok(());
        }
        Err(self.unexpected_here())
    }

    /// Error for whatever starts at the cursor. A stray `]` on the rest of the line is reported
    /// as an unmatched bracket rather than a generic token error.
    fn unexpected_here(&self) -> DslParseError {
        let pos = self.cursor.pos();
        let rest = self.cursor.line_rest();
        if let Some(close) = stray_close_bracket(rest) {
            let column = pos.column + rest[..close].chars().count();
            return DslParseError::UnmatchedCloseBracket { line: pos.line, column };
        }
        DslParseError::UnexpectedToken {
            line: pos.line,
            column: pos.column,
            token: self.cursor.peek_token(MAX_TOKEN_CHARS),
        }
    }
}

/// Byte offset of the first `]` in `text` that has no preceding `[`, ignoring quoted text.
fn stray_close_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' => depth += 1,
            ']' if depth == 0 => return Some(idx),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}
