// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::cursor::{Cursor, SourcePos};
use super::ident::{is_ident_char, quote, quote_if_needed};
use crate::model::{
    Attributes, ClusterId, Edge, Graph, IdError, Node, NodeId, ATTR_CLUSTER, ATTR_LABEL,
};

const CLUSTER_PREFIX: &str = "cluster";

/// Strings are matched first so comment markers inside them survive.
static COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)"(?:[^"\\]|\\.)*"|/\*(?s:.*?)\*/|//[^\n]*|^[ \t]*#[^\n]*"#)
        .expect("comment pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotParseError {
    MissingHeader { line: usize, column: usize },
    UnexpectedToken { line: usize, column: usize, token: String },
    UnterminatedString { line: usize, column: usize },
    UnclosedBody { line: usize, column: usize },
    UnmatchedBracket { line: usize, column: usize },
    InvalidNodeId { line: usize, column: usize, name: String, reason: IdError },
}

impl DotParseError {
    pub fn line(&self) -> usize {
        self.pos().line
    }

    pub fn column(&self) -> usize {
        self.pos().column
    }

    fn pos(&self) -> SourcePos {
        let (line, column) = match self {
            Self::MissingHeader { line, column }
            | Self::UnexpectedToken { line, column, .. }
            | Self::UnterminatedString { line, column }
            | Self::UnclosedBody { line, column }
            | Self::UnmatchedBracket { line, column }
            | Self::InvalidNodeId { line, column, .. } => (*line, *column),
        };
        SourcePos { line, column }
    }

    fn unexpected(token: &Token) -> Self {
        Self::UnexpectedToken {
            line: token.pos.line,
            column: token.pos.column,
            token: token.kind.to_string(),
        }
    }
}

impl fmt::Display for DotParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let SourcePos { line, column } = self.pos();
        write!(f, "line {line}, column {column}: ")?;
        match self {
            Self::MissingHeader { .. } => {
                f.write_str("expected `graph` or `digraph` header (optionally `strict`)")
            }
            Self::UnexpectedToken { token, .. } => write!(f, "unexpected token '{token}'"),
            Self::UnterminatedString { .. } => f.write_str("unterminated quoted string"),
            Self::UnclosedBody { .. } => f.write_str("unclosed '{' (missing '}')"),
            Self::UnmatchedBracket { .. } => f.write_str("unmatched attribute bracket"),
            Self::InvalidNodeId { name, reason, .. } => {
                write!(f, "invalid node id {name:?} ({reason})")
            }
        }
    }
}

impl std::error::Error for DotParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Id { text: String, quoted: bool },
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equals,
    Semi,
    Comma,
    Arrow { directed: bool },
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id { text, .. } => f.write_str(text),
            Self::LBrace => f.write_str("{"),
            Self::RBrace => f.write_str("}"),
            Self::LBracket => f.write_str("["),
            Self::RBracket => f.write_str("]"),
            Self::Equals => f.write_str("="),
            Self::Semi => f.write_str(";"),
            Self::Comma => f.write_str(","),
            Self::Arrow { directed: true } => f.write_str("->"),
            Self::Arrow { directed: false } => f.write_str("--"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: SourcePos,
}

impl Token {
    fn keyword(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Id { text, quoted: false } => Some(text.as_str()),
            _ => None,
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        self.keyword().is_some_and(|text| text.eq_ignore_ascii_case(keyword))
    }
}

/// Replaces comments with spaces so line/column positions stay aligned with the source.
fn blank_comments(input: &str) -> Cow<'_, str> {
    COMMENTS.replace_all(input, |caps: &Captures<'_>| {
        let matched = &caps[0];
        if matched.starts_with('"') {
            return matched.to_owned();
        }
        matched.chars().map(|ch| if ch == '\n' { '\n' } else { ' ' }).collect()
    })
}

fn tokenize(input: &str) -> Result<(Vec<Token>, SourcePos), DotParseError> {
    let mut cursor = Cursor::new(input);
    let mut tokens = Vec::new();

    loop {
        cursor.skip_whitespace();
        let pos = cursor.pos();
        let Some(ch) = cursor.peek() else {
            return Ok((tokens, pos));
        };

        let kind = match ch {
            '{' | '}' | '[' | ']' | '=' | ';' | ',' => {
                cursor.bump();
                match ch {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '=' => TokenKind::Equals,
                    ';' => TokenKind::Semi,
                    _ => TokenKind::Comma,
                }
            }
            '-' if cursor.peek_second() == Some('>') => {
                cursor.advance_bytes(2);
                TokenKind::Arrow { directed: true }
            }
            '-' if cursor.peek_second() == Some('-') => {
                cursor.advance_bytes(2);
                TokenKind::Arrow { directed: false }
            }
            '-' if cursor.peek_second().is_some_and(|next| next.is_ascii_digit() || next == '.') => {
                cursor.bump();
                let digits = cursor.take_while(is_ident_char);
                TokenKind::Id { text: format!("-{digits}"), quoted: false }
            }
            '"' => TokenKind::Id { text: take_dot_string(&mut cursor, pos)?, quoted: true },
            ch if is_ident_char(ch) => {
                TokenKind::Id { text: cursor.take_while(is_ident_char).to_owned(), quoted: false }
            }
            _ => {
                return Err(DotParseError::UnexpectedToken {
                    line: pos.line,
                    column: pos.column,
                    token: cursor.peek_token(16),
                })
            }
        };
        tokens.push(Token { kind, pos });
    }
}

/// Reads a DOT double-quoted string. Strings may span lines; `\"` and `\\` are unescaped, other
/// backslash sequences are kept verbatim.
fn take_dot_string(cursor: &mut Cursor<'_>, open: SourcePos) -> Result<String, DotParseError> {
    cursor.bump();
    let mut text = String::new();
    loop {
        match cursor.bump() {
            None => {
                return Err(DotParseError::UnterminatedString {
                    line: open.line,
                    column: open.column,
                })
            }
            Some('"') => return Ok(text),
            Some('\\') if matches!(cursor.peek(), Some('"' | '\\')) => {
                if let Some(escaped) = cursor.bump() {
                    text.push(escaped);
                }
            }
            Some(ch) => text.push(ch),
        }
    }
}

/// Parse a DOT document into a [`Graph`].
///
/// Supports `strict`, `graph`/`digraph` headers, node and edge statements (including chains),
/// `graph`/`node`/`edge` attribute statements, `key=value` graph attributes, and
/// `subgraph cluster_x { .. }` blocks, whose members get `cluster=x`. Edge `label` attributes
/// become edge labels.
pub fn parse_dot(input: &str) -> Result<Graph, DotParseError> {
    let cleaned = blank_comments(input);
    let (tokens, eof) = tokenize(&cleaned)?;

    let mut parser = DotParser {
        tokens,
        eof,
        idx: 0,
        graph: Graph::new(),
        scope: Scope::default(),
    };
    parser.parse_document()?;

    tracing::debug!(
        nodes = parser.graph.node_count(),
        edges = parser.graph.edge_count(),
        "parsed DOT source"
    );
    Ok(parser.graph)
}

/// Defaults and cluster membership active at the current nesting level.
#[derive(Debug, Clone, Default)]
struct Scope {
    node_defaults: Attributes,
    edge_defaults: Attributes,
    cluster: Option<ClusterId>,
}

struct DotParser {
    tokens: Vec<Token>,
    eof: SourcePos,
    idx: usize,
    graph: Graph,
    scope: Scope,
}

impl DotParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.idx)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.idx).cloned();
        if token.is_some() {
            self.idx += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.idx += 1;
            return true;
        }
        false
    }

    fn parse_document(&mut self) -> Result<(), DotParseError> {
        let missing_header = |pos: SourcePos| DotParseError::MissingHeader {
            line: pos.line,
            column: pos.column,
        };

        let mut header = self.next().ok_or_else(|| missing_header(self.eof))?;
        if header.is_keyword("strict") {
            header = self.next().ok_or_else(|| missing_header(self.eof))?;
        }
        if !header.is_keyword("graph") && !header.is_keyword("digraph") {
            return Err(missing_header(header.pos));
        }

        if let Some(TokenKind::Id { .. }) = self.peek_kind() {
            self.idx += 1;
        }
        let open = match self.next() {
            Some(token) if token.kind == TokenKind::LBrace => token,
            Some(token) => return Err(DotParseError::unexpected(&token)),
            None => return Err(missing_header(self.eof)),
        };

        self.parse_statements(open.pos)?;

        match self.next() {
            None => Ok(()),
            Some(token) => Err(DotParseError::unexpected(&token)),
        }
    }

    /// Parses statements up to and including the `}` that closes the block opened at `open`.
    fn parse_statements(&mut self, open: SourcePos) -> Result<(), DotParseError> {
        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(DotParseError::UnclosedBody { line: open.line, column: open.column });
            };
            match &token.kind {
                TokenKind::RBrace => {
                    self.idx += 1;
                    return Ok(());
                }
                TokenKind::Semi | TokenKind::Comma => self.idx += 1,
                TokenKind::RBracket => {
                    return Err(DotParseError::UnmatchedBracket {
                        line: token.pos.line,
                        column: token.pos.column,
                    })
                }
                TokenKind::LBrace => {
                    self.idx += 1;
                    self.parse_subgraph_body(None, token.pos)?;
                }
                TokenKind::Id { .. } => self.parse_statement(token.clone())?,
                _ => return Err(DotParseError::unexpected(&token)),
            }
        }
    }

    fn parse_statement(&mut self, first: Token) -> Result<(), DotParseError> {
        let followed_by_bracket = matches!(
            self.tokens.get(self.idx + 1).map(|token| &token.kind),
            Some(TokenKind::LBracket)
        );

        if followed_by_bracket && first.is_keyword("graph") {
            self.idx += 1;
            let attributes = self.parse_attribute_lists()?;
            self.apply_graph_attributes(attributes);
            return Ok(());
        }
        if followed_by_bracket && first.is_keyword("node") {
            self.idx += 1;
            let attributes = self.parse_attribute_lists()?;
            self.scope.node_defaults.extend(attributes);
            return Ok(());
        }
        if followed_by_bracket && first.is_keyword("edge") {
            self.idx += 1;
            let attributes = self.parse_attribute_lists()?;
            self.scope.edge_defaults.extend(attributes);
            return Ok(());
        }
        if first.is_keyword("subgraph") {
            self.idx += 1;
            return self.parse_subgraph();
        }

        self.idx += 1;
        if self.eat(&TokenKind::Equals) {
            let value = self.expect_id()?;
            let key = id_text(&first);
            self.apply_graph_attributes(Attributes::from([(key.into(), value)]));
            return Ok(());
        }

        let mut chain = vec![(self.node_id(&first)?, first.pos)];
        let mut directions = Vec::new();
        while let Some(TokenKind::Arrow { directed }) = self.peek_kind() {
            directions.push(*directed);
            self.idx += 1;
            let target = match self.next() {
                Some(token) if matches!(token.kind, TokenKind::Id { .. }) => token,
                Some(token) => return Err(DotParseError::unexpected(&token)),
                None => {
                    return Err(DotParseError::UnexpectedToken {
                        line: self.eof.line,
                        column: self.eof.column,
                        token: String::new(),
                    })
                }
            };
            chain.push((self.node_id(&target)?, target.pos));
        }

        let attributes = if self.peek_kind() == Some(&TokenKind::LBracket) {
            self.parse_attribute_lists()?
        } else {
            Attributes::new()
        };

        if directions.is_empty() {
            let (id, _) = chain.remove(0);
            self.touch_node(id).merge_attributes(attributes);
            return Ok(());
        }

        for (id, _) in &chain {
            self.touch_node(id.clone());
        }
        let mut edge_attributes = self.scope.edge_defaults.clone();
        edge_attributes.extend(attributes);
        let label = edge_attributes.remove(ATTR_LABEL);

        for (segment, directed) in directions.into_iter().enumerate() {
            let mut edge = Edge::new_with(
                chain[segment].0.clone(),
                chain[segment + 1].0.clone(),
                label.clone(),
                directed,
            );
            edge.merge_attributes(edge_attributes.clone());
            self.graph.add_edge(edge);
        }
        Ok(())
    }

    fn parse_subgraph(&mut self) -> Result<(), DotParseError> {
        let mut name = None;
        if let Some(token) = self.peek().cloned() {
            if let TokenKind::Id { text, .. } = &token.kind {
                name = Some(text.clone());
                self.idx += 1;
            }
        }
        let open = match self.next() {
            Some(token) if token.kind == TokenKind::LBrace => token,
            Some(token) => return Err(DotParseError::unexpected(&token)),
            None => {
                return Err(DotParseError::UnclosedBody {
                    line: self.eof.line,
                    column: self.eof.column,
                })
            }
        };
        let cluster = name.as_deref().and_then(cluster_name);
        self.parse_subgraph_body(cluster, open.pos)
    }

    fn parse_subgraph_body(
        &mut self,
        cluster: Option<ClusterId>,
        open: SourcePos,
    ) -> Result<(), DotParseError> {
        let saved = self.scope.clone();
        if cluster.is_some() {
            self.scope.cluster = cluster;
        }
        let result = self.parse_statements(open);
        self.scope = saved;
        result
    }

    fn apply_graph_attributes(&mut self, attributes: Attributes) {
        if let Some(cluster) = &self.scope.cluster {
            tracing::debug!(cluster = %cluster, count = attributes.len(), "ignoring subgraph attributes");
            return;
        }
        self.graph.merge_attributes(attributes);
    }

    /// Creates `id` with the active node defaults when new; assigns the active cluster.
    fn touch_node(&mut self, id: NodeId) -> &mut Node {
        let exists = self.graph.contains_node(id.as_str());
        let defaults = (!exists).then(|| self.scope.node_defaults.clone());
        let cluster = self.scope.cluster.clone();

        let node = self.graph.ensure_node(id);
        if let Some(defaults) = defaults {
            node.merge_attributes(defaults);
        }
        if let Some(cluster) = cluster {
            node.set_attribute_if_absent(ATTR_CLUSTER, cluster.into_string());
        }
        node
    }

    fn parse_attribute_lists(&mut self) -> Result<Attributes, DotParseError> {
        let mut attributes = Attributes::new();
        while let Some(open) = self.peek().cloned() {
            if open.kind != TokenKind::LBracket {
                break;
            }
            self.idx += 1;
            loop {
                let Some(token) = self.next() else {
                    return Err(DotParseError::UnmatchedBracket {
                        line: open.pos.line,
                        column: open.pos.column,
                    });
                };
                match &token.kind {
                    TokenKind::RBracket => break,
                    TokenKind::Semi | TokenKind::Comma => {}
                    TokenKind::Id { text, .. } => {
                        let key = text.clone();
                        if !self.eat(&TokenKind::Equals) {
                            return Err(self.unexpected_at_cursor());
                        }
                        let value = self.expect_id()?;
                        attributes.insert(key.into(), value);
                    }
                    TokenKind::RBrace | TokenKind::LBrace if self.peek().is_none() => {
                        return Err(DotParseError::UnmatchedBracket {
                            line: open.pos.line,
                            column: open.pos.column,
                        })
                    }
                    _ => return Err(DotParseError::unexpected(&token)),
                }
            }
        }
        Ok(attributes)
    }

    fn expect_id(&mut self) -> Result<String, DotParseError> {
        let text = match self.peek() {
            Some(Token { kind: TokenKind::Id { text, .. }, .. }) => text.clone(),
            _ => return Err(self.unexpected_at_cursor()),
        };
        self.idx += 1;
        Ok(text)
    }

    fn unexpected_at_cursor(&self) -> DotParseError {
        match self.peek() {
            Some(token) => DotParseError::unexpected(token),
            None => DotParseError::UnexpectedToken {
                line: self.eof.line,
                column: self.eof.column,
                token: String::new(),
            },
        }
    }

    fn node_id(&self, token: &Token) -> Result<NodeId, DotParseError> {
        let name = id_text(token);
        NodeId::new(name.clone()).map_err(|reason| DotParseError::InvalidNodeId {
            line: token.pos.line,
            column: token.pos.column,
            name,
            reason,
        })
    }
}

fn id_text(token: &Token) -> String {
    match &token.kind {
        TokenKind::Id { text, .. } => text.clone(),
        other => other.to_string(),
    }
}

/// `cluster_x` and `clusterX` name the clusters `x` and `X`; other subgraphs are not clusters.
fn cluster_name(subgraph: &str) -> Option<ClusterId> {
    let rest = subgraph.strip_prefix(CLUSTER_PREFIX)?;
    let rest = rest.strip_prefix('_').unwrap_or(rest);
    let name = if rest.is_empty() { CLUSTER_PREFIX } else { rest };
    ClusterId::new(name).ok()
}

/// Writes `graph` as a DOT document that [`parse_dot`] reads back to the same graph.
///
/// Output is deterministic: graph attributes, then nodes in insertion order, then one
/// `subgraph cluster_*` block per cluster listing its members, then edges in insertion order.
pub fn export_dot(graph: &Graph) -> String {
    let directed = graph.has_directed_edges();
    let mut out = String::new();
    out.push_str(if directed { "digraph {\n" } else { "graph {\n" });

    if !graph.attributes().is_empty() {
        out.push_str("  graph ");
        write_attribute_list(&mut out, graph.attributes().iter());
        out.push_str(";\n");
    }

    for node in graph.nodes() {
        out.push_str("  ");
        out.push_str(&quote_if_needed(node.id().as_str()));
        let mut attributes =
            node.attributes().iter().filter(|(key, _)| key.as_str() != ATTR_CLUSTER).peekable();
        if attributes.peek().is_some() {
            out.push(' ');
            write_attribute_list(&mut out, attributes);
        }
        out.push_str(";\n");
    }

    let clusters: BTreeMap<ClusterId, Vec<usize>> = graph.clusters();
    for (cluster, members) in &clusters {
        out.push_str("  subgraph ");
        out.push_str(&quote_if_needed(&format!("{CLUSTER_PREFIX}_{cluster}")));
        out.push_str(" {\n");
        for &idx in members {
            out.push_str("    ");
            out.push_str(&quote_if_needed(graph.nodes()[idx].id().as_str()));
            out.push_str(";\n");
        }
        out.push_str("  }\n");
    }

    for edge in graph.edges() {
        out.push_str("  ");
        out.push_str(&quote_if_needed(edge.from().as_str()));
        out.push_str(if edge.is_directed() { " -> " } else { " -- " });
        out.push_str(&quote_if_needed(edge.to().as_str()));

        let label = edge.label().map(|label| (ATTR_LABEL, label));
        let others = edge
            .attributes()
            .iter()
            .filter(|(key, _)| key.as_str() != ATTR_LABEL)
            .map(|(key, value)| (key.as_str(), value.as_str()));
        let mut attributes = label.into_iter().chain(others).peekable();
        if attributes.peek().is_some() {
            out.push(' ');
            write_attribute_list(&mut out, attributes);
        }
        out.push_str(";\n");
    }

    out.push_str("}\n");
    out
}

fn write_attribute_list<K, V>(out: &mut String, attributes: impl Iterator<Item = (K, V)>)
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    out.push('[');
    for (idx, (key, value)) in attributes.enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        out.push_str(&quote_if_needed(key.as_ref()));
        out.push('=');
        out.push_str(&quote(value.as_ref()));
    }
    out.push(']');
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use super::{export_dot, parse_dot, DotParseError};
    use crate::format::dsl::parse_dsl;
    use crate::model::{fixtures, Graph};

    type EdgeView = (String, String, Option<String>, bool, Vec<(String, String)>);

    /// Order-preserving view of everything a round trip must keep.
    fn semantic_view(graph: &Graph) -> (Vec<(String, Vec<(String, String)>)>, Vec<EdgeView>) {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| {
                let attrs = node
                    .attributes()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect::<Vec<_>>();
                (node.id().to_string(), attrs)
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|edge| {
                let attrs = edge
                    .attributes()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect::<Vec<_>>();
                (
                    edge.from().to_string(),
                    edge.to().to_string(),
                    edge.label().map(str::to_owned),
                    edge.is_directed(),
                    attrs,
                )
            })
            .collect();
        (nodes, edges)
    }

    #[test]
    fn parses_basic_digraph() {
        let graph = parse_dot(
            r#"
            digraph G {
                a [label="Start", shape=ellipse];
                b;
                a -> b [label="go"];
                b -> c -> d
            }
            "#,
        )
        .expect("parse");

        let ids = graph.nodes().iter().map(|n| n.id().as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(graph.node("a").expect("a").label(), "Start");
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edges()[0].label(), Some("go"));
        assert!(graph.edges()[0].attribute("label").is_none());
        assert!(graph.edges().iter().all(|edge| edge.is_directed()));
    }

    #[test]
    fn comments_are_stripped_but_strings_keep_their_text() {
        let graph = parse_dot(
            "graph {\n  // line comment\n  /* block\n comment */ a -- b [label=\"http://x /* y */\"];\n# hash\n}",
        )
        .expect("parse");
        assert_eq!(graph.edges()[0].label(), Some("http://x /* y */"));
        assert!(!graph.edges()[0].is_directed());
    }

    #[test]
    fn defaults_apply_to_later_elements_only() {
        let graph = parse_dot(
            "digraph { a; node [shape=box]; edge [style=dashed]; b; a -> b; c [shape=circle]; }",
        )
        .expect("parse");
        assert_eq!(graph.node("a").expect("a").attribute("shape"), None);
        assert_eq!(graph.node("b").expect("b").attribute("shape"), Some("box"));
        assert_eq!(graph.node("c").expect("c").attribute("shape"), Some("circle"));
        assert_eq!(graph.edges()[0].attribute("style"), Some("dashed"));
    }

    #[test]
    fn graph_attributes_and_clusters() {
        let graph = parse_dot(
            r#"strict digraph "flow" {
                rankdir=LR;
                graph [theme=dark];
                subgraph cluster_backend {
                    node [shape=cylinder];
                    label="Backend";
                    db; cache;
                }
                api -> db;
                other;
            }"#,
        )
        .expect("parse");
        assert_eq!(graph.attribute("rankdir"), Some("LR"));
        assert_eq!(graph.attribute("theme"), Some("dark"));
        assert_eq!(graph.attribute("label"), None);
        assert_eq!(graph.node("db").expect("db").attribute("cluster"), Some("backend"));
        assert_eq!(graph.node("db").expect("db").attribute("shape"), Some("cylinder"));
        assert_eq!(graph.node("api").expect("api").attribute("shape"), None);
        assert_eq!(graph.node("other").expect("other").attribute("cluster"), None);

        let clusters = graph.clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.values().next().map(Vec::len), Some(2));
    }

    #[rstest]
    #[case("a -> b", 1, "MissingHeader")]
    #[case("", 1, "MissingHeader")]
    #[case("digraph {\n a -> b;\n", 1, "UnclosedBody")]
    #[case("digraph {\n a [label=\"x];\n}", 2, "UnterminatedString")]
    #[case("digraph {\n a [label=x;\n", 2, "UnmatchedBracket")]
    #[case("digraph {\n a ];\n}", 2, "UnmatchedBracket")]
    #[case("digraph {\n a -> ;\n}", 2, "UnexpectedToken")]
    #[case("digraph {\n a @ b\n}", 2, "UnexpectedToken")]
    #[case("digraph {\n \"\" -> b\n}", 2, "InvalidNodeId")]
    #[case("digraph { a } extra", 1, "UnexpectedToken")]
    fn reports_located_errors(#[case] input: &str, #[case] line: usize, #[case] variant: &str) {
        let err = parse_dot(input).unwrap_err();
        assert_eq!(err.line(), line, "{input:?} -> {err}");
        assert!(format!("{err:?}").starts_with(variant), "{input:?} -> {err:?}");
    }

    #[test]
    fn missing_header_points_at_first_token() {
        let err = parse_dot("\n  node -> b").unwrap_err();
        assert_eq!(err, DotParseError::MissingHeader { line: 2, column: 3 });
    }

    #[test]
    fn export_is_deterministic_and_quotes_when_needed() {
        let mut graph = parse_dsl("\"Load data\" -> node : say \"hi\"").expect("parse");
        graph.set_attribute("theme", "dark");
        let dot = export_dot(&graph);
        assert_eq!(
            dot,
            "digraph {\n  graph [theme=\"dark\"];\n  \"Load data\";\n  \"node\";\n  \"Load data\" -> \"node\" [label=\"say \\\"hi\\\"\"];\n}\n"
        );
        assert_eq!(export_dot(&graph), dot);
    }

    #[test]
    fn export_then_parse_preserves_semantics() {
        for graph in [fixtures::small_dag(), fixtures::multi_edges()] {
            let dot = export_dot(&graph);
            let reparsed = parse_dot(&dot).expect("reparse");
            assert_eq!(semantic_view(&reparsed), semantic_view(&graph), "{dot}");
        }
    }

    #[test]
    fn backslashes_survive_export_and_reparse() {
        let graph = parse_dot(
            r#"digraph { A [label="C:\\"]; B [label="line\nbreak"]; A -> B [label="a\\b"]; }"#,
        )
        .expect("parse");
        assert_eq!(graph.node("A").expect("A").attribute("label"), Some(r"C:\"));
        assert_eq!(graph.node("B").expect("B").attribute("label"), Some(r"line\nbreak"));
        assert_eq!(graph.edges()[0].label(), Some(r"a\b"));

        let dot = export_dot(&graph);
        let reparsed = parse_dot(&dot).expect("reparse");
        assert_eq!(semantic_view(&reparsed), semantic_view(&graph), "{dot}");
    }

    #[test]
    fn dsl_label_attribute_is_exported_as_edge_label() {
        let graph = parse_dsl("A -> B [label=hello]").expect("parse");
        let dot = export_dot(&graph);
        assert!(dot.contains("A -> B [label=\"hello\"];"), "{dot}");
        let reparsed = parse_dot(&dot).expect("reparse");
        assert_eq!(reparsed.edges()[0].label(), Some("hello"));
    }

    #[test]
    fn dsl_export_round_trip_keeps_clusters_and_styles() {
        let graph = parse_dsl(
            "graph [theme=colorful]\nApi [cluster=edge, shape=hexagon]\nDb [cluster=data]\nApi{dashed} -> Db [color=\"#ff0000\"] : query\nDb -- Cache",
        )
        .expect("parse");
        let reparsed = parse_dot(&export_dot(&graph)).expect("reparse");
        assert_eq!(semantic_view(&reparsed), semantic_view(&graph));
        assert_eq!(reparsed.attributes(), graph.attributes());

        let names = reparsed
            .clusters()
            .into_iter()
            .map(|(cluster, members)| (cluster.to_string(), members.len()))
            .collect::<BTreeMap<_, _>>();
        assert_eq!(names, BTreeMap::from([("data".to_owned(), 1), ("edge".to_owned(), 1)]));
    }
}
