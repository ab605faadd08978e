//! # AST Utilities Module
//!
//! Parsing and tree navigation helpers shared by the dialect adapters and the
//! injectors, plus the debug rendering behind the `generate_ast` tool.

use ast_grep_core::{AstGrep, Node, tree_sitter::StrDoc};
use ast_grep_language::SupportLang as Language;

use crate::dialect::{DialectKind, NodeTypes};

pub type SgNode<'r> = Node<'r, StrDoc<Language>>;
pub type SgRoot = AstGrep<StrDoc<Language>>;

/// Utilities for working with AST parsing
#[derive(Clone, Default)]
pub struct AstParser;

impl AstParser {
    pub fn new() -> Self {
        Self
    }

    /// Create a new AST from code
    pub fn parse(&self, code: &str, dialect: DialectKind) -> SgRoot {
        AstGrep::new(code, dialect.language())
    }

    /// Build a string representation of the AST
    pub fn build_ast_string<D: ast_grep_core::Doc>(
        node: ast_grep_core::Node<D>,
        depth: usize,
    ) -> String {
        let indent = "  ".repeat(depth);
        let mut result = format!(
            "{}{}[{}:{}]",
            indent,
            node.kind(),
            node.range().start,
            node.range().end
        );

        // Add node text if it's a leaf node or short
        let node_text = node.text();
        if node.children().count() == 0 || node_text.len() <= 50 {
            let escaped_text = node_text.replace('\n', "\\n").replace('\r', "\\r");
            if !escaped_text.trim().is_empty() {
                result.push_str(&format!(" \"{escaped_text}\""));
            }
        }

        result.push('\n');

        for child in node.children() {
            result.push_str(&Self::build_ast_string(child, depth + 1));
        }

        result
    }

    /// Generate a stringified AST for debugging
    pub fn generate_ast_debug_string(&self, code: &str, dialect: DialectKind) -> String {
        let ast = self.parse(code, dialect);
        Self::build_ast_string(ast.root(), 0)
    }
}

/// Named children of a node, comments excluded.
pub fn named_children<'r>(node: &SgNode<'r>, types: &NodeTypes) -> Vec<SgNode<'r>> {
    node.children()
        .filter(|c| c.is_named() && !types.is_comment(&c.kind()))
        .collect()
}

/// All nodes below `node` in pre-order, `node` included.
pub fn descendants<'r>(node: &SgNode<'r>) -> Vec<SgNode<'r>> {
    fn collect<'r>(node: &SgNode<'r>, out: &mut Vec<SgNode<'r>>) {
        out.push(node.clone());
        for child in node.children() {
            collect(&child, out);
        }
    }
    let mut nodes = Vec::new();
    collect(node, &mut nodes);
    nodes
}

/// Nearest ancestor whose kind is one of `kinds`.
pub fn ancestor_of_kind<'r>(node: &SgNode<'r>, kinds: &[&str]) -> Option<SgNode<'r>> {
    std::iter::successors(node.parent(), |n| n.parent()).find(|n| kinds.contains(&n.kind().as_ref()))
}

/// Number of syntax errors in a tree.
pub fn count_errors(node: &SgNode<'_>, types: &NodeTypes) -> usize {
    let own = if node.kind() == "ERROR" {
        1
    } else if types.zero_width_is_error && node.range().is_empty() && node.children().count() == 0
    {
        // recovery tokens the parser inserted (`MISSING ;`)
        usize::from(!node.kind().is_empty())
    } else {
        0
    };
    own + node
        .children()
        .map(|child| count_errors(&child, types))
        .sum::<usize>()
}

/// Text with all whitespace removed.
pub fn normalized(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Leading whitespace of the line containing `offset`.
pub fn line_indent(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = &source[start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// End offset of a node with trailing whitespace excluded.
pub fn trimmed_end(node: &SgNode<'_>) -> usize {
    node.range().start + node.text().trim_end().len()
}

/// Whether only whitespace separates the start of the line from `offset`.
pub fn starts_line(source: &str, offset: usize) -> bool {
    source[line_start(source, offset)..offset].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ast_debug_string() {
        let ast = AstParser::new().generate_ast_debug_string("class A {}", DialectKind::Java);
        assert!(ast.starts_with("program"));
        assert!(ast.contains("class_declaration"));
    }

    #[test]
    fn test_descendants_pre_order() {
        let ast = AstParser::new().parse("class A { void f() {} }", DialectKind::Java);
        let root = ast.root();
        let kinds: Vec<String> = descendants(&root)
            .iter()
            .filter(|n| n.is_named())
            .map(|n| n.kind().to_string())
            .collect();
        let class = kinds.iter().position(|k| k == "class_declaration").unwrap();
        let method = kinds.iter().position(|k| k == "method_declaration").unwrap();
        assert_eq!(kinds[0], "program");
        assert!(class < method);
    }

    #[test]
    fn test_line_helpers() {
        let source = "class A {\n    void f() {}\n}";
        let offset = source.find("void").unwrap();
        assert_eq!(line_start(source, offset), 10);
        assert_eq!(line_indent(source, offset), "    ");
        assert!(starts_line(source, offset));
        assert!(!starts_line(source, source.find("f()").unwrap()));
        assert_eq!(normalized("super . onCreate ( s )"), "super.onCreate(s)");
    }

    #[test]
    fn test_count_errors() {
        let java = DialectKind::Java.adapter().node_types();
        let clean = AstParser::new().parse("class A { void f() { g(); } }", DialectKind::Java);
        assert_eq!(count_errors(&clean.root(), java), 0);
        let broken = AstParser::new().parse("class A { void f() { g( } }", DialectKind::Java);
        assert!(count_errors(&broken.root(), java) > 0);
    }
}
