//! # Source Dialects
//!
//! The instrumentation engine works on Java and Kotlin sources through one capability
//! interface. Every structural question the injectors ask (is a class externally
//! visible, where is a method body, which node is the callee of a call, how is a
//! statement terminated) is answered by a [`Dialect`] implementation, so the engine
//! itself never branches on the language.

mod java;
mod kotlin;

pub use java::JavaDialect;
pub use kotlin::KotlinDialect;

use crate::ast_utils::{self, SgNode};
use ast_grep_language::SupportLang as Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The two supported source dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Java,
    Kotlin,
}

impl DialectKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "java" => Some(DialectKind::Java),
            "kt" | "kts" => Some(DialectKind::Kotlin),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "java" => Some(DialectKind::Java),
            "kotlin" | "kt" => Some(DialectKind::Kotlin),
            _ => None,
        }
    }

    pub fn language(self) -> Language {
        match self {
            DialectKind::Java => Language::Java,
            DialectKind::Kotlin => Language::Kotlin,
        }
    }

    pub fn adapter(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Java => &JavaDialect,
            DialectKind::Kotlin => &KotlinDialect,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::Java => write!(f, "java"),
            DialectKind::Kotlin => write!(f, "kotlin"),
        }
    }
}

/// Node kinds of a dialect grammar that the generic helpers navigate by.
pub struct NodeTypes {
    pub class_declarations: &'static [&'static str],
    pub class_body: &'static str,
    pub method_declarations: &'static [&'static str],
    /// Nodes whose named children are statements
    pub statement_lists: &'static [&'static str],
    /// Transparent wrappers between a block and its statements
    pub statement_wrappers: &'static [&'static str],
    /// Nodes an enclosing-statement search never climbs past
    pub scope_boundaries: &'static [&'static str],
    /// Block-like nodes used as naming scope outside of methods
    pub block_scopes: &'static [&'static str],
    pub call_expression: &'static str,
    pub argument_container: &'static str,
    pub identifier: &'static str,
    pub references: &'static [&'static str],
    pub comments: &'static [&'static str],
    pub package_declaration: &'static str,
    pub import_declaration: &'static str,
    pub import_containers: &'static [&'static str],
    /// Zero-width leaves are recovery tokens inserted by the parser
    pub zero_width_is_error: bool,
}

impl NodeTypes {
    pub fn is_comment(&self, kind: &str) -> bool {
        self.comments.contains(&kind)
    }

    pub fn is_class(&self, kind: &str) -> bool {
        self.class_declarations.contains(&kind)
    }

    pub fn is_method(&self, kind: &str) -> bool {
        self.method_declarations.contains(&kind)
    }
}

/// Where a synthesized fragment is meant to live; used to validate it by parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentScope {
    Statement,
    Member,
    Import,
}

/// Shape of a method body.
pub enum BodyState<'r> {
    /// The method declares no body (abstract, expression-bodied, ...)
    Missing,
    Block(BlockShape<'r>),
}

/// A braced block with its statements, comments excluded.
pub struct BlockShape<'r> {
    pub node: SgNode<'r>,
    /// Byte offset just past the opening brace
    pub open: usize,
    /// Byte offset of the closing brace
    pub close: usize,
    pub statements: Vec<SgNode<'r>>,
}

impl<'r> BlockShape<'r> {
    pub fn of(node: SgNode<'r>, types: &NodeTypes) -> Option<Self> {
        let open = node.children().find(|c| c.kind() == "{")?.range().end;
        let close = node
            .children()
            .filter(|c| c.kind() == "}")
            .last()?
            .range()
            .start;
        let mut statements = Vec::new();
        for child in ast_utils::named_children(&node, types) {
            if types.statement_wrappers.contains(&child.kind().as_ref()) {
                statements.extend(ast_utils::named_children(&child, types));
            } else {
                statements.push(child);
            }
        }
        Some(Self {
            node,
            open,
            close,
            statements,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Capability interface over a source dialect.
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DialectKind;

    fn node_types(&self) -> &'static NodeTypes;

    fn language(&self) -> Language {
        self.kind().language()
    }

    /// Whether a class declaration is visible outside its package.
    fn is_externally_visible(&self, class: &SgNode<'_>) -> bool;

    /// Simple name of a class or method declaration.
    fn declared_name(&self, declaration: &SgNode<'_>) -> Option<String>;

    fn class_body<'r>(&self, class: &SgNode<'r>) -> Option<SgNode<'r>> {
        let types = self.node_types();
        class.children().find(|c| c.kind() == types.class_body)
    }

    fn method_body<'r>(&self, method: &SgNode<'r>) -> BodyState<'r>;

    fn first_parameter_name(&self, method: &SgNode<'_>) -> Option<String>;

    /// The identifier naming the invoked function of a call expression.
    fn callee_name<'r>(&self, call: &SgNode<'r>) -> Option<SgNode<'r>>;

    /// Argument nodes of a call, `None` when the call has no argument list.
    fn arguments<'r>(&self, call: &SgNode<'r>) -> Option<Vec<SgNode<'r>>>;

    /// The expression carried by an argument node.
    fn argument_expression<'r>(&self, argument: &SgNode<'r>) -> Option<SgNode<'r>>;

    /// The call a statement consists of, if it is a bare call.
    fn statement_call<'r>(&self, statement: &SgNode<'r>) -> Option<SgNode<'r>>;

    /// Whether `child` is the unbraced body of a lambda, branch or loop `parent`.
    fn is_inline_body(&self, parent: &SgNode<'_>, child: &SgNode<'_>) -> bool;

    /// Operators that bind a name in a declaration (`name =`, `name:`).
    fn binding_operators(&self) -> &'static [&'static str];

    fn terminate(&self, expression: &str) -> String;

    fn declaration(&self, name: &str, type_name: &str, initializer: &str) -> String;

    /// The statement an inline target becomes inside a materialized block.
    fn inline_statement(&self, target: &SgNode<'_>, text: &str) -> String;

    fn import(&self, path: &str) -> String;

    /// Method header line of a synthesized entry method, without the opening brace.
    fn entry_method_header(&self, name: &str, parameter: &str, parameter_type: &str)
    -> Vec<String>;

    /// Wraps a fragment into a compilation unit that parses it in `scope`.
    fn fragment_context(&self, scope: FragmentScope, fragment: &str) -> String;

    /// Whether a statement is the base-class call of method `entry`.
    fn is_base_call(&self, statement: &SgNode<'_>, entry: &str) -> bool {
        let Some(call) = self.statement_call(statement) else {
            return false;
        };
        let callee = callee_text(self, &call);
        callee.starts_with("super") && callee.ends_with(&format!(".{entry}"))
    }

    fn package_name(&self, root: &SgNode<'_>) -> Option<String> {
        let types = self.node_types();
        let package = root
            .children()
            .find(|c| c.kind() == types.package_declaration)?;
        let name = ast_utils::normalized(&package.text());
        let name = name.strip_prefix("package").unwrap_or(&name);
        Some(name.trim_end_matches(';').to_string())
    }
}

/// Text of the callee part of a call, whitespace stripped.
pub fn callee_text<D: Dialect + ?Sized>(dialect: &D, call: &SgNode<'_>) -> String {
    let types = dialect.node_types();
    let text = call.text();
    let end = call
        .children()
        .find(|c| c.kind() == types.argument_container)
        .map(|args| args.range().start - call.range().start)
        .unwrap_or(text.len());
    ast_utils::normalized(&text[..end])
}

/// The call expression whose callee is the identifier `name`.
pub fn invoked_call<'r, D: Dialect + ?Sized>(dialect: &D, name: &SgNode<'r>) -> Option<SgNode<'r>> {
    let types = dialect.node_types();
    let mut current = name.parent()?;
    for _ in 0..3 {
        if current.kind() == types.call_expression {
            let callee = dialect.callee_name(&current)?;
            return (callee.range() == name.range()).then_some(current);
        }
        current = current.parent()?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(
            DialectKind::from_path(Path::new("a/MainActivity.java")),
            Some(DialectKind::Java)
        );
        assert_eq!(
            DialectKind::from_path(Path::new("a/MainActivity.kt")),
            Some(DialectKind::Kotlin)
        );
        assert_eq!(DialectKind::from_path(Path::new("a/Readme.md")), None);
    }

    #[test]
    fn test_dialect_from_name() {
        assert_eq!(DialectKind::from_name("Kotlin"), Some(DialectKind::Kotlin));
        assert_eq!(DialectKind::from_name("JAVA"), Some(DialectKind::Java));
        assert_eq!(DialectKind::from_name("rust"), None);
    }
}
