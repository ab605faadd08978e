//! Structural marker checks used for idempotency.

use crate::ast_utils::{self, SgNode};
use crate::dialect::{Dialect, callee_text};

/// Whether `scope` contains a call whose text equals `marker`, ignoring whitespace.
/// Comments and string literals never match since only call nodes are compared.
pub fn contains_statement(dialect: &dyn Dialect, scope: &SgNode<'_>, marker: &str) -> bool {
    let wanted = ast_utils::normalized(marker);
    let wanted = wanted.trim_end_matches(';');
    if wanted.is_empty() || !ast_utils::normalized(&scope.text()).contains(wanted) {
        return false;
    }
    let call_kind = dialect.node_types().call_expression;
    ast_utils::descendants(scope)
        .iter()
        .any(|n| n.kind() == call_kind && ast_utils::normalized(&n.text()) == wanted)
}

/// Whether `scope` contains a call to the function spelled `callee`.
pub fn contains_call_to(dialect: &dyn Dialect, scope: &SgNode<'_>, callee: &str) -> bool {
    let wanted = ast_utils::normalized(callee);
    if !ast_utils::normalized(&scope.text()).contains(&wanted) {
        return false;
    }
    let call_kind = dialect.node_types().call_expression;
    ast_utils::descendants(scope)
        .iter()
        .any(|n| n.kind() == call_kind && callee_text(dialect, n) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_utils::AstParser;
    use crate::dialect::DialectKind;

    const MARKER: &str = "getLifecycle().addObserver(new NappaLifecycleObserver(this))";

    #[test]
    fn test_marker_in_code_matches() {
        let source = "class A { void f() { getLifecycle().addObserver( new NappaLifecycleObserver(this) ); } }";
        let ast = AstParser::new().parse(source, DialectKind::Java);
        assert!(contains_statement(
            DialectKind::Java.adapter(),
            &ast.root(),
            MARKER
        ));
    }

    #[test]
    fn test_marker_in_comment_or_string_ignored() {
        let source = r#"class A {
    // getLifecycle().addObserver(new NappaLifecycleObserver(this));
    String s = "getLifecycle().addObserver(new NappaLifecycleObserver(this))";
}"#;
        let ast = AstParser::new().parse(source, DialectKind::Java);
        assert!(!contains_statement(
            DialectKind::Java.adapter(),
            &ast.root(),
            MARKER
        ));
    }

    #[test]
    fn test_call_to_probe() {
        let source = "fun f() {\n    Nappa.notifyExtras(intent.extras)\n}\n";
        let ast = AstParser::new().parse(source, DialectKind::Kotlin);
        let kotlin = DialectKind::Kotlin.adapter();
        assert!(contains_call_to(kotlin, &ast.root(), "Nappa.notifyExtras"));
        assert!(!contains_call_to(kotlin, &ast.root(), "Nappa.init"));
    }
}
