use super::{BlockShape, BodyState, Dialect, DialectKind, FragmentScope, NodeTypes};
use crate::ast_utils::{self, SgNode};

static KOTLIN_TYPES: NodeTypes = NodeTypes {
    class_declarations: &["class_declaration", "object_declaration"],
    class_body: "class_body",
    method_declarations: &[
        "function_declaration",
        "secondary_constructor",
        "anonymous_initializer",
    ],
    statement_lists: &["statements"],
    statement_wrappers: &["statements"],
    scope_boundaries: &[
        "class_body",
        "enum_class_body",
        "source_file",
        "function_body",
        "function_declaration",
    ],
    block_scopes: &["statements", "lambda_literal"],
    call_expression: "call_expression",
    argument_container: "call_suffix",
    identifier: "simple_identifier",
    references: &["simple_identifier", "navigation_expression"],
    comments: &["line_comment", "multiline_comment", "comment"],
    package_declaration: "package_header",
    import_declaration: "import_header",
    import_containers: &["import_list"],
    zero_width_is_error: false,
};

const HIDDEN_VISIBILITY: [&str; 3] = ["private", "internal", "protected"];

pub struct KotlinDialect;

impl Dialect for KotlinDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Kotlin
    }

    fn node_types(&self) -> &'static NodeTypes {
        &KOTLIN_TYPES
    }

    // Kotlin declarations are public unless a narrower visibility is spelled out
    fn is_externally_visible(&self, class: &SgNode<'_>) -> bool {
        let Some(modifiers) = class.children().find(|c| c.kind() == "modifiers") else {
            return true;
        };
        !modifiers
            .children()
            .filter(|m| m.kind() == "visibility_modifier")
            .any(|m| HIDDEN_VISIBILITY.contains(&m.text().trim()))
    }

    fn declared_name(&self, declaration: &SgNode<'_>) -> Option<String> {
        declaration
            .children()
            .find(|c| c.kind() == "type_identifier" || c.kind() == "simple_identifier")
            .map(|name| name.text().to_string())
    }

    fn method_body<'r>(&self, method: &SgNode<'r>) -> BodyState<'r> {
        let body = if method.kind() == "anonymous_initializer" {
            Some(method.clone())
        } else {
            method.children().find(|c| c.kind() == "function_body")
        };
        body.and_then(|body| BlockShape::of(body, &KOTLIN_TYPES))
            .map_or(BodyState::Missing, BodyState::Block)
    }

    fn first_parameter_name(&self, method: &SgNode<'_>) -> Option<String> {
        let parameters = method
            .children()
            .find(|c| c.kind() == "function_value_parameters")?;
        let first = parameters.children().find(|c| c.kind() == "parameter")?;
        first
            .children()
            .find(|c| c.kind() == "simple_identifier")
            .map(|name| name.text().to_string())
    }

    fn callee_name<'r>(&self, call: &SgNode<'r>) -> Option<SgNode<'r>> {
        let callee = call.children().next()?;
        if callee.kind() == "simple_identifier" {
            return Some(callee);
        }
        if callee.kind() != "navigation_expression" {
            return None;
        }
        callee
            .children()
            .filter(|c| c.kind() == "navigation_suffix")
            .last()?
            .children()
            .find(|c| c.kind() == "simple_identifier")
    }

    fn arguments<'r>(&self, call: &SgNode<'r>) -> Option<Vec<SgNode<'r>>> {
        let suffix = call.children().find(|c| c.kind() == "call_suffix")?;
        let arguments = suffix
            .children()
            .find(|c| c.kind() == "value_arguments")?;
        Some(
            arguments
                .children()
                .filter(|c| c.kind() == "value_argument")
                .collect(),
        )
    }

    // Named arguments carry the expression after `=`
    fn argument_expression<'r>(&self, argument: &SgNode<'r>) -> Option<SgNode<'r>> {
        ast_utils::named_children(argument, &KOTLIN_TYPES).pop()
    }

    fn statement_call<'r>(&self, statement: &SgNode<'r>) -> Option<SgNode<'r>> {
        (statement.kind() == "call_expression").then(|| statement.clone())
    }

    fn is_inline_body(&self, parent: &SgNode<'_>, _child: &SgNode<'_>) -> bool {
        parent.kind() == "control_structure_body" && !parent.children().any(|c| c.kind() == "{")
    }

    fn binding_operators(&self) -> &'static [&'static str] {
        &["=", ":"]
    }

    fn terminate(&self, expression: &str) -> String {
        expression.to_string()
    }

    fn declaration(&self, name: &str, type_name: &str, initializer: &str) -> String {
        format!("val {name}: {type_name} = {initializer}")
    }

    fn inline_statement(&self, _target: &SgNode<'_>, text: &str) -> String {
        text.to_string()
    }

    fn import(&self, path: &str) -> String {
        format!("import {path}")
    }

    fn entry_method_header(
        &self,
        name: &str,
        parameter: &str,
        parameter_type: &str,
    ) -> Vec<String> {
        vec![format!("override fun {name}({parameter}: {parameter_type})")]
    }

    fn fragment_context(&self, scope: FragmentScope, fragment: &str) -> String {
        match scope {
            FragmentScope::Statement => format!("fun nappaFragment() {{\n{fragment}\n}}\n"),
            FragmentScope::Member => format!("class NappaFragment {{\n{fragment}\n}}\n"),
            FragmentScope::Import => format!("{fragment}\n\nclass NappaFragment\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_utils::AstParser;

    const SOURCE: &str = r#"package com.example.app

import android.os.Bundle

class MainActivity : AppCompatActivity() {
    override fun onCreate(savedInstanceState: Bundle?) {
        super.onCreate(savedInstanceState)
        if (ready) startActivity(Intent(this, B::class.java))
    }
}

private class Hidden
"#;

    #[test]
    fn test_class_visibility_and_names() {
        let ast = AstParser::new().parse(SOURCE, DialectKind::Kotlin);
        let root = ast.root();
        let classes: Vec<_> = root
            .children()
            .filter(|c| KOTLIN_TYPES.is_class(&c.kind()))
            .collect();
        assert_eq!(classes.len(), 2);
        assert!(KotlinDialect.is_externally_visible(&classes[0]));
        assert!(!KotlinDialect.is_externally_visible(&classes[1]));
        assert_eq!(
            KotlinDialect.declared_name(&classes[0]).as_deref(),
            Some("MainActivity")
        );
        assert_eq!(
            KotlinDialect.package_name(&root).as_deref(),
            Some("com.example.app")
        );
    }

    #[test]
    fn test_method_body_and_base_call() {
        let ast = AstParser::new().parse(SOURCE, DialectKind::Kotlin);
        let root = ast.root();
        let method = ast_utils::descendants(&root)
            .into_iter()
            .find(|n| n.kind() == "function_declaration")
            .unwrap();
        assert_eq!(
            KotlinDialect.first_parameter_name(&method).as_deref(),
            Some("savedInstanceState")
        );
        let BodyState::Block(body) = KotlinDialect.method_body(&method) else {
            panic!("expected a block body");
        };
        assert_eq!(body.statements.len(), 2);
        assert!(KotlinDialect.is_base_call(&body.statements[0], "onCreate"));
    }

    #[test]
    fn test_inline_branch_detection() {
        let ast = AstParser::new().parse(SOURCE, DialectKind::Kotlin);
        let root = ast.root();
        let name = ast_utils::descendants(&root)
            .into_iter()
            .find(|n| n.kind() == "simple_identifier" && n.text() == "startActivity")
            .unwrap();
        let call = super::super::invoked_call(&KotlinDialect, &name).unwrap();
        let parent = call.parent().unwrap();
        assert!(KotlinDialect.is_inline_body(&parent, &call));
        let args = KotlinDialect.arguments(&call).unwrap();
        let expression = KotlinDialect.argument_expression(&args[0]).unwrap();
        assert_eq!(expression.kind(), "call_expression");
    }
}
