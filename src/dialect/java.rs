use super::{BlockShape, BodyState, Dialect, DialectKind, FragmentScope, NodeTypes};
use crate::ast_utils::{self, SgNode};

static JAVA_TYPES: NodeTypes = NodeTypes {
    class_declarations: &["class_declaration"],
    class_body: "class_body",
    method_declarations: &["method_declaration", "constructor_declaration"],
    statement_lists: &[
        "block",
        "constructor_body",
        "switch_block_statement_group",
    ],
    statement_wrappers: &[],
    scope_boundaries: &[
        "class_body",
        "interface_body",
        "enum_body",
        "program",
        "method_declaration",
    ],
    block_scopes: &["block", "lambda_expression"],
    call_expression: "method_invocation",
    argument_container: "argument_list",
    identifier: "identifier",
    references: &["identifier", "field_access"],
    comments: &["line_comment", "block_comment", "comment"],
    package_declaration: "package_declaration",
    import_declaration: "import_declaration",
    import_containers: &[],
    zero_width_is_error: true,
};

const BRANCH_AND_LOOP_KINDS: [&str; 5] = [
    "if_statement",
    "while_statement",
    "for_statement",
    "enhanced_for_statement",
    "do_statement",
];

pub struct JavaDialect;

impl Dialect for JavaDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Java
    }

    fn node_types(&self) -> &'static NodeTypes {
        &JAVA_TYPES
    }

    fn is_externally_visible(&self, class: &SgNode<'_>) -> bool {
        class
            .children()
            .find(|c| c.kind() == "modifiers")
            .is_some_and(|modifiers| modifiers.children().any(|m| m.kind() == "public"))
    }

    fn declared_name(&self, declaration: &SgNode<'_>) -> Option<String> {
        declaration
            .children()
            .find(|c| c.kind() == "identifier")
            .map(|name| name.text().to_string())
    }

    fn method_body<'r>(&self, method: &SgNode<'r>) -> BodyState<'r> {
        method
            .children()
            .find(|c| c.kind() == "block" || c.kind() == "constructor_body")
            .and_then(|block| BlockShape::of(block, &JAVA_TYPES))
            .map_or(BodyState::Missing, BodyState::Block)
    }

    fn first_parameter_name(&self, method: &SgNode<'_>) -> Option<String> {
        let parameters = method
            .children()
            .find(|c| c.kind() == "formal_parameters")?;
        let first = parameters
            .children()
            .find(|c| c.kind() == "formal_parameter")?;
        first
            .children()
            .filter(|c| c.kind() == "identifier")
            .last()
            .map(|name| name.text().to_string())
    }

    fn callee_name<'r>(&self, call: &SgNode<'r>) -> Option<SgNode<'r>> {
        // `a.b().name(args)`: the name is the last identifier before the argument list
        call.children()
            .take_while(|c| c.kind() != "argument_list")
            .filter(|c| c.kind() == "identifier")
            .last()
    }

    fn arguments<'r>(&self, call: &SgNode<'r>) -> Option<Vec<SgNode<'r>>> {
        let list = call.children().find(|c| c.kind() == "argument_list")?;
        Some(ast_utils::named_children(&list, &JAVA_TYPES))
    }

    fn argument_expression<'r>(&self, argument: &SgNode<'r>) -> Option<SgNode<'r>> {
        Some(argument.clone())
    }

    fn statement_call<'r>(&self, statement: &SgNode<'r>) -> Option<SgNode<'r>> {
        if statement.kind() != "expression_statement" {
            return None;
        }
        statement
            .children()
            .find(|c| c.is_named())
            .filter(|c| c.kind() == "method_invocation")
    }

    fn is_inline_body(&self, parent: &SgNode<'_>, child: &SgNode<'_>) -> bool {
        if child.kind() == "block" {
            return false;
        }
        let parent_kind = parent.kind();
        if parent_kind == "lambda_expression" {
            return ast_utils::named_children(parent, &JAVA_TYPES)
                .last()
                .is_some_and(|body| body.range() == child.range());
        }
        // `case 1 -> call();` runs its statement only when the arm is taken
        if parent_kind == "switch_rule" {
            return child.kind() == "expression_statement";
        }
        BRANCH_AND_LOOP_KINDS.contains(&parent_kind.as_ref()) && child.kind().ends_with("_statement")
    }

    fn binding_operators(&self) -> &'static [&'static str] {
        &["="]
    }

    fn terminate(&self, expression: &str) -> String {
        format!("{expression};")
    }

    fn declaration(&self, name: &str, type_name: &str, initializer: &str) -> String {
        format!("{type_name} {name} = {initializer};")
    }

    fn inline_statement(&self, target: &SgNode<'_>, text: &str) -> String {
        // An expression lambda may feed a void interface, so its call never becomes `return`
        if target.kind().ends_with("_statement") {
            text.to_string()
        } else {
            self.terminate(text)
        }
    }

    fn import(&self, path: &str) -> String {
        format!("import {path};")
    }

    fn entry_method_header(
        &self,
        name: &str,
        parameter: &str,
        parameter_type: &str,
    ) -> Vec<String> {
        vec![
            "@Override".to_string(),
            format!("protected void {name}({parameter_type} {parameter})"),
        ]
    }

    fn fragment_context(&self, scope: FragmentScope, fragment: &str) -> String {
        match scope {
            FragmentScope::Statement => {
                format!("class NappaFragment {{\nvoid fragment() {{\n{fragment}\n}}\n}}\n")
            }
            FragmentScope::Member => format!("class NappaFragment {{\n{fragment}\n}}\n"),
            FragmentScope::Import => format!("{fragment}\nclass NappaFragment {{}}\n"),
        }
    }
}
