//! # Entry Method Plan
//!
//! The lifecycle and library-init injectors both put statements at the top of the
//! same entry method. They stage those statements into one [`EntryPlan`] per class,
//! which is rendered into edits once, so the base-class call is written at most once
//! and the statements keep the order in which the injectors ran.

use super::ClassContext;
use crate::ast_utils::{self, SgNode};
use crate::config::InstrumentConfig;
use crate::dialect::{BlockShape, BodyState};
use crate::edit::TextEdit;
use crate::errors::ServiceError;
use crate::template::TemplateFactory;
use crate::types::EntryCase;

pub enum EntryMethod<'r> {
    Absent,
    Present {
        method: SgNode<'r>,
        body: BlockShape<'r>,
    },
}

impl EntryMethod<'_> {
    pub fn case(&self, ctx: &ClassContext<'_>, entry: &str) -> EntryCase {
        match self {
            EntryMethod::Absent => EntryCase::Absent,
            EntryMethod::Present { body, .. } => match body.statements.first() {
                None => EntryCase::EmptyBody,
                Some(first) if ctx.dialect.is_base_call(first, entry) => EntryCase::AfterBaseCall,
                Some(_) => EntryCase::BeforeFirstStatement,
            },
        }
    }

    pub fn method_name(&self, ctx: &ClassContext<'_>) -> Option<String> {
        match self {
            EntryMethod::Absent => None,
            EntryMethod::Present { method, .. } => ctx.dialect.declared_name(method),
        }
    }
}

/// Find the entry method among the class members.
pub fn locate<'r>(ctx: &ClassContext<'r>, entry: &str) -> Result<EntryMethod<'r>, ServiceError> {
    let types = ctx.dialect.node_types();
    let Some(class_body) = ctx.dialect.class_body(&ctx.class) else {
        return Ok(EntryMethod::Absent);
    };
    let method = ast_utils::named_children(&class_body, types)
        .into_iter()
        .filter(|member| types.is_method(&member.kind()))
        .find(|member| ctx.dialect.declared_name(member).as_deref() == Some(entry));
    let Some(method) = method else {
        return Ok(EntryMethod::Absent);
    };
    match ctx.dialect.method_body(&method) {
        BodyState::Block(body) => Ok(EntryMethod::Present { method, body }),
        BodyState::Missing => Err(ServiceError::StructuralMismatch(format!(
            "{}.{} has no block body",
            ctx.name, entry
        ))),
    }
}

#[derive(Debug, Default)]
pub struct EntryPlan {
    statements: Vec<String>,
    anchor: Option<String>,
}

impl EntryPlan {
    /// Queue a statement (an expression without terminator).
    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    /// Statements go right after an existing call with this text, when the body has one.
    pub fn anchor_after(&mut self, statement: impl Into<String>) {
        self.anchor = Some(statement.into());
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn render(
        &self,
        ctx: &ClassContext<'_>,
        config: &InstrumentConfig,
        templates: &TemplateFactory,
    ) -> Result<Vec<TextEdit>, ServiceError> {
        if self.statements.is_empty() {
            return Ok(Vec::new());
        }
        let dialect = ctx.dialect;
        let entry = config.entry_method.as_str();
        let mut lines = Vec::with_capacity(self.statements.len() + 1);
        for statement in &self.statements {
            lines.push(templates.statement(dialect, &dialect.terminate(statement))?);
        }

        match locate(ctx, entry)? {
            EntryMethod::Absent => {
                let base = base_call(ctx, config, &config.entry_parameter, templates)?;
                lines.insert(0, base);
                self.append_method(ctx, config, templates, &lines)
            }
            EntryMethod::Present { method, body } if body.is_empty() => {
                let parameter = dialect
                    .first_parameter_name(&method)
                    .unwrap_or_else(|| config.entry_parameter.clone());
                lines.insert(0, base_call(ctx, config, &parameter, templates)?);
                Ok(vec![fill_empty_body(ctx, config, &method, &body, &lines)])
            }
            EntryMethod::Present { body, .. } => {
                let anchor = self.anchor.as_deref().and_then(|anchor| {
                    let wanted = ast_utils::normalized(anchor);
                    body.statements.iter().find(|s| {
                        dialect
                            .statement_call(s)
                            .is_some_and(|call| ast_utils::normalized(&call.text()) == wanted)
                    })
                });
                let first = &body.statements[0];
                match anchor {
                    Some(anchor) => Ok(vec![insert_after(ctx, anchor, &lines)]),
                    None if dialect.is_base_call(first, entry) => {
                        Ok(vec![insert_after(ctx, first, &lines)])
                    }
                    None => Ok(vec![insert_before(ctx, first, &lines)]),
                }
            }
        }
    }

    fn append_method(
        &self,
        ctx: &ClassContext<'_>,
        config: &InstrumentConfig,
        templates: &TemplateFactory,
        lines: &[String],
    ) -> Result<Vec<TextEdit>, ServiceError> {
        let dialect = ctx.dialect;
        let source = ctx.source;
        let unit = config.indent_unit.as_str();
        let class_indent = ast_utils::line_indent(source, ctx.class.range().start);
        let header = (
            config.entry_method.as_str(),
            config.entry_parameter.as_str(),
            config.entry_parameter_type.get(dialect.kind()),
        );

        let Some(class_body) = dialect
            .class_body(&ctx.class)
            .and_then(|body| BlockShape::of(body, dialect.node_types()))
        else {
            // Kotlin classes may omit the body entirely
            let member_indent = format!("{class_indent}{unit}");
            let method = templates.entry_method(dialect, header, lines, &member_indent, unit)?;
            return Ok(vec![TextEdit::insert(
                ast_utils::trimmed_end(&ctx.class),
                format!(" {{\n{method}\n{class_indent}}}"),
            )]);
        };

        let member_indent = class_body
            .statements
            .first()
            .filter(|m| ast_utils::starts_line(source, m.range().start))
            .map(|m| ast_utils::line_indent(source, m.range().start).to_string())
            .unwrap_or_else(|| format!("{class_indent}{unit}"));
        let method = templates.entry_method(dialect, header, lines, &member_indent, unit)?;

        let close = class_body.close;
        let close_line = ast_utils::line_start(source, close);
        if ast_utils::starts_line(source, close) && close_line > class_body.open {
            let separator = if class_body.is_empty() { "" } else { "\n" };
            Ok(vec![TextEdit::insert(
                close_line,
                format!("{separator}{method}\n"),
            )])
        } else {
            Ok(vec![TextEdit::insert(
                close,
                format!("\n{method}\n{class_indent}"),
            )])
        }
    }
}

fn base_call(
    ctx: &ClassContext<'_>,
    config: &InstrumentConfig,
    parameter: &str,
    templates: &TemplateFactory,
) -> Result<String, ServiceError> {
    let call = format!("super.{}({})", config.entry_method, parameter);
    templates.statement(ctx.dialect, &ctx.dialect.terminate(&call))
}

fn fill_empty_body(
    ctx: &ClassContext<'_>,
    config: &InstrumentConfig,
    method: &SgNode<'_>,
    body: &BlockShape<'_>,
    lines: &[String],
) -> TextEdit {
    let source = ctx.source;
    let method_indent = ast_utils::line_indent(source, method.range().start);
    let statement_indent = format!("{method_indent}{}", config.indent_unit);
    let rendered: String = lines
        .iter()
        .map(|line| format!("{statement_indent}{line}\n"))
        .collect();

    let close_line = ast_utils::line_start(source, body.close);
    if ast_utils::starts_line(source, body.close) && close_line > body.open {
        TextEdit::insert(close_line, rendered)
    } else {
        TextEdit::insert(body.close, format!("\n{rendered}{method_indent}"))
    }
}

fn insert_after(ctx: &ClassContext<'_>, statement: &SgNode<'_>, lines: &[String]) -> TextEdit {
    let indent = ast_utils::line_indent(ctx.source, statement.range().start);
    let rendered: String = lines.iter().map(|line| format!("\n{indent}{line}")).collect();
    TextEdit::insert(ast_utils::trimmed_end(statement), rendered)
}

fn insert_before(ctx: &ClassContext<'_>, statement: &SgNode<'_>, lines: &[String]) -> TextEdit {
    let indent = ast_utils::line_indent(ctx.source, statement.range().start);
    let rendered: String = lines.iter().map(|line| format!("{line}\n{indent}")).collect();
    TextEdit::insert(statement.range().start, rendered)
}
