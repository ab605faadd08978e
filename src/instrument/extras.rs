//! # Intent-Extras Injector
//!
//! Puts a probe reporting the payload's extras in front of every activity start.
//! A payload built inline is first hoisted into a fresh local variable so the probe
//! and the call see the same object. Calls that sit in an unbraced lambda body or
//! branch are wrapped into a block first.

use super::scanner::{CallSite, CallSiteScanner};
use super::{ClassContext, StatementContext, markers, statement_context, top_level_classes};
use crate::ast_utils::{self, SgNode};
use crate::config::InstrumentConfig;
use crate::corpus::SourceFile;
use crate::edit::{TextEdit, Transaction};
use crate::errors::ServiceError;
use crate::naming;
use crate::report::ResultCollector;
use crate::template::TemplateFactory;
use crate::types::{Concern, PayloadForm, SiteDescriptor, SiteOutcome};

use super::imports::ImportInjector;

const SNIPPET_LIMIT: usize = 120;

pub struct IntentExtrasInjector<'c> {
    config: &'c InstrumentConfig,
    templates: &'c TemplateFactory,
    scanner: CallSiteScanner<'c>,
}

impl<'c> IntentExtrasInjector<'c> {
    pub fn new(config: &'c InstrumentConfig, templates: &'c TemplateFactory) -> Self {
        Self {
            config,
            templates,
            scanner: CallSiteScanner::new(config),
        }
    }

    /// Instrument every call site of one file, one transaction per top-level class.
    pub fn instrument_file(
        &self,
        file: &mut SourceFile,
        collector: &mut ResultCollector,
    ) -> Result<(), ServiceError> {
        if !self.scanner.file_may_match(file.text()) {
            return Ok(());
        }
        let class_count = {
            let tx = Transaction::begin(file);
            let root = tx.root();
            let count = top_level_classes(tx.dialect(), &root).len();
            count
        };

        for class_index in 0..class_count {
            let mut tx = Transaction::begin(file);
            let mut descriptors = self.instrument_class(&mut tx, class_index, collector)?;
            let instrumented = descriptors
                .iter()
                .any(|d| matches!(d.outcome, SiteOutcome::Instrumented { .. }));
            if instrumented {
                let (edits, descriptor) = {
                    let root = tx.root();
                    let class = nth_class(&tx, &root, class_index)?;
                    let ctx = ClassContext::new(tx.dialect(), class, tx.source(), tx.display_path());
                    ImportInjector::new(self.config).plan(&ctx, &root, self.templates, false)?
                };
                tx.stage_all(edits);
                descriptors.push(descriptor);
            }
            tx.commit()?;
            collector.record_all(descriptors);
        }
        Ok(())
    }

    fn instrument_class(
        &self,
        tx: &mut Transaction<'_>,
        class_index: usize,
        collector: &mut ResultCollector,
    ) -> Result<Vec<SiteDescriptor>, ServiceError> {
        let dialect = tx.dialect();
        let site_count = {
            let root = tx.root();
            let class = nth_class(tx, &root, class_index)?;
            if !self.scanner.class_may_match(&class.text()) {
                return Ok(Vec::new());
            }
            let output = self.scanner.scan(dialect, &class);
            collector.add_processed(output.processed);
            output.sites.len()
        };

        let mut descriptors = Vec::with_capacity(site_count);
        // Sites are re-located after every flush; earlier edits moved their offsets
        for ordinal in 0..site_count {
            let (descriptor, edits) = {
                let root = tx.root();
                let class = nth_class(tx, &root, class_index)?;
                let ctx = ClassContext::new(dialect, class, tx.source(), tx.display_path());
                let Some(site) = self.scanner.scan(dialect, &ctx.class).sites.into_iter().nth(ordinal)
                else {
                    tracing::warn!(
                        "Call site {} of {} disappeared after earlier edits",
                        ordinal,
                        ctx.name
                    );
                    break;
                };
                self.plan_site(&ctx, &site)?
            };
            if !edits.is_empty() {
                tx.stage_all(edits);
                tx.flush()?;
            }
            descriptors.push(descriptor);
        }
        Ok(descriptors)
    }

    fn plan_site(
        &self,
        ctx: &ClassContext<'_>,
        site: &CallSite<'_>,
    ) -> Result<(SiteDescriptor, Vec<TextEdit>), ServiceError> {
        let types = ctx.dialect.node_types();
        let method_name = ast_utils::ancestor_of_kind(&site.call, types.method_declarations)
            .and_then(|method| ctx.dialect.declared_name(&method));
        let line = site.call.start_pos().line();

        let (outcome, edits) = match self.site_edits(ctx, site) {
            Ok(planned) => planned,
            Err(e) if e.is_structural() => {
                tracing::debug!(
                    "Skipping {} call in {} at line {}: {e}",
                    site.operation.name,
                    ctx.name,
                    line + 1
                );
                (
                    SiteOutcome::Skipped {
                        reason: e.to_string(),
                    },
                    Vec::new(),
                )
            }
            Err(e) => return Err(e),
        };

        let mut descriptor = ctx.descriptor(Concern::IntentExtras, method_name, line, outcome);
        descriptor.snippet = Some(snippet(&site.call.text()));
        Ok((descriptor, edits))
    }

    fn site_edits(
        &self,
        ctx: &ClassContext<'_>,
        site: &CallSite<'_>,
    ) -> Result<(SiteOutcome, Vec<TextEdit>), ServiceError> {
        let dialect = ctx.dialect;
        let types = dialect.node_types();
        let payload = site.payload.as_ref().ok_or_else(|| {
            ServiceError::StructuralMismatch(format!(
                "{} has no argument at position {}",
                site.operation.name, site.operation.payload_position
            ))
        })?;
        let expression = dialect.argument_expression(payload).ok_or_else(|| {
            ServiceError::StructuralMismatch("payload argument has no expression".to_string())
        })?;
        let context = statement_context(dialect, &site.call).ok_or_else(|| {
            ServiceError::StructuralMismatch(format!(
                "{} call is not inside a statement",
                site.operation.name
            ))
        })?;

        if let StatementContext::InBlock(statement) = &context {
            if preceded_by_probe(ctx, statement, &self.config.probe_function) {
                return Ok((SiteOutcome::AlreadyInstrumented, Vec::new()));
            }
        }

        let form = if types.references.contains(&expression.kind().as_ref()) {
            PayloadForm::VariableReference
        } else {
            PayloadForm::ConstructedValue
        };
        let (name, declaration) = match form {
            PayloadForm::VariableReference => (expression.text().to_string(), None),
            PayloadForm::ConstructedValue => {
                let name = naming::allocate(dialect, &site.call, &self.config.payload_variable)?;
                let declaration = self.templates.statement(
                    dialect,
                    &dialect.declaration(&name, &self.config.payload_type, &expression.text()),
                )?;
                (name, Some(declaration))
            }
        };
        let probe = format!(
            "{}({}.{})",
            self.config.probe_function,
            name,
            self.config.probe_accessor.get(dialect.kind())
        );
        let probe = self.templates.statement(dialect, &dialect.terminate(&probe))?;

        let mut prelude: Vec<String> = declaration.into_iter().collect();
        prelude.push(probe);

        match context {
            StatementContext::InBlock(statement) => {
                let start = statement.range().start;
                let line_indent = ast_utils::line_indent(ctx.source, start);
                let own_line = ast_utils::starts_line(ctx.source, start);
                let (from, indent) = if own_line {
                    (start, line_indent.to_string())
                } else {
                    // `{ call() }` on one line: the statements move to a line of their own
                    let from = ctx.source[..start].trim_end_matches([' ', '\t']).len();
                    (from, format!("{line_indent}{}", self.config.indent_unit))
                };
                let mut rendered = if own_line {
                    String::new()
                } else {
                    format!("\n{indent}")
                };
                for line in &prelude {
                    rendered.push_str(&format!("{line}\n{indent}"));
                }
                let mut edits = vec![TextEdit::replace(from..start, rendered)];
                if form == PayloadForm::ConstructedValue {
                    edits.push(TextEdit::replace(expression.range(), name));
                }
                Ok((instrumented(form, false), edits))
            }
            StatementContext::Inline(target) => {
                let target_range = target.range();
                let mut text = target.text().to_string();
                if form == PayloadForm::ConstructedValue {
                    let range = expression.range();
                    text.replace_range(
                        range.start - target_range.start..range.end - target_range.start,
                        &name,
                    );
                }
                prelude.push(dialect.inline_statement(&target, &text));

                let indent = ast_utils::line_indent(ctx.source, target_range.start);
                let block =
                    self.templates
                        .block(dialect, &prelude, indent, &self.config.indent_unit)?;
                Ok((
                    instrumented(form, true),
                    vec![TextEdit::replace(target_range, block)],
                ))
            }
        }
    }
}

fn instrumented(form: PayloadForm, encapsulated: bool) -> SiteOutcome {
    SiteOutcome::Instrumented {
        entry_case: None,
        payload_form: Some(form),
        encapsulated,
    }
}

fn nth_class<'r>(
    tx: &Transaction<'_>,
    root: &SgNode<'r>,
    index: usize,
) -> Result<SgNode<'r>, ServiceError> {
    top_level_classes(tx.dialect(), root)
        .into_iter()
        .nth(index)
        .ok_or_else(|| {
            ServiceError::HostMutation(format!(
                "class #{index} vanished from {}",
                tx.display_path()
            ))
        })
}

/// Whether the statement right before `statement` already calls the probe.
fn preceded_by_probe(ctx: &ClassContext<'_>, statement: &SgNode<'_>, probe: &str) -> bool {
    let Some(parent) = statement.parent() else {
        return false;
    };
    let siblings = ast_utils::named_children(&parent, ctx.dialect.node_types());
    let Some(index) = siblings.iter().position(|s| s.range() == statement.range()) else {
        return false;
    };
    index > 0 && markers::contains_call_to(ctx.dialect, &siblings[index - 1], probe)
}

fn snippet(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() > SNIPPET_LIMIT {
        let truncated: String = first_line.chars().take(SNIPPET_LIMIT).collect();
        format!("{truncated}...")
    } else {
        first_line.to_string()
    }
}
