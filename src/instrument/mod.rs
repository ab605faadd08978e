//! # Instrumentation Engine
//!
//! Drives the injectors over a loaded [`Corpus`]. Activity instrumentation visits the
//! source file of every discovered activity; intent-extras instrumentation visits
//! every file. Failures that only concern one class or call site are recorded as
//! skipped sites, failures of a file's edit transaction are collected as faults.

pub mod entry;
pub mod extras;
pub mod imports;
pub mod init;
pub mod lifecycle;
pub mod markers;
pub mod scanner;

use crate::ast_utils::SgNode;
use crate::config::InstrumentConfig;
use crate::corpus::{Corpus, SourceFile};
use crate::dialect::Dialect;
use crate::discovery::ActivityMap;
use crate::edit::Transaction;
use crate::errors::ServiceError;
use crate::report::ResultCollector;
use crate::template::TemplateFactory;
use crate::types::{Concern, SiteDescriptor, SiteOutcome};

use entry::EntryPlan;
use extras::IntentExtrasInjector;
use imports::ImportInjector;
use init::LibraryInitInjector;
use lifecycle::LifecycleInjector;

/// A class being instrumented, located in the current tree of a transaction.
pub struct ClassContext<'r> {
    pub dialect: &'static dyn Dialect,
    pub class: SgNode<'r>,
    pub name: String,
    pub source: &'r str,
    pub file_path: String,
}

impl<'r> ClassContext<'r> {
    pub fn new(
        dialect: &'static dyn Dialect,
        class: SgNode<'r>,
        source: &'r str,
        file_path: String,
    ) -> Self {
        let name = dialect.declared_name(&class).unwrap_or_default();
        Self {
            dialect,
            class,
            name,
            source,
            file_path,
        }
    }

    pub fn descriptor(
        &self,
        concern: Concern,
        method_name: Option<String>,
        line: usize,
        outcome: SiteOutcome,
    ) -> SiteDescriptor {
        SiteDescriptor {
            file_path: self.file_path.clone(),
            class_name: self.name.clone(),
            method_name,
            concern,
            line,
            snippet: None,
            outcome,
        }
    }
}

/// Where a call sits relative to the statement list it can be prefixed in.
pub enum StatementContext<'r> {
    /// The statement of a statement list that contains the call
    InBlock(SgNode<'r>),
    /// An unbraced lambda body or branch that has to become a block
    Inline(SgNode<'r>),
}

/// Climb from `call` to the statement that can receive preceding statements.
pub fn statement_context<'r>(dialect: &dyn Dialect, call: &SgNode<'r>) -> Option<StatementContext<'r>> {
    let types = dialect.node_types();
    let mut current = call.clone();
    loop {
        let parent = current.parent()?;
        if types.statement_lists.contains(&parent.kind().as_ref()) {
            return Some(StatementContext::InBlock(current));
        }
        if dialect.is_inline_body(&parent, &current) {
            return Some(StatementContext::Inline(current));
        }
        if types.scope_boundaries.contains(&parent.kind().as_ref()) {
            return None;
        }
        current = parent;
    }
}

pub fn top_level_classes<'r>(dialect: &dyn Dialect, root: &SgNode<'r>) -> Vec<SgNode<'r>> {
    let types = dialect.node_types();
    root.children().filter(|c| types.is_class(&c.kind())).collect()
}

/// The file's primary externally visible class: the one named like the component,
/// else the first visible one.
pub fn primary_class<'r>(
    dialect: &dyn Dialect,
    root: &SgNode<'r>,
    component: &str,
) -> Option<SgNode<'r>> {
    let visible: Vec<_> = top_level_classes(dialect, root)
        .into_iter()
        .filter(|class| dialect.is_externally_visible(class))
        .collect();
    let named = visible
        .iter()
        .position(|class| dialect.declared_name(class).as_deref() == Some(component));
    match named {
        Some(index) => visible.into_iter().nth(index),
        None => visible.into_iter().next(),
    }
}

pub struct Instrumenter {
    config: InstrumentConfig,
    templates: TemplateFactory,
}

impl Instrumenter {
    pub fn new(config: InstrumentConfig) -> Self {
        let templates = TemplateFactory::with_capacity(config.template_cache_size);
        Self { config, templates }
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    /// Register the lifecycle observer in every discovered activity and initialize the
    /// library in the launcher.
    pub fn instrument_activities(
        &self,
        corpus: &mut Corpus,
        activities: &ActivityMap,
        collector: &mut ResultCollector,
    ) {
        for (component, &is_launcher) in activities {
            let indices = corpus.files_named(component);
            if indices.is_empty() {
                tracing::debug!("No source file found for activity {component}");
            }
            for index in indices {
                let file = &mut corpus.files_mut()[index];
                match self.instrument_activity_file(file, component, is_launcher) {
                    Ok(descriptors) => collector.record_all(descriptors),
                    Err(e) => {
                        tracing::warn!("Failed to instrument {}: {e}", file.display_path());
                        collector.fault(file.display_path(), e.to_string());
                    }
                }
            }
        }
    }

    /// Stage and commit the entry-method injections of one activity source in a
    /// single transaction.
    pub fn instrument_activity_file(
        &self,
        file: &mut SourceFile,
        component: &str,
        is_launcher: bool,
    ) -> Result<Vec<SiteDescriptor>, ServiceError> {
        let mut tx = Transaction::begin(file);
        let dialect = tx.dialect();

        let (descriptors, edits) = {
            let root = tx.root();
            let Some(class) = primary_class(dialect, &root, component) else {
                tracing::debug!("{} has no externally visible class", tx.display_path());
                return Ok(Vec::new());
            };
            let ctx = ClassContext::new(dialect, class, tx.source(), tx.display_path());

            let mut plan = EntryPlan::default();
            let mut descriptors = vec![LifecycleInjector::new(&self.config).stage(&ctx, &mut plan)];
            if is_launcher {
                descriptors.push(LibraryInitInjector::new(&self.config).stage(&ctx, &mut plan));
            }

            let mut edits = match plan.render(&ctx, &self.config, &self.templates) {
                Ok(edits) => edits,
                Err(e) if e.is_structural() => {
                    tracing::warn!("Skipping entry method of {}: {e}", ctx.name);
                    for descriptor in &mut descriptors {
                        if matches!(descriptor.outcome, SiteOutcome::Instrumented { .. }) {
                            descriptor.outcome = SiteOutcome::Skipped {
                                reason: e.to_string(),
                            };
                        }
                    }
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            if !edits.is_empty() {
                let (import_edits, descriptor) = ImportInjector::new(&self.config).plan(
                    &ctx,
                    &root,
                    &self.templates,
                    is_launcher,
                )?;
                edits.extend(import_edits);
                descriptors.push(descriptor);
            }
            (descriptors, edits)
        };

        tx.stage_all(edits);
        tx.commit()?;
        Ok(descriptors)
    }

    /// Put a probe before every activity start in the corpus.
    pub fn instrument_intent_extras(&self, corpus: &mut Corpus, collector: &mut ResultCollector) {
        let injector = IntentExtrasInjector::new(&self.config, &self.templates);
        for file in corpus.files_mut() {
            if let Err(e) = injector.instrument_file(file, collector) {
                tracing::warn!("Failed to instrument {}: {e}", file.display_path());
                collector.fault(file.display_path(), e.to_string());
            }
        }
    }
}
