//! # Library Init Injector
//!
//! Makes the launcher activity initialize the library once, right after the
//! lifecycle observer registration.

use super::ClassContext;
use super::entry::{self, EntryMethod, EntryPlan};
use super::markers;
use crate::config::InstrumentConfig;
use crate::types::{Concern, SiteDescriptor, SiteOutcome};

pub struct LibraryInitInjector<'c> {
    config: &'c InstrumentConfig,
}

impl<'c> LibraryInitInjector<'c> {
    pub fn new(config: &'c InstrumentConfig) -> Self {
        Self { config }
    }

    /// Decide for the launcher class and queue the init statement if needed.
    /// Must run after the lifecycle injector staged into the same plan.
    pub fn stage(&self, ctx: &ClassContext<'_>, plan: &mut EntryPlan) -> SiteDescriptor {
        let kind = ctx.dialect.kind();
        let marker = self.config.init_statement.get(kind);
        let line = ctx.class.start_pos().line();

        if markers::contains_statement(ctx.dialect, &ctx.class, marker) {
            tracing::debug!("{} already initializes the library", ctx.name);
            return ctx.descriptor(
                Concern::LibraryInit,
                None,
                line,
                SiteOutcome::AlreadyInstrumented,
            );
        }

        let skipped = |reason: String| {
            ctx.descriptor(
                Concern::LibraryInit,
                Some(self.config.entry_method.clone()),
                line,
                SiteOutcome::Skipped { reason },
            )
        };

        let entry_method = match entry::locate(ctx, &self.config.entry_method) {
            Ok(entry_method) => entry_method,
            Err(e) => {
                tracing::warn!("Skipping library init for {}: {e}", ctx.name);
                return skipped(e.to_string());
            }
        };
        if matches!(entry_method, EntryMethod::Absent) {
            tracing::warn!(
                "Launcher {} has no {} method; library init not injected",
                ctx.name,
                self.config.entry_method
            );
            return skipped(format!("{} method absent", self.config.entry_method));
        }

        let entry_case = entry_method.case(ctx, &self.config.entry_method);
        plan.anchor_after(self.config.observer_statement.get(kind));
        plan.push(marker);
        tracing::info!("Initializing library in launcher {}", ctx.name);
        ctx.descriptor(
            Concern::LibraryInit,
            entry_method.method_name(ctx),
            line,
            SiteOutcome::Instrumented {
                entry_case: Some(entry_case),
                payload_form: None,
                encapsulated: false,
            },
        )
    }
}
