//! # Lifecycle Injector
//!
//! Makes an activity register the library's lifecycle observer at the top of its
//! entry method.

use super::ClassContext;
use super::entry::{self, EntryPlan};
use super::markers;
use crate::config::InstrumentConfig;
use crate::types::{Concern, SiteDescriptor, SiteOutcome};

pub struct LifecycleInjector<'c> {
    config: &'c InstrumentConfig,
}

impl<'c> LifecycleInjector<'c> {
    pub fn new(config: &'c InstrumentConfig) -> Self {
        Self { config }
    }

    /// Decide for one eligible class and queue the observer statement if needed.
    pub fn stage(&self, ctx: &ClassContext<'_>, plan: &mut EntryPlan) -> SiteDescriptor {
        let marker = self.config.observer_statement.get(ctx.dialect.kind());
        let line = ctx.class.start_pos().line();

        if markers::contains_statement(ctx.dialect, &ctx.class, marker) {
            tracing::debug!("{} already registers the lifecycle observer", ctx.name);
            return ctx.descriptor(
                Concern::LifecycleObserver,
                None,
                line,
                SiteOutcome::AlreadyInstrumented,
            );
        }

        let entry_method = match entry::locate(ctx, &self.config.entry_method) {
            Ok(entry_method) => entry_method,
            Err(e) => {
                tracing::warn!("Skipping lifecycle observer for {}: {e}", ctx.name);
                return ctx.descriptor(
                    Concern::LifecycleObserver,
                    Some(self.config.entry_method.clone()),
                    line,
                    SiteOutcome::Skipped {
                        reason: e.to_string(),
                    },
                );
            }
        };

        let entry_case = entry_method.case(ctx, &self.config.entry_method);
        plan.push(marker);
        tracing::info!(
            "Registering lifecycle observer in {} ({:?})",
            ctx.name,
            entry_case
        );
        ctx.descriptor(
            Concern::LifecycleObserver,
            entry_method
                .method_name(ctx)
                .or_else(|| Some(self.config.entry_method.clone())),
            line,
            SiteOutcome::Instrumented {
                entry_case: Some(entry_case),
                payload_form: None,
                encapsulated: false,
            },
        )
    }
}
