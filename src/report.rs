//! # Result Collector
//!
//! Aggregates the counters and per-site descriptors of one run.

use crate::types::{
    Concern, FileFault, FileRecord, InstrumentationResult, SiteDescriptor, SiteOutcome,
};

#[derive(Debug, Default)]
pub struct ResultCollector {
    result: InstrumentationResult,
}

impl ResultCollector {
    pub fn new(dry_run: bool) -> Self {
        Self {
            result: InstrumentationResult {
                dry_run,
                ..InstrumentationResult::default()
            },
        }
    }

    /// Record a site decision. Every decision about an injection concern counts as a
    /// possible instrumentation; import bookkeeping is reported but not counted.
    pub fn record(&mut self, descriptor: SiteDescriptor) {
        if descriptor.concern != Concern::LibraryImport {
            self.result.possible_count += 1;
            match descriptor.outcome {
                SiteOutcome::Instrumented { .. } => self.result.instrumented_count += 1,
                SiteOutcome::AlreadyInstrumented => self.result.already_instrumented_count += 1,
                SiteOutcome::Skipped { .. } => {}
            }
        }
        self.result.sites.push(descriptor);
    }

    pub fn record_all(&mut self, descriptors: impl IntoIterator<Item = SiteDescriptor>) {
        for descriptor in descriptors {
            self.record(descriptor);
        }
    }

    pub fn add_processed(&mut self, count: usize) {
        self.result.processed_elements_count += count;
    }

    pub fn fault(&mut self, file_path: impl Into<String>, message: impl Into<String>) {
        self.result.faults.push(FileFault {
            file_path: file_path.into(),
            message: message.into(),
        });
    }

    pub fn files(&mut self, records: Vec<FileRecord>) {
        self.result.files.extend(records);
    }

    pub fn has_faults(&self) -> bool {
        !self.result.faults.is_empty()
    }

    pub fn finish(self) -> InstrumentationResult {
        self.result
    }
}
