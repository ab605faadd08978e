use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Instrumentation concern a descriptor belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Concern {
    LifecycleObserver,
    LibraryInit,
    LibraryImport,
    IntentExtras,
}

/// Shape of the entry method when an injection was planned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryCase {
    /// No entry method; a complete method was synthesized
    Absent,
    /// Entry method with an empty body
    EmptyBody,
    /// Non-empty body starting with the base-class call
    AfterBaseCall,
    /// Non-empty body without a leading base-class call
    BeforeFirstStatement,
}

/// How a call site payload was handled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayloadForm {
    VariableReference,
    ConstructedValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SiteOutcome {
    Instrumented {
        #[serde(skip_serializing_if = "Option::is_none")]
        entry_case: Option<EntryCase>,
        #[serde(skip_serializing_if = "Option::is_none")]
        payload_form: Option<PayloadForm>,
        /// An inline lambda body or branch was materialized into a block
        #[serde(default)]
        encapsulated: bool,
    },
    AlreadyInstrumented,
    Skipped {
        reason: String,
    },
}

/// One entry of the per-run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub file_path: String,
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    pub concern: Concern,
    /// 0-based line of the class or call site in the text the decision was made on
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub outcome: SiteOutcome,
}

/// A file that could not be instrumented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFault {
    pub file_path: String,
    pub message: String,
}

/// Per-file record of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_path: String,
    pub hash_before: String,
    pub hash_after: String,
    pub changed: bool,
    pub written: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentationResult {
    pub possible_count: usize,
    pub already_instrumented_count: usize,
    pub instrumented_count: usize,
    pub processed_elements_count: usize,
    pub dry_run: bool,
    pub sites: Vec<SiteDescriptor>,
    pub files: Vec<FileRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<FileFault>,
}

impl InstrumentationResult {
    pub fn sites_for(&self, concern: Concern) -> impl Iterator<Item = &SiteDescriptor> {
        self.sites.iter().filter(move |s| s.concern == concern)
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().filter(|f| f.changed)
    }
}

// MCP tool parameter types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentParam {
    /// Override of the configured dry-run flag
    #[serde(default)]
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoverActivitiesParam {}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoverActivitiesResult {
    /// Simple component name to launcher flag
    pub activities: BTreeMap<String, bool>,
    pub manifests: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAstParam {
    pub code: String,
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateAstResult {
    pub ast: String,
    pub language: String,
    pub code_length: usize,
}
