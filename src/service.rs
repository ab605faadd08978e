//! # Instrumentation Service
//!
//! Loads the corpus, runs the engine and writes results back. Exposed to MCP clients
//! through [`ServerHandler`] and used directly by the one-shot CLI mode.

use crate::ast_utils::AstParser;
use crate::config::InstrumentConfig;
use crate::corpus::Corpus;
use crate::dialect::DialectKind;
use crate::discovery::{ActivityDiscovery, ActivityMap};
use crate::errors::ServiceError;
use crate::instrument::Instrumenter;
use crate::report::ResultCollector;
use crate::tool_router::ToolRouter;
use crate::types::*;

use std::sync::{Arc, Mutex};

use rmcp::{
    ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, ErrorData, Implementation, InitializeResult,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, Tool,
    },
    service::{RequestContext, RoleServer},
};

/// Which injection passes a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Activities,
    IntentExtras,
    All,
}

impl RunMode {
    fn includes_activities(self) -> bool {
        matches!(self, RunMode::Activities | RunMode::All)
    }

    fn includes_intent_extras(self) -> bool {
        matches!(self, RunMode::IntentExtras | RunMode::All)
    }
}

#[derive(Clone)]
pub struct InstrumentService {
    config: InstrumentConfig,
    instrumenter: Arc<Instrumenter>,
    /// Runs mutate the corpus on disk and must not interleave
    run_lock: Arc<Mutex<()>>,
}

impl Default for InstrumentService {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrumentService {
    pub fn new() -> Self {
        Self::with_config(InstrumentConfig::default())
    }

    pub fn with_config(config: InstrumentConfig) -> Self {
        let instrumenter = Arc::new(Instrumenter::new(config.clone()));
        Self {
            config,
            instrumenter,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    #[tracing::instrument(skip(self, _param))]
    pub async fn discover_activities(
        &self,
        _param: DiscoverActivitiesParam,
    ) -> Result<DiscoverActivitiesResult, ServiceError> {
        let corpus = Corpus::load(&self.config)?;
        let activities = ActivityDiscovery::discover_in(&corpus);
        Ok(DiscoverActivitiesResult {
            activities,
            manifests: corpus
                .manifests()
                .iter()
                .map(|m| m.path.display().to_string())
                .collect(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn instrument_activities(
        &self,
        param: InstrumentParam,
    ) -> Result<InstrumentationResult, ServiceError> {
        self.run(RunMode::Activities, param.dry_run)
    }

    #[tracing::instrument(skip(self))]
    pub async fn instrument_intent_extras(
        &self,
        param: InstrumentParam,
    ) -> Result<InstrumentationResult, ServiceError> {
        self.run(RunMode::IntentExtras, param.dry_run)
    }

    /// Generate a stringified syntax tree for Java or Kotlin code
    pub async fn generate_ast(
        &self,
        param: GenerateAstParam,
    ) -> Result<GenerateAstResult, ServiceError> {
        let dialect = DialectKind::from_name(&param.language).ok_or_else(|| {
            ServiceError::Internal(format!(
                "Unsupported language '{}'; expected java or kotlin",
                param.language
            ))
        })?;
        let ast = AstParser::new().generate_ast_debug_string(&param.code, dialect);

        Ok(GenerateAstResult {
            ast,
            language: dialect.to_string(),
            code_length: param.code.chars().count(),
        })
    }

    /// One complete scan-and-mutate pass over a freshly loaded corpus.
    ///
    /// Files that instrumented cleanly are written back even when others failed; the
    /// failures are then reported as [`ServiceError::Faults`] carrying the result.
    pub fn run(
        &self,
        mode: RunMode,
        dry_run: Option<bool>,
    ) -> Result<InstrumentationResult, ServiceError> {
        let _guard = self
            .run_lock
            .lock()
            .map_err(|_| ServiceError::Internal("run lock poisoned".into()))?;
        let dry_run = dry_run.unwrap_or(self.config.dry_run);

        let mut corpus = Corpus::load(&self.config)?;
        let mut collector = ResultCollector::new(dry_run);

        if mode.includes_activities() {
            let activities: ActivityMap = ActivityDiscovery::discover_in(&corpus);
            self.instrumenter
                .instrument_activities(&mut corpus, &activities, &mut collector);
        }
        if mode.includes_intent_extras() {
            self.instrumenter
                .instrument_intent_extras(&mut corpus, &mut collector);
        }

        corpus.write_back(dry_run, &mut collector);
        let has_faults = collector.has_faults();
        let result = collector.finish();
        tracing::info!(
            "{:?} run finished: {} possible, {} instrumented, {} already instrumented",
            mode,
            result.possible_count,
            result.instrumented_count,
            result.already_instrumented_count
        );

        if has_faults {
            return Err(ServiceError::Faults {
                faults: result.faults.clone(),
                partial: Box::new(result),
            });
        }
        Ok(result)
    }
}

fn schema(value: serde_json::Value) -> Arc<serde_json::Map<String, serde_json::Value>> {
    match value {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    }
}

fn dry_run_schema() -> Arc<serde_json::Map<String, serde_json::Value>> {
    schema(serde_json::json!({
        "type": "object",
        "properties": {
            "dry_run": { "type": "boolean", "description": "If true, compute the edits and report them without modifying files. Defaults to the configured value." }
        }
    }))
}

impl ServerHandler for InstrumentService {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "nappa-instrument".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability { list_changed: Some(true) }),
                ..Default::default()
            },
            instructions: Some("This MCP server instruments Android Java/Kotlin projects for the NAPPA prefetching library. Run `discover_activities` first, then `instrument_activities` and `instrument_intent_extras` with dry_run=true to preview the changes.".into()),
        }
    }

    #[tracing::instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: vec![
                Tool::new(
                    "discover_activities",
                    "List the activities declared in the project's manifests and whether each one is the launcher.",
                    schema(serde_json::json!({ "type": "object", "properties": {} })),
                ),
                Tool::new(
                    "instrument_activities",
                    "Register the lifecycle observer in every activity's entry method and initialize the library in the launcher.",
                    dry_run_schema(),
                ),
                Tool::new(
                    "instrument_intent_extras",
                    "Insert a probe reporting the intent extras before every activity start call.",
                    dry_run_schema(),
                ),
                Tool::new(
                    "generate_ast",
                    "Generate a stringified syntax tree for Java or Kotlin code.",
                    schema(serde_json::json!({
                        "type": "object",
                        "properties": {
                            "code": { "type": "string" },
                            "language": { "type": "string", "enum": ["java", "kotlin"] }
                        },
                        "required": ["code", "language"]
                    })),
                ),
            ],
            ..Default::default()
        })
    }

    #[tracing::instrument(skip(self, request, _context), fields(tool_name = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        ToolRouter::route_tool_call(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_ast_kotlin() {
        let service = InstrumentService::new();
        let result = service
            .generate_ast(GenerateAstParam {
                code: "class A".to_string(),
                language: "kt".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.language, "kotlin");
        assert_eq!(result.code_length, 7);
        assert!(result.ast.starts_with("source_file"));
    }

    #[tokio::test]
    async fn test_generate_ast_rejects_other_languages() {
        let service = InstrumentService::new();
        let err = service
            .generate_ast(GenerateAstParam {
                code: "fn main() {}".to_string(),
                language: "rust".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported language"));
    }

    #[test]
    fn test_run_modes() {
        assert!(RunMode::All.includes_activities());
        assert!(RunMode::All.includes_intent_extras());
        assert!(!RunMode::Activities.includes_intent_extras());
        assert!(!RunMode::IntentExtras.includes_activities());
    }
}
