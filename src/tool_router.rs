//! # Tool Router Module
//!
//! Routes MCP tool calls to the matching [`InstrumentService`] method and renders
//! the result as a readable summary plus JSON.

use crate::response_formatter::ResponseFormatter;
use crate::service::InstrumentService;
use crate::types::*;

use rmcp::model::{CallToolRequestParam, CallToolResult, ErrorData};
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// Routes tool calls to appropriate service methods
pub struct ToolRouter;

impl ToolRouter {
    /// Helper function to parse request parameters
    fn parse_params<T: DeserializeOwned>(request: &CallToolRequestParam) -> Result<T, ErrorData> {
        serde_json::from_value(serde_json::Value::Object(
            request.arguments.clone().unwrap_or_default(),
        ))
        .map_err(|e| ErrorData::invalid_params(Cow::Owned(e.to_string()), None))
    }

    /// Helper function to create formatted response
    fn create_formatted_response<T: serde::Serialize>(
        result: &T,
        summary: String,
    ) -> Result<CallToolResult, ErrorData> {
        ResponseFormatter::create_formatted_response(result, summary)
            .map_err(|e| ErrorData::internal_error(Cow::Owned(e.to_string()), None))
    }

    /// Route a tool call to the appropriate service method
    pub async fn route_tool_call(
        service: &InstrumentService,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ErrorData> {
        match request.name.as_ref() {
            "discover_activities" => Self::handle_discover_activities(service, request).await,
            "instrument_activities" => Self::handle_instrument_activities(service, request).await,
            "instrument_intent_extras" => {
                Self::handle_instrument_intent_extras(service, request).await
            }
            "generate_ast" => Self::handle_generate_ast(service, request).await,
            _ => Err(ErrorData::method_not_found::<
                rmcp::model::CallToolRequestMethod,
            >()),
        }
    }

    async fn handle_discover_activities(
        service: &InstrumentService,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ErrorData> {
        let param: DiscoverActivitiesParam = Self::parse_params(&request)?;
        let result = service
            .discover_activities(param)
            .await
            .map_err(ErrorData::from)?;
        let summary = ResponseFormatter::format_discover_result(&result);
        Self::create_formatted_response(&result, summary)
    }

    async fn handle_instrument_activities(
        service: &InstrumentService,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ErrorData> {
        let param: InstrumentParam = Self::parse_params(&request)?;
        let result = service
            .instrument_activities(param)
            .await
            .map_err(ErrorData::from)?;
        let summary =
            ResponseFormatter::format_instrumentation_result("Activity Instrumentation", &result);
        Self::create_formatted_response(&result, summary)
    }

    async fn handle_instrument_intent_extras(
        service: &InstrumentService,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ErrorData> {
        let param: InstrumentParam = Self::parse_params(&request)?;
        let result = service
            .instrument_intent_extras(param)
            .await
            .map_err(ErrorData::from)?;
        let summary = ResponseFormatter::format_instrumentation_result(
            "Intent Extras Instrumentation",
            &result,
        );
        Self::create_formatted_response(&result, summary)
    }

    async fn handle_generate_ast(
        service: &InstrumentService,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ErrorData> {
        let param: GenerateAstParam = Self::parse_params(&request)?;
        let result = service.generate_ast(param).await.map_err(ErrorData::from)?;
        let summary = ResponseFormatter::format_generate_ast_result(&result);
        Self::create_formatted_response(&result, summary)
    }
}
