//! MCP tool routing.

mod common;

use common::*;
use nappa_instrument::service::InstrumentService;
use nappa_instrument::tool_router::ToolRouter;
use rmcp::model::CallToolRequestParam;

fn request(name: &'static str, arguments: serde_json::Value) -> CallToolRequestParam {
    CallToolRequestParam {
        name: name.into(),
        arguments: arguments.as_object().cloned(),
    }
}

#[tokio::test]
async fn test_generate_ast_tool() {
    let service = InstrumentService::new();
    let result = ToolRouter::route_tool_call(
        &service,
        request(
            "generate_ast",
            serde_json::json!({ "code": "class A {}", "language": "java" }),
        ),
    )
    .await
    .unwrap();

    assert_ne!(result.is_error, Some(true));
}

#[tokio::test]
async fn test_instrument_tool_dry_run() {
    let project = setup_android_project();
    let service = InstrumentService::with_config(project_config(project.path()));
    let result = ToolRouter::route_tool_call(
        &service,
        request("instrument_activities", serde_json::json!({ "dry_run": true })),
    )
    .await
    .unwrap();

    assert_ne!(result.is_error, Some(true));
    assert_eq!(read_source(project.path(), "MainActivity.java"), MAIN_ACTIVITY);
}

#[tokio::test]
async fn test_unknown_tool() {
    let service = InstrumentService::new();
    let result =
        ToolRouter::route_tool_call(&service, request("search", serde_json::json!({}))).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_invalid_params() {
    let service = InstrumentService::new();
    let result = ToolRouter::route_tool_call(
        &service,
        request("generate_ast", serde_json::json!({ "code": 42 })),
    )
    .await;
    assert!(result.is_err());
}
