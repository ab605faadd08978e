use crate::types::*;
use rmcp::model::{CallToolResult, Content};
use serde_json;

const MAX_LISTED_SITES: usize = 20;

pub struct ResponseFormatter;

impl ResponseFormatter {
    /// Create a formatted response with both JSON data and human-readable text
    pub fn create_formatted_response<T>(
        result: &T,
        summary: String,
    ) -> Result<CallToolResult, Box<dyn std::error::Error + Send + Sync>>
    where
        T: serde::Serialize,
    {
        let json_value = serde_json::to_value(result)?;

        let contents = vec![Content::text(summary), Content::json(json_value)?];

        Ok(CallToolResult::success(contents))
    }

    /// Format an instrumentation result with a readable summary
    pub fn format_instrumentation_result(title: &str, result: &InstrumentationResult) -> String {
        let mut summary = format!(
            "🛠️ **{}**{}\n\n🎯 **Possible**: {}\n✅ **Instrumented**: {}\n♻️ **Already instrumented**: {}\n🔎 **Elements processed**: {}\n",
            title,
            if result.dry_run { " (dry run)" } else { "" },
            result.possible_count,
            result.instrumented_count,
            result.already_instrumented_count,
            result.processed_elements_count
        );

        let changed: Vec<_> = result.changed_files().collect();
        if !changed.is_empty() {
            summary.push_str(&format!("📁 **Files changed**: {}\n", changed.len()));
            for file in &changed {
                let marker = if file.written { "written" } else { "not written" };
                summary.push_str(&format!("   - `{}` ({marker})\n", file.file_path));
            }
        }

        let listed: Vec<_> = result
            .sites
            .iter()
            .filter(|s| s.concern != Concern::LibraryImport)
            .collect();
        if !listed.is_empty() {
            summary.push_str("\n**Sites**:\n");
            for (i, site) in listed.iter().take(MAX_LISTED_SITES).enumerate() {
                summary.push_str(&format!(
                    "{}. {} `{}`{} line {}: {}\n",
                    i + 1,
                    Self::concern_label(site.concern),
                    site.class_name,
                    site.method_name
                        .as_ref()
                        .map(|m| format!(".{m}"))
                        .unwrap_or_default(),
                    site.line + 1,
                    Self::outcome_label(&site.outcome)
                ));
            }
            if listed.len() > MAX_LISTED_SITES {
                summary.push_str(&format!(
                    "... and {} more sites\n",
                    listed.len() - MAX_LISTED_SITES
                ));
            }
        }

        if !result.faults.is_empty() {
            summary.push_str(&format!("\n⚠️ **Faults**: {}\n", result.faults.len()));
            for fault in &result.faults {
                summary.push_str(&format!("   - `{}`: {}\n", fault.file_path, fault.message));
            }
        }

        summary
    }

    /// Format the discovered activities with a readable summary
    pub fn format_discover_result(result: &DiscoverActivitiesResult) -> String {
        if result.activities.is_empty() {
            return "📱 **No activities found**\n\nNo manifest declared any activity.".to_string();
        }

        let mut summary = format!(
            "📱 **Activities**\n\n📄 **Manifests**: {}\n🧩 **Activities**: {}\n\n",
            result.manifests.len(),
            result.activities.len()
        );
        for (name, launcher) in &result.activities {
            if *launcher {
                summary.push_str(&format!("- `{name}` 🚀 launcher\n"));
            } else {
                summary.push_str(&format!("- `{name}`\n"));
            }
        }
        summary
    }

    /// Format a generate AST result with a readable summary
    pub fn format_generate_ast_result(result: &GenerateAstResult) -> String {
        format!(
            "🌳 **AST Generation Results**\n\n📝 **Language**: {}\n📏 **Code length**: {} characters\n\n**AST Structure**:\n```\n{}\n```",
            result.language, result.code_length, result.ast
        )
    }

    fn concern_label(concern: Concern) -> &'static str {
        match concern {
            Concern::LifecycleObserver => "observer",
            Concern::LibraryInit => "init",
            Concern::LibraryImport => "import",
            Concern::IntentExtras => "extras",
        }
    }

    fn outcome_label(outcome: &SiteOutcome) -> String {
        match outcome {
            SiteOutcome::Instrumented {
                entry_case,
                payload_form,
                encapsulated,
            } => {
                let mut label = "instrumented".to_string();
                if let Some(case) = entry_case {
                    label.push_str(&format!(" ({case:?})"));
                }
                if let Some(form) = payload_form {
                    label.push_str(&format!(" ({form:?})"));
                }
                if *encapsulated {
                    label.push_str(" in new block");
                }
                label
            }
            SiteOutcome::AlreadyInstrumented => "already instrumented".to_string(),
            SiteOutcome::Skipped { reason } => format!("skipped: {reason}"),
        }
    }
}
