//! # Import Injector
//!
//! Every instrumented file needs the library's on-demand import.

use super::ClassContext;
use crate::ast_utils::{self, SgNode};
use crate::config::InstrumentConfig;
use crate::edit::TextEdit;
use crate::errors::ServiceError;
use crate::template::TemplateFactory;
use crate::types::{Concern, SiteDescriptor, SiteOutcome};

pub struct ImportInjector<'c> {
    config: &'c InstrumentConfig,
}

impl<'c> ImportInjector<'c> {
    pub fn new(config: &'c InstrumentConfig) -> Self {
        Self { config }
    }

    /// Edits adding the missing library imports to the file of `ctx`.
    pub fn plan(
        &self,
        ctx: &ClassContext<'_>,
        root: &SgNode<'_>,
        templates: &TemplateFactory,
        launcher: bool,
    ) -> Result<(Vec<TextEdit>, SiteDescriptor), ServiceError> {
        let dialect = ctx.dialect;
        let types = dialect.node_types();
        let imports = import_nodes(ctx, root);
        let existing: Vec<String> = imports.iter().map(|i| import_path(&i.text())).collect();

        let mut wanted: Vec<&str> = self.config.library.imports.iter().map(String::as_str).collect();
        if launcher {
            wanted.extend(self.config.library.launcher_imports.iter().map(String::as_str));
        }
        let mut missing: Vec<&str> = Vec::new();
        for path in wanted {
            let normalized = ast_utils::normalized(path);
            if !existing.contains(&normalized) && !missing.contains(&path) {
                missing.push(path);
            }
        }

        let line = root
            .children()
            .find(|c| c.kind() == types.package_declaration)
            .map_or(0, |p| p.start_pos().line());
        if missing.is_empty() {
            return Ok((
                Vec::new(),
                ctx.descriptor(Concern::LibraryImport, None, line, SiteOutcome::AlreadyInstrumented),
            ));
        }

        let mut lines = Vec::with_capacity(missing.len());
        for path in &missing {
            lines.push(templates.import(dialect, path)?);
        }
        tracing::debug!("Adding {} import(s) to {}", lines.len(), ctx.file_path);

        let edit = if let Some(last) = imports.last() {
            let rendered: String = lines.iter().map(|l| format!("\n{l}")).collect();
            TextEdit::insert(ast_utils::trimmed_end(last), rendered)
        } else if let Some(package) = root
            .children()
            .find(|c| c.kind() == types.package_declaration)
        {
            TextEdit::insert(
                ast_utils::trimmed_end(&package),
                format!("\n\n{}", lines.join("\n")),
            )
        } else {
            TextEdit::insert(0, format!("{}\n\n", lines.join("\n")))
        };

        Ok((
            vec![edit],
            ctx.descriptor(
                Concern::LibraryImport,
                None,
                line,
                SiteOutcome::Instrumented {
                    entry_case: None,
                    payload_form: None,
                    encapsulated: false,
                },
            ),
        ))
    }
}

fn import_nodes<'r>(ctx: &ClassContext<'_>, root: &SgNode<'r>) -> Vec<SgNode<'r>> {
    let types = ctx.dialect.node_types();
    let mut imports = Vec::new();
    for child in root.children() {
        if child.kind() == types.import_declaration {
            imports.push(child);
        } else if types.import_containers.contains(&child.kind().as_ref()) {
            imports.extend(
                child
                    .children()
                    .filter(|c| c.kind() == types.import_declaration),
            );
        }
    }
    imports
}

/// `import a.b.*;` -> `a.b.*`
fn import_path(text: &str) -> String {
    let normalized = ast_utils::normalized(text);
    let path = normalized.strip_prefix("import").unwrap_or(&normalized);
    path.trim_end_matches(';').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_path() {
        assert_eq!(
            import_path("import nl.vu.cs.s2group.nappa.*;"),
            "nl.vu.cs.s2group.nappa.*"
        );
        assert_eq!(import_path("import android.os.Bundle\n"), "android.os.Bundle");
    }
}
