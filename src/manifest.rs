//! # Manifest Reader
//!
//! Reads the component declarations of an Android manifest. The document is parsed
//! with the HTML grammar, which accepts the manifest's element and attribute syntax
//! once the XML prolog is blanked out.

use crate::ast_utils::{self, SgNode};
use ast_grep_core::AstGrep;
use ast_grep_language::SupportLang as Language;

pub const MAIN_ACTION: &str = "android.intent.action.MAIN";
pub const LAUNCHER_CATEGORY: &str = "android.intent.category.LAUNCHER";
const NAME_ATTRIBUTE: &str = "android:name";

/// A declared activity with the actions and categories of its intent filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDecl {
    pub name: String,
    pub actions: Vec<String>,
    pub categories: Vec<String>,
}

impl ComponentDecl {
    /// Last dot-separated segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_launcher(&self) -> bool {
        self.actions.iter().any(|a| a == MAIN_ACTION)
            && self.categories.iter().any(|c| c == LAUNCHER_CATEGORY)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationDocument {
    pub components: Vec<ComponentDecl>,
}

pub struct ManifestReader;

impl ManifestReader {
    pub fn parse(text: &str) -> DeclarationDocument {
        let text = blank_prolog(text);
        let ast = AstGrep::new(&text, Language::Html);
        let root = ast.root();

        let Some(manifest) = child_elements(&root)
            .into_iter()
            .find(|e| tag_name(e).as_deref() == Some("manifest"))
        else {
            return DeclarationDocument::default();
        };
        let Some(application) = child_elements(&manifest)
            .into_iter()
            .find(|e| tag_name(e).as_deref() == Some("application"))
        else {
            return DeclarationDocument::default();
        };

        let mut components = Vec::new();
        for activity in child_elements(&application)
            .into_iter()
            .filter(|e| tag_name(e).as_deref() == Some("activity"))
        {
            let Some(name) = attribute(&activity, NAME_ATTRIBUTE) else {
                tracing::debug!("Skipping activity declaration without a name");
                continue;
            };
            let mut component = ComponentDecl {
                name,
                actions: Vec::new(),
                categories: Vec::new(),
            };
            for filter in child_elements(&activity)
                .into_iter()
                .filter(|e| tag_name(e).as_deref() == Some("intent-filter"))
            {
                for entry in child_elements(&filter) {
                    let Some(value) = attribute(&entry, NAME_ATTRIBUTE) else {
                        continue;
                    };
                    match tag_name(&entry).as_deref() {
                        Some("action") => component.actions.push(value),
                        Some("category") => component.categories.push(value),
                        _ => {}
                    }
                }
            }
            components.push(component);
        }

        DeclarationDocument { components }
    }
}

// Offsets are kept so that nothing else in the document moves
fn blank_prolog(text: &str) -> String {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("<?xml") {
        return text.to_string();
    }
    let start = text.len() - trimmed.len();
    match trimmed.find("?>") {
        Some(end) => {
            let mut result = text.to_string();
            result.replace_range(start..start + end + 2, &" ".repeat(end + 2));
            result
        }
        None => text.to_string(),
    }
}

fn child_elements<'r>(node: &SgNode<'r>) -> Vec<SgNode<'r>> {
    node.children().filter(|c| c.kind() == "element").collect()
}

fn opening_tag<'r>(element: &SgNode<'r>) -> Option<SgNode<'r>> {
    element
        .children()
        .find(|c| c.kind() == "start_tag" || c.kind() == "self_closing_tag")
}

fn tag_name(element: &SgNode<'_>) -> Option<String> {
    opening_tag(element)?
        .children()
        .find(|c| c.kind() == "tag_name")
        .map(|name| name.text().to_string())
}

fn attribute(element: &SgNode<'_>, name: &str) -> Option<String> {
    let tag = opening_tag(element)?;
    let attribute = tag.children().filter(|c| c.kind() == "attribute").find(|a| {
        a.children()
            .find(|c| c.kind() == "attribute_name")
            .is_some_and(|n| n.text() == name)
    })?;
    let value = ast_utils::descendants(&attribute)
        .into_iter()
        .find(|n| n.kind() == "attribute_value")?;
    Some(value.text().trim().to_string())
}
