//! # Unique Name Allocator
//!
//! Picks a local variable name that does not collide, by textual occurrence, with a
//! binding in the narrowest enclosing method (or block).

use crate::ast_utils::{self, SgNode};
use crate::dialect::Dialect;
use crate::errors::ServiceError;
use regex::Regex;

/// Allocate `base`, `base1`, `base2`, ... for a declaration placed near `reference`.
pub fn allocate(
    dialect: &dyn Dialect,
    reference: &SgNode<'_>,
    base: &str,
) -> Result<String, ServiceError> {
    let types = dialect.node_types();
    let scope = ast_utils::ancestor_of_kind(reference, types.method_declarations)
        .or_else(|| ast_utils::ancestor_of_kind(reference, types.block_scopes));
    match scope {
        Some(scope) => allocate_in_text(&scope.text(), base, dialect.binding_operators()),
        None => Ok(base.to_string()),
    }
}

/// Textual collision search over `scope_text`.
pub fn allocate_in_text(
    scope_text: &str,
    base: &str,
    operators: &[&str],
) -> Result<String, ServiceError> {
    let operators = operators
        .iter()
        .map(|op| regex::escape(op))
        .collect::<Vec<_>>()
        .join("|");

    for suffix in 0usize.. {
        let candidate = if suffix == 0 {
            base.to_string()
        } else {
            format!("{base}{suffix}")
        };
        let binding = Regex::new(&format!(
            r"(?:^|[^\w$]){} ?(?:{})",
            regex::escape(&candidate),
            operators
        ))?;
        if !binding.is_match(scope_text) {
            return Ok(candidate);
        }
    }
    Err(ServiceError::Internal(format!("no free name for base {base}")))
}
