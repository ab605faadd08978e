//! # Edit Transactions
//!
//! All mutations of a source file go through a [`Transaction`]: injectors stage
//! [`TextEdit`]s computed against the current tree, `flush` applies them in reverse
//! offset order and reparses, and `commit` hands the new text back to the file.
//! A transaction that is dropped without committing leaves the file untouched.

use crate::ast_utils::{self, AstParser, SgNode, SgRoot};
use crate::corpus::SourceFile;
use crate::dialect::Dialect;
use crate::errors::ServiceError;
use std::path::Path;

/// A single text replacement, expressed in byte offsets of the working text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub position: usize,
    pub deleted_length: usize,
    pub inserted_text: String,
}

impl TextEdit {
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            deleted_length: 0,
            inserted_text: text.into(),
        }
    }

    pub fn replace(range: std::ops::Range<usize>, text: impl Into<String>) -> Self {
        Self {
            position: range.start,
            deleted_length: range.end - range.start,
            inserted_text: text.into(),
        }
    }

    fn end(&self) -> usize {
        self.position + self.deleted_length
    }
}

pub struct Transaction<'f> {
    file: &'f mut SourceFile,
    source: String,
    ast: SgRoot,
    staged: Vec<TextEdit>,
    baseline_errors: usize,
}

impl<'f> Transaction<'f> {
    pub fn begin(file: &'f mut SourceFile) -> Self {
        let source = file.text().to_string();
        let ast = AstParser::new().parse(&source, file.dialect());
        let baseline_errors =
            ast_utils::count_errors(&ast.root(), file.dialect().adapter().node_types());
        Self {
            file,
            source,
            ast,
            staged: Vec::new(),
            baseline_errors,
        }
    }

    pub fn root(&self) -> SgNode<'_> {
        self.ast.root()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn display_path(&self) -> String {
        self.file.display_path()
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.file.dialect().adapter()
    }

    pub fn stage(&mut self, edit: TextEdit) {
        self.staged.push(edit);
    }

    pub fn stage_all(&mut self, edits: impl IntoIterator<Item = TextEdit>) {
        self.staged.extend(edits);
    }

    /// Apply staged edits to the working text and reparse it.
    ///
    /// Edits at the same offset keep their staging order. Overlapping edits, offsets
    /// outside the text, and edits that introduce new syntax errors are rejected;
    /// the working text is left as it was before the flush.
    pub fn flush(&mut self) -> Result<(), ServiceError> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut edits = std::mem::take(&mut self.staged);
        edits.sort_by_key(|edit| edit.position);

        for edit in &edits {
            if edit.end() > self.source.len()
                || !self.source.is_char_boundary(edit.position)
                || !self.source.is_char_boundary(edit.end())
            {
                return Err(ServiceError::HostMutation(format!(
                    "edit at {}..{} is outside of {}",
                    edit.position,
                    edit.end(),
                    self.file.display_path()
                )));
            }
        }
        for pair in edits.windows(2) {
            if pair[0].end() > pair[1].position {
                return Err(ServiceError::HostMutation(format!(
                    "overlapping edits at {} and {} in {}",
                    pair[0].position,
                    pair[1].position,
                    self.file.display_path()
                )));
            }
        }

        let mut updated = self.source.clone();
        // Apply edits in reverse order to maintain correct offsets
        for edit in edits.iter().rev() {
            updated.replace_range(edit.position..edit.end(), &edit.inserted_text);
        }

        let ast = AstParser::new().parse(&updated, self.file.dialect());
        let errors = ast_utils::count_errors(&ast.root(), self.dialect().node_types());
        if errors > self.baseline_errors {
            return Err(ServiceError::HostMutation(format!(
                "edits introduced {} syntax error(s) in {}",
                errors - self.baseline_errors,
                self.file.display_path()
            )));
        }

        tracing::trace!(
            "Applied {} edit(s) to {}",
            edits.len(),
            self.file.display_path()
        );
        self.source = updated;
        self.ast = ast;
        Ok(())
    }

    /// Flush pending edits and write the working text back into the file.
    /// Returns whether the file text changed.
    pub fn commit(mut self) -> Result<bool, ServiceError> {
        self.flush()?;
        let changed = self.source != self.file.text();
        if changed {
            self.file.replace_text(self.source);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;

    fn java_file(text: &str) -> SourceFile {
        SourceFile::new("Sample.java", DialectKind::Java, text)
    }

    #[test]
    fn test_same_offset_edits_keep_staging_order() {
        let mut file = java_file("class A {\n    void f() {\n        g();\n    }\n}\n");
        let offset = file.text().find("g();").unwrap();
        let mut tx = Transaction::begin(&mut file);
        tx.stage(TextEdit::insert(offset, "a();\n        "));
        tx.stage(TextEdit::insert(offset, "b();\n        "));
        assert!(tx.commit().unwrap());
        assert!(file.text().contains("a();\n        b();\n        g();"));
    }

    #[test]
    fn test_overlapping_edits_rejected() {
        let mut file = java_file("class A { void f() { g(); } }");
        let start = file.text().find("g();").unwrap();
        let mut tx = Transaction::begin(&mut file);
        tx.stage(TextEdit::replace(start..start + 4, "h();"));
        tx.stage(TextEdit::replace(start + 1..start + 3, "x"));
        let err = tx.flush().unwrap_err();
        assert!(matches!(err, ServiceError::HostMutation(_)));
    }

    #[test]
    fn test_syntax_breaking_edit_rejected_and_file_untouched() {
        let original = "class A { void f() { g(); } }";
        let mut file = java_file(original);
        let start = original.find("g();").unwrap();
        {
            let mut tx = Transaction::begin(&mut file);
            tx.stage(TextEdit::insert(start, "if ( {"));
            assert!(tx.commit().is_err());
        }
        assert_eq!(file.text(), original);
    }

    #[test]
    fn test_out_of_range_edit_rejected() {
        let mut file = java_file("class A {}");
        let mut tx = Transaction::begin(&mut file);
        tx.stage(TextEdit::insert(100, "x"));
        assert!(matches!(
            tx.flush().unwrap_err(),
            ServiceError::HostMutation(_)
        ));
    }

    #[test]
    fn test_dropped_transaction_leaves_file() {
        let mut file = java_file("class A {}");
        {
            let mut tx = Transaction::begin(&mut file);
            tx.stage(TextEdit::insert(9, " int x; "));
            tx.flush().unwrap();
            assert!(tx.source().contains("int x;"));
        }
        assert_eq!(file.text(), "class A {}");
    }
}
