//! # Source Corpus
//!
//! Enumerates the Java/Kotlin sources and component declaration documents below the
//! configured root directories, keeps their text in memory while the injectors work
//! on it, and writes changed files back at the end of a run.

use crate::ast_utils::AstParser;
use crate::config::InstrumentConfig;
use crate::dialect::DialectKind;
use crate::errors::ServiceError;
use crate::report::ResultCollector;
use crate::types::FileRecord;
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// One source file of the corpus.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    dialect: DialectKind,
    text: String,
    hash_before: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, dialect: DialectKind, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            path: path.into(),
            dialect,
            hash_before: content_hash(&text),
            text,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// File name without extension, matched against component names.
    pub fn simple_name(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }

    pub fn package_name(&self) -> Option<String> {
        let ast = AstParser::new().parse(&self.text, self.dialect);
        self.dialect.adapter().package_name(&ast.root())
    }

    pub fn is_changed(&self) -> bool {
        content_hash(&self.text) != self.hash_before
    }

    pub(crate) fn replace_text(&mut self, text: String) {
        self.text = text;
    }

    fn record(&self, written: bool) -> FileRecord {
        let hash_after = content_hash(&self.text);
        FileRecord {
            file_path: self.display_path(),
            changed: hash_after != self.hash_before,
            hash_before: self.hash_before.clone(),
            hash_after,
            written,
        }
    }
}

/// A component declaration document found in the corpus.
#[derive(Debug, Clone)]
pub struct ManifestFile {
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Corpus {
    files: Vec<SourceFile>,
    manifests: Vec<ManifestFile>,
}

impl Corpus {
    pub fn new(files: Vec<SourceFile>, manifests: Vec<ManifestFile>) -> Self {
        Self { files, manifests }
    }

    /// Load every source and manifest below the configured root directories.
    pub fn load(config: &InstrumentConfig) -> Result<Self, ServiceError> {
        let source_globs = build_glob_set(&config.source_globs)?;
        let mut files = Vec::new();
        let mut manifests = Vec::new();

        for root_dir in &config.root_directories {
            if !root_dir.exists() {
                return Err(ServiceError::FileNotFound(root_dir.clone()));
            }
            for entry in WalkDir::new(root_dir)
                .max_depth(config.max_depth)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    e.depth() == 0
                        || !e.file_type().is_dir()
                        || !config
                            .exclude_directories
                            .iter()
                            .any(|name| e.file_name().to_string_lossy() == name.as_str())
                })
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path();
                if let Ok(metadata) = entry.metadata() {
                    if metadata.len() > config.max_file_size {
                        tracing::debug!("Skipping {} (exceeds max file size)", path.display());
                        continue;
                    }
                }

                if entry.file_name().to_string_lossy() == config.manifest_file_name.as_str() {
                    manifests.push(ManifestFile {
                        path: path.to_path_buf(),
                        text: std::fs::read_to_string(path)?,
                    });
                    continue;
                }

                let relative = path.strip_prefix(root_dir).unwrap_or(path);
                if !source_globs.is_match(relative) {
                    continue;
                }
                let Some(dialect) = DialectKind::from_path(path) else {
                    continue;
                };
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("Failed to read {}: {e}", path.display());
                        continue;
                    }
                };
                let file = SourceFile::new(path, dialect, text);
                if is_library_file(&file, config) {
                    tracing::debug!("Skipping library source {}", path.display());
                    continue;
                }
                files.push(file);
            }
        }

        tracing::info!(
            "Loaded {} source file(s) and {} manifest(s)",
            files.len(),
            manifests.len()
        );
        Ok(Self { files, manifests })
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [SourceFile] {
        &mut self.files
    }

    pub fn manifests(&self) -> &[ManifestFile] {
        &self.manifests
    }

    /// Indices of the files whose simple name equals `name`.
    pub fn files_named(&self, name: &str) -> Vec<usize> {
        self.files
            .iter()
            .enumerate()
            .filter(|(_, f)| f.simple_name() == Some(name))
            .map(|(i, _)| i)
            .collect()
    }

    /// Write changed files to disk unless `dry_run` and record each of them.
    ///
    /// A file that cannot be written is recorded as unwritten with a fault; the
    /// remaining files are still written.
    pub fn write_back(&self, dry_run: bool, collector: &mut ResultCollector) {
        for file in self.files.iter().filter(|f| f.is_changed()) {
            let written = if dry_run {
                false
            } else {
                match std::fs::write(file.path(), file.text()) {
                    Ok(()) => {
                        tracing::info!("Wrote {}", file.display_path());
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Failed to write {}: {e}", file.display_path());
                        collector.fault(file.display_path(), format!("write failed: {e}"));
                        false
                    }
                }
            };
            collector.files(vec![file.record(written)]);
        }
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ServiceError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Sources of the instrumented library itself are left alone, except its sample app.
fn is_library_file(file: &SourceFile, config: &InstrumentConfig) -> bool {
    if config.library.package.is_empty() {
        return false;
    }
    let Some(package) = file.package_name() else {
        return false;
    };
    package.starts_with(&config.library.package)
        && (config.library.sample_app_package.is_empty()
            || !package.starts_with(&config.library.sample_app_package))
}
