//! # Configuration
//!
//! Runtime configuration of the instrumentation engine. Every textual artefact the
//! engine synthesizes or searches for is configurable; the defaults target the NAPPA
//! prefetching library.
//!
//! Configuration can be loaded from a `nappa-instrument.yml` file discovered by
//! walking up from a project directory.

use crate::dialect::DialectKind;
use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: [&str; 2] = ["nappa-instrument.yml", "nappa-instrument.yaml"];

/// A piece of source text that differs between the two dialects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DialectText {
    pub java: String,
    pub kotlin: String,
}

impl DialectText {
    pub fn new(java: impl Into<String>, kotlin: impl Into<String>) -> Self {
        Self {
            java: java.into(),
            kotlin: kotlin.into(),
        }
    }

    pub fn get(&self, dialect: DialectKind) -> &str {
        match dialect {
            DialectKind::Java => &self.java,
            DialectKind::Kotlin => &self.kotlin,
        }
    }
}

/// A known activity-start operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KnownOperation {
    pub name: String,
    /// 1-based position of the payload argument
    pub payload_position: usize,
}

impl KnownOperation {
    pub fn new(name: &str, payload_position: usize) -> Self {
        Self {
            name: name.to_string(),
            payload_position,
        }
    }
}

/// Settings describing the instrumented library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryConfig {
    /// Package of the library; files inside it are not instrumented
    pub package: String,
    /// Sub-package that is instrumented despite living inside `package`
    pub sample_app_package: String,
    /// On-demand imports added to every instrumented file
    pub imports: Vec<String>,
    /// Extra imports added to the launcher's file
    pub launcher_imports: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            package: "nl.vu.cs.s2group.nappa".to_string(),
            sample_app_package: "nl.vu.cs.s2group.nappa.sample.app".to_string(),
            imports: vec!["nl.vu.cs.s2group.nappa.*".to_string()],
            launcher_imports: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstrumentConfig {
    /// Root directories of the corpus (defaults to current working directory)
    pub root_directories: Vec<PathBuf>,
    /// Glob patterns selecting source files
    pub source_globs: Vec<String>,
    /// File name of the component declaration document
    pub manifest_file_name: String,
    /// Maximum file size to process (in bytes)
    pub max_file_size: u64,
    /// Maximum directory depth while enumerating the corpus
    pub max_depth: usize,
    /// Directory names never descended into
    pub exclude_directories: Vec<String>,
    /// Compute edits without writing files back
    pub dry_run: bool,
    pub library: LibraryConfig,
    /// Lifecycle callback receiving the injections
    pub entry_method: String,
    /// Parameter name used when the entry method is synthesized
    pub entry_parameter: String,
    /// Parameter type used when the entry method is synthesized
    pub entry_parameter_type: DialectText,
    /// Observer registration statement (without terminator)
    pub observer_statement: DialectText,
    /// Library initialization statement (without terminator)
    pub init_statement: DialectText,
    /// Callee of the probe statement
    pub probe_function: String,
    /// Accessor appended to the payload inside the probe
    pub probe_accessor: DialectText,
    /// Declared type of synthesized payload variables
    pub payload_type: String,
    /// Base name for synthesized payload variables
    pub payload_variable: String,
    /// Literal fragment shared by every known operation name
    pub operation_family: String,
    pub operations: Vec<KnownOperation>,
    /// Files not containing any of these strings are not scanned for call sites
    pub file_filter: Vec<String>,
    /// Classes not containing any of these strings are not scanned for call sites
    pub class_filter: Vec<String>,
    /// One level of indentation in synthesized code
    pub indent_unit: String,
    /// Maximum number of validated template fragments to cache
    pub template_cache_size: usize,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            root_directories: vec![
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            ],
            source_globs: vec!["**/*.java".to_string(), "**/*.kt".to_string()],
            manifest_file_name: "AndroidManifest.xml".to_string(),
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_depth: 32,
            exclude_directories: vec![
                "build".to_string(),
                ".git".to_string(),
                ".gradle".to_string(),
                ".idea".to_string(),
            ],
            dry_run: false,
            library: LibraryConfig::default(),
            entry_method: "onCreate".to_string(),
            entry_parameter: "savedInstanceState".to_string(),
            entry_parameter_type: DialectText::new("Bundle", "Bundle?"),
            observer_statement: DialectText::new(
                "getLifecycle().addObserver(new NappaLifecycleObserver(this))",
                "lifecycle.addObserver(NappaLifecycleObserver(this))",
            ),
            init_statement: DialectText::new(
                "Nappa.init(this, PrefetchingStrategyType.STRATEGY_GREEDY_VISIT_FREQUENCY)",
                "Nappa.init(this, PrefetchingStrategyType.STRATEGY_GREEDY_VISIT_FREQUENCY)",
            ),
            probe_function: "Nappa.notifyExtras".to_string(),
            probe_accessor: DialectText::new("getExtras()", "extras"),
            payload_type: "Intent".to_string(),
            payload_variable: "intent".to_string(),
            operation_family: "startActivity".to_string(),
            operations: vec![
                KnownOperation::new("startActivity", 1),
                KnownOperation::new("startActivityForResult", 1),
                // Deprecated legacy overloads take the payload second
                KnownOperation::new("startActivityFromChild", 2),
                KnownOperation::new("startActivityFromFragment", 2),
                KnownOperation::new("startActivityIfNeeded", 1),
            ],
            file_filter: vec!["android.content.Intent".to_string()],
            class_filter: vec!["Intent".to_string()],
            indent_unit: "    ".to_string(),
            template_cache_size: 256,
        }
    }
}

impl InstrumentConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let mut config = Self::from_yaml(&content)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ServiceError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Find a configuration file by traversing up the directory tree
    pub fn discover(start_dir: &Path) -> Result<Option<(PathBuf, Self)>, ServiceError> {
        let mut current = start_dir;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    let config = Self::from_file(&config_path)?;
                    return Ok(Some((config_path, config)));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(None)
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.entry_method.trim().is_empty() {
            return Err(ServiceError::Config("entryMethod must not be empty".into()));
        }
        if self.payload_variable.trim().is_empty() {
            return Err(ServiceError::Config(
                "payloadVariable must not be empty".into(),
            ));
        }
        for op in &self.operations {
            if op.payload_position == 0 {
                return Err(ServiceError::Config(format!(
                    "operation {} has payloadPosition 0; positions are 1-based",
                    op.name
                )));
            }
            if !op.name.contains(&self.operation_family) {
                return Err(ServiceError::Config(format!(
                    "operation {} does not contain the family fragment {}",
                    op.name, self.operation_family
                )));
            }
        }
        Ok(())
    }

    pub fn operation(&self, name: &str) -> Option<&KnownOperation> {
        self.operations.iter().find(|op| op.name == name)
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        self.root_directories = self
            .root_directories
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    config_dir.join(p)
                }
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_operation_table() {
        let config = InstrumentConfig::default();
        assert_eq!(config.operations.len(), 5);
        assert_eq!(
            config.operation("startActivityFromChild").unwrap().payload_position,
            2
        );
        assert_eq!(
            config.operation("startActivityIfNeeded").unwrap().payload_position,
            1
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_overrides_defaults() {
        let yaml = r#"
entryMethod: onStart
payloadVariable: target
operations:
  - name: startActivity
    payloadPosition: 1
"#;
        let config = InstrumentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.entry_method, "onStart");
        assert_eq!(config.payload_variable, "target");
        assert_eq!(config.operations.len(), 1);
        assert_eq!(config.probe_function, "Nappa.notifyExtras");
    }

    #[test]
    fn test_zero_payload_position_rejected() {
        let yaml = r#"
operations:
  - name: startActivity
    payloadPosition: 0
"#;
        let err = InstrumentConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[test]
    fn test_discover_walks_up() {
        let temp = tempfile::TempDir::new().unwrap();
        let nested = temp.path().join("app").join("src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            temp.path().join("nappa-instrument.yml"),
            "rootDirectories: [app]\ndryRun: true\n",
        )
        .unwrap();

        let (path, config) = InstrumentConfig::discover(&nested).unwrap().unwrap();
        assert_eq!(path, temp.path().join("nappa-instrument.yml"));
        assert!(config.dry_run);
        assert_eq!(config.root_directories, vec![temp.path().join("app")]);
    }
}
