//! # Template Factory
//!
//! Synthesized code is rendered as text from dialect templates and checked by parsing
//! it inside a context that makes the fragment grammatical (a statement inside a
//! method inside a class, a member inside a class, an import above a class).
//! Validation results are cached.

use crate::ast_utils::{self, AstParser};
use crate::dialect::{Dialect, FragmentScope};
use crate::errors::ServiceError;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct TemplateFactory {
    validated: Arc<Mutex<LruCache<String, bool>>>,
}

impl Default for TemplateFactory {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl TemplateFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cache_size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            validated: Arc::new(Mutex::new(LruCache::new(cache_size))),
        }
    }

    fn cache(&self) -> Result<MutexGuard<'_, LruCache<String, bool>>, ServiceError> {
        self.validated
            .lock()
            .map_err(|_| ServiceError::Internal("template cache lock poisoned".into()))
    }

    /// Return `fragment` if it parses without errors in `scope`.
    pub fn validate(
        &self,
        dialect: &dyn Dialect,
        scope: FragmentScope,
        fragment: &str,
    ) -> Result<String, ServiceError> {
        let cache_key = format!("{}:{:?}:{}", dialect.kind(), scope, fragment);

        // Try to get from cache first
        let cached = self.cache()?.get(&cache_key).copied();

        let valid = match cached {
            Some(valid) => valid,
            None => {
                let wrapped = dialect.fragment_context(scope, fragment);
                let ast = AstParser::new().parse(&wrapped, dialect.kind());
                let valid = ast_utils::count_errors(&ast.root(), dialect.node_types()) == 0;
                self.cache()?.put(cache_key, valid);
                valid
            }
        };

        if valid {
            Ok(fragment.to_string())
        } else {
            Err(ServiceError::Template(format!(
                "{:?} fragment does not parse as {}: {}",
                scope,
                dialect.kind(),
                fragment
            )))
        }
    }

    pub fn statement(&self, dialect: &dyn Dialect, text: &str) -> Result<String, ServiceError> {
        self.validate(dialect, FragmentScope::Statement, text)
    }

    pub fn member(&self, dialect: &dyn Dialect, text: &str) -> Result<String, ServiceError> {
        self.validate(dialect, FragmentScope::Member, text)
    }

    pub fn import(&self, dialect: &dyn Dialect, path: &str) -> Result<String, ServiceError> {
        self.validate(dialect, FragmentScope::Import, &dialect.import(path))
    }

    /// A braced block of statements, each on its own line.
    pub fn block(
        &self,
        dialect: &dyn Dialect,
        statements: &[String],
        indent: &str,
        unit: &str,
    ) -> Result<String, ServiceError> {
        let mut block = String::from("{\n");
        for statement in statements {
            block.push_str(indent);
            block.push_str(unit);
            block.push_str(statement);
            block.push('\n');
        }
        block.push_str(indent);
        block.push('}');
        self.statement(dialect, &block)
    }

    /// A complete entry method whose body holds `statements`; every line is prefixed
    /// with `indent`.
    pub fn entry_method(
        &self,
        dialect: &dyn Dialect,
        header: (&str, &str, &str),
        statements: &[String],
        indent: &str,
        unit: &str,
    ) -> Result<String, ServiceError> {
        let (name, parameter, parameter_type) = header;
        let mut lines = dialect.entry_method_header(name, parameter, parameter_type);
        if let Some(signature) = lines.last_mut() {
            signature.push_str(" {");
        }
        lines.extend(statements.iter().map(|s| format!("{unit}{s}")));
        lines.push("}".to_string());

        let method = lines
            .iter()
            .map(|line| format!("{indent}{line}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.member(dialect, &method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;

    #[test]
    fn test_valid_statement_passes() {
        let factory = TemplateFactory::new();
        let java = DialectKind::Java.adapter();
        let statement = factory
            .statement(java, "Nappa.notifyExtras(intent.getExtras());")
            .unwrap();
        assert_eq!(statement, "Nappa.notifyExtras(intent.getExtras());");
    }

    #[test]
    fn test_broken_statement_rejected() {
        let factory = TemplateFactory::new();
        let java = DialectKind::Java.adapter();
        let err = factory.statement(java, "Nappa.notifyExtras(intent.getExtras(;").unwrap_err();
        assert!(matches!(err, ServiceError::Template(_)));
        // cached result gives the same answer
        assert!(factory.statement(java, "Nappa.notifyExtras(intent.getExtras(;").is_err());
    }

    #[test]
    fn test_kotlin_entry_method() {
        let factory = TemplateFactory::new();
        let kotlin = DialectKind::Kotlin.adapter();
        let method = factory
            .entry_method(
                kotlin,
                ("onCreate", "savedInstanceState", "Bundle?"),
                &[
                    "super.onCreate(savedInstanceState)".to_string(),
                    "lifecycle.addObserver(NappaLifecycleObserver(this))".to_string(),
                ],
                "    ",
                "    ",
            )
            .unwrap();
        assert_eq!(
            method,
            "    override fun onCreate(savedInstanceState: Bundle?) {\n        super.onCreate(savedInstanceState)\n        lifecycle.addObserver(NappaLifecycleObserver(this))\n    }"
        );
    }

    #[test]
    fn test_java_block() {
        let factory = TemplateFactory::new();
        let java = DialectKind::Java.adapter();
        let block = factory
            .block(
                java,
                &[
                    "Nappa.notifyExtras(i.getExtras());".to_string(),
                    "startActivity(i);".to_string(),
                ],
                "",
                "    ",
            )
            .unwrap();
        assert_eq!(
            block,
            "{\n    Nappa.notifyExtras(i.getExtras());\n    startActivity(i);\n}"
        );
    }

    #[test]
    fn test_poisoned_cache_is_an_error() {
        let factory = TemplateFactory::new();
        let validated = factory.validated.clone();
        let _ = std::thread::spawn(move || {
            let _guard = validated.lock().unwrap();
            panic!("cache holder failed");
        })
        .join();

        let java = DialectKind::Java.adapter();
        let err = factory.statement(java, "startActivity(i);").unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
