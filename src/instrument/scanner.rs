//! # Call-Site Scanner
//!
//! Finds invocations of the known activity-start operations inside a class.

use crate::ast_utils::SgNode;
use crate::config::{InstrumentConfig, KnownOperation};
use crate::dialect::{Dialect, invoked_call};

/// A matched invocation with its positional payload argument.
pub struct CallSite<'r> {
    pub call: SgNode<'r>,
    pub operation: KnownOperation,
    /// `None` when the argument list is missing or too short
    pub payload: Option<SgNode<'r>>,
}

#[derive(Default)]
pub struct ScanOutput<'r> {
    pub sites: Vec<CallSite<'r>>,
    pub processed: usize,
}

pub struct CallSiteScanner<'c> {
    config: &'c InstrumentConfig,
}

impl<'c> CallSiteScanner<'c> {
    pub fn new(config: &'c InstrumentConfig) -> Self {
        Self { config }
    }

    pub fn file_may_match(&self, text: &str) -> bool {
        text.contains(&self.config.operation_family) && passes(&self.config.file_filter, text)
    }

    pub fn class_may_match(&self, text: &str) -> bool {
        passes(&self.config.class_filter, text)
    }

    /// Pre-order traversal of `class`, skipping subtrees that cannot mention an operation.
    pub fn scan<'r>(&self, dialect: &dyn Dialect, class: &SgNode<'r>) -> ScanOutput<'r> {
        let mut output = ScanOutput::default();
        self.visit(dialect, class, &mut output);
        output
    }

    fn visit<'r>(&self, dialect: &dyn Dialect, node: &SgNode<'r>, output: &mut ScanOutput<'r>) {
        output.processed += 1;
        let text = node.text();
        if !text.contains(&self.config.operation_family) {
            return;
        }

        if node.kind() == dialect.node_types().identifier {
            if let Some(operation) = self.config.operation(&text) {
                if let Some(call) = invoked_call(dialect, node) {
                    let payload = dialect
                        .arguments(&call)
                        .and_then(|args| args.into_iter().nth(operation.payload_position - 1));
                    output.sites.push(CallSite {
                        call,
                        operation: operation.clone(),
                        payload,
                    });
                }
            }
            return;
        }

        for child in node.children() {
            self.visit(dialect, &child, output);
        }
    }
}

fn passes(filter: &[String], text: &str) -> bool {
    filter.is_empty() || filter.iter().any(|needle| text.contains(needle.as_str()))
}
