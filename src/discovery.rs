//! # Activity Discovery
//!
//! Maps declared activities to a launcher flag, keyed by simple class name.

use crate::corpus::Corpus;
use crate::manifest::{DeclarationDocument, ManifestReader};
use std::collections::BTreeMap;

/// Simple component name to "is launcher".
pub type ActivityMap = BTreeMap<String, bool>;

pub struct ActivityDiscovery;

impl ActivityDiscovery {
    /// Later declarations of the same simple name overwrite earlier ones.
    pub fn discover<'a>(documents: impl IntoIterator<Item = &'a DeclarationDocument>) -> ActivityMap {
        let mut activities = ActivityMap::new();
        for document in documents {
            for component in &document.components {
                let simple_name = component.simple_name().to_string();
                let is_launcher = component.is_launcher();
                if let Some(previous) = activities.insert(simple_name.clone(), is_launcher) {
                    tracing::warn!(
                        "Component {} redeclared (launcher {} -> {}); keeping the later declaration",
                        simple_name,
                        previous,
                        is_launcher
                    );
                }
            }
        }
        activities
    }

    /// Discover activities from every manifest of a corpus, in corpus order.
    pub fn discover_in(corpus: &Corpus) -> ActivityMap {
        let documents: Vec<DeclarationDocument> = corpus
            .manifests()
            .iter()
            .map(|manifest| ManifestReader::parse(&manifest.text))
            .collect();
        let activities = Self::discover(&documents);
        tracing::info!(
            "Discovered {} activit(ies) in {} manifest(s)",
            activities.len(),
            documents.len()
        );
        activities
    }
}
