use std::sync::Arc;

use crate::domain::{FilterSpec, Source};
use crate::embedder::Embedder;
use crate::error::ApiError;
use crate::vector_store::VectorStore;

const DEFAULT_TOP_K: usize = 6;
const SNIPPET_MAX_BYTES: usize = 200;

pub struct RetrievalEngine {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalEngine {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
        }
    }

    /// Embeds `question`, searches `collection` under `filter_spec`,
    /// and returns hits as `Source`s in score-descending order. Purely
    /// mechanical: a `FilterSpec::None` is executed as-is — refusing on
    /// no filter is the orchestrator's call, not this engine's.
    pub async fn retrieve(
        &self,
        collection: &str,
        question: &str,
        filter_spec: &FilterSpec,
        top_k: Option<usize>,
    ) -> Result<Vec<Source>, ApiError> {
        let query_vector = self.embedder.embed(question).await.map_err(|_| ApiError::EmbedFailed {
            index: 0,
            reason: "failed to embed retrieval query".to_string(),
        })?;

        let hits = self
            .vector_store
            .search(collection, &query_vector, top_k.unwrap_or(DEFAULT_TOP_K), filter_spec, None)
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| Source {
                course_id: hit.course_id,
                course_material_id: hit.course_material_id,
                material_name: hit.material_name,
                chunk_text: truncate_snippet(&hit.text),
                similarity: hit.score,
            })
            .collect())
    }
}

/// Truncates `text` to at most 200 bytes, adding an ellipsis if
/// truncated, without splitting inside a codepoint.
fn truncate_snippet(text: &str) -> String {
    if text.len() <= SNIPPET_MAX_BYTES {
        return text.to_string();
    }

    let mut cut = SNIPPET_MAX_BYTES;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }

    format!("{}...", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::MockEmbedder;
    use crate::vector_store::{MockVectorStore, SearchHit};

    #[tokio::test]
    async fn maps_hits_to_sources_in_order() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.1, 0.2]));

        let mut vector_store = MockVectorStore::new();
        vector_store.expect_search().returning(|_, _, _, _, _| {
            Ok(vec![
                SearchHit {
                    chunk_id: "a".into(),
                    score: 0.9,
                    course_id: "c1".into(),
                    course_material_id: "m1".into(),
                    material_name: "Intro".into(),
                    text: "hello world".into(),
                },
                SearchHit {
                    chunk_id: "b".into(),
                    score: 0.5,
                    course_id: "c1".into(),
                    course_material_id: "m1".into(),
                    text: "goodbye world".into(),
                    material_name: "Intro".into(),
                },
            ])
        });

        let engine = RetrievalEngine::new(Arc::new(vector_store), Arc::new(embedder));
        let sources = engine
            .retrieve("default", "what is this", &FilterSpec::ByCourse("c1".into()), None)
            .await
            .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].similarity, 0.9);
        assert_eq!(sources[1].similarity, 0.5);
    }

    #[test]
    fn truncates_long_snippets_with_ellipsis() {
        let long = "x".repeat(250);
        let snippet = truncate_snippet(&long);
        assert!(snippet.ends_with("..."));
        assert!(snippet.len() <= SNIPPET_MAX_BYTES + 3);
    }

    #[test]
    fn short_snippet_untouched() {
        assert_eq!(truncate_snippet("short"), "short");
    }

    #[test]
    fn truncation_respects_codepoint_boundaries() {
        let text = "文".repeat(100);
        let snippet = truncate_snippet(&text);
        assert!(std::str::from_utf8(snippet.as_bytes()).is_ok());
    }
}
