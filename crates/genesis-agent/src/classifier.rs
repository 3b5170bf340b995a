//! Function classification (§4.4, Open Question resolved in SPEC_FULL.md:
//! classification is an optional trait seam with a no-op default rather
//! than a built-in heuristic or ML model).

use async_trait::async_trait;
use genesis_registry::FunctionRecord;

/// Narrows a candidate set of registered functions before they are exposed
/// to the LLM as tools, e.g. by relevance to the current conversation or by
/// an allow/deny policy. The default behavior is to pass every candidate
/// through unchanged.
#[async_trait]
pub trait FunctionClassifier: Send + Sync {
    async fn classify(&self, candidates: Vec<FunctionRecord>) -> Vec<FunctionRecord>;
}

/// Default classifier: no filtering.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopClassifier;

#[async_trait]
impl FunctionClassifier for NoopClassifier {
    async fn classify(&self, candidates: Vec<FunctionRecord>) -> Vec<FunctionRecord> {
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_core::Guid;
    use genesis_registry::OperationType;

    fn record(name: &str) -> FunctionRecord {
        FunctionRecord {
            function_id: Guid::new(),
            name: name.to_string(),
            description: String::new(),
            parameter_schema: serde_json::json!({}),
            provider_id: Guid::new(),
            capabilities: vec![],
            operation_type: OperationType::Remote,
            local_impl: None,
            service_name: Some("svc".to_string()),
        }
    }

    #[tokio::test]
    async fn noop_classifier_passes_everything_through() {
        let candidates = vec![record("a"), record("b")];
        let out = NoopClassifier.classify(candidates.clone()).await;
        assert_eq!(out.len(), candidates.len());
    }
}
