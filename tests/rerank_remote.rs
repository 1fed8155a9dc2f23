//! Cross-encoder reranker against a mock `/rerank` endpoint.

mod common;

use common::corpus;
use mockito::{Matcher, Server};
use rag_retrieval::config::RetrievalConfig;
use rag_retrieval::rerank::{CrossEncoderReranker, RerankCandidate, Reranker};
use rag_retrieval::store::{DocumentMetadata, MemoryDocumentStore};
use rag_retrieval::telemetry::{CallOutcome, InMemoryRecorder};
use rag_retrieval::{Error, OutcomeCode};
use std::sync::Arc;

fn candidates() -> Vec<RerankCandidate> {
    ["AI policy requires transparency", "unrelated gardening tips", "AI ethics"]
        .iter()
        .enumerate()
        .map(|(i, text)| RerankCandidate {
            doc_id: i as u64 + 1,
            content: text.to_string(),
            metadata: DocumentMetadata::new(format!("{}.md", i + 1), "md"),
            original_score: 0.5,
        })
        .collect()
}

fn reranker(url: &str) -> CrossEncoderReranker {
    CrossEncoderReranker::builder()
        .model("rerank-v3.5")
        .api_key("test-key")
        .base_url(url)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_scores_are_mapped_by_index() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rerank")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "rerank-v3.5",
            "query": "AI policy",
            "top_n": 3
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"results":[
                {"index":2,"relevance_score":0.61},
                {"index":0,"relevance_score":0.98},
                {"index":1,"relevance_score":0.02}
            ]}"#,
        )
        .create_async()
        .await;

    let results = reranker(&server.url())
        .rerank("AI policy", candidates(), 2)
        .await
        .unwrap();
    mock.assert_async().await;

    let ids: Vec<u64> = results.iter().map(|r| r.doc_id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!((results[0].rerank_score - 0.98).abs() < 1e-6);
    assert_eq!(results[1].final_rank, 2);
    assert_eq!(results[1].original_score, 0.5);
}

#[tokio::test]
async fn test_http_error_surfaces_as_api_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/rerank")
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let err = reranker(&server.url())
        .score("AI policy", &candidates())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_out_of_range_index_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/rerank")
        .with_status(200)
        .with_body(r#"{"results":[{"index":9,"relevance_score":0.5}]}"#)
        .create_async()
        .await;

    let err = reranker(&server.url())
        .score("AI policy", &candidates())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rerank { .. }));
}

#[tokio::test]
async fn test_service_falls_back_when_reranker_fails() {
    common::init_tracing();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rerank")
        .with_status(500)
        .with_body("boom")
        .expect(2)
        .create_async()
        .await;

    let docs = corpus();
    let store = Arc::new(MemoryDocumentStore::with_documents(docs.clone()));
    let recorder = Arc::new(InMemoryRecorder::new(10));
    let service = common::builder_for(store, &docs, RetrievalConfig::default())
        .reranker(Arc::new(reranker(&server.url())))
        .call_recorder(recorder.clone())
        .build()
        .await
        .unwrap();

    let resp = service.search_documents("AI policy", 2, true).await.unwrap();
    assert_eq!(resp.outcome, OutcomeCode::DegradedRanking);
    assert_eq!(resp.len(), 2);
    for d in &resp.documents {
        assert_eq!(d.rerank_score, Some(d.hybrid_score));
    }

    // Degraded responses are not cached; the reranker is tried again
    let again = service.search_documents("AI policy", 2, true).await.unwrap();
    assert!(!again.cached);
    assert_eq!(again.outcome, OutcomeCode::DegradedRanking);
    mock.assert_async().await;

    let rerank_calls = recorder.records_for("rerank");
    assert_eq!(rerank_calls.len(), 2);
    assert_eq!(rerank_calls[0].outcome, CallOutcome::Failure("api".into()));
    // Rerank failures never count against the retrieval breaker
    assert_eq!(service.get_stats().circuit.stats.failed_calls, 0);
}
