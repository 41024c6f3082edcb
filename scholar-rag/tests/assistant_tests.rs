//! End-to-end tests for the research assistant over an in-memory index.

mod common;

use std::sync::Arc;

use common::*;
use scholar_rag::{
    Answer, ChunkRetriever, DocListResponse, Document, InMemoryVectorStore, Ingestor, Llm,
    NO_RELEVANT_DOCUMENTS_MESSAGE, RagError, RecursiveChunker, ResearchAssistant, RetrievalConfig,
    Retriever, Role,
};

const VOCABULARY: [&str; 6] =
    ["hubbard", "quasiparticle", "federated", "topic", "protein", "folding"];

fn corpus() -> Vec<Document> {
    vec![
        Document::new(
            "cond-mat/0001",
            "Quasiparticles in the Hubbard model",
            "Hubbard model quasiparticle spectra.",
        ),
        Document::new(
            "cs/0002",
            "Federated topic models",
            "Topic models trained with federated learning.",
        ),
        Document::new("q-bio/0003", "Protein folding dynamics", "Folding of protein chains."),
    ]
}

async fn indexed_retriever() -> Arc<dyn Retriever> {
    let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY.to_vec()));
    let store = Arc::new(InMemoryVectorStore::new());

    Ingestor::builder()
        .embedding_provider(embedder.clone())
        .vector_store(store.clone())
        .chunker(Arc::new(RecursiveChunker::new(1024, 200)))
        .build()
        .unwrap()
        .ingest_documents(&corpus())
        .await
        .unwrap();

    Arc::new(ChunkRetriever::new(embedder, store, "arxiv", RetrievalConfig::default()).unwrap())
}

fn assistant(retriever: Arc<dyn Retriever>, llm: Arc<dyn Llm>) -> ResearchAssistant {
    ResearchAssistant::builder().retriever(retriever).llm(llm).build().unwrap()
}

#[tokio::test]
async fn confident_query_is_synthesized() {
    let llm = Arc::new(ScriptedLlm::always("  Document 1 matches closely.  "));
    let assistant = assistant(indexed_retriever().await, llm.clone());

    let answer = assistant.ask("hubbard quasiparticle", None).await.unwrap();

    match &answer {
        Answer::Synthesized { text, documents } => {
            assert_eq!(text, "Document 1 matches closely.");
            assert_eq!(documents.len(), 1);
            assert_eq!(documents[0].source_id, "cond-mat/0001");
            assert_eq!(documents[0].index, 1);
            assert!(documents[0].similarity >= 0.8);
        }
        other => panic!("expected a synthesized answer, got {other:?}"),
    }
    assert_eq!(llm.call_count(), 1);

    let prompt = &llm.calls.lock().unwrap()[0];
    assert_eq!(prompt.len(), 3);
    assert_eq!(prompt[0].role, Role::System);
    assert!(prompt[0].content.contains("English"));
    assert!(prompt[1].content.contains("hubbard quasiparticle"));
    assert!(prompt[1].content.contains("Quasiparticles in the Hubbard model"));
}

#[tokio::test]
async fn low_confidence_query_never_reaches_the_model() {
    let llm = Arc::new(ScriptedLlm::always("should not be used"));
    let assistant = assistant(indexed_retriever().await, llm.clone());

    let answer = assistant.ask("graph neural networks", None).await.unwrap();

    assert_eq!(answer, Answer::NoRelevantDocuments);
    assert_eq!(answer.text(), NO_RELEVANT_DOCUMENTS_MESSAGE);
    assert!(answer.documents().is_empty());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn backend_failure_is_distinct_from_no_documents() {
    let retriever = Arc::new(
        ChunkRetriever::new(
            Arc::new(ConstantEmbedder),
            Arc::new(FailingIndex),
            "arxiv",
            RetrievalConfig::default(),
        )
        .unwrap(),
    );
    let llm = Arc::new(ScriptedLlm::always("unused"));
    let assistant = assistant(retriever, llm.clone());

    let err = assistant.ask("hubbard quasiparticle", None).await.unwrap_err();

    assert!(err.is_backend_unavailable());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn synthesis_failure_propagates() {
    let assistant = assistant(indexed_retriever().await, Arc::new(FailingLlm));

    let err = assistant.ask("hubbard quasiparticle", None).await.unwrap_err();

    assert!(matches!(err, RagError::LlmError { .. }));
}

#[tokio::test]
async fn transformed_query_drives_retrieval_but_not_the_prompt() {
    let llm = Arc::new(ScriptedLlm::new(&["Output: \"hubbard quasiparticle\""], "Summary."));
    let assistant = ResearchAssistant::builder()
        .retriever(indexed_retriever().await)
        .llm(llm.clone())
        .transform_queries(true)
        .build()
        .unwrap();
    let query = "I am researching strongly correlated electrons";

    let answer = assistant.ask(query, None).await.unwrap();

    assert_eq!(answer.documents().len(), 1);
    assert_eq!(llm.call_count(), 2);
    let calls = llm.calls.lock().unwrap();
    assert!(calls[0][1].content.contains(query));
    assert!(calls[1][1].content.contains(query));
    assert!(!calls[1][1].content.contains("\"hubbard quasiparticle\""));
}

#[tokio::test]
async fn output_language_can_be_overridden_per_call() {
    let llm = Arc::new(ScriptedLlm::always("Resumen."));
    let assistant = ResearchAssistant::builder()
        .retriever(indexed_retriever().await)
        .llm(llm.clone())
        .output_language("French")
        .build()
        .unwrap();

    assistant.ask("hubbard quasiparticle", None).await.unwrap();
    assistant.ask("hubbard quasiparticle", Some("Spanish")).await.unwrap();

    let calls = llm.calls.lock().unwrap();
    assert!(calls[0][0].content.contains("French"));
    assert!(calls[1][0].content.contains("Spanish"));
}

#[tokio::test]
async fn lookup_returns_gated_documents_without_generation() {
    let llm = Arc::new(ScriptedLlm::always("unused"));
    let assistant = assistant(indexed_retriever().await, llm.clone());

    let docs = assistant.lookup("federated topic").await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title, "Federated topic models");
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn blank_query_is_invalid() {
    let llm = Arc::new(ScriptedLlm::always("unused"));
    let assistant = assistant(indexed_retriever().await, llm.clone());

    let err = assistant.ask("   ", None).await.unwrap_err();

    assert!(matches!(err, RagError::InvalidQuery(_)));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn zero_threshold_admits_every_retrieved_document() {
    let assistant = ResearchAssistant::builder()
        .retriever(indexed_retriever().await)
        .llm(Arc::new(ScriptedLlm::always("ok")))
        .confidence_threshold(0.0)
        .build()
        .unwrap();

    let docs = assistant.lookup("graph neural networks").await.unwrap();

    assert_eq!(docs.len(), 3);
}

#[test]
fn builder_validates_inputs() {
    let no_retriever =
        ResearchAssistant::builder().llm(Arc::new(ScriptedLlm::always("x"))).build();
    assert!(matches!(no_retriever, Err(RagError::ConfigError(_))));

    let retriever: Arc<dyn Retriever> = Arc::new(
        ChunkRetriever::new(
            Arc::new(ConstantEmbedder),
            Arc::new(ScriptedIndex::new(Vec::new())),
            "arxiv",
            RetrievalConfig::default(),
        )
        .unwrap(),
    );
    let bad_threshold = ResearchAssistant::builder()
        .retriever(retriever)
        .llm(Arc::new(ScriptedLlm::always("x")))
        .confidence_threshold(1.5)
        .build();
    assert!(matches!(bad_threshold, Err(RagError::ConfigError(_))));
}

#[test]
fn answer_serializes_with_outcome_tag() {
    let json = serde_json::to_value(Answer::NoRelevantDocuments).unwrap();

    assert_eq!(json["outcome"], "no_relevant_documents");
    assert_eq!(json["text"], NO_RELEVANT_DOCUMENTS_MESSAGE);
    assert_eq!(json["documents"], serde_json::json!([]));
}

#[test]
fn synthesized_answer_serializes_text_and_documents() {
    let answer = Answer::Synthesized {
        text: "Both papers study the Hubbard model.".to_string(),
        documents: vec![DocListResponse {
            index: 1,
            title: "Quasiparticles".to_string(),
            abstract_text: "We study spectral functions.".to_string(),
            source_id: "2101.00001".to_string(),
            similarity: 0.91,
        }],
    };

    let json = serde_json::to_value(&answer).unwrap();

    assert_eq!(json["outcome"], "synthesized");
    assert_eq!(json["text"], "Both papers study the Hubbard model.");
    assert_eq!(json["documents"][0]["source_id"], "2101.00001");
}
