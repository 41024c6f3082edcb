//! Prompt construction for synthesis and query transformation.

mod common;

use std::sync::Arc;

use common::*;
use scholar_rag::query_transform::clean_transformed_query;
use scholar_rag::{
    DocListResponse, NO_RELEVANT_DOCUMENTS_MESSAGE, QueryTransformer, ResponseSynthesizer, Role,
    SynthesisStyle,
};

fn docs() -> Vec<DocListResponse> {
    vec![
        DocListResponse {
            index: 1,
            title: "Quasiparticles in the Hubbard model".to_string(),
            abstract_text: "Spectral functions at half filling.".to_string(),
            source_id: "cond-mat/0001".to_string(),
            similarity: 0.9132,
        },
        DocListResponse {
            index: 3,
            title: "Doped Mott insulators".to_string(),
            abstract_text: "Pseudogap behaviour.".to_string(),
            source_id: "cond-mat/0003".to_string(),
            similarity: 0.8421,
        },
    ]
}

#[test]
fn comparison_prompt_lists_documents_in_order() {
    let synthesizer =
        ResponseSynthesizer::new(Arc::new(ScriptedLlm::always("")), SynthesisStyle::Comparison);

    let messages = synthesizer.build_messages("Hubbard quasiparticles", "German", &docs());

    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::System]);
    assert!(messages[0].content.contains("German"));
    let prompt = &messages[1].content;
    assert!(prompt.contains("\"Hubbard quasiparticles\""));
    assert!(prompt.contains(
        "Document 1: Title: 'Quasiparticles in the Hubbard model' | Similarity Score: 0.9132"
    ));
    assert!(prompt.contains("Document 2: Title: 'Doped Mott insulators'"));
    assert!(messages[2].content.contains(NO_RELEVANT_DOCUMENTS_MESSAGE));
}

#[test]
fn annotated_prompt_keeps_gate_indices() {
    let synthesizer =
        ResponseSynthesizer::new(Arc::new(ScriptedLlm::always("")), SynthesisStyle::Annotated);

    let messages = synthesizer.build_messages("Hubbard quasiparticles", "English", &docs());

    let listing = "3. Title: 'Doped Mott insulators' | Similarity Score: 0.8421";
    assert!(messages[1].content.contains(listing));
    assert!(messages[2].content.contains("<index>. <title> (<similarity>)"));
}

#[tokio::test]
async fn synthesizer_skips_model_without_documents() {
    let llm = Arc::new(ScriptedLlm::always("unused"));
    let synthesizer = ResponseSynthesizer::new(llm.clone(), SynthesisStyle::default());

    let text = synthesizer.synthesize("anything", "English", &[]).await.unwrap();

    assert_eq!(text, NO_RELEVANT_DOCUMENTS_MESSAGE);
    assert_eq!(llm.call_count(), 0);
}

#[test]
fn synthesis_style_deserializes_lowercase() {
    let style: SynthesisStyle = serde_json::from_str("\"annotated\"").unwrap();

    assert_eq!(style, SynthesisStyle::Annotated);
    assert_eq!(SynthesisStyle::default(), SynthesisStyle::Comparison);
}

#[tokio::test]
async fn transformer_returns_cleaned_phrase() {
    let llm = Arc::new(ScriptedLlm::always("\"LLM models in medicine\"\n"));
    let transformer = QueryTransformer::new(llm.clone());

    let phrase = transformer
        .transform("I am researching about LLM models and their usage in medicine")
        .await
        .unwrap();

    assert_eq!(phrase, "LLM models in medicine");
    let prompt = &llm.calls.lock().unwrap()[0];
    assert!(prompt[1].content.contains("their usage in medicine"));
}

#[test]
fn clean_transformed_query_handles_model_artifacts() {
    let original = "original query";

    assert_eq!(clean_transformed_query("spin liquids", original), "spin liquids");
    assert_eq!(clean_transformed_query("\n  \"spin liquids\"  \n", original), "spin liquids");
    assert_eq!(
        clean_transformed_query("Input: \"x\"\nOutput: \"spin liquids\"\nDone", original),
        "spin liquids"
    );
    assert_eq!(clean_transformed_query("   ", original), original);
    assert_eq!(clean_transformed_query("\"\"", original), original);
}
