//! CLI argument parsing, configuration loading, and offline commands.

use clap::Parser;
use scholar_cli::cli::{Cli, Command, RetrievalArgs};
use scholar_cli::commands::{format_document, run};
use scholar_cli::config::{api_key_from, apply_overrides, load, parse};
use scholar_rag::{
    Answer, AssistantConfig, DocListResponse, NO_RELEVANT_DOCUMENTS_MESSAGE, QueryMode,
    SynthesisStyle,
};

#[test]
fn parses_ask_with_overrides() {
    let cli = Cli::try_parse_from([
        "scholar",
        "--index",
        "idx.json",
        "ask",
        "spin liquids",
        "--language",
        "Italian",
        "--top-k",
        "3",
        "--threshold",
        "0.7",
        "--hyde",
    ])
    .unwrap();

    assert_eq!(cli.index.to_str(), Some("idx.json"));
    match cli.command {
        Command::Ask { query, language, retrieval, json } => {
            assert_eq!(query, "spin liquids");
            assert_eq!(language.as_deref(), Some("Italian"));
            assert_eq!(retrieval.top_k, Some(3));
            assert_eq!(retrieval.threshold, Some(0.7));
            assert!(retrieval.hyde);
            assert!(!json);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn ingest_requires_a_snapshot() {
    assert!(Cli::try_parse_from(["scholar", "ingest"]).is_err());

    let cli =
        Cli::try_parse_from(["scholar", "ingest", "--snapshot", "arxiv.json", "--force"]).unwrap();
    assert!(matches!(cli.command, Command::Ingest { force: true, max_documents: None, .. }));
}

#[test]
fn toml_config_overrides_defaults() {
    let config = parse(
        r#"
        collection = "physics"
        output_language = "Spanish"
        synthesis_style = "annotated"

        [retrieval]
        node_top_k = 40
        confidence_threshold = 0.75
        query_mode = "default"

        [llm]
        base_url = "http://localhost:8080/v1"
        model = "llama-2-13b-chat"
        "#,
    )
    .unwrap();

    assert_eq!(config.collection, "physics");
    assert_eq!(config.output_language, "Spanish");
    assert_eq!(config.synthesis_style, SynthesisStyle::Annotated);
    assert_eq!(config.retrieval.node_top_k, 40);
    assert_eq!(config.retrieval.document_top_k, 5);
    assert_eq!(config.retrieval.confidence_threshold, 0.75);
    assert_eq!(config.retrieval.query_mode, QueryMode::Default);
    assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:8080/v1"));
    assert_eq!(config.embedding.model, "BAAI/bge-small-en");
}

#[test]
fn invalid_config_values_are_rejected() {
    assert!(parse("[retrieval]\nnode_top_k = 2\ndocument_top_k = 5\n").is_err());
    assert!(parse("[retrieval]\nquery_mode = \"dense\"\n").is_err());
    assert!(parse("collection = [").is_err());
}

#[test]
fn load_reads_file_or_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scholar.toml");
    std::fs::write(&path, "collection = \"papers\"\n").unwrap();

    assert_eq!(load(Some(path.as_path())).unwrap().collection, "papers");
    assert_eq!(load(None).unwrap(), AssistantConfig::default());
    assert!(load(Some(dir.path().join("missing.toml").as_path())).is_err());
}

#[test]
fn top_k_override_widens_the_over_fetch_window() {
    let mut config = AssistantConfig::default();
    let args = RetrievalArgs { top_k: Some(30), ..Default::default() };

    apply_overrides(&mut config, &args).unwrap();

    assert_eq!(config.retrieval.document_top_k, 30);
    assert_eq!(config.retrieval.node_top_k, 30);
}

#[test]
fn invalid_overrides_are_rejected() {
    let mut config = AssistantConfig::default();
    let args = RetrievalArgs { top_k: Some(10), node_top_k: Some(5), ..Default::default() };
    assert!(apply_overrides(&mut config, &args).is_err());

    let mut config = AssistantConfig::default();
    let args = RetrievalArgs { threshold: Some(2.0), ..Default::default() };
    assert!(apply_overrides(&mut config, &args).is_err());
}

#[test]
fn hyde_counts_require_the_hyde_flag() {
    assert!(Cli::try_parse_from(["scholar", "search", "q", "--hypotheses", "2"]).is_err());

    let cli = Cli::try_parse_from([
        "scholar",
        "search",
        "q",
        "--hyde",
        "--hypotheses",
        "2",
        "--hits-per-hypothesis",
        "4",
    ])
    .unwrap();
    let Command::Search { retrieval, .. } = cli.command else {
        panic!("expected search");
    };

    let mut config = AssistantConfig::default();
    apply_overrides(&mut config, &retrieval).unwrap();

    assert_eq!(config.hyde.hypotheses, 2);
    assert_eq!(config.hyde.hits_per_hypothesis, 4);
}

#[test]
fn zero_hyde_counts_are_rejected() {
    let mut config = AssistantConfig::default();
    let args = RetrievalArgs { hyde: true, hypotheses: Some(0), ..Default::default() };

    assert!(apply_overrides(&mut config, &args).is_err());
}

#[test]
fn hyde_section_loads_from_toml() {
    let config = parse("[hyde]\nhypotheses = 8\n").unwrap();

    assert_eq!(config.hyde.hypotheses, 8);
    assert_eq!(config.hyde.hits_per_hypothesis, 3);
}

#[test]
fn no_relevant_documents_answer_keeps_its_message_in_json() {
    let json = serde_json::to_value(Answer::NoRelevantDocuments).unwrap();

    assert_eq!(json["text"], NO_RELEVANT_DOCUMENTS_MESSAGE);
}

#[test]
fn api_key_prefers_scholar_variable_and_skips_blanks() {
    let env = |scholar: Option<&str>, openai: Option<&str>| {
        let scholar = scholar.map(str::to_string);
        let openai = openai.map(str::to_string);
        api_key_from(move |var| match var {
            "SCHOLAR_API_KEY" => scholar.clone(),
            "OPENAI_API_KEY" => openai.clone(),
            _ => None,
        })
    };

    assert_eq!(env(Some("s"), Some("o")).as_deref(), Some("s"));
    assert_eq!(env(Some("  "), Some("o")).as_deref(), Some("o"));
    assert_eq!(env(None, None), None);
}

#[test]
fn documents_are_listed_on_one_line() {
    let doc = DocListResponse {
        index: 2,
        title: "Federated topic models".to_string(),
        abstract_text: "Topic models.".to_string(),
        source_id: "cs/0002".to_string(),
        similarity: 0.85,
    };

    assert_eq!(format_document(&doc), "2. Federated topic models (0.8500) [cs/0002]");
}

#[tokio::test]
async fn count_on_missing_index_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let index = dir.path().join("index.json");
    let args = ["scholar", "--index", index.to_str().unwrap(), "count"];
    let cli = Cli::try_parse_from(args).unwrap();

    run(cli).await.unwrap();
}

#[tokio::test]
async fn search_on_empty_index_asks_for_ingestion() {
    let dir = tempfile::tempdir().unwrap();
    let index = dir.path().join("index.json");
    let args = ["scholar", "--index", index.to_str().unwrap(), "search", "topic"];
    let cli = Cli::try_parse_from(args).unwrap();

    let err = run(cli).await.unwrap_err();

    assert!(err.to_string().contains("scholar ingest"));
}
