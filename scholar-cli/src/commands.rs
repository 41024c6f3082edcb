//! Subcommand implementations.
//!
//! Every command works against the in-memory index restored from the JSON
//! snapshot at `--index`; `ingest` writes the snapshot back when it changes.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use scholar_rag::openai::{OpenAICompatibleLlm, OpenAIEmbeddingProvider};
use scholar_rag::{
    Answer, AssistantConfig, ChunkRetriever, DocListResponse, HydeRetriever, InMemoryVectorStore,
    Ingestor, NO_RELEVANT_DOCUMENTS_MESSAGE, RecursiveChunker, ResearchAssistant, Retriever,
    VectorSearch, VectorStore, load_arxiv_snapshot,
};
use tracing::info;

use crate::cli::{Cli, Command, RetrievalArgs};
use crate::config;

/// Run the parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = config::load(cli.config.as_deref())?;
    let api_key = config::api_key();

    match cli.command {
        Command::Ingest { snapshot, max_documents, force } => {
            ingest(&config, &cli.index, &snapshot, max_documents, force, api_key).await
        }
        Command::Search { query, retrieval, json } => {
            config::apply_overrides(&mut config, &retrieval)?;
            let assistant = assistant(&config, &cli.index, &retrieval, api_key).await?;
            let documents = assistant.lookup(&query).await?;
            print_documents(&documents, json)
        }
        Command::Ask { query, language, retrieval, json } => {
            config::apply_overrides(&mut config, &retrieval)?;
            let assistant = assistant(&config, &cli.index, &retrieval, api_key).await?;
            let answer = assistant.ask(&query, language.as_deref()).await?;
            print_answer(&answer, json)
        }
        Command::Count => {
            let store = InMemoryVectorStore::load_or_default(&cli.index).await?;
            println!("{}", store.count(&config.collection).await?);
            Ok(())
        }
    }
}

fn embedder(config: &AssistantConfig, api_key: Option<String>) -> Arc<OpenAIEmbeddingProvider> {
    Arc::new(OpenAIEmbeddingProvider::from_settings(&config.embedding, api_key))
}

fn llm(config: &AssistantConfig, api_key: Option<String>) -> Arc<OpenAICompatibleLlm> {
    Arc::new(OpenAICompatibleLlm::from_settings(&config.llm, api_key))
}

async fn ingest(
    config: &AssistantConfig,
    index: &Path,
    snapshot: &Path,
    max_documents: Option<usize>,
    force: bool,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let store = Arc::new(InMemoryVectorStore::load_or_default(index).await?);
    let limit = max_documents.or(config.ingest.max_documents);
    let documents = load_arxiv_snapshot(snapshot, limit)
        .with_context(|| format!("failed to load snapshot {}", snapshot.display()))?;

    let ingestor = Ingestor::builder()
        .collection(&config.collection)
        .batch_size(config.ingest.batch_size)
        .embedding_provider(embedder(config, api_key))
        .vector_store(store.clone())
        .chunker(Arc::new(RecursiveChunker::from_config(&config.chunking)))
        .build()?;

    if force {
        info!(collection = %config.collection, "dropping collection before ingestion");
        store.delete_collection(&config.collection).await?;
    }

    match ingestor.ensure_ingested(&documents).await? {
        Some(report) => {
            store.save(index).await?;
            println!(
                "Ingested {} papers as {} chunks into '{}'",
                report.documents, report.chunks, config.collection
            );
        }
        None => {
            let existing = store.count(&config.collection).await?;
            println!(
                "Collection '{}' already holds {existing} chunks; pass --force to rebuild it",
                config.collection
            );
        }
    }
    Ok(())
}

async fn assistant(
    config: &AssistantConfig,
    index: &Path,
    args: &RetrievalArgs,
    api_key: Option<String>,
) -> anyhow::Result<ResearchAssistant> {
    let store = Arc::new(InMemoryVectorStore::load_or_default(index).await?);
    if store.count(&config.collection).await? == 0 {
        bail!(
            "collection '{}' in {} is empty; run `scholar ingest` first",
            config.collection,
            index.display()
        );
    }

    let llm = llm(config, api_key.clone());
    let embedder = embedder(config, api_key);
    let retrieval = config.retrieval.clone();
    let retriever: Arc<dyn Retriever> = if args.hyde {
        let hyde = HydeRetriever::new(llm.clone(), embedder, store, &config.collection, retrieval)?;
        Arc::new(hyde.with_config(&config.hyde))
    } else {
        Arc::new(ChunkRetriever::new(embedder, store, &config.collection, retrieval)?)
    };

    Ok(ResearchAssistant::builder().config(config).retriever(retriever).llm(llm).build()?)
}

fn print_documents(documents: &[DocListResponse], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(documents)?);
        return Ok(());
    }
    if documents.is_empty() {
        println!("{NO_RELEVANT_DOCUMENTS_MESSAGE}");
        return Ok(());
    }
    for doc in documents {
        println!("{}", format_document(doc));
    }
    Ok(())
}

fn print_answer(answer: &Answer, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(answer)?);
        return Ok(());
    }
    println!("{}", answer.text());
    if !answer.documents().is_empty() {
        println!("\nSources:");
        for doc in answer.documents() {
            println!("{}", format_document(doc));
        }
    }
    Ok(())
}

/// One-line listing: `index. title (similarity) [source_id]`.
pub fn format_document(doc: &DocListResponse) -> String {
    format!("{}. {} ({:.4}) [{}]", doc.index, doc.title, doc.similarity, doc.source_id)
}
