//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Research assistant over arXiv abstracts.
#[derive(Debug, Parser)]
#[command(name = "scholar", version, about = "Research assistant over arXiv abstracts")]
pub struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long, env = "SCHOLAR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// JSON snapshot holding the in-memory vector index
    #[arg(long, env = "SCHOLAR_INDEX", default_value = "scholar-index.json", global = true)]
    pub index: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load an arXiv metadata snapshot into the index
    Ingest {
        /// arXiv metadata snapshot (JSON lines)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Maximum number of papers to read (overrides `ingest.max_documents`)
        #[arg(long)]
        max_documents: Option<usize>,

        /// Drop the collection and ingest again even if it already holds chunks
        #[arg(long)]
        force: bool,
    },

    /// Show the documents that clear the confidence gate, without generation
    Search {
        query: String,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a research query from the indexed abstracts
    Ask {
        query: String,

        /// Language of the answer (overrides `output_language`)
        #[arg(short, long)]
        language: Option<String>,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the number of chunks stored in the collection
    Count,
}

/// Per-invocation overrides of the retrieval section.
#[derive(Debug, Clone, Default, Args)]
pub struct RetrievalArgs {
    /// Maximum number of distinct papers returned
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Raw chunk hits requested from the index (ignored with --hyde)
    #[arg(long)]
    pub node_top_k: Option<usize>,

    /// Minimum similarity for a paper to be used
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Retrieve with LLM-written hypothetical abstracts (HyDE)
    #[arg(long)]
    pub hyde: bool,

    /// Hypothetical abstracts generated per query (overrides `hyde.hypotheses`)
    #[arg(long, requires = "hyde")]
    pub hypotheses: Option<usize>,

    /// Index hits per hypothetical abstract (overrides `hyde.hits_per_hypothesis`)
    #[arg(long, requires = "hyde")]
    pub hits_per_hypothesis: Option<usize>,
}
