//! Configuration loading for the CLI: TOML file, command-line overrides, and
//! secrets from the environment.

use std::path::Path;

use anyhow::Context;
use scholar_rag::AssistantConfig;
use tracing::warn;

use crate::cli::RetrievalArgs;

/// Environment variables searched, in order, for the API key.
pub const API_KEY_VARS: [&str; 2] = ["SCHOLAR_API_KEY", "OPENAI_API_KEY"];

/// Read and validate an [`AssistantConfig`]. Missing fields take their defaults.
pub fn load(path: Option<&Path>) -> anyhow::Result<AssistantConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            parse(&text).with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => AssistantConfig::default(),
    };
    Ok(config)
}

/// Parse a TOML document and validate it.
pub fn parse(text: &str) -> anyhow::Result<AssistantConfig> {
    let config: AssistantConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Apply per-invocation retrieval overrides.
///
/// A `--top-k` above the configured over-fetch window widens the window to
/// match, unless `--node-top-k` is given explicitly. `--hypotheses` and
/// `--hits-per-hypothesis` override the `[hyde]` section.
pub fn apply_overrides(config: &mut AssistantConfig, args: &RetrievalArgs) -> anyhow::Result<()> {
    let retrieval = &mut config.retrieval;
    if let Some(top_k) = args.top_k {
        retrieval.document_top_k = top_k;
        retrieval.node_top_k = retrieval.node_top_k.max(top_k);
    }
    if let Some(node_top_k) = args.node_top_k {
        if args.hyde {
            warn!(node_top_k, "--node-top-k has no effect with --hyde");
        }
        retrieval.node_top_k = node_top_k;
    }
    if let Some(threshold) = args.threshold {
        retrieval.confidence_threshold = threshold;
    }
    retrieval.validate()?;

    if let Some(hypotheses) = args.hypotheses {
        config.hyde.hypotheses = hypotheses;
    }
    if let Some(hits) = args.hits_per_hypothesis {
        config.hyde.hits_per_hypothesis = hits;
    }
    config.hyde.validate()?;
    Ok(())
}

/// API key from the process environment.
pub fn api_key() -> Option<String> {
    api_key_from(|var| std::env::var(var).ok())
}

/// First non-blank value among [`API_KEY_VARS`] according to `lookup`.
pub fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS.iter().find_map(|var| lookup(var).filter(|value| !value.trim().is_empty()))
}
