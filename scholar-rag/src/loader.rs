//! Reader for the arXiv metadata snapshot (`arxiv-metadata-oai-snapshot.json`).
//!
//! The snapshot is JSON lines: one object per paper with at least `id`,
//! `title` and `abstract`. Every other field is ignored.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::document::Document;
use crate::error::{RagError, Result};

#[derive(Deserialize)]
struct ArxivRecord {
    id: String,
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: String,
}

/// Collapse runs of whitespace (arXiv titles and abstracts are hard-wrapped).
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse one snapshot line into a [`Document`].
pub fn parse_arxiv_line(line: &str) -> std::result::Result<Document, serde_json::Error> {
    let record: ArxivRecord = serde_json::from_str(line)?;
    Ok(Document::new(
        record.id.trim(),
        normalize_whitespace(&record.title),
        normalize_whitespace(&record.abstract_text),
    ))
}

/// Load up to `max_documents` papers from a snapshot file.
///
/// Blank lines are skipped. A repeated `id` keeps the first occurrence, since
/// source ids must be unique within the corpus.
///
/// # Errors
///
/// - [`RagError::Io`] if the file cannot be read.
/// - [`RagError::LoaderError`] with the 1-based line number of a malformed record.
pub fn load_arxiv_snapshot(
    path: impl AsRef<Path>,
    max_documents: Option<usize>,
) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut documents = Vec::new();
    let mut seen = HashSet::new();

    for (i, line) in reader.lines().enumerate() {
        if max_documents.is_some_and(|max| documents.len() >= max) {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let document = parse_arxiv_line(&line).map_err(|e| RagError::LoaderError {
            path: path.display().to_string(),
            line: i + 1,
            message: e.to_string(),
        })?;

        if !seen.insert(document.source_id.clone()) {
            warn!(source_id = %document.source_id, line = i + 1, "duplicate paper id, skipping");
            continue;
        }
        documents.push(document);
    }

    info!(path = %path.display(), documents = documents.len(), "loaded arxiv snapshot");
    Ok(documents)
}
