//! Loads search-result records (`ID`, `Url`, `Description`) from JSON or JSONL files.

use crate::document::Document;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read every document under `input`, a single file or a directory searched
/// recursively for `.json` / `.jsonl` files in path order.
pub fn load_documents<P: AsRef<Path>>(input: P) -> Result<Vec<Document>> {
    let input = input.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input {} does not exist", input.display());
    }

    let mut docs = Vec::new();
    for file in files {
        let loaded = if extension(&file) == Some("jsonl") {
            read_jsonl(&file)
        } else {
            read_json(&file)
        };
        docs.extend(loaded.with_context(|| format!("loading {}", file.display()))?);
    }
    tracing::info!(documents = docs.len(), input = %input.display(), "loaded documents");
    Ok(docs)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(file)?);
    let mut docs = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: Document = serde_json::from_str(&line).with_context(|| format!("line {}", n + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// A JSON file holds one record or an array of records.
fn read_json(file: &Path) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Into::into))
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => Ok(Vec::new()),
    }
}
