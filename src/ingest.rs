// Copyright 2026 Glimpse Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loads extraction records (`.json` objects or arrays, `.jsonl` lines)
//! into documents ready for the pipeline.

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;
use tracing::warn;
use walkdir::WalkDir;

use crate::model::IndexedDocument;
use crate::model::QualityEvaluation;

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub glob: Option<String>,
    pub ignore: Vec<String>,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub docs: Vec<IndexedDocument>,
    pub files: usize,
    pub warnings: Vec<String>,
}

impl LoadReport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

#[derive(Debug, Deserialize)]
struct ExtractionRecord {
    name: Option<String>,
    ocr_text: Option<String>,
    visual_description: Option<String>,
    created_at: Option<String>,
    image: Option<PathBuf>,
    hash: Option<String>,
    evaluation: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordFormat {
    Json,
    JsonLines,
}

impl RecordFormat {
    fn of(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "json" => Some(RecordFormat::Json),
            "jsonl" | "ndjson" => Some(RecordFormat::JsonLines),
            _ => None,
        }
    }
}

/// Reads every record under `paths`. Directories are walked and only
/// `.json`/`.jsonl` files inside them are considered; files named
/// explicitly are always read.
pub fn load_records(paths: Vec<PathBuf>, opts: &LoadOptions) -> Result<LoadReport> {
    let include_set = build_globset(opts.glob.as_deref())?;
    let ignore_set = build_ignore_set(&opts.ignore)?;
    let mut report = LoadReport::default();

    for path in paths {
        if path.is_file() {
            let format = RecordFormat::of(&path).unwrap_or(RecordFormat::Json);
            load_file(&path, format, &include_set, &ignore_set, &mut report)?;
        } else if path.is_dir() {
            for entry in WalkDir::new(&path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(format) = RecordFormat::of(entry.path()) {
                    load_file(entry.path(), format, &include_set, &ignore_set, &mut report)?;
                }
            }
        } else {
            anyhow::bail!("input not found: {}", path.display());
        }
    }

    debug!(
        files = report.files,
        docs = report.docs.len(),
        warnings = report.warnings.len(),
        "records loaded"
    );
    Ok(report)
}

fn build_globset(pattern: Option<&str>) -> Result<Option<GlobSet>> {
    if let Some(pat) = pattern {
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new(pat).with_context(|| format!("invalid glob '{pat}'"))?);
        let set = builder.build()?;
        Ok(Some(set))
    } else {
        Ok(None)
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat).with_context(|| format!("invalid ignore glob '{pat}'"))?);
    }
    Ok(builder.build()?)
}

fn load_file(
    path: &Path,
    format: RecordFormat,
    include_set: &Option<GlobSet>,
    ignore_set: &GlobSet,
    report: &mut LoadReport,
) -> Result<()> {
    if !ignore_set.is_empty() && ignore_set.is_match(path) {
        return Ok(());
    }
    if let Some(set) = include_set
        && !set.is_match(path)
    {
        return Ok(());
    }

    let metadata =
        std::fs::metadata(path).with_context(|| format!("metadata {}", path.display()))?;
    let mtime = metadata.modified().ok().map(OffsetDateTime::from);

    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(err) => {
            report.warn(format!("skip unreadable file {}: {err}", path.display()));
            return Ok(());
        }
    };
    report.files += 1;

    let values: Vec<(usize, Value)> = match format {
        RecordFormat::Json => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items.into_iter().enumerate().collect(),
            Ok(value) => vec![(0, value)],
            Err(err) => {
                report.warn(format!("skip {}: {err}", path.display()));
                return Ok(());
            }
        },
        RecordFormat::JsonLines => {
            let mut values = Vec::new();
            for (idx, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(line) {
                    Ok(value) => values.push((idx, value)),
                    Err(err) => {
                        report.warn(format!("skip {} line {}: {err}", path.display(), idx + 1))
                    }
                }
            }
            values
        }
    };

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    for (idx, value) in values {
        let record: ExtractionRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(err) => {
                report.warn(format!("skip {} record {}: {err}", path.display(), idx + 1));
                continue;
            }
        };
        let doc = into_document(record, &stem, base_dir, mtime, report);
        report.docs.push(doc);
    }
    Ok(())
}

fn into_document(
    record: ExtractionRecord,
    stem: &str,
    base_dir: &Path,
    mtime: Option<OffsetDateTime>,
    report: &mut LoadReport,
) -> IndexedDocument {
    let name = record.name.unwrap_or_else(|| stem.to_string());
    let ocr_text = record.ocr_text.unwrap_or_default();
    let visual_description = record.visual_description.unwrap_or_default();

    let created_at = match record.created_at.as_deref() {
        Some(raw) => match OffsetDateTime::parse(raw, &Rfc3339) {
            Ok(ts) => Some(ts),
            Err(err) => {
                report.warn(format!("{name}: invalid created_at '{raw}': {err}"));
                None
            }
        },
        None => None,
    }
    .or(mtime)
    .unwrap_or_else(OffsetDateTime::now_utc);

    let hash = match record.hash.filter(|h| !h.trim().is_empty()) {
        Some(hash) => hash,
        None => {
            let image_hash = record.image.and_then(|image| {
                let image_path = base_dir.join(&image);
                match std::fs::read(&image_path) {
                    Ok(bytes) => Some(sha256_hex(&bytes)),
                    Err(err) => {
                        report.warn(format!(
                            "{name}: cannot read image {}: {err}",
                            image_path.display()
                        ));
                        None
                    }
                }
            });
            image_hash
                .unwrap_or_else(|| content_hash(&name, &ocr_text, &visual_description))
        }
    };

    let doc = IndexedDocument::new(hash, name, ocr_text, visual_description, created_at);
    match record.evaluation {
        Some(payload) => doc.with_evaluation(QualityEvaluation::from_value(payload)),
        None => doc,
    }
}

/// Identity for records without screenshot bytes or an explicit hash.
pub fn content_hash(name: &str, ocr_text: &str, visual_description: &str) -> String {
    sha256_hex(format!("{name}\0{ocr_text}\0{visual_description}").as_bytes())
}

pub(crate) fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let digest = hasher.finalize();
    hex::encode(digest)
}
