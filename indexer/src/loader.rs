//! Document sources for the indexer. Every source yields plain
//! [`Document`]s; a directory combines JSON metadata with PDF and TXT files.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use crate::metadata;
use telusur_core::{DocId, Document, DocumentSource, Error, Result};
use walkdir::WalkDir;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref ILLEGAL_NAME_CHARS: Regex = Regex::new(r#"[\\/*?:"<>|]"#).expect("valid regex");
}

const UNKNOWN: &str = "Unknown";
const GENERAL: &str = "General";
/// PDF names longer than this may match a title by containment.
const FUZZY_MATCH_MIN_CHARS: usize = 20;

/// A document as found in an export, before ids are settled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct Record {
    #[serde(default)]
    id: Option<DocId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl Record {
    fn standalone(title: String, content: String, file_name: String) -> Self {
        Self {
            id: None,
            title,
            content,
            author: Some(UNKNOWN.into()),
            date: Some(UNKNOWN.into()),
            category: Some(GENERAL.into()),
            source: Some(file_name),
        }
    }

    /// A PDF with no metadata record: title, author and date come from its
    /// opening text where they can be found.
    fn from_pdf(stem: &str, file_name: &str, raw_text: &str) -> Self {
        let meta = metadata::from_opening_text(raw_text);
        let mut record = Self::standalone(
            meta.title.unwrap_or_else(|| title_from_stem(stem)),
            collapse_whitespace(raw_text),
            file_name.to_string(),
        );
        if meta.author.is_some() {
            record.author = meta.author;
        }
        if meta.date.is_some() {
            record.date = meta.date;
        }
        record
    }
}

/// Records without an id are numbered after the largest id present, in order.
fn assign_ids(records: Vec<Record>) -> Vec<Document> {
    let mut next = records.iter().filter_map(|r| r.id).max().unwrap_or(0);
    records
        .into_iter()
        .map(|r| {
            let id = r.id.unwrap_or_else(|| {
                next += 1;
                next
            });
            Document {
                id,
                title: r.title,
                content: r.content,
                author: r.author,
                date: r.date,
                category: r.category,
                source: r.source,
            }
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// `global_warming-report` -> `Global Warming-Report`
fn title_from_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut at_word_start = true;
    for c in stem.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Key used to pair a PDF file with a JSON title.
fn normalize_name(name: &str) -> String {
    let cleaned = ILLEGAL_NAME_CHARS.replace_all(name, "").to_lowercase();
    cleaned.chars().take(100).collect::<String>().trim().to_string()
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase)
}

fn read_records(path: &Path) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path)?;
    match serde_json::from_str::<serde_json::Value>(&text)? {
        serde_json::Value::Array(items) => {
            items.into_iter().map(|v| serde_json::from_value(v).map_err(Error::from)).collect()
        }
        obj @ serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(obj)?]),
        _ => Err(Error::InvalidInput(format!("{}: expected a JSON array or object", path.display()))),
    }
}

/// A JSON export: an array of records or a single record.
pub struct JsonSource {
    pub path: PathBuf,
}

impl DocumentSource for JsonSource {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let records = read_records(&self.path)?;
        tracing::info!(path = %self.path.display(), count = records.len(), "loaded json");
        Ok(assign_ids(records))
    }
}

/// One JSON record per line; blank lines are skipped.
pub struct JsonlSource {
    pub path: PathBuf,
}

impl DocumentSource for JsonlSource {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str::<Record>(&line)?);
        }
        tracing::info!(path = %self.path.display(), count = records.len(), "loaded jsonl");
        Ok(assign_ids(records))
    }
}

pub struct TextSource {
    pub path: PathBuf,
}

impl TextSource {
    fn record(&self) -> Result<Record> {
        let bytes = fs::read(&self.path)?;
        let content = collapse_whitespace(&String::from_utf8_lossy(&bytes));
        Ok(Record::standalone(title_from_stem(&file_stem(&self.path)), content, file_name(&self.path)))
    }
}

impl DocumentSource for TextSource {
    fn load_documents(&self) -> Result<Vec<Document>> {
        Ok(assign_ids(vec![self.record()?]))
    }
}

pub struct PdfSource {
    pub path: PathBuf,
}

impl PdfSource {
    /// Extracted text with its line breaks, for metadata detection.
    fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text(&self.path).map_err(|e| {
            Error::InvalidInput(format!("failed to extract text from {}: {e}", self.path.display()))
        })
    }

    fn record(&self) -> Result<Record> {
        let text = self.extract_text()?;
        Ok(Record::from_pdf(&file_stem(&self.path), &file_name(&self.path), &text))
    }
}

impl DocumentSource for PdfSource {
    fn load_documents(&self) -> Result<Vec<Document>> {
        Ok(assign_ids(vec![self.record()?]))
    }
}

/// A folder of exports. JSON metadata comes from `documents.json` when it
/// exists, otherwise from every `*.json` not named like a backup. PDFs whose
/// name matches a JSON title lend it their text; other PDFs and TXT files
/// become documents of their own.
pub struct DirectorySource {
    pub dir: PathBuf,
}

impl DirectorySource {
    fn files_with_extension(&self, ext: &str) -> Vec<PathBuf> {
        WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && lowercase_extension(p).as_deref() == Some(ext))
            .collect()
    }

    fn metadata_records(&self) -> Result<Vec<Record>> {
        let main = self.dir.join("documents.json");
        if main.is_file() {
            return read_records(&main);
        }
        let mut records = Vec::new();
        for path in self.files_with_extension("json") {
            if file_name(&path).to_lowercase().contains("backup") {
                tracing::debug!(path = %path.display(), "skipping backup metadata");
                continue;
            }
            records.extend(read_records(&path)?);
        }
        Ok(records)
    }
}

impl DocumentSource for DirectorySource {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let mut records = self.metadata_records()?;
        let json_count = records.len();

        let mut standalone = Vec::new();
        for path in self.files_with_extension("pdf") {
            let pdf = PdfSource { path };
            let text = match pdf.extract_text() {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable pdf");
                    continue;
                }
            };
            if let Some(record) = merge_pdf(&mut records, &file_stem(&pdf.path), &file_name(&pdf.path), &text) {
                standalone.push(record);
            }
        }

        for path in self.files_with_extension("txt") {
            let name = file_name(&path).to_lowercase();
            if name.contains("stopword") || name.contains("requirement") {
                continue;
            }
            match (TextSource { path }).record() {
                Ok(record) => standalone.push(record),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable text file"),
            }
        }

        tracing::info!(
            dir = %self.dir.display(),
            json = json_count,
            standalone = standalone.len(),
            "loaded directory"
        );
        records.extend(standalone);
        Ok(assign_ids(records))
    }
}

/// Pair a PDF with a metadata record: exact normalized-name match first,
/// then containment for long names, first match in record order. A matched
/// record keeps its metadata and takes the PDF text unless that text is
/// empty. Returns the PDF as a standalone record when nothing matches.
fn merge_pdf(records: &mut [Record], stem: &str, file_name: &str, text: &str) -> Option<Record> {
    let name = normalize_name(stem);
    let titles: Vec<String> = records.iter().map(|r| normalize_name(&r.title)).collect();
    let matched = titles.iter().position(|t| !t.is_empty() && *t == name).or_else(|| {
        if name.chars().count() <= FUZZY_MATCH_MIN_CHARS {
            return None;
        }
        titles.iter().position(|t| !t.is_empty() && (t.contains(&name) || name.contains(t.as_str())))
    });

    match matched {
        Some(i) => {
            let record = &mut records[i];
            tracing::debug!(pdf = file_name, title = %record.title, "merging pdf text into metadata");
            if !text.trim().is_empty() {
                record.content = collapse_whitespace(text);
            }
            record.source = Some(file_name.to_string());
            None
        }
        None => Some(Record::from_pdf(stem, file_name, text)),
    }
}

/// Source for a path given on the command line.
pub fn source_for(path: &Path) -> Result<Box<dyn DocumentSource>> {
    let path = path.to_path_buf();
    if path.is_dir() {
        return Ok(Box::new(DirectorySource { dir: path }));
    }
    match lowercase_extension(&path).as_deref() {
        Some("json") => Ok(Box::new(JsonSource { path })),
        Some("jsonl") => Ok(Box::new(JsonlSource { path })),
        Some("txt") => Ok(Box::new(TextSource { path })),
        Some("pdf") => Ok(Box::new(PdfSource { path })),
        _ => Err(Error::InvalidInput(format!("unsupported input {}", path.display()))),
    }
}
