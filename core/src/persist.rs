//! Engine snapshots on disk.
//!
//! Blob layout: `TLSR` magic, big-endian `u16` format version, bincode
//! payload, big-endian CRC32 of the payload. Document vectors are not stored;
//! they are rebuilt from the index on load.

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::index::InvertedIndex;
use crate::stopwords::StopwordSet;
use crate::tokenizer::Tokenizer;
use crate::{DocId, Document, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"TLSR";
pub const FORMAT_VERSION: u16 = 2;
const HEADER_LEN: usize = MAGIC.len() + 2;
const CRC_LEN: usize = 4;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    config: &'a EngineConfig,
    extra_stopwords: Vec<String>,
    extra_roots: Vec<String>,
    documents: &'a BTreeMap<DocId, Document>,
    index: &'a InvertedIndex,
}

#[derive(Deserialize)]
struct Snapshot {
    config: EngineConfig,
    extra_stopwords: Vec<String>,
    extra_roots: Vec<String>,
    documents: BTreeMap<DocId, Document>,
    index: InvertedIndex,
}

fn corrupt(msg: impl Into<String>) -> Error {
    Error::CorruptPersistedState(msg.into())
}

pub fn serialize(engine: &Engine) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        config: engine.config(),
        extra_stopwords: engine.tokenizer().stopwords().extra_words(),
        extra_roots: engine.tokenizer().extra_roots(),
        documents: engine.stored_documents(),
        index: engine.index(),
    };
    let payload = bincode::serialize(&snapshot).map_err(std::io::Error::other)?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + CRC_LEN);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
    Ok(out)
}

/// Every failure, structural ones included, is reported as
/// [`Error::CorruptPersistedState`]; the caller should rebuild from source.
pub fn deserialize(bytes: &[u8]) -> Result<Engine> {
    if bytes.len() < HEADER_LEN + CRC_LEN {
        return Err(corrupt(format!("blob is {} bytes, too short for a snapshot", bytes.len())));
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(corrupt("bad magic"));
    }
    let version = u16::from_be_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported format version {version}, expected {FORMAT_VERSION}")));
    }

    let (payload, trailer) = bytes[HEADER_LEN..].split_at(bytes.len() - HEADER_LEN - CRC_LEN);
    let stored = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = crc32fast::hash(payload);
    if stored != actual {
        return Err(corrupt(format!("checksum mismatch: stored {stored:08x}, computed {actual:08x}")));
    }

    let snapshot: Snapshot = bincode::deserialize(payload).map_err(|e| corrupt(format!("decode snapshot: {e}")))?;
    snapshot.config.validate().map_err(|e| corrupt(e.to_string()))?;
    if let Some((key, doc)) = snapshot.documents.iter().find(|(k, d)| **k != d.id) {
        return Err(corrupt(format!("document stored under id {key} claims id {}", doc.id)));
    }
    snapshot
        .index
        .check_integrity(|id| snapshot.documents.contains_key(&id))
        .map_err(corrupt)?;

    let stopwords = StopwordSet::new().with_words(&snapshot.extra_stopwords);
    let tokenizer = Tokenizer::new(stopwords, snapshot.config.stemmer, snapshot.config.min_token_len)
        .with_roots(&snapshot.extra_roots);
    Ok(Engine::from_parts(snapshot.config, tokenizer, snapshot.documents, snapshot.index))
}

/// Human-readable summary written next to the blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    pub min_df: u32,
}

impl MetaFile {
    pub fn describe(engine: &Engine) -> Self {
        let stats = engine.index_stats();
        Self {
            num_docs: stats.document_count as u32,
            num_terms: stats.term_count as u32,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: u32::from(FORMAT_VERSION),
            min_df: engine.config().min_df,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self) -> PathBuf { self.root.join("index.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Write `bytes` to a sibling temp file and return its path.
fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let tmp = path.with_extension("tmp");
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(tmp)
}

fn commit(tmp: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        Error::from(e)
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = stage(path, bytes)?;
    commit(&tmp, path)
}

/// Both files are staged before either is moved into place, and `index.bin`
/// is renamed last: if any step fails the previous index stays on disk.
pub fn save_engine(paths: &IndexPaths, engine: &Engine) -> Result<()> {
    create_dir_all(&paths.root)?;
    let blob = engine.serialize()?;
    let meta = serde_json::to_string_pretty(&MetaFile::describe(engine))?;

    let index_tmp = stage(&paths.index(), &blob)?;
    let staged_meta = stage(&paths.meta(), meta.as_bytes()).and_then(|tmp| commit(&tmp, &paths.meta()));
    if let Err(e) = staged_meta {
        let _ = fs::remove_file(&index_tmp);
        return Err(e);
    }
    commit(&index_tmp, &paths.index())?;
    tracing::info!(path = %paths.index().display(), bytes = blob.len(), "saved index");
    Ok(())
}

pub fn load_engine(paths: &IndexPaths) -> Result<Engine> {
    let blob = fs::read(paths.index())?;
    let engine = deserialize(&blob)?;
    tracing::info!(path = %paths.index().display(), docs = engine.index_stats().document_count, "loaded index");
    Ok(engine)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let text = fs::read_to_string(paths.meta())?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::SearchMode;

    fn engine() -> Engine {
        let docs = vec![
            Document::new(1, "Energi surya", "Panel surya mengubah cahaya matahari menjadi listrik."),
            Document::new(2, "Energi angin", "Turbin angin menghasilkan listrik tanpa emisi."),
            Document::new(3, "Hutan", "Hutan tropis menyerap karbon dioksida."),
        ];
        let config = EngineConfig { min_df: 1, ..EngineConfig::default() };
        Engine::build(docs, config).unwrap()
    }

    fn assert_corrupt(result: Result<Engine>) {
        assert!(matches!(result, Err(Error::CorruptPersistedState(_))));
    }

    #[test]
    fn round_trip_keeps_postings() {
        let original = engine();
        let restored = deserialize(&serialize(&original).unwrap()).unwrap();
        assert_eq!(restored.index(), original.index());
        let before = original.search("energi listrik", SearchMode::VectorSpace, 10);
        let after = restored.search("energi listrik", SearchMode::VectorSpace, 10);
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.doc_id, b.doc_id);
            assert!((a.score - b.score).abs() < 1e-9);
        }
        assert_eq!(restored.document(2).unwrap(), original.document(2).unwrap());
    }

    #[test]
    fn extra_roots_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let roots = dir.path().join("roots.txt");
        fs::write(&roots, "simpan\n").unwrap();
        let config = EngineConfig { min_df: 1, roots_file: Some(roots.clone()), ..EngineConfig::default() };
        let docs = vec![Document::new(1, "Gudang", "Beras disimpan di gudang.")];
        let original = Engine::build(docs, config).unwrap();
        fs::remove_file(&roots).unwrap();

        let restored = deserialize(&serialize(&original).unwrap()).unwrap();
        assert_eq!(restored.tokenizer().extra_roots(), vec!["simpan".to_string()]);
        assert_eq!(restored.search("penyimpanan", SearchMode::BooleanOr, 5).len(), 1);
    }

    #[test]
    fn failed_save_keeps_previous_index_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let shared = crate::SharedEngine::new(engine());
        save_engine(&paths, &shared.snapshot()).unwrap();

        // A non-empty directory where meta.json belongs cannot be replaced.
        fs::remove_file(paths.meta()).unwrap();
        fs::create_dir(paths.meta()).unwrap();
        fs::write(paths.meta().join("keep"), b"x").unwrap();

        assert!(shared.rebuild_with(2, |next| save_engine(&paths, next)).is_err());
        let on_disk = load_engine(&paths).unwrap();
        assert_eq!(on_disk.index(), shared.snapshot().index());
        assert_eq!(on_disk.index(), engine().index());
        assert!(!paths.index().with_extension("tmp").exists());
        assert!(!paths.meta().with_extension("tmp").exists());
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let blob = serialize(&engine()).unwrap();
        assert_corrupt(deserialize(&blob[..blob.len() / 2]));
        assert_corrupt(deserialize(&blob[..3]));
        assert_corrupt(deserialize(&[]));
    }

    #[test]
    fn wrong_magic_or_version_is_corrupt() {
        let mut blob = serialize(&engine()).unwrap();
        blob[0] = b'X';
        assert_corrupt(deserialize(&blob));

        let mut blob = serialize(&engine()).unwrap();
        blob[5] = 99;
        assert_corrupt(deserialize(&blob));
    }

    #[test]
    fn checksum_mismatch_is_corrupt() {
        let mut blob = serialize(&engine()).unwrap();
        blob[HEADER_LEN + 2] ^= 0xff;
        assert_corrupt(deserialize(&blob));
    }

    #[test]
    fn dangling_posting_is_corrupt() {
        let mut index = InvertedIndex::new();
        index.add_document(7, &["panas"]);
        let config = EngineConfig::default();
        let documents = BTreeMap::new();
        let snapshot = SnapshotRef { config: &config, extra_stopwords: Vec::new(), extra_roots: Vec::new(), documents: &documents, index: &index };
        let payload = bincode::serialize(&snapshot).unwrap();
        let mut blob = MAGIC.to_vec();
        blob.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        blob.extend_from_slice(&payload);
        blob.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
        assert_corrupt(deserialize(&blob));
    }

    #[test]
    fn save_and_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("idx"));
        let original = engine();
        save_engine(&paths, &original).unwrap();
        let loaded = load_engine(&paths).unwrap();
        assert_eq!(loaded.index(), original.index());

        let meta = load_meta(&paths).unwrap();
        assert_eq!(meta.num_docs, 3);
        assert_eq!(meta.min_df, 1);
        assert_eq!(meta.version, u32::from(FORMAT_VERSION));
        assert!(!paths.index().with_extension("tmp").exists());
    }
}
