// Corpus loader: regulation tree + categorized Q&A into flat chunks
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::corpus::chunk::{Chunk, ChunkType, CorpusChunkSet};
use crate::errors::LoadError;

/// Categorized Q&A source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaDataset {
    pub qa_dataset: Vec<QaCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaCategory {
    pub category: String,
    pub qa_pairs: Vec<QaPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaPair {
    /// Usually a string; lists and objects are embedded verbatim
    pub question: Value,
    pub answer: Value,
}

/// Body of a QA chunk; field order is the serialized key order
#[derive(Serialize)]
struct QaContent<'a> {
    question: &'a Value,
    answer: &'a Value,
    category: &'a str,
}

/// Reads the two corpus sources once and flattens them into chunks
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    regulation_path: PathBuf,
    qa_path: Option<PathBuf>,
}

impl CorpusLoader {
    pub fn new(regulation_path: impl Into<PathBuf>, qa_path: Option<PathBuf>) -> Self {
        Self {
            regulation_path: regulation_path.into(),
            qa_path,
        }
    }

    pub fn regulation_path(&self) -> &Path {
        &self.regulation_path
    }

    pub fn qa_path(&self) -> Option<&Path> {
        self.qa_path.as_deref()
    }

    /// Load both sources: regulation chunks first, then QA chunks
    pub fn load(&self) -> Result<CorpusChunkSet, LoadError> {
        let regulation_doc: Value = read_json(&self.regulation_path)?;
        let mut chunks = chunk_regulations(&regulation_doc)?;
        let regulation_count = chunks.len();

        match self.load_qa()? {
            Some(dataset) => chunks.extend(chunk_qa(&dataset)?),
            None => info!("QA dataset not found, continuing with regulations only"),
        }

        ensure_unique_ids(&chunks)?;

        debug!(
            regulation = regulation_count,
            qa = chunks.len() - regulation_count,
            "Corpus loaded"
        );
        Ok(CorpusChunkSet::new(chunks))
    }

    /// `None` when the QA source is absent; a present but broken file is an error
    fn load_qa(&self) -> Result<Option<QaDataset>, LoadError> {
        let Some(path) = &self.qa_path else {
            return Ok(None);
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|source| LoadError::Parse {
                    path: path.display().to_string(),
                    source,
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LoadError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| LoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Flatten a nested regulation document into chunks.
///
/// Objects emit a chunk and are descended into; lists emit one chunk for the
/// whole list; scalars emit nothing.
pub fn chunk_regulations(doc: &Value) -> Result<Vec<Chunk>, LoadError> {
    let Value::Object(root) = doc else {
        return Err(LoadError::InvalidRoot {
            found: json_kind(doc).to_string(),
        });
    };

    let mut chunks = Vec::new();
    walk(root, "", &mut chunks)?;
    Ok(chunks)
}

fn walk(map: &Map<String, Value>, path: &str, out: &mut Vec<Chunk>) -> Result<(), LoadError> {
    for (key, value) in map {
        let current_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}/{}", path, key)
        };

        match value {
            Value::Object(children) => {
                out.push(regulation_chunk(&current_path, key, value)?);
                walk(children, &current_path, out)?;
            }
            Value::Array(_) => {
                out.push(regulation_chunk(&current_path, key, value)?);
            }
            _ => {}
        }
    }
    Ok(())
}

fn regulation_chunk(id: &str, key: &str, value: &Value) -> Result<Chunk, LoadError> {
    let mut single = Map::new();
    single.insert(key.to_string(), value.clone());

    Ok(Chunk {
        id: id.to_string(),
        content: serde_json::to_string_pretty(&Value::Object(single))
            .map_err(LoadError::Serialize)?,
        section: key.to_string(),
        chunk_type: ChunkType::Regulation,
    })
}

/// One chunk per Q&A pair, ids numbered per category from 0.
///
/// The counter is keyed by category name, so a category split across
/// several blocks keeps counting instead of restarting.
pub fn chunk_qa(dataset: &QaDataset) -> Result<Vec<Chunk>, LoadError> {
    let mut chunks = Vec::new();
    let mut next_index: HashMap<&str, usize> = HashMap::new();

    for category in &dataset.qa_dataset {
        for pair in &category.qa_pairs {
            let counter = next_index.entry(category.category.as_str()).or_insert(0);
            let index = *counter;
            *counter += 1;

            let content = QaContent {
                question: &pair.question,
                answer: &pair.answer,
                category: &category.category,
            };

            chunks.push(Chunk {
                id: format!("qa_{}_{}", category.category, index),
                content: serde_json::to_string_pretty(&content).map_err(LoadError::Serialize)?,
                section: category.category.clone(),
                chunk_type: ChunkType::Qa,
            });
        }
    }

    Ok(chunks)
}

fn ensure_unique_ids(chunks: &[Chunk]) -> Result<(), LoadError> {
    let mut seen = HashSet::with_capacity(chunks.len());
    for chunk in chunks {
        if !seen.insert(chunk.id.as_str()) {
            return Err(LoadError::DuplicateId(chunk.id.clone()));
        }
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_nested_object_emits_parent_and_child() {
        let doc = json!({"attendance": {"late_policy": {"limit": "3 lates = absence"}}});
        let chunks = chunk_regulations(&doc).unwrap();

        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["attendance", "attendance/late_policy"]);
        assert_eq!(chunks[0].section, "attendance");
        assert_eq!(chunks[1].section, "late_policy");

        let content: Value = serde_json::from_str(&chunks[1].content).unwrap();
        assert_eq!(content, json!({"late_policy": {"limit": "3 lates = absence"}}));
    }

    #[test]
    fn test_scalar_leaves_emit_nothing() {
        let doc = json!({"attendance": {"late_policy": "3 lates = absence"}});
        let chunks = chunk_regulations(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "attendance");
        let content: Value = serde_json::from_str(&chunks[0].content).unwrap();
        assert_eq!(content, doc);
    }

    #[test]
    fn test_list_emits_single_chunk_without_recursing() {
        let doc = json!({"rules": {"items": [{"a": {"b": 1}}, "two"]}});
        let chunks = chunk_regulations(&doc).unwrap();

        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["rules", "rules/items"]);
        assert!(chunks.iter().all(|c| c.chunk_type == ChunkType::Regulation));
    }

    #[test]
    fn test_content_is_pretty_and_keeps_unicode() {
        let doc = json!({"출석": {"지각": ["3회 = 결석"]}});
        let chunks = chunk_regulations(&doc).unwrap();

        assert!(chunks[1].content.contains("3회 = 결석"));
        assert!(chunks[1].content.contains("\n  \"지각\": ["));
    }

    #[test]
    fn test_key_order_is_source_order() {
        let doc: Value = serde_json::from_str(r#"{"zeta": {"x": []}, "alpha": {"y": []}}"#).unwrap();
        let chunks = chunk_regulations(&doc).unwrap();

        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "zeta/x", "alpha", "alpha/y"]);
    }

    #[test]
    fn test_non_object_root_rejected() {
        let err = chunk_regulations(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, LoadError::InvalidRoot { .. }));
    }

    #[test]
    fn test_qa_ids_numbered_per_category() {
        let dataset: QaDataset = serde_json::from_value(json!({
            "qa_dataset": [
                {"category": "grading", "qa_pairs": [
                    {"question": "q1", "answer": "a1"},
                    {"question": "q2", "answer": "a2"}
                ]},
                {"category": "leave", "qa_pairs": [
                    {"question": "q3", "answer": "a3"}
                ]}
            ]
        }))
        .unwrap();

        let chunks = chunk_qa(&dataset).unwrap();
        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["qa_grading_0", "qa_grading_1", "qa_leave_0"]);
        assert_eq!(chunks[2].section, "leave");

        let content: Value = serde_json::from_str(&chunks[0].content).unwrap();
        assert_eq!(content, json!({"question": "q1", "answer": "a1", "category": "grading"}));
        let keys: Vec<_> = content.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["question", "answer", "category"]);
    }

    #[test]
    fn test_repeated_category_block_keeps_counting() {
        let dataset: QaDataset = serde_json::from_value(json!({
            "qa_dataset": [
                {"category": "grading", "qa_pairs": [{"question": "q1", "answer": "a1"}]},
                {"category": "leave", "qa_pairs": [{"question": "q2", "answer": "a2"}]},
                {"category": "grading", "qa_pairs": [
                    {"question": "q3", "answer": "a3"},
                    {"question": "q4", "answer": "a4"}
                ]}
            ]
        }))
        .unwrap();

        let chunks = chunk_qa(&dataset).unwrap();
        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["qa_grading_0", "qa_leave_0", "qa_grading_1", "qa_grading_2"]);
        assert!(ensure_unique_ids(&chunks).is_ok());
    }

    #[test]
    fn test_repeated_category_file_loads() {
        let dir = TempDir::new().unwrap();
        let rules = write(&dir, "rule.json", r#"{"a": {"b": []}}"#);
        let qa = write(
            &dir,
            "qa.json",
            r#"{"qa_dataset": [
                {"category": "grading", "qa_pairs": [{"question": "q", "answer": "a"}]},
                {"category": "leave", "qa_pairs": [{"question": "q", "answer": "a"}]},
                {"category": "grading", "qa_pairs": [{"question": "q", "answer": "a"}]}
            ]}"#,
        );

        let corpus = CorpusLoader::new(rules, Some(qa)).load().unwrap();
        assert!(corpus.get("qa_grading_1").is_some());
        assert_eq!(corpus.count_by_type(ChunkType::Qa), 3);
    }

    #[test]
    fn test_structured_answer_embedded_verbatim() {
        let dataset: QaDataset = serde_json::from_str(
            r#"{"qa_dataset": [{"category": "leave", "qa_pairs": [
                {"question": "How do I apply?", "answer": ["step 1", "step 2"]},
                {"question": {"ko": "휴가", "en": "vacation"}, "answer": {"days": 15}}
            ]}]}"#,
        )
        .unwrap();

        let chunks = chunk_qa(&dataset).unwrap();
        let first: Value = serde_json::from_str(&chunks[0].content).unwrap();
        assert_eq!(
            first,
            json!({"question": "How do I apply?", "answer": ["step 1", "step 2"], "category": "leave"})
        );
        let second: Value = serde_json::from_str(&chunks[1].content).unwrap();
        assert_eq!(second["question"], json!({"ko": "휴가", "en": "vacation"}));
        assert_eq!(second["answer"], json!({"days": 15}));
    }

    #[test]
    fn test_load_regulations_then_qa() {
        let dir = TempDir::new().unwrap();
        let rules = write(&dir, "rule.json", r#"{"attendance": {"late": ["x"]}}"#);
        let qa = write(
            &dir,
            "qa.json",
            r#"{"qa_dataset": [{"category": "grading", "qa_pairs": [{"question": "q", "answer": "a"}]}]}"#,
        );

        let corpus = CorpusLoader::new(rules, Some(qa)).load().unwrap();
        let ids: Vec<_> = corpus.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["attendance", "attendance/late", "qa_grading_0"]);
    }

    #[test]
    fn test_missing_qa_degrades_gracefully() {
        let dir = TempDir::new().unwrap();
        let rules = write(&dir, "rule.json", r#"{"attendance": {"late": ["x"]}}"#);

        let corpus = CorpusLoader::new(rules, Some(dir.path().join("absent.json")))
            .load()
            .unwrap();
        assert_eq!(corpus.count_by_type(ChunkType::Qa), 0);
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_missing_regulations_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = CorpusLoader::new(dir.path().join("rule.json"), None)
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_malformed_sources_are_fatal() {
        let dir = TempDir::new().unwrap();
        let bad_rules = write(&dir, "bad.json", "{not json");
        let err = CorpusLoader::new(bad_rules, None).load().unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));

        let rules = write(&dir, "rule.json", r#"{"a": {"b": []}}"#);
        let bad_qa = write(&dir, "qa.json", r#"{"wrong": []}"#);
        let err = CorpusLoader::new(rules, Some(bad_qa)).load().unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_colliding_ids_rejected() {
        let dir = TempDir::new().unwrap();
        let rules = write(&dir, "rule.json", r#"{"qa_grading_0": {"x": []}}"#);
        let qa = write(
            &dir,
            "qa.json",
            r#"{"qa_dataset": [{"category": "grading", "qa_pairs": [{"question": "q", "answer": "a"}]}]}"#,
        );

        let err = CorpusLoader::new(rules, Some(qa)).load().unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId(id) if id == "qa_grading_0"));
    }

    #[test]
    fn test_load_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let rules = write(
            &dir,
            "rule.json",
            r#"{"b": {"c": {"d": [1, 2]}, "e": "leaf"}, "a": {"f": []}}"#,
        );
        let loader = CorpusLoader::new(rules, None);

        assert_eq!(loader.load().unwrap(), loader.load().unwrap());
    }
}
