use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::EngineError;
use crate::model::{CorpusEntry, StoryEntry};
use crate::semantic::fingerprint_parts;

/// Labeled reference corpus loaded from CSV. Row order is significant: the
/// cache aligns vectors with rows by position.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub source_name: String,
    pub entries: Vec<CorpusEntry>,
}

impl Corpus {
    pub fn new(source_name: impl Into<String>, entries: Vec<CorpusEntry>) -> Self {
        Self {
            source_name: source_name.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contents(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.content.as_str()).collect()
    }

    /// Content fingerprint used to key the embedding cache. Only `content`
    /// feeds the embeddings, so labels are left out.
    pub fn fingerprint(&self) -> String {
        let row_count = self.entries.len().to_string();
        fingerprint_parts(
            std::iter::once(row_count.as_str())
                .chain(self.entries.iter().map(|entry| entry.content.as_str())),
        )
    }
}

pub fn load_corpus(path: &Path) -> Result<Corpus, EngineError> {
    let file = File::open(path).map_err(|err| corpus_error(path, err))?;
    let entries = parse_corpus(file).map_err(|reason| EngineError::Corpus {
        path: path.to_path_buf(),
        reason,
    })?;

    let source_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("corpus.csv")
        .to_string();

    Ok(Corpus::new(source_name, entries))
}

pub fn parse_corpus<R: Read>(reader: R) -> Result<Vec<CorpusEntry>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|err| format!("failed to read header row: {err}"))?
        .clone();
    let content_column = column_index(&headers, "content")?;
    let type_column = column_index(&headers, "type")?;
    let platform_column = find_column(&headers, "platform");

    let mut entries = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|err| format!("row {}: {err}", row_idx + 1))?;
        let cell = |column: usize| record.get(column).unwrap_or("").to_string();

        entries.push(CorpusEntry {
            content: cell(content_column),
            scam_type: cell(type_column),
            platform: platform_column.map(cell),
        });
    }

    Ok(entries)
}

pub fn load_stories(path: &Path) -> Result<Vec<StoryEntry>, EngineError> {
    let file = File::open(path).map_err(|err| corpus_error(path, err))?;
    let rows = parse_corpus(file).map_err(|reason| EngineError::Corpus {
        path: path.to_path_buf(),
        reason,
    })?;

    Ok(rows
        .into_iter()
        .map(|row| StoryEntry {
            content: row.content,
            scam_type: row.scam_type,
        })
        .collect())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, String> {
    find_column(headers, name).ok_or_else(|| format!("missing required column '{name}'"))
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}').trim() == name)
}

fn corpus_error(path: &Path, err: std::io::Error) -> EngineError {
    EngineError::Corpus {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_corpus_reads_columns_by_name() {
        let raw = "type,content,platform\n匯款詐騙,轉帳到此帳戶即可領獎,LINE\n無,今天天氣真好,\n";
        let entries = parse_corpus(raw.as_bytes()).expect("corpus should parse");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "轉帳到此帳戶即可領獎");
        assert_eq!(entries[0].scam_type, "匯款詐騙");
        assert_eq!(entries[0].platform.as_deref(), Some("LINE"));
        assert_eq!(entries[1].platform.as_deref(), Some(""));
    }

    #[test]
    fn parse_corpus_treats_missing_cells_as_empty() {
        let raw = "content,type\n只有內容\n";
        let entries = parse_corpus(raw.as_bytes()).expect("short rows are allowed");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "只有內容");
        assert_eq!(entries[0].scam_type, "");
        assert!(entries[0].platform.is_none());
    }

    #[test]
    fn parse_corpus_requires_content_and_type() {
        let error = parse_corpus("content,platform\nx,y\n".as_bytes())
            .expect_err("type column is required");
        assert!(error.contains("'type'"));
    }

    #[test]
    fn parse_corpus_strips_utf8_bom_from_first_header() {
        let raw = "\u{feff}content,type\n限時優惠,購物詐騙\n";
        let entries = parse_corpus(raw.as_bytes()).expect("bom header should parse");
        assert_eq!(entries[0].scam_type, "購物詐騙");
    }

    #[test]
    fn fingerprint_changes_with_content_but_not_labels() {
        let base = Corpus::new(
            "a.csv",
            vec![CorpusEntry::new("轉帳到此帳戶即可領獎", "匯款詐騙")],
        );
        let relabeled = Corpus::new("a.csv", vec![CorpusEntry::new("轉帳到此帳戶即可領獎", "其他")]);
        let edited = Corpus::new("a.csv", vec![CorpusEntry::new("轉帳到此帳戶", "匯款詐騙")]);

        assert_eq!(base.fingerprint(), relabeled.fingerprint());
        assert_ne!(base.fingerprint(), edited.fingerprint());
        assert_ne!(base.fingerprint(), Corpus::default().fingerprint());
    }
}
