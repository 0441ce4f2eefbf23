//! Persistence and file I/O.
//!
//! - [`Store`]: whole-collection `load`/`save` of canonical records
//! - [`ingest`]: normalize raw rows and append them to a store
//! - readers for raw `.csv` / `.json` rows, writers for records, buckets and comparisons

use crate::models::{Bucket, RawRow, RawValue, Record};
use crate::normalize::{Rejection, normalize_rows};
use anyhow::{Context, Result, bail};
use csv::WriterBuilder;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Whole-collection record storage.
///
/// `load` never fails: a missing or unreadable payload is an empty collection.
pub trait Store {
    fn load(&self) -> Vec<Record>;
    fn save(&mut self, records: &[Record]) -> Result<()>;
}

/// Records kept as a pretty JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for JsonFileStore {
    fn load(&self) -> Vec<Record> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) => {
                debug!("no snapshot at {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Record>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "ignoring unreadable snapshot {}: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn save(&mut self, records: &[Record]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        // Write next to the target, then rename, so a crash never leaves half a file.
        let mut tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        let s = serde_json::to_string_pretty(records)?;
        tmp.write_all(s.as_bytes())?;
        tmp.persist(&self.path)
            .with_context(|| format!("write {}", self.path.display()))?;
        info!("saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// In-process store, handy for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<Record>,
}

impl MemoryStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Vec<Record> {
        self.records.clone()
    }

    fn save(&mut self, records: &[Record]) -> Result<()> {
        self.records = records.to_vec();
        Ok(())
    }
}

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: Vec<Rejection>,
    /// Size of the stored collection after the merge.
    pub stored: usize,
}

/// Normalize `rows` and append the accepted records to whatever `store` holds.
///
/// Ingestion is additive: loading the same rows twice stores them twice.
pub fn ingest<S: Store + ?Sized>(store: &mut S, rows: &[RawRow]) -> Result<IngestReport> {
    let normalized = normalize_rows(rows);
    let mut merged = store.load();
    let accepted = normalized.records.len();
    merged.extend(normalized.records);
    store.save(&merged)?;
    info!(
        "ingested {} of {} rows ({} rejected), {} stored",
        accepted,
        rows.len(),
        normalized.rejected.len(),
        merged.len()
    );
    Ok(IngestReport {
        accepted,
        rejected: normalized.rejected,
        stored: merged.len(),
    })
}

/// CSV carries no cell types: keep the text as written (labels like `007` or `NaN`
/// survive) and let the normalizer read serial dates out of digit-only text.
fn csv_cell(s: &str) -> RawValue {
    let t = s.trim();
    if t.is_empty() {
        RawValue::Empty
    } else {
        RawValue::Text(t.to_string())
    }
}

/// Read raw rows from a CSV file with a header line.
pub fn read_csv_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("read {}", path.display()))?;
        let mut row = RawRow::new();
        for (h, cell) in headers.iter().zip(rec.iter()) {
            row.push(h, csv_cell(cell));
        }
        rows.push(row);
    }
    debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read raw rows from a JSON array of objects.
///
/// Elements that are not objects become empty rows, so they are rejected at their
/// own index instead of disappearing from the counts.
pub fn read_json_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let txt = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let v: serde_json::Value =
        serde_json::from_str(&txt).with_context(|| format!("parse {}", path.display()))?;
    let arr = v
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("{}: expected a top-level array", path.display()))?;
    let rows = arr
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let mut row = RawRow::new();
            match item.as_object() {
                Some(obj) => {
                    for (k, v) in obj {
                        row.push(k.as_str(), RawValue::from(v.clone()));
                    }
                }
                None => warn!("{}: element {} is not an object", path.display(), i),
            }
            row
        })
        .collect::<Vec<_>>();
    debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read raw rows, picking the decoder from the file extension.
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => read_csv_rows(path),
        "json" => read_json_rows(path),
        other => bail!("unsupported input format `{}` for {}", other, path.display()),
    }
}

/// Prefix cells that spreadsheets would evaluate as formulas.
pub fn sanitize_cell(s: &str) -> String {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{}", s),
        _ => s.to_string(),
    }
}

/// Save records as CSV with header.
pub fn save_csv<P: AsRef<Path>>(records: &[Record], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["date", "location", "source", "service"])?;
    for r in records {
        wtr.write_record([
            sanitize_cell(&r.date),
            sanitize_cell(&r.location),
            sanitize_cell(&r.source),
            sanitize_cell(r.service.as_deref().unwrap_or("")),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save any serializable value as pretty JSON.
pub fn save_json<T: serde::Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save a bucket sequence as `name,value` CSV.
pub fn save_buckets_csv<P: AsRef<Path>>(buckets: &[Bucket], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["name", "value"])?;
    for b in buckets {
        wtr.write_record([sanitize_cell(&b.key), b.count.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the two compared subsets: rows tagged `A` (current) and `B` (previous).
pub fn export_comparison_csv<P: AsRef<Path>>(
    current: &[Record],
    previous: &[Record],
    path: P,
) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["Range", "Date", "Source", "Location", "Service"])?;
    let tagged = current
        .iter()
        .map(|r| ("A", r))
        .chain(previous.iter().map(|r| ("B", r)));
    for (tag, r) in tagged {
        wtr.write_record([
            tag.to_string(),
            sanitize_cell(&r.date),
            sanitize_cell(&r.source),
            sanitize_cell(&r.location),
            sanitize_cell(r.service.as_deref().unwrap_or("")),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let recs = vec![Record::new("2024-01-05", "A", "Web").with_service("Checkup")];
        save_csv(&recs, &csvp).unwrap();
        save_json(&recs, &jsonp).unwrap();
        assert!(csvp.exists());
        assert!(jsonp.exists());
    }

    #[test]
    fn csv_cells_stay_text() {
        assert_eq!(csv_cell(" 45292 "), RawValue::Text("45292".into()));
        assert_eq!(csv_cell("NaN"), RawValue::Text("NaN".into()));
        assert_eq!(csv_cell("007"), RawValue::Text("007".into()));
        assert_eq!(csv_cell(" "), RawValue::Empty);
        assert_eq!(csv_cell("2024-01-05"), RawValue::Text("2024-01-05".into()));
    }
}
