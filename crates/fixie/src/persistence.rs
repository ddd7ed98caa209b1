//! Reading and writing fixture files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{FixieError, Result};
use crate::record::Record;

/// Metadata about the file a fixture was loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Number of records read.
    pub record_count: usize,
    /// Number of distinct models.
    pub model_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    fn new(path: PathBuf, contents: &[u8], record_count: usize, model_count: usize) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash: content_hash(contents),
            size_bytes: contents.len() as u64,
            record_count,
            model_count,
            loaded_at: Utc::now(),
        }
    }

    /// Whether the file on disk still has the contents it had when loaded.
    pub fn is_unchanged(&self) -> Result<bool> {
        match fs::read(&self.path) {
            Ok(contents) => Ok(content_hash(&contents) == self.hash),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FixieError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

/// Read a fixture file into records.
pub(crate) fn read_records(path: &Path) -> Result<(Vec<Record>, SourceMetadata)> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FixieError::FixtureNotFound(path.display().to_string()),
        _ => FixieError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let mut contents = Vec::new();
    file.read_to_end(&mut contents).map_err(|e| FixieError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let records = parse_records(&contents, path)?;
    let model_count = count_models(&records);
    let metadata = SourceMetadata::new(path.to_path_buf(), &contents, records.len(), model_count);

    debug!(
        path = %path.display(),
        records = metadata.record_count,
        models = metadata.model_count,
        "read fixture"
    );

    Ok((records, metadata))
}

/// Parse fixture bytes, naming `origin` in errors.
pub(crate) fn parse_records(bytes: &[u8], origin: &Path) -> Result<Vec<Record>> {
    serde_json::from_slice(bytes).map_err(|e| FixieError::MalformedSource {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write records to `path`.
pub(crate) fn write_records(
    path: &Path,
    records: &[&Record],
    pretty: bool,
    create_dirs: bool,
) -> Result<()> {
    replace_atomically(path, create_dirs, |writer| {
        if pretty {
            serde_json::to_writer_pretty(writer, records)?;
        } else {
            serde_json::to_writer(writer, records)?;
        }
        Ok(())
    })
}

/// Replace `path` with whatever `write` produces.
///
/// The output goes to a temporary file in the destination directory which
/// then replaces `path`. If any step fails, `path` keeps its old contents
/// and the temporary file is removed. An existing destination keeps its
/// permissions.
fn replace_atomically<F>(path: &Path, create_dirs: bool, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<NamedTempFile>) -> Result<()>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if create_dirs && !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| {
            FixieError::Persistence(format!(
                "Failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp = NamedTempFile::new_in(parent).map_err(|e| FixieError::Io {
        path: parent.to_path_buf(),
        source: e,
    })?;

    let mut writer = BufWriter::new(temp);
    write(&mut writer)?;
    writer.flush().map_err(|e| FixieError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let temp = writer.into_inner().map_err(|e| FixieError::Io {
        path: path.to_path_buf(),
        source: e.into_error(),
    })?;

    let io_err = |e: io::Error| FixieError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    match fs::metadata(path) {
        Ok(existing) => temp
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(io_err)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }
    temp.as_file().sync_all().map_err(io_err)?;

    temp.persist(path).map_err(|e| {
        FixieError::Persistence(format!(
            "Failed to replace '{}': {}",
            path.display(),
            e.error
        ))
    })?;

    Ok(())
}

/// Copy the current contents of `path` into its history directory.
///
/// Does nothing if `path` does not exist yet.
pub(crate) fn save_to_history(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let history_dir = history_directory(path);
    if !history_dir.exists() {
        fs::create_dir_all(&history_dir).map_err(|e| {
            FixieError::Persistence(format!(
                "Failed to create history directory '{}': {}",
                history_dir.display(),
                e
            ))
        })?;
    }

    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
    let history_file = history_dir.join(format!("{}.json", timestamp));

    fs::copy(path, &history_file).map_err(|e| FixieError::Io {
        path: history_file.clone(),
        source: e,
    })?;

    Ok(Some(history_file))
}

/// List the saved history of a fixture file, newest first.
pub(crate) fn list_history(path: &Path) -> Result<Vec<PathBuf>> {
    let history_dir = history_directory(path);

    if !history_dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(&history_dir)
        .map_err(|e| {
            FixieError::Persistence(format!(
                "Failed to read history directory '{}': {}",
                history_dir.display(),
                e
            ))
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();

    // Timestamped names sort chronologically
    entries.sort_by(|a, b| b.cmp(a));

    Ok(entries)
}

/// Get the history directory for a fixture file.
fn history_directory(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = path.parent().unwrap_or(Path::new("."));

    parent.join(format!("{}.history", stem))
}

fn content_hash(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("sha256:{:x}", hasher.finalize())
}

fn count_models(records: &[Record]) -> usize {
    records
        .iter()
        .map(|record| record.model.as_str())
        .collect::<IndexSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_history_directory() {
        let path = Path::new("fixtures/initial_data.json");
        assert_eq!(
            history_directory(path).to_string_lossy(),
            "fixtures/initial_data.history"
        );
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let err = read_records(Path::new("/nonexistent/fixture.json")).unwrap_err();
        assert!(matches!(err, FixieError::FixtureNotFound(_)));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_records(br#"{"model": "app.A"}"#, Path::new("inline")).unwrap_err();
        assert!(matches!(err, FixieError::MalformedSource { .. }));
    }

    #[test]
    fn test_parse_rejects_record_without_model() {
        let err = parse_records(br#"[{"pk": 1, "fields": {}}]"#, Path::new("inline")).unwrap_err();
        assert!(matches!(err, FixieError::MalformedSource { .. }));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let record = Record::new("app.A", 1).with_field("name", "x");

        write_records(&path, &[&record], false, true).unwrap();
        let (records, metadata) = read_records(&path).unwrap();

        assert_eq!(records, vec![record]);
        assert_eq!(metadata.file, "data.json");
        assert_eq!(metadata.record_count, 1);
        assert_eq!(metadata.model_count, 1);
        assert!(metadata.hash.starts_with("sha256:"));
        assert!(metadata.is_unchanged().unwrap());
    }

    #[test]
    fn test_write_without_create_dirs_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("data.json");

        assert!(write_records(&path, &[], false, false).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_write_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[]").unwrap();

        let result = replace_atomically(&path, false, |writer| {
            writer.write_all(b"[{\"model\": ").unwrap();
            Err(FixieError::Persistence("interrupted".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");

        let entries: Vec<PathBuf> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(entries, vec![path]);
    }

    #[test]
    fn test_failed_persist_keeps_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.json"), "[]").unwrap();

        let record = Record::new("app.A", 1);
        assert!(write_records(&path, &[&record], false, false).is_err());

        assert_eq!(fs::read_to_string(path.join("keep.json")).unwrap(), "[]");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[]").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let record = Record::new("app.A", 1);
        write_records(&path, &[&record], true, false).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_write_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[]").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let result = replace_atomically(&path, false, |_| {
            Err(FixieError::Persistence("interrupted".to_string()))
        });

        assert!(result.is_err());
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_history_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        assert_eq!(save_to_history(&path).unwrap(), None);

        fs::write(&path, "[]").unwrap();
        let saved = save_to_history(&path).unwrap().unwrap();
        assert_eq!(fs::read_to_string(&saved).unwrap(), "[]");
        assert_eq!(list_history(&path).unwrap(), vec![saved]);
    }

    #[test]
    fn test_count_models() {
        let records = vec![
            Record::new("app.A", 1),
            Record::new("app.B", 1),
            Record::new("app.A", 2),
        ];
        assert_eq!(count_models(&records), 2);
    }
}
