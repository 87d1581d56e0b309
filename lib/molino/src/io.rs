use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path.as_ref())
        .with_context(|| format!("create_dir_all {}", path.as_ref().display()))
}

/// Expands a file or directory path into the files underneath it.
pub fn list_files_recursive(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

/// Writes one output pair as JSON-encoded key, tab, JSON-encoded value.
pub fn write_tsv<W, K, V>(writer: &mut W, key: &K, value: &V) -> Result<()>
where
    W: Write,
    K: Serialize,
    V: Serialize,
{
    let key_str = serde_json::to_string(key)?;
    let value_str = serde_json::to_string(value)?;
    writeln!(writer, "{}\t{}", key_str, value_str)?;
    Ok(())
}

pub fn open_writer(path: impl AsRef<Path>) -> Result<BufWriter<File>> {
    if let Some(parent) = path.as_ref().parent() {
        ensure_dir(parent)?;
    }
    let file = File::create(path.as_ref())
        .with_context(|| format!("create {}", path.as_ref().display()))?;
    Ok(BufWriter::new(file))
}

pub fn open_reader(path: impl AsRef<Path>) -> Result<BufReader<File>> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("open {}", path.as_ref().display()))?;
    Ok(BufReader::new(file))
}
