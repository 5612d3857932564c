use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;
use tracing::debug;

use crate::errors::DiigoError;
use crate::models::RaindropRow;

pub type CsvRow = HashMap<String, String>;

/// Column names Raindrop.io's CSV importer recognises, in output order.
pub const FIELDNAMES: [&str; 6] = ["url", "folder", "title", "note", "tags", "created"];

pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, DiigoError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| DiigoError::Config(format!("unsupported encoding: {label}")))
}

/// Serializes the header and every row into an in-memory buffer.
pub fn render_rows(rows: &[RaindropRow], encoding: &str) -> Result<Vec<u8>, DiigoError> {
    let enc = resolve_encoding(encoding)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(FIELDNAMES)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    let buffer = writer
        .into_inner()
        .map_err(|err| DiigoError::Encoding(err.to_string()))?;

    if enc == UTF_8 {
        return Ok(buffer);
    }
    let utf8 = String::from_utf8(buffer).map_err(|err| DiigoError::Encoding(err.to_string()))?;
    let (encoded, _, had_errors) = enc.encode(&utf8);
    if had_errors {
        return Err(DiigoError::Encoding(format!(
            "some characters cannot be represented in {}",
            enc.name()
        )));
    }
    Ok(encoded.into_owned())
}

/// Writes the export in one step. The file is staged next to `path` and
/// renamed over it, so a failure never leaves a truncated export behind.
pub fn write_rows(path: &Path, encoding: &str, rows: &[RaindropRow]) -> Result<usize, DiigoError> {
    let bytes = render_rows(rows, encoding)?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| DiigoError::file(parent, err))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".diigo_export")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|err| DiigoError::file(parent, err))?;
    if let Err(err) = write_and_sync(staged.as_file_mut(), &bytes) {
        return Err(DiigoError::file(staged.path(), err));
    }
    staged
        .persist(path)
        .map_err(|err| DiigoError::file(path, err.error))?;

    debug!(path = %path.display(), rows = rows.len(), bytes = bytes.len(), "export written");
    Ok(rows.len())
}

fn write_and_sync(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

pub fn read_csv_rows(path: &Path, encoding: &str) -> Result<Vec<CsvRow>, DiigoError> {
    let enc = resolve_encoding(encoding)?;
    let file = File::open(path).map_err(|err| DiigoError::file(path, err))?;
    let mut reader = csv::Reader::from_reader(
        DecodeReaderBytesBuilder::new()
            .encoding(Some(enc))
            .build(file),
    );
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = HashMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), value.to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}
