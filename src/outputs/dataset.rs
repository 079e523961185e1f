//! Append-only CSV dataset, one file per outlet domain.
//!
//! Callers serialize access per file (the store holds the domain lock while
//! appending), so these functions do no locking of their own.

use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::StoreError;
use crate::models::ArticleRecord;

pub const CSV_HEADERS: [&str; 7] = [
    "Author", "Headline", "Keywords", "Topics", "URL", "Outlet", "Timestamp",
];

/// Separator for the list-valued columns.
pub const LIST_SEPARATOR: &str = ", ";

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.to_path_buf(), source }
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> StoreError + '_ {
    move |source| StoreError::Csv { path: path.to_path_buf(), source }
}

/// Append one record, writing the header first when the file is new or empty.
pub fn append_row(path: &Path, record: &ArticleRecord) -> Result<(), StoreError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err(path))?;
    let is_empty = file.metadata().map_err(io_err(path))?.len() == 0;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if is_empty {
        writer.write_record(CSV_HEADERS).map_err(csv_err(path))?;
    }
    let keywords = record.keywords.join(LIST_SEPARATOR);
    let topics = record.topics.join(LIST_SEPARATOR);
    writer
        .write_record([
            record.author.as_str(),
            record.headline.as_str(),
            keywords.as_str(),
            topics.as_str(),
            record.url.as_str(),
            record.outlet.as_str(),
            record.timestamp.as_str(),
        ])
        .map_err(csv_err(path))?;
    writer.flush().map_err(io_err(path))
}

fn reader(path: &Path) -> Result<Option<csv::Reader<File>>, StoreError> {
    match File::open(path) {
        Ok(file) => Ok(Some(
            csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(file),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path)(e)),
    }
}

/// The (author, headline) pairs already on disk, in file order.
///
/// A missing file yields no pairs. Rows without both columns are skipped.
pub fn read_pairs(path: &Path) -> Result<Vec<(String, String)>, StoreError> {
    let Some(mut reader) = reader(path)? else {
        return Ok(Vec::new());
    };
    let mut pairs = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err(path))?;
        if let (Some(author), Some(headline)) = (row.get(0), row.get(1)) {
            pairs.push((author.to_string(), headline.to_string()));
        }
    }
    Ok(pairs)
}

/// Number of data rows, excluding the header.
pub fn row_count(path: &Path) -> Result<usize, StoreError> {
    let Some(mut reader) = reader(path)? else {
        return Ok(0);
    };
    let mut count = 0;
    for row in reader.records() {
        row.map_err(csv_err(path))?;
        count += 1;
    }
    Ok(count)
}

/// Progress check: the dataset exists and holds at least one fact.
pub fn has_results(path: &Path) -> bool {
    row_count(path).is_ok_and(|n| n > 0)
}
