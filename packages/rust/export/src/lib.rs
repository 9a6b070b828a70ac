//! CSV export of tabular rows.
//!
//! Serializes an ordered row sequence to a UTF-8, comma-delimited file:
//! header row from the fixed schema, one line per record, no index column.
//! The file is written to a temporary sibling and renamed into place so a
//! partial write is never left as the final artifact.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use healthpull_shared::{HealthPullError, Result, TabularRow};

/// Serialize rows to CSV text: header plus one line per row.
pub fn to_csv<R: TabularRow>(rows: &[R]) -> String {
    let mut out = String::new();
    out.push_str(&R::columns().join(","));
    out.push('\n');

    for row in rows {
        let line: Vec<String> = row.values().iter().map(|v| escape_csv(v)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

/// Simple CSV field escaping.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Write rows as CSV to `<directory>/<file_name>`.
///
/// Creates the directory if missing, writes atomically (temp file + rename),
/// and returns the final path. An empty row sequence still produces a file
/// with the schema header.
#[instrument(skip(rows), fields(file = file_name, rows = rows.len()))]
pub fn write_csv<R: TabularRow>(directory: &Path, file_name: &str, rows: &[R]) -> Result<PathBuf> {
    std::fs::create_dir_all(directory).map_err(|e| HealthPullError::io(directory, e))?;

    let final_path = directory.join(file_name);
    let tmp_path = directory.join(format!("{file_name}.tmp"));

    let content = to_csv(rows);

    let mut file =
        std::fs::File::create(&tmp_path).map_err(|e| HealthPullError::io(&tmp_path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| HealthPullError::io(&tmp_path, e))?;
    file.sync_all().map_err(|e| HealthPullError::io(&tmp_path, e))?;

    std::fs::rename(&tmp_path, &final_path).map_err(|e| HealthPullError::io(&final_path, e))?;

    info!(path = %final_path.display(), rows = rows.len(), "CSV written");
    Ok(final_path)
}
