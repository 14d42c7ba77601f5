//! Line-oriented input handling
//!
//! An input path is either a single file or a directory of part files.
//! Files ending in `.gz` are decompressed transparently.

use crate::error::{ErrorCode, FeatureError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

fn io_error(code: u16, path: &Path, err: std::io::Error) -> FeatureError {
    let code = if err.kind() == std::io::ErrorKind::NotFound {
        ErrorCode::IO_NOT_FOUND
    } else {
        code
    };
    FeatureError::io(code, err.to_string(), Some(path.to_path_buf())).with_source(err)
}

/// Files making up an input path, in name order
///
/// Hidden files and `_`-prefixed markers (e.g. `_SUCCESS`) are skipped.
pub fn input_files(path: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(path).map_err(|e| io_error(ErrorCode::IO_READ_FAILED, path, e))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| io_error(ErrorCode::IO_READ_FAILED, path, e))? {
        let entry = entry.map_err(|e| io_error(ErrorCode::IO_READ_FAILED, path, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Open one file for buffered line reading
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|e| io_error(ErrorCode::IO_READ_FAILED, path, e))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Call `f` with the 1-based line number and content of every non-blank line
///
/// Returns the number of lines passed to `f`.
pub fn for_each_line<F>(path: &Path, mut f: F) -> Result<usize>
where
    F: FnMut(usize, &str) -> Result<()>,
{
    let reader = open_reader(path)?;
    let mut count = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(ErrorCode::IO_READ_FAILED, path, e))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        f(index + 1, line)?;
        count += 1;
    }
    Ok(count)
}
