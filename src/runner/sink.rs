//! Output sinks for reduced records

use super::io::is_gzip;
use crate::core::key::GroupKey;
use crate::error::{ErrorCode, FeatureError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Receives every emitted record, in group key order
pub trait RecordSink {
    fn emit(&mut self, key: &GroupKey, value: &str) -> Result<()>;
}

/// Collects records in memory
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<(GroupKey, String)>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<&str> {
        self.records.iter().map(|(_, value)| value.as_str()).collect()
    }
}

impl RecordSink for VecSink {
    fn emit(&mut self, key: &GroupKey, value: &str) -> Result<()> {
        self.records.push((key.clone(), value.to_string()));
        Ok(())
    }
}

/// Writes values as lines to any writer, e.g. stdout
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for WriterSink<W> {
    fn emit(&mut self, _key: &GroupKey, value: &str) -> Result<()> {
        writeln!(self.writer, "{}", value)?;
        Ok(())
    }
}

enum LineWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl LineWriter {
    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        match self {
            LineWriter::Plain(w) => writeln!(w, "{}", line),
            LineWriter::Gzip(w) => writeln!(w, "{}", line),
        }
    }

    fn finish(self) -> std::io::Result<()> {
        match self {
            LineWriter::Plain(mut w) => w.flush(),
            LineWriter::Gzip(w) => w.finish()?.flush(),
        }
    }
}

/// Line file output that only appears at its path once committed
///
/// Lines go to a temporary file next to the target. Dropping the sink without
/// calling [`LineFileSink::commit`] discards everything written.
pub struct LineFileSink {
    target: PathBuf,
    temp: NamedTempFile,
    writer: LineWriter,
    lines: usize,
}

impl LineFileSink {
    pub fn create(target: &Path) -> Result<Self> {
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| write_error(&parent, e))?;

        let temp = tempfile::Builder::new()
            .prefix(".featurecook-")
            .suffix(".partial")
            .tempfile_in(&parent)
            .map_err(|e| write_error(target, e))?;
        let file = temp.as_file().try_clone().map_err(|e| write_error(target, e))?;
        let writer = if is_gzip(target) {
            LineWriter::Gzip(GzEncoder::new(BufWriter::new(file), Compression::default()))
        } else {
            LineWriter::Plain(BufWriter::new(file))
        };

        Ok(Self {
            target: target.to_path_buf(),
            temp,
            writer,
            lines: 0,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and move the output into place
    pub fn commit(self) -> Result<PathBuf> {
        let Self {
            target,
            temp,
            writer,
            ..
        } = self;
        writer.finish().map_err(|e| write_error(&target, e))?;
        temp.persist(&target)
            .map_err(|e| write_error(&target, e.error))?;
        Ok(target)
    }
}

impl RecordSink for LineFileSink {
    fn emit(&mut self, _key: &GroupKey, value: &str) -> Result<()> {
        self.writer
            .write_line(value)
            .map_err(|e| write_error(&self.target, e))?;
        self.lines += 1;
        Ok(())
    }
}

fn write_error(path: &Path, err: std::io::Error) -> FeatureError {
    FeatureError::io(
        ErrorCode::IO_WRITE_FAILED,
        err.to_string(),
        Some(path.to_path_buf()),
    )
    .with_source(err)
}
