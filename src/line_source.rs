//! Position-tracked line reader over a JSON Lines file
//!
//! [`LineSource`] yields one `String` per line without the trailing `\n` or
//! `\r\n`. Empty lines are yielded as empty strings. Progress is measured in
//! bytes consumed against the file length captured at open time.
//!
//! The sequence does not rewind by itself when exhausted; call
//! [`LineSource::restart`] to replay it from the first byte.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{IngestError, IngestResult};

pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

pub struct LineSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    total_length: u64,
    consumed: u64,
    line_number: usize,
    started: bool,
    exhausted: bool,
    buf: Vec<u8>,
}

impl LineSource {
    pub fn open(path: impl AsRef<Path>) -> IngestResult<Self> {
        Self::with_capacity(path, DEFAULT_BUFFER_SIZE)
    }

    /// Open `path` with a read buffer of `capacity` bytes
    pub fn with_capacity(path: impl AsRef<Path>, capacity: usize) -> IngestResult<Self> {
        let path = path.as_ref();
        if capacity == 0 {
            return Err(IngestError::InvalidArgument(
                "read buffer capacity must be greater than 0".to_string(),
            ));
        }

        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => IngestError::NotFound {
                path: path.to_path_buf(),
            },
            _ => IngestError::io(path, e),
        })?;

        let metadata = file.metadata().map_err(|e| IngestError::io(path, e))?;
        if metadata.is_dir() {
            return Err(IngestError::io(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "path is a directory"),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(BufReader::with_capacity(capacity, file)),
            total_length: metadata.len(),
            consumed: 0,
            line_number: 0,
            started: false,
            exhausted: false,
            buf: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Byte length of the file, or -1 once closed
    pub fn total_length(&self) -> i64 {
        if self.reader.is_none() {
            return -1;
        }
        i64::try_from(self.total_length).unwrap_or(i64::MAX)
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Number of lines yielded since open or the last restart
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fraction of the file consumed in [0, 1]; -1 before the first read or
    /// once closed. Exactly 1.0 after the end of the file has been reached.
    pub fn progress(&self) -> f64 {
        if self.reader.is_none() || !self.started {
            return -1.0;
        }
        if self.exhausted {
            return 1.0;
        }
        if self.total_length == 0 {
            return 0.0;
        }
        (self.consumed as f64 / self.total_length as f64).min(1.0)
    }

    /// Read the next line. `None` once the end of the file is reached or the
    /// source has been closed.
    pub fn next_line(&mut self) -> Option<io::Result<String>> {
        let reader = self.reader.as_mut()?;
        self.started = true;
        if self.exhausted {
            return None;
        }

        self.buf.clear();
        match reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.exhausted = true;
                None
            }
            Ok(read) => {
                self.consumed += read as u64;
                self.line_number += 1;

                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Seek back to the first byte and reset progress to zero
    pub fn restart(&mut self) -> IngestResult<()> {
        let reader = self.reader.as_mut().ok_or_else(|| {
            IngestError::InvalidArgument(format!("{} is closed", self.path.display()))
        })?;

        // BufReader::seek drops whatever is buffered
        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| IngestError::io(&self.path, e))?;
        if let Ok(metadata) = reader.get_ref().metadata() {
            self.total_length = metadata.len();
        }

        self.consumed = 0;
        self.line_number = 0;
        self.started = true;
        self.exhausted = false;
        self.buf.clear();
        Ok(())
    }

    /// Release the file handle
    pub fn close(&mut self) {
        self.reader = None;
        self.buf = Vec::new();
    }
}

impl Iterator for LineSource {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
    }
}

impl std::fmt::Debug for LineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource")
            .field("path", &self.path)
            .field("open", &self.reader.is_some())
            .field("total_length", &self.total_length)
            .field("consumed", &self.consumed)
            .field("line_number", &self.line_number)
            .finish()
    }
}
