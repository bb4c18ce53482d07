//! Day file persistence.
//!
//! Each calendar day is stored as `log_YYYYMMDD.bin` in a single flat
//! directory: a 12-byte header followed by all 1440 records in minute order,
//! so any record can be read with one seek.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use tlog_types::{
    FILE_SIZE, FORMAT_VERSION, HEADER_SIZE, LogDate, LogHeader, SAMPLE_SIZE, SAMPLES_PER_DAY,
    Sample, record_offset,
};

use crate::buffer::DayBuffer;
use crate::error::{Error, Result};

/// Outcome of loading a day file into a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Header exactly as read from the file.
    pub header: LogHeader,
    /// Whole records copied into the buffer.
    pub records_read: usize,
}

impl LoadReport {
    /// The file held fewer than 1440 whole records.
    pub fn is_truncated(&self) -> bool {
        self.records_read < SAMPLES_PER_DAY
    }

    /// The header carried a format version other than the current one.
    pub fn version_mismatch(&self) -> bool {
        !self.header.is_current_version()
    }
}

/// Flat directory of day files.
#[derive(Debug, Clone)]
pub struct LogDir {
    root: PathBuf,
}

impl LogDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name for `date`, e.g. `log_20251221.bin`.
    pub fn filename_for(date: LogDate) -> String {
        date.filename()
    }

    /// Full path of the day file for `date`.
    pub fn path_for(&self, date: LogDate) -> PathBuf {
        self.root.join(date.filename())
    }

    fn temp_path_for(&self, date: LogDate) -> PathBuf {
        self.root.join(format!("{}.tmp", date.filename()))
    }

    /// Whether a day file exists for `date`.
    pub fn exists(&self, date: LogDate) -> bool {
        self.path_for(date).is_file()
    }

    /// Create the root directory if needed.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| Error::io(&self.root, e))
    }

    /// Write the buffer to the file named after its header date and clear its
    /// dirty flag.
    ///
    /// The image is written to a temporary file, synced, and renamed over the
    /// final name, so an interrupted save leaves the previous file intact.
    /// A failed save removes its temporary file.
    pub fn save(&self, buffer: &mut DayBuffer) -> Result<()> {
        if !buffer.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let date = buffer.date();
        let path = self.path_for(date);
        let tmp = self.temp_path_for(date);
        let image = encode_file(buffer);

        let written = write_synced(&tmp, &image)
            .and_then(|()| fs::rename(&tmp, &path).map_err(|e| Error::io(&path, e)));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp)
                && cleanup.kind() != ErrorKind::NotFound
            {
                warn!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e);
        }

        buffer.dirty = false;
        debug!(
            "Saved {} ({} samples high-water)",
            path.display(),
            buffer.num_samples()
        );
        Ok(())
    }

    /// Read the day file for `date` into an already-initialized buffer.
    ///
    /// The magic is checked before the buffer is touched, so a
    /// [`Error::Format`] failure leaves it unchanged. A version mismatch or a
    /// truncated file is logged and tolerated; slots past the end of a short
    /// file keep their previous contents. The header is adopted exactly as
    /// read and the buffer is marked clean.
    pub fn load_into(&self, date: LogDate, buffer: &mut DayBuffer) -> Result<LoadReport> {
        if !buffer.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let path = self.path_for(date);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No log file for {}", date);
                return Err(Error::FileNotFound { date, path });
            }
            Err(e) => return Err(Error::io(&path, e)),
        };

        let header = LogHeader::decode(&data).map_err(|_| Error::Format {
            path: path.clone(),
            reason: format!("file is {} bytes, shorter than the header", data.len()),
        })?;
        if !header.has_valid_magic() {
            return Err(Error::Format {
                path,
                reason: format!("bad magic {:02X?}", header.magic),
            });
        }
        if !header.is_current_version() {
            warn!(
                "{}: format version {} (expected {}), reading anyway",
                path.display(),
                header.version,
                FORMAT_VERSION
            );
        }
        if header.date() != date {
            warn!(
                "{}: header is dated {}, keeping it as stored",
                path.display(),
                header.date()
            );
        }

        let mut records_read = 0;
        for (slot, chunk) in buffer
            .samples
            .iter_mut()
            .zip(data[HEADER_SIZE..].chunks_exact(SAMPLE_SIZE))
        {
            *slot = Sample::decode(chunk)?;
            records_read += 1;
        }
        if records_read < SAMPLES_PER_DAY {
            warn!(
                "{}: truncated, only {} of {} records present",
                path.display(),
                records_read,
                SAMPLES_PER_DAY
            );
        }

        buffer.header = header;
        buffer.current_minute = buffer
            .samples
            .iter()
            .rposition(Sample::is_valid)
            .map_or(0, |i| i as u16);
        buffer.dirty = false;

        debug!("Loaded {} ({} records)", path.display(), records_read);
        Ok(LoadReport {
            header,
            records_read,
        })
    }

    /// Load the day file for `date` into a fresh buffer.
    pub fn load(&self, date: LogDate) -> Result<DayBuffer> {
        let mut buffer = DayBuffer::for_date(date)?;
        self.load_into(date, &mut buffer)?;
        Ok(buffer)
    }

    /// Read a single minute straight from disk without loading the day.
    ///
    /// Returns [`Error::SampleNotFound`] for an unwritten slot or one past the
    /// end of a truncated file.
    pub fn read_sample(&self, date: LogDate, minute: u16) -> Result<Sample> {
        if usize::from(minute) >= SAMPLES_PER_DAY {
            return Err(Error::InvalidArgument(format!(
                "minute {minute} out of range (0-{})",
                SAMPLES_PER_DAY - 1
            )));
        }

        let path = self.path_for(date);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::FileNotFound { date, path });
            }
            Err(e) => return Err(Error::io(&path, e)),
        };

        let mut header = [0u8; HEADER_SIZE];
        read_exact_or(&mut file, &mut header, &path, || Error::Format {
            path: path.clone(),
            reason: "file shorter than the header".to_string(),
        })?;
        if !LogHeader::from_bytes(&header).has_valid_magic() {
            return Err(Error::Format {
                path,
                reason: "bad magic".to_string(),
            });
        }

        file.seek(SeekFrom::Start(record_offset(minute) as u64))
            .map_err(|e| Error::io(&path, e))?;
        let mut record = [0u8; SAMPLE_SIZE];
        read_exact_or(&mut file, &mut record, &path, || Error::SampleNotFound(minute))?;

        let sample = Sample::from_bytes(&record);
        if sample.is_valid() {
            Ok(sample)
        } else {
            Err(Error::SampleNotFound(minute))
        }
    }

    /// Dates of all day files in the root, oldest first.
    ///
    /// A missing root directory lists as empty. Names that do not match
    /// `log_YYYYMMDD.bin` are ignored.
    pub fn list(&self) -> Result<Vec<LogDate>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.root, e)),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            let Some(date) = entry.file_name().to_str().and_then(LogDate::from_filename) else {
                continue;
            };
            if entry.file_type().is_ok_and(|t| t.is_file()) {
                dates.push(date);
            }
        }
        dates.sort_unstable();
        Ok(dates)
    }

    /// Delete the day file for `date`.
    pub fn remove(&self, date: LogDate) -> Result<()> {
        let path = self.path_for(date);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::FileNotFound { date, path }),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    /// Keep only the newest `keep_days` days ending at `today`; delete older
    /// day files and return their dates. `keep_days == 0` disables cleanup.
    ///
    /// Individual delete failures are logged and skipped.
    pub fn cleanup(&self, today: LogDate, keep_days: u16) -> Result<Vec<LogDate>> {
        if keep_days == 0 {
            return Ok(Vec::new());
        }
        let Some(oldest_kept) = today.checked_sub_days(keep_days - 1) else {
            return Ok(Vec::new());
        };

        let mut removed = Vec::new();
        for date in self.list()?.into_iter().filter(|d| *d < oldest_kept) {
            match self.remove(date) {
                Ok(()) => {
                    info!("Removed expired log {}", date.filename());
                    removed.push(date);
                }
                Err(e) => warn!("Could not remove log for {}: {}", date, e),
            }
        }
        Ok(removed)
    }
}

fn write_synced(path: &Path, image: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| Error::io(path, e))?;
    file.write_all(image).map_err(|e| Error::io(path, e))?;
    file.sync_all().map_err(|e| Error::io(path, e))
}

/// Full on-disk image of a buffer: header then every slot.
pub(crate) fn encode_file(buffer: &DayBuffer) -> Vec<u8> {
    let mut image = Vec::with_capacity(FILE_SIZE);
    image.extend_from_slice(&buffer.header().to_bytes());
    for sample in buffer.samples() {
        image.extend_from_slice(&sample.to_bytes());
    }
    image
}

fn read_exact_or(
    file: &mut File,
    buf: &mut [u8],
    path: &Path,
    on_eof: impl FnOnce() -> Error,
) -> Result<()> {
    match file.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(on_eof()),
        Err(e) => Err(Error::io(path, e)),
    }
}
