//! Append-only exposure log, binary protobuf.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][ProtoExposureDay bytes][4-byte LE length]...
//!
//! A valid log holds days 1, 2, 3, ... in order, all recorded by this
//! kernel version. Anything else in a complete frame is corruption and
//! refuses to load. A frame cut short at the end of the file is what a
//! crash mid-append leaves behind; it never became part of the run, so
//! `open` truncates it away and the day can be applied again.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::warn;

use guts_kernel::GutsError;

use crate::proto_bridge::{day_to_proto, proto_to_day};
use crate::proto_types::ProtoExposureDay;
use crate::schedule::ExposureDay;
use crate::RuntimeError;

const LEN_PREFIX: usize = 4;
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Append-only log of exposure days backed by a binary file.
pub struct ExposureLog {
    path: PathBuf,
    /// Bytes covered by complete, verified frames.
    len: u64,
    last_day: u64,
}

/// Result of scanning a log file front to back.
struct Scan {
    days: Vec<ExposureDay>,
    /// End of the last complete frame.
    valid_len: u64,
    file_len: u64,
}

impl ExposureLog {
    /// Open or create a log. Existing frames are verified once; a torn
    /// trailing frame is cut off.
    pub fn open(path: &Path) -> Result<Self, RuntimeError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                len: 0,
                last_day: 0,
            });
        }

        let scan = scan_file(path)?;
        if scan.valid_len < scan.file_len {
            warn!(
                path = %path.display(),
                valid_len = scan.valid_len,
                dropped = scan.file_len - scan.valid_len,
                "truncating torn frame at end of exposure log"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(scan.valid_len)?;
            file.sync_all()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            len: scan.valid_len,
            last_day: scan.days.last().map(|d| d.day).unwrap_or(0),
        })
    }

    /// Append one day and fsync. The day must follow the last recorded
    /// one.
    ///
    /// The frame is written at the end of the verified frames, so bytes
    /// left by an earlier failed append are overwritten rather than
    /// followed.
    pub fn append(&mut self, day: &ExposureDay) -> Result<(), RuntimeError> {
        let expected = self.last_day + 1;
        if day.day != expected {
            return Err(GutsError::DaySequence {
                expected,
                got: day.day,
            }
            .into());
        }

        let buf = day_to_proto(day).encode_to_vec();
        let mut frame = Vec::with_capacity(LEN_PREFIX + buf.len());
        frame.extend_from_slice(&(buf.len() as u32).to_le_bytes());
        frame.extend_from_slice(&buf);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.path)?;
        file.set_len(self.len)?;
        file.seek(SeekFrom::Start(self.len))?;
        file.write_all(&frame)?;
        file.sync_all()?;

        self.len += frame.len() as u64;
        self.last_day = day.day;
        Ok(())
    }

    /// All recorded days in order.
    pub fn load(&self) -> Result<Vec<ExposureDay>, RuntimeError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(scan_file(&self.path)?.days)
    }

    pub fn last_day(&self) -> u64 {
        self.last_day
    }
}

fn corrupt(offset: usize, reason: String) -> RuntimeError {
    RuntimeError::CorruptLog {
        offset: offset as u64,
        reason,
    }
}

fn scan_file(path: &Path) -> Result<Scan, RuntimeError> {
    let bytes = fs::read(path)?;
    let mut days: Vec<ExposureDay> = Vec::new();
    let mut offset = 0usize;

    while bytes.len() - offset >= LEN_PREFIX {
        let mut len_buf = [0u8; LEN_PREFIX];
        len_buf.copy_from_slice(&bytes[offset..offset + LEN_PREFIX]);
        // An empty day still encodes its day number, so a zero length can
        // only come from corruption.
        let len = u32::from_le_bytes(len_buf) as usize;
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(corrupt(offset, format!("invalid frame length {}", len)));
        }
        let body_start = offset + LEN_PREFIX;
        if bytes.len() - body_start < len {
            break;
        }

        let body = &bytes[body_start..body_start + len];
        let proto = ProtoExposureDay::decode(body)
            .map_err(|e| corrupt(offset, format!("protobuf decode error: {}", e)))?;
        let day = proto_to_day(&proto).map_err(|e| corrupt(offset, e.to_string()))?;
        let expected = days.len() as u64 + 1;
        if day.day != expected {
            return Err(corrupt(
                offset,
                format!("expected day {}, found day {}", expected, day.day),
            ));
        }
        day.validate().map_err(|e| corrupt(offset, e.to_string()))?;

        days.push(day);
        offset = body_start + len;
    }

    Ok(Scan {
        days,
        valid_len: offset as u64,
        file_len: bytes.len() as u64,
    })
}
