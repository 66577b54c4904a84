use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use log::info;
use serde::{Deserialize, Serialize};

use crate::dataset::WindowTensor;
use crate::window::WindowSet;

const SPLIT_MAGIC: &[u8; 8] = b"VSETSPLT";
const SPLIT_VERSION: u16 = 1;
const HEADER_LEN: usize = 8 + 2 + 4 + 4;

/// Errors produced while persisting or restoring preparation outputs.
#[derive(Debug)]
pub enum ArchiveError {
    InvalidHeader,
    UnsupportedVersion(u16),
    ChecksumMismatch { expected: u32, actual: u32 },
    Encode(bincode::Error),
    Decode(bincode::Error),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::InvalidHeader => write!(f, "invalid archive header"),
            ArchiveError::UnsupportedVersion(version) => {
                write!(f, "unsupported archive version {version}")
            }
            ArchiveError::ChecksumMismatch { expected, actual } => write!(
                f,
                "archive checksum mismatch (expected {expected:#010x}, got {actual:#010x})"
            ),
            ArchiveError::Encode(err) => write!(f, "archive encoding failed: {err}"),
            ArchiveError::Decode(err) => write!(f, "archive decoding failed: {err}"),
            ArchiveError::Json(err) => write!(f, "JSON serialization failed: {err}"),
            ArchiveError::Io(err) => write!(f, "archive I/O failed: {err}"),
        }
    }
}

impl std::error::Error for ArchiveError {}

/// One persisted dataset partition with every window fully materialized,
/// zero padding included, so consumers never re-run windowing logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitArchive {
    pub window_len: usize,
    pub histories: Vec<WindowTensor>,
    pub targets: Vec<f64>,
}

impl SplitArchive {
    /// Materializes the windows selected by `indices` from the shared arena.
    pub fn from_partition(windows: &WindowSet, indices: &[usize]) -> Self {
        let mut histories = Vec::with_capacity(indices.len());
        let mut targets = Vec::with_capacity(indices.len());
        for &index in indices {
            let view = windows.window(index);
            histories.push(WindowTensor {
                rows: view.to_rows(),
            });
            targets.push(view.target);
        }
        Self {
            window_len: windows.window_len(),
            histories,
            targets,
        }
    }

    /// Encodes the archive with its framing header.
    ///
    /// Layout: 8-byte magic, u16 version, u32 payload length, u32 CRC32 of
    /// the payload, then the bincode payload. All integers little endian.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        let payload = bincode::serialize(self).map_err(ArchiveError::Encode)?;
        let mut hasher = Hasher::new();
        hasher.update(&payload);
        let checksum = hasher.finalize();

        let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
        buffer.extend_from_slice(SPLIT_MAGIC);
        buffer.extend_from_slice(&SPLIT_VERSION.to_le_bytes());
        buffer.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buffer.extend_from_slice(&checksum.to_le_bytes());
        buffer.extend_from_slice(&payload);
        Ok(buffer)
    }

    /// Decodes an archive, rejecting bad magic, unknown versions, truncated
    /// payloads, and checksum mismatches before touching bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        if bytes.len() < HEADER_LEN || &bytes[0..8] != SPLIT_MAGIC {
            return Err(ArchiveError::InvalidHeader);
        }
        let version = u16::from_le_bytes([bytes[8], bytes[9]]);
        if version != SPLIT_VERSION {
            return Err(ArchiveError::UnsupportedVersion(version));
        }
        let payload_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]) as usize;
        let expected = u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
        let payload = bytes
            .get(HEADER_LEN..HEADER_LEN + payload_len)
            .ok_or(ArchiveError::InvalidHeader)?;

        let mut hasher = Hasher::new();
        hasher.update(payload);
        let actual = hasher.finalize();
        if actual != expected {
            return Err(ArchiveError::ChecksumMismatch { expected, actual });
        }
        bincode::deserialize(payload).map_err(ArchiveError::Decode)
    }

    pub fn write(&self, path: &Path) -> Result<(), ArchiveError> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes).map_err(ArchiveError::Io)?;
        info!(
            target: "veloset_core::persist",
            "Wrote split archive with {} windows to {}",
            self.histories.len(),
            path.display()
        );
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, ArchiveError> {
        let bytes = fs::read(path).map_err(ArchiveError::Io)?;
        Self::from_bytes(&bytes)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Writes `bytes` to a sibling temporary file, syncs it, and renames it over
/// `path`. A crashed run leaves either the old file or the new one, never a
/// partial archive.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}
