//! Decoder for headerless `*.pos` files.
//!
//! A `*.pos` file is a bare sequence of 16 byte records, each holding four
//! big-endian 32 bit floats: x, y, z and mass-to-charge ratio. The rows have
//! the same shape as [`TranscodeResult::position_mass`], so either format can
//! feed the same analysis.
//!
//! [`TranscodeResult::position_mass`]: crate::avec::TranscodeResult::position_mass

use alloc::vec::Vec;

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, KnownLayout, byteorder::big_endian::F32};

#[cfg(feature = "std")]
extern crate std;

/// Size of one record, in bytes.
pub const RECORD_SIZE: usize = 16;

/// Errors occurring while decoding `*.pos` data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The data does not end on a record boundary.
    #[error("{0} bytes follow the last complete record.")]
    TrailingBytes(usize),
}

/// Errors occurring while decoding a `*.pos` file on disk.
///
/// _Requires Cargo feature `std`._
#[cfg(feature = "std")]
#[derive(Debug, Error)]
pub enum PathError {
    /// An error reading the file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The named input does not exist.
    #[error("Input file {} does not exist.", .0.display())]
    MissingFile(std::path::PathBuf),
    /// The file contents are not valid `*.pos` data.
    #[error(transparent)]
    Pos(#[from] Error),
}

#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable)]
struct Record {
    x: F32,
    y: F32,
    z: F32,
    m: F32,
}

/// Decode `[x, y, z, mass]` rows from a slice of a `*.pos` file.
pub fn decode_slice(r: &[u8]) -> Result<Vec<[f32; 4]>, Error> {
    let trailing = r.len() % RECORD_SIZE;
    if trailing != 0 {
        Err(Error::TrailingBytes(trailing))?;
    }

    let records = <[Record]>::ref_from_bytes(r).map_err(|_| Error::TrailingBytes(trailing))?;

    Ok(records
        .iter()
        .map(|Record { x, y, z, m }| [x.get(), y.get(), z.get(), m.get()])
        .collect())
}

/// Decode `[x, y, z, mass]` rows from a `*.pos` file on disk.
///
/// _Requires Cargo feature `std`._
#[cfg(feature = "std")]
pub fn decode_path(path: impl AsRef<std::path::Path>) -> Result<Vec<[f32; 4]>, PathError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => PathError::MissingFile(path.to_path_buf()),
        _ => PathError::Io(err),
    })?;

    tracing::debug!(bytes = data.len(), path = %path.display(), "read pos file");
    Ok(decode_slice(&data)?)
}
