//! States processing the file header.

use alloc::string::String;

use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::little_endian::{I32, U16, U64},
};

use super::{schema::MAX_SECTIONS, section::SectionHeaderState};

/// Size of the file header on disk, in bytes.
pub const FILE_HEADER_SIZE: usize = 540;

/// The only supported file header version.
pub const FILE_HEADER_VERSION: i32 = 2;

/// An error advancing over a file header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileHeaderError {
    /// Incorrect file signature.
    #[error("Incorrect file signature ({0:?}).")]
    InvalidSignature([u8; 4]),
    /// Unsupported header size.
    #[error("Unsupported file header size ({0}, expected 540).")]
    UnsupportedHeaderSize(i32),
    /// Unsupported header version.
    #[error("Unsupported file header version ({0}, expected 2).")]
    UnsupportedHeaderVersion(i32),
    /// The file declares no ions.
    #[error("File declares no ions.")]
    EmptyDataset,
}

/// A validated file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub header_size: i32,
    pub header_version: i32,
    /// Name of the file at the time of export.
    pub filename: String,
    /// Creation time, as written by the exporting software.
    pub creation_time: u64,
    /// Number of ions, and so the number of records in every section.
    pub ion_count: u64,
}

#[repr(C)]
#[derive(FromBytes)]
struct WireFileHeader {
    signature: [u8; 4],
    header_size: I32,
    header_version: I32,
    filename: [U16; 256],
    creation_time: U64,
    ion_count: U64,
}

/// State token to decode the file header.
#[derive(Debug)]
pub struct FileHeaderState;

impl FileHeaderState {
    /// Transition to another state by decoding the file header.
    ///
    /// Returns the validated header, and a successor state token for the first
    /// section header.
    pub fn advance(
        r: [u8; FILE_HEADER_SIZE],
    ) -> Result<(FileHeader, SectionHeaderState), FileHeaderError> {
        let WireFileHeader {
            signature,
            header_size,
            header_version,
            filename,
            creation_time,
            ion_count,
        } = zerocopy::transmute!(r);

        if super::signature(&signature) != b"APT" {
            Err(FileHeaderError::InvalidSignature(signature))?;
        }

        let header_size = header_size.get();
        if header_size != FILE_HEADER_SIZE as i32 {
            Err(FileHeaderError::UnsupportedHeaderSize(header_size))?;
        }

        let header_version = header_version.get();
        if header_version != FILE_HEADER_VERSION {
            Err(FileHeaderError::UnsupportedHeaderVersion(header_version))?;
        }

        let ion_count = ion_count.get();
        if ion_count < 1 {
            Err(FileHeaderError::EmptyDataset)?;
        }

        let header = FileHeader {
            header_size,
            header_version,
            filename: super::utf16_field(filename.iter().map(|u| u.get())),
            creation_time: creation_time.get(),
            ion_count,
        };

        let successor = SectionHeaderState {
            ion_count,
            attempts_remaining: MAX_SECTIONS,
        };

        Ok((header, successor))
    }
}
