//! States processing section headers.

use alloc::string::String;

use either::Either::{self, Left, Right};
use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::little_endian::{I32, U16, U32, U64},
};

use super::{
    data::{AnyScalars, BoundingBoxState, Layout, LayoutError},
    schema::{self, SECTION_HEADER_SIZE, SchemaField, SectionSchema},
};

/// An error advancing over a section header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionHeaderError {
    /// Incorrect section signature.
    #[error("Incorrect section signature ({0:?}).")]
    InvalidSectionSignature([u8; 4]),
    /// The section type is not in the registry.
    #[error("Unknown section type \"{0}\".")]
    UnknownSection(String),
    /// A header field differs from the registered schema.
    #[error("Section \"{section}\" has {field} {found}, expected {expected}.")]
    SchemaMismatch {
        section: &'static str,
        field: SchemaField,
        expected: i64,
        found: i64,
    },
    /// The record layout cannot be decoded.
    #[error("Section \"{section}\" has an unusable record layout: {source}")]
    Layout {
        section: &'static str,
        source: LayoutError,
    },
}

/// A validated section header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// The registered schema this header was validated against.
    pub schema: &'static SectionSchema,
    /// Section type name, as stored.
    pub section_type: String,
    pub header_size: i32,
    pub header_version: i32,
    pub section_version: i32,
    pub relationship_type: u32,
    pub record_type: u32,
    pub record_data_type: u32,
    /// Width of one scalar, in bits.
    pub data_type_size: i32,
    /// Width of one record, in bytes.
    pub record_size: i32,
    /// Physical unit of the stored values.
    pub data_unit: String,
    /// Declared record count. Not checked against the file header.
    pub record_count: u64,
    /// Declared payload size. Not checked against the stream.
    pub byte_count: u64,
    /// Scalar kind and elements per record.
    pub layout: Layout,
}

#[repr(C)]
#[derive(FromBytes)]
struct WireSectionHeader {
    signature: [u8; 4],
    header_size: I32,
    header_version: I32,
    section_type: [U16; 32],
    section_version: I32,
    relationship_type: U32,
    record_type: U32,
    record_data_type: U32,
    data_type_size: I32,
    record_size: I32,
    data_unit: [U16; 16],
    record_count: U64,
    byte_count: U64,
}

/// State token to decode a section header.
#[derive(Debug)]
pub struct SectionHeaderState {
    pub(super) ion_count: u64,
    pub(super) attempts_remaining: usize,
}

impl SectionHeaderState {
    /// Number of ions declared by the file header.
    pub fn ion_count(&self) -> u64 {
        self.ion_count
    }

    /// Transition to another state by decoding a section header.
    ///
    /// Returns the validated header, and a successor state token: a bounding
    /// box for the `Position` section, or the first scalar of the payload
    /// otherwise.
    pub fn advance(
        self,
        r: [u8; SECTION_HEADER_SIZE],
    ) -> Result<(SectionHeader, Either<BoundingBoxState, AnyScalars>), SectionHeaderError> {
        let WireSectionHeader {
            signature,
            header_size,
            header_version,
            section_type,
            section_version,
            relationship_type,
            record_type,
            record_data_type,
            data_type_size,
            record_size,
            data_unit,
            record_count,
            byte_count,
        } = zerocopy::transmute!(r);

        if super::signature(&signature) != b"SEC" {
            Err(SectionHeaderError::InvalidSectionSignature(signature))?;
        }

        let section_type = super::utf16_field(section_type.iter().map(|u| u.get()));
        let Some(schema) = schema::lookup(&section_type) else {
            return Err(SectionHeaderError::UnknownSection(section_type));
        };

        let header_size = header_size.get();
        let header_version = header_version.get();
        let section_version = section_version.get();
        let relationship_type = relationship_type.get();
        let record_type = record_type.get();
        let record_data_type = record_data_type.get();
        let data_type_size = data_type_size.get();
        let record_size = record_size.get();

        let checks: [(SchemaField, i64, i64); 8] = [
            (SchemaField::HeaderSize, schema.header_size.into(), header_size.into()),
            (SchemaField::HeaderVersion, schema.header_version.into(), header_version.into()),
            (SchemaField::SectionVersion, schema.section_version.into(), section_version.into()),
            (
                SchemaField::RelationshipType,
                schema.relationship_type.into(),
                relationship_type.into(),
            ),
            (SchemaField::RecordType, schema.record_type.into(), record_type.into()),
            (SchemaField::RecordDataType, schema.record_data_type.into(), record_data_type.into()),
            (SchemaField::DataTypeSize, schema.data_type_size.into(), data_type_size.into()),
            (SchemaField::RecordSize, schema.record_size.into(), record_size.into()),
        ];

        if let Some(&(field, expected, found)) = checks.iter().find(|(_, e, f)| e != f) {
            Err(SectionHeaderError::SchemaMismatch {
                section: schema.name,
                field,
                expected,
                found,
            })?;
        }

        let layout = Layout::new(record_data_type, data_type_size, record_size).map_err(|source| {
            SectionHeaderError::Layout {
                section: schema.name,
                source,
            }
        })?;

        let header = SectionHeader {
            schema,
            section_type,
            header_size,
            header_version,
            section_version,
            relationship_type,
            record_type,
            record_data_type,
            data_type_size,
            record_size,
            data_unit: super::utf16_field(data_unit.iter().map(|u| u.get())),
            record_count: record_count.get(),
            byte_count: byte_count.get(),
            layout,
        };

        let attempts_remaining = self.attempts_remaining.saturating_sub(1);
        let scalars = AnyScalars::new(layout, self.ion_count, attempts_remaining);

        let successor = if schema.has_bounding_box() {
            Left(BoundingBoxState { scalars })
        } else {
            Right(scalars)
        };

        Ok((header, successor))
    }
}
