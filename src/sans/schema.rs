//! Registry of known section types.
//!
//! Every section header found in a file is compared field by field with the
//! schema registered under its section type name. The table is fixed; adding
//! a channel means adding an entry here, nothing else.

use core::fmt;

use super::data::{Layout, LayoutError};

/// Size of a section header on disk, in bytes.
pub const SECTION_HEADER_SIZE: usize = 148;

/// Size of the bounding box preceding the `Position` payload, in bytes.
pub const BOUNDING_BOX_SIZE: usize = 6 * 4;

/// Name of the section carrying ion positions and a bounding box.
pub const POSITION: &str = "Position";

/// Name of the section carrying mass-to-charge ratios.
pub const MASS: &str = "Mass";

/// Expected header values for a known section type.
#[derive(Debug, PartialEq, Eq)]
pub struct SectionSchema {
    /// Registry identifier, starting at 1. Identifier 0 is reserved for
    /// failure and never registered.
    pub id: u8,
    /// Section type name as stored in the section header.
    pub name: &'static str,
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
}

impl SectionSchema {
    const fn new(
        id: u8,
        name: &'static str,
        record_data_type: u32,
        data_type_size: i32,
        record_size: i32,
    ) -> Self {
        Self {
            id,
            name,
            header_size: SECTION_HEADER_SIZE as i32,
            header_version: 2,
            section_version: 1,
            relationship_type: 1,
            record_type: 1,
            record_data_type,
            data_type_size,
            record_size,
        }
    }

    /// Whether a bounding box precedes this section's records.
    pub fn has_bounding_box(&self) -> bool {
        self.name == POSITION
    }

    /// Scalar kind and elements per record described by this schema.
    pub fn layout(&self) -> Result<Layout, LayoutError> {
        Layout::new(self.record_data_type, self.data_type_size, self.record_size)
    }
}

/// Header fields checked against a [`SectionSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaField {
    HeaderSize,
    HeaderVersion,
    SectionVersion,
    RelationshipType,
    RecordType,
    RecordDataType,
    DataTypeSize,
    RecordSize,
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HeaderSize => "header size",
            Self::HeaderVersion => "header version",
            Self::SectionVersion => "section version",
            Self::RelationshipType => "relationship type",
            Self::RecordType => "record type",
            Self::RecordDataType => "record data type",
            Self::DataTypeSize => "data type size",
            Self::RecordSize => "record size",
        })
    }
}

/// All known section types, ordered by identifier.
pub static SCHEMAS: [SectionSchema; 36] = [
    SectionSchema::new(1, "tof", 3, 32, 4),
    SectionSchema::new(2, "pulse", 3, 32, 4),
    SectionSchema::new(3, "freq", 3, 32, 4),
    SectionSchema::new(4, "tElapsed", 3, 32, 4),
    SectionSchema::new(5, "erate", 3, 32, 4),
    SectionSchema::new(6, "tstage", 2, 16, 2),
    SectionSchema::new(7, "TargetErate", 3, 32, 4),
    SectionSchema::new(8, "TargetFlux", 3, 32, 4),
    SectionSchema::new(9, "pulseDelta", 1, 16, 2),
    SectionSchema::new(10, "Pres", 3, 32, 4),
    SectionSchema::new(11, "VAnodeMon", 3, 32, 4),
    SectionSchema::new(12, "Temp", 3, 32, 4),
    SectionSchema::new(13, "AmbTemp", 3, 32, 4),
    SectionSchema::new(14, "FractureGuard", 2, 16, 2),
    SectionSchema::new(15, "Vref", 3, 32, 4),
    SectionSchema::new(16, "Noise", 3, 32, 4),
    SectionSchema::new(17, "Uniformity", 3, 32, 4),
    SectionSchema::new(18, "xstage", 1, 32, 4),
    SectionSchema::new(19, "ystage", 1, 32, 4),
    SectionSchema::new(20, "zstage", 1, 32, 4),
    SectionSchema::new(21, "z", 1, 64, 8),
    SectionSchema::new(22, "tofc", 3, 32, 4),
    SectionSchema::new(23, MASS, 3, 32, 4),
    SectionSchema::new(24, "tofb", 3, 32, 4),
    SectionSchema::new(25, "xs", 3, 32, 4),
    SectionSchema::new(26, "ys", 3, 32, 4),
    SectionSchema::new(27, "zs", 3, 32, 4),
    SectionSchema::new(28, "rTip", 3, 32, 4),
    SectionSchema::new(29, "zApex", 3, 32, 4),
    SectionSchema::new(30, "zSphereCorr", 3, 32, 4),
    SectionSchema::new(31, "XDet_mm", 3, 32, 4),
    SectionSchema::new(32, "YDet_mm", 3, 32, 4),
    SectionSchema::new(33, "Multiplicity", 1, 32, 4),
    SectionSchema::new(34, "Vap", 3, 32, 4),
    SectionSchema::new(35, "Detector Coordinates", 3, 32, 8),
    // The bounding box is counted in the declared header size.
    SectionSchema {
        header_size: (SECTION_HEADER_SIZE + BOUNDING_BOX_SIZE) as i32,
        ..SectionSchema::new(36, POSITION, 3, 32, 12)
    },
];

/// Maximum number of section headers read from one file.
///
/// The format has no end-of-sections marker, so decoding never attempts more
/// sections than there are known section types.
pub const MAX_SECTIONS: usize = SCHEMAS.len();

/// Find the schema registered for a section type name.
pub fn lookup(name: &str) -> Option<&'static SectionSchema> {
    SCHEMAS.iter().find(|s| s.name == name)
}
