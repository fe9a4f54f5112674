#![allow(dead_code)]

//! Builders for synthetic `*.apt` files.

use apt_transcoder::sans::schema;

pub const FILE_HEADER_END: usize = 540;
pub const SECTION_HEADER_LEN: usize = 148;

/// Fields of an encoded section header.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub signature: [u8; 4],
    pub name: String,
    pub header_size: i32,
    pub header_version: i32,
    pub section_version: i32,
    pub relationship_type: u32,
    pub record_type: u32,
    pub record_data_type: u32,
    pub data_type_size: i32,
    pub record_size: i32,
    pub unit: String,
    pub record_count: u64,
    pub byte_count: u64,
}

impl SectionSpec {
    /// A header matching the registered schema for `name`.
    pub fn known(name: &str, ion_count: u64) -> Self {
        let schema = schema::lookup(name).unwrap();

        Self {
            signature: *b"SEC\0",
            name: name.to_string(),
            header_size: schema.header_size,
            header_version: schema.header_version,
            section_version: schema.section_version,
            relationship_type: schema.relationship_type,
            record_type: schema.record_type,
            record_data_type: schema.record_data_type,
            data_type_size: schema.data_type_size,
            record_size: schema.record_size,
            unit: "amu".to_string(),
            record_count: ion_count,
            byte_count: ion_count * schema.record_size as u64,
        }
    }

    /// A well-formed header for a section type the registry does not know.
    pub fn unknown(name: &str, ion_count: u64) -> Self {
        Self {
            name: name.to_string(),
            ..Self::known("Mass", ion_count)
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SECTION_HEADER_LEN);
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.header_size.to_le_bytes());
        out.extend_from_slice(&self.header_version.to_le_bytes());
        out.extend_from_slice(&utf16(&self.name, 32));
        out.extend_from_slice(&self.section_version.to_le_bytes());
        out.extend_from_slice(&self.relationship_type.to_le_bytes());
        out.extend_from_slice(&self.record_type.to_le_bytes());
        out.extend_from_slice(&self.record_data_type.to_le_bytes());
        out.extend_from_slice(&self.data_type_size.to_le_bytes());
        out.extend_from_slice(&self.record_size.to_le_bytes());
        out.extend_from_slice(&utf16(&self.unit, 16));
        out.extend_from_slice(&self.record_count.to_le_bytes());
        out.extend_from_slice(&self.byte_count.to_le_bytes());
        assert_eq!(out.len(), SECTION_HEADER_LEN);
        out
    }
}

/// Incrementally written file.
pub struct AptFile {
    pub ion_count: u64,
    bytes: Vec<u8>,
}

impl AptFile {
    pub fn new(ion_count: u64) -> Self {
        Self::with_header(*b"APT\0", 540, 2, ion_count)
    }

    pub fn with_header(signature: [u8; 4], header_size: i32, version: i32, ion_count: u64) -> Self {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&signature);
        bytes.extend_from_slice(&header_size.to_le_bytes());
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes.extend_from_slice(&utf16("R31_06365-v02.apt", 256));
        bytes.extend_from_slice(&132_000_000_000_000_000u64.to_le_bytes());
        bytes.extend_from_slice(&ion_count.to_le_bytes());
        assert_eq!(bytes.len(), FILE_HEADER_END);

        Self { ion_count, bytes }
    }

    /// Append a section header and its raw payload.
    pub fn section(mut self, spec: &SectionSpec, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(&spec.encode());
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Append a known section with a well-formed header.
    pub fn known(self, name: &str, payload: &[u8]) -> Self {
        let spec = SectionSpec::known(name, self.ion_count);
        self.section(&spec, payload)
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(self) -> Vec<u8> {
        self.bytes
    }
}

pub fn utf16(s: &str, width: usize) -> Vec<u8> {
    let mut units: Vec<u16> = s.encode_utf16().collect();
    assert!(units.len() <= width);
    units.resize(width, 0);
    units.iter().flat_map(|u| u.to_le_bytes()).collect()
}

pub fn f32s(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i16s(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i32s(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i64s(values: &[i64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u16s(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
