//! Internal finite-state machine for implementing decoders.
//!
//! This module is intended for applications that need fine control over how
//! bytes are fetched. See [`crate::avec`] for implementations covering common
//! decoding patterns.
//!
//! # Architecture
//!
//! All states are represented by a non-copy token. Once enough bytes are
//! ready, transition to another state by calling the token's `advance` method.
//! This will return a successor state token, along with any extracted data.
//!
//! The states follow the layout of the file:
//!
//! 1. [`header::FileHeaderState`] reads the 540 byte file header.
//! 2. [`section::SectionHeaderState`] reads a 148 byte section header and
//!    checks it against the [`schema`] registry.
//! 3. The `Position` section continues through
//!    [`data::BoundingBoxState`]; every section then reads its payload one
//!    scalar at a time through a [`data::AnyScalars`] token.
//! 4. After the last scalar, the successor is either another section header
//!    or [`data::Done`], once the registry's section count is exhausted.
//!
//! Only the initial state, re-exported for convenience as [`Decoder`], can be
//! constructed.
//!
//! Some areas of the decoding process are not represented in the finite-state
//! machine and must be carefully written:
//!
//! - Reading bytes strictly in order. The format has no index or padding, so
//!   every offset depends on every previous section having been fully read.
//!
//! - Recognising the end of the stream. Files carry no end-of-sections marker,
//!   so a stream that ends exactly where a section header would start is a
//!   normal end of decoding.
//!
//! Implementers are recommended to begin by studying and modifying a decoder
//! from the [`crate::avec`] module.

pub mod data;
pub mod header;
pub mod schema;
pub mod section;

/// Entrypoint to the finite-state machine.
pub type Decoder = header::FileHeaderState;

/// Decode a fixed-width UTF-16 field, dropping trailing NUL code units.
pub(crate) fn utf16_field(units: impl IntoIterator<Item = u16>) -> alloc::string::String {
    let decoded: alloc::string::String = char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();

    alloc::string::String::from(decoded.trim_end_matches('\0'))
}

/// Strip trailing NUL bytes from a fixed-width ASCII signature.
pub(crate) fn signature(raw: &[u8; 4]) -> &[u8] {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &raw[..end]
}
