//! Convenience interfaces for common decoding patterns.
//!
//! The functions in this module decode whole files from readers and data
//! slices, publishing to the [`FromSections`] trait. [`TranscodeResult`] is the
//! receiver used by the `transcode` functions and keeps every section.
//!
//! When only a few channels are needed, [`FromSections`] can be derived. See
//! the [`FromSections`](macro@FromSections) macro for details.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use crate::sans::{
    data::{BoundingBox, ScalarKind},
    header::FileHeader,
    schema::{MASS, POSITION},
    section::SectionHeader,
};

#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::{Transcoder, decode as decode_reader, transcode as transcode_reader};
pub use slice::{decode as decode_slice, transcode as transcode_slice};

/// Derive [`FromSections`] for a struct holding selected channels.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// To collect a channel, add the `section("Name")` attribute to an
/// `Option<SectionData>` struct field, where `Name` is the section type name.
/// Sections without a matching field are read past but never stored. The
/// `bounding_box` and `header` identifiers collect the `Position` bounding
/// box and the file header into `Option<BoundingBox>` and `Option<FileHeader>`
/// fields. A `bounding_box` field makes the receiver accept the `Position`
/// section even without a field for its payload.
///
/// ```
/// #[derive(Debug, Default, FromSections)]
/// struct Reconstruction {
///     #[section(header)]
///     header: Option<FileHeader>,
///     #[section(bounding_box)]
///     bounds: Option<BoundingBox>,
///     #[section("Position")]
///     position: Option<SectionData>,
///     #[section("Mass")]
///     mass: Option<SectionData>,
/// }
/// ```
///
/// To store something other than the value itself, supply an accumulator
/// closure. Since the value type cannot be inferred, the second argument must
/// be typed.
///
/// ```
/// #[derive(Debug, Default, FromSections)]
/// struct Spectrum {
///     #[section("Mass", |v, d: SectionData| *v = d.to_f32())]
///     mass: Vec<f32>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use apt_transcoder_derive::FromSections;

/// Receive the contents of a file.
///
/// Methods are called in file order: the header once, then for each section
/// whose payload is accepted, the bounding box if it has one, then the
/// section itself. Sections decoded before an error remain with the
/// receiver.
///
/// The default implementation of each method ignores received values and
/// accepts every section.
///
/// See the [`FromSections`](macro@FromSections) derive macro for an automatic
/// implementation of this trait.
#[allow(unused_variables)]
pub trait FromSections {
    /// Add the validated file header.
    fn add_file_header(&mut self, header: &FileHeader) {}
    /// Whether the payload of a section should be kept.
    ///
    /// A rejected payload is still read past, without being stored.
    fn accepts(&self, header: &SectionHeader) -> bool {
        true
    }
    /// Add the bounding box preceding a `Position` payload.
    fn add_bounding_box(&mut self, bounding_box: BoundingBox) {}
    /// Add a decoded section.
    fn add_section(&mut self, header: SectionHeader, data: SectionData) {}
}

/// Row-major scalars of a single kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl Values {
    fn len(&self) -> usize {
        match self {
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    /// Scalar kind of the stored values.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::U16(_) => ScalarKind::U16,
            Self::F32(_) => ScalarKind::F32,
        }
    }
}

/// A decoded section payload: one row per ion, one column per element.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionData {
    columns: usize,
    values: Values,
}

impl SectionData {
    /// Wrap row-major values with a given number of columns.
    ///
    /// Returns `None` if `columns` is zero or does not divide the number of
    /// values.
    pub fn new(columns: usize, values: Values) -> Option<Self> {
        (columns != 0 && values.len() % columns == 0).then_some(Self { columns, values })
    }

    pub fn rows(&self) -> usize {
        self.values.len() / self.columns
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.columns)
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn into_values(self) -> Values {
        self.values
    }

    /// Borrow the values if they are 32 bit floats.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.values {
            Values::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Copy the values into row-major 32 bit floats.
    ///
    /// Integers wider than 24 bits may lose precision.
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.values {
            Values::I16(v) => v.iter().map(|&x| f32::from(x)).collect(),
            Values::I32(v) => v.iter().map(|&x| x as f32).collect(),
            Values::I64(v) => v.iter().map(|&x| x as f32).collect(),
            Values::U16(v) => v.iter().map(|&x| f32::from(x)).collect(),
            Values::F32(v) => v.clone(),
        }
    }
}

/// Every section decoded from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeResult {
    pub header: FileHeader,
    /// Decoded payloads, keyed by section type name.
    pub sections: BTreeMap<String, SectionData>,
    /// Bounding box of the `Position` section, if present.
    pub bounding_box: Option<BoundingBox>,
    /// Headers of decoded sections, in file order.
    pub seen: Vec<SectionHeader>,
}

impl TranscodeResult {
    pub fn ion_count(&self) -> u64 {
        self.header.ion_count
    }

    pub fn get(&self, name: &str) -> Option<&SectionData> {
        self.sections.get(name)
    }

    /// A channel as `(rows, columns, row-major 32 bit floats)`.
    pub fn channel_f32(&self, name: &str) -> Option<(usize, usize, Vec<f32>)> {
        let data = self.sections.get(name)?;
        Some((data.rows(), data.columns(), data.to_f32()))
    }

    /// Positions and mass-to-charge ratios joined into `[x, y, z, mass]` rows.
    ///
    /// Returns `None` unless both channels are present with matching row
    /// counts, three position columns and one mass column.
    pub fn position_mass(&self) -> Option<Vec<[f32; 4]>> {
        let position = self.sections.get(POSITION)?;
        let mass = self.sections.get(MASS)?;

        if position.columns() != 3 || mass.columns() != 1 || position.rows() != mass.rows() {
            return None;
        }

        let position = position.to_f32();
        let mass = mass.to_f32();

        Some(
            position
                .chunks_exact(3)
                .zip(mass)
                .map(|(p, m)| [p[0], p[1], p[2], m])
                .collect(),
        )
    }
}

/// A transcoded file, with the section error that halted decoding, if any.
#[derive(Debug)]
pub struct Transcoded<E> {
    /// Sections decoded before decoding ended.
    pub result: TranscodeResult,
    /// The error that halted decoding early.
    pub halted: Option<E>,
}

impl<E> Transcoded<E> {
    /// Discard partial results, failing if decoding halted early.
    pub fn into_result(self) -> Result<TranscodeResult, E> {
        match self.halted {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}

/// Receiver building a [`TranscodeResult`].
#[derive(Debug)]
pub(crate) struct Collector(TranscodeResult);

impl Collector {
    pub(crate) fn new(header: FileHeader) -> Self {
        Self(TranscodeResult {
            header,
            sections: BTreeMap::new(),
            bounding_box: None,
            seen: Vec::new(),
        })
    }

    pub(crate) fn finish<E>(self, halted: Option<E>) -> Transcoded<E> {
        Transcoded {
            result: self.0,
            halted,
        }
    }
}

impl FromSections for Collector {
    fn add_bounding_box(&mut self, bounding_box: BoundingBox) {
        self.0.bounding_box = Some(bounding_box);
    }

    fn add_section(&mut self, header: SectionHeader, data: SectionData) {
        self.0.sections.insert(header.section_type.clone(), data);
        self.0.seen.push(header);
    }
}

/// Capacity to reserve for a payload of `remaining` scalars.
///
/// Declared counts are not trusted for allocation; larger payloads grow as
/// they are read.
pub(crate) fn initial_capacity(remaining: u64) -> usize {
    const MAX_RESERVE: u64 = 1 << 20;
    remaining.min(MAX_RESERVE) as usize
}
