//! States processing section payloads.

use core::marker::PhantomData;

use either::Either::{self, Left, Right};
use thiserror::Error;
use zerocopy::byteorder::little_endian::F32 as LeF32;

use super::{schema::BOUNDING_BOX_SIZE, section::SectionHeaderState};

/// An error determining how a section's records are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The scalar width is not supported for the record data type.
    #[error(
        "Unsupported scalar width ({bits} bits) for record data type {record_data_type}."
    )]
    UnsupportedScalarWidth { record_data_type: u32, bits: i32 },
    /// The record data type code is unknown.
    #[error("Unsupported record data type ({0}).")]
    UnsupportedRecordDataType(u32),
    /// The record size is not a positive multiple of the scalar width.
    #[error(
        "Record size ({record_size} bytes) is not a positive multiple of {scalar_width} bytes."
    )]
    MalformedRecordLayout { record_size: i32, scalar_width: usize },
}

/// Primitive type of the scalars in a section payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    I16,
    I32,
    I64,
    U16,
    F32,
}

impl ScalarKind {
    /// Width of one scalar, in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::I64 => 8,
        }
    }
}

/// Shape of one record: its scalar kind and number of elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub kind: ScalarKind,
    /// Elements per record. Always at least one.
    pub columns: usize,
}

impl Layout {
    /// Determine the layout from a record data type code, a scalar width in
    /// bits, and a record size in bytes.
    ///
    /// Code 1 is a signed integer of 16, 32 or 64 bits. Code 2 is always an
    /// unsigned 16 bit integer and code 3 always a 32 bit float, whatever the
    /// declared width.
    pub fn new(record_data_type: u32, bits: i32, record_size: i32) -> Result<Self, LayoutError> {
        let kind = match (record_data_type, bits) {
            (1, 16) => ScalarKind::I16,
            (1, 32) => ScalarKind::I32,
            (1, 64) => ScalarKind::I64,
            (1, _) => Err(LayoutError::UnsupportedScalarWidth {
                record_data_type,
                bits,
            })?,
            (2, _) => ScalarKind::U16,
            (3, _) => ScalarKind::F32,
            (code, _) => Err(LayoutError::UnsupportedRecordDataType(code))?,
        };

        let scalar_width = kind.width();
        let columns = usize::try_from(record_size)
            .ok()
            .filter(|&size| size != 0 && size % scalar_width == 0)
            .map(|size| size / scalar_width)
            .ok_or(LayoutError::MalformedRecordLayout {
                record_size,
                scalar_width,
            })?;

        Ok(Self { kind, columns })
    }
}

/// The six floats preceding the `Position` payload, as two rows of three.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox(pub [[f32; 3]; 2]);

/// State token to decode the bounding box of a `Position` section.
#[derive(Debug)]
pub struct BoundingBoxState {
    pub(super) scalars: AnyScalars,
}

impl BoundingBoxState {
    /// Transition to another state by decoding a bounding box.
    ///
    /// Returns the bounding box, and a successor state token for the first
    /// scalar of the payload.
    pub fn advance(self, r: [u8; BOUNDING_BOX_SIZE]) -> (BoundingBox, AnyScalars) {
        let v: [LeF32; 6] = zerocopy::transmute!(r);

        let bounding_box = BoundingBox([
            [v[0].get(), v[1].get(), v[2].get()],
            [v[3].get(), v[4].get(), v[5].get()],
        ]);

        (bounding_box, self.scalars)
    }
}

/// State token reached once the registry's section count is exhausted.
#[derive(Debug)]
pub struct Done(pub(super) ());

/// State token to decode a payload scalar of type `T`.
#[derive(Debug)]
pub struct Scalars<T> {
    pub(super) remaining: u64,
    pub(super) ion_count: u64,
    pub(super) attempts_remaining: usize,
    pub(super) _phantom: PhantomData<T>,
}

impl<T: Scalar> Scalars<T> {
    /// Number of scalars left in this payload, including the next one.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Transition to another state by decoding a scalar of type `T`.
    ///
    /// Returns the scalar as a Rust primitive, and a successor state: the
    /// next scalar, or after the last one, the next section header or the end
    /// of decoding.
    pub fn advance(
        self,
        r: T::From,
    ) -> (
        T::Into,
        Either<Either<SectionHeaderState, Done>, Self>,
    ) {
        let value = T::from(r);

        let successor = if self.remaining == 1 {
            Left(if self.attempts_remaining != 0 {
                Left(SectionHeaderState {
                    ion_count: self.ion_count,
                    attempts_remaining: self.attempts_remaining,
                })
            } else {
                Right(Done(()))
            })
        } else {
            Right(Self {
                remaining: self.remaining - 1,
                ion_count: self.ion_count,
                attempts_remaining: self.attempts_remaining,
                _phantom: PhantomData,
            })
        };

        (value, successor)
    }
}

pub trait Scalar {
    /// The bytes storing this scalar.
    type From;
    /// The primitive corresponding to this scalar.
    type Into;

    /// Convert the little-endian bytes of this scalar to its primitive.
    fn from(r: Self::From) -> Self::Into;
}

macro_rules! scalar {
    ($t:ident, $into:ident, $(#[$attr:meta])*) => {
        $(#[$attr])*
        #[derive(Debug)]
        pub struct $t;

        impl Scalar for $t {
            type From = [u8; size_of::<Self::Into>()];
            type Into = $into;

            fn from(r: Self::From) -> Self::Into {
                Self::Into::from_le_bytes(r)
            }
        }
    };
}

scalar!(I16, i16, /** Record data type 1, 16 bits. */);
scalar!(I32, i32, /** Record data type 1, 32 bits. */);
scalar!(I64, i64, /** Record data type 1, 64 bits. */);
scalar!(U16, u16, /** Record data type 2. */);
scalar!(F32, f32, /** Record data type 3. */);

/// A `Scalars` state token for a scalar kind.
#[derive(Debug)]
pub enum AnyScalars {
    I16(Scalars<I16>),
    I32(Scalars<I32>),
    I64(Scalars<I64>),
    U16(Scalars<U16>),
    F32(Scalars<F32>),
}

impl AnyScalars {
    pub(super) fn new(layout: Layout, ion_count: u64, attempts_remaining: usize) -> Self {
        fn new_scalars<T>(
            (remaining, ion_count, attempts_remaining): (u64, u64, usize),
        ) -> Scalars<T> {
            Scalars {
                remaining,
                ion_count,
                attempts_remaining,
                _phantom: PhantomData,
            }
        }

        // Saturates only for counts no stream could hold; reading then ends in
        // a truncation error.
        let remaining = ion_count.saturating_mul(layout.columns as u64);
        let parameters = (remaining, ion_count, attempts_remaining);

        match layout.kind {
            ScalarKind::I16 => Self::I16(new_scalars(parameters)),
            ScalarKind::I32 => Self::I32(new_scalars(parameters)),
            ScalarKind::I64 => Self::I64(new_scalars(parameters)),
            ScalarKind::U16 => Self::U16(new_scalars(parameters)),
            ScalarKind::F32 => Self::F32(new_scalars(parameters)),
        }
    }

    /// Number of scalars left in this payload, including the next one.
    pub fn remaining(&self) -> u64 {
        match self {
            Self::I16(s) => s.remaining,
            Self::I32(s) => s.remaining,
            Self::I64(s) => s.remaining,
            Self::U16(s) => s.remaining,
            Self::F32(s) => s.remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_from_codes() {
        assert_eq!(
            Layout::new(3, 32, 12),
            Ok(Layout {
                kind: ScalarKind::F32,
                columns: 3
            })
        );
        assert_eq!(Layout::new(1, 64, 8).map(|l| l.kind), Ok(ScalarKind::I64));
        assert_eq!(Layout::new(2, 16, 2).map(|l| l.kind), Ok(ScalarKind::U16));
    }

    #[test]
    fn scalar_widths_per_code() {
        assert_eq!(
            Layout::new(1, 8, 4),
            Err(LayoutError::UnsupportedScalarWidth {
                record_data_type: 1,
                bits: 8
            })
        );
        assert_eq!(
            Layout::new(3, 64, 8),
            Ok(Layout {
                kind: ScalarKind::F32,
                columns: 2
            })
        );
        assert_eq!(
            Layout::new(2, 32, 4),
            Ok(Layout {
                kind: ScalarKind::U16,
                columns: 2
            })
        );
        assert_eq!(
            Layout::new(7, 32, 4),
            Err(LayoutError::UnsupportedRecordDataType(7))
        );
    }

    #[test]
    fn record_size_must_divide() {
        for record_size in [0, 6, -4] {
            assert_eq!(
                Layout::new(3, 32, record_size),
                Err(LayoutError::MalformedRecordLayout {
                    record_size,
                    scalar_width: 4
                })
            );
        }
    }

    #[test]
    fn last_scalar_of_last_section_is_done() {
        let layout = Layout {
            kind: ScalarKind::I16,
            columns: 1,
        };

        let AnyScalars::I16(scalars) = AnyScalars::new(layout, 1, 0) else {
            panic!("expected 16 bit scalars");
        };

        let (value, successor) = scalars.advance((-2i16).to_le_bytes());
        assert_eq!(value, -2);
        assert!(matches!(successor, Left(Right(Done(())))));
    }

    #[test]
    fn bounding_box_rows() {
        let mut bytes = [0; BOUNDING_BOX_SIZE];
        for (chunk, v) in bytes.chunks_exact_mut(4).zip([1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }

        let layout = Layout {
            kind: ScalarKind::F32,
            columns: 3,
        };
        let state = BoundingBoxState {
            scalars: AnyScalars::new(layout, 2, 1),
        };

        let (bounding_box, scalars) = state.advance(bytes);
        assert_eq!(bounding_box, BoundingBox([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
        assert_eq!(scalars.remaining(), 6);
    }
}
