//! Slice-based decoder implementation.

use alloc::{string::String, vec::Vec};

use either::Either::{self, Left, Right};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::sans::{
    Decoder,
    data::{AnyScalars, Done, Scalar, Scalars},
    header::{FileHeader, FileHeaderError},
    section::{SectionHeaderError, SectionHeaderState},
};

use super::{Collector, FromSections, SectionData, Transcoded, Values, initial_capacity};

/// Errors occurring while decoding from a slice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The slice ended part-way through a header.
    #[error("Slice ended inside a header at byte {offset}.")]
    TruncatedHeader { offset: usize },
    /// The slice ended part-way through a section payload.
    #[error("Slice ended inside the payload of section \"{section}\" at byte {offset}.")]
    TruncatedPayload { section: String, offset: usize },
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] FileHeaderError),
    /// Incorrect section header.
    #[error("Incorrect section header: {0}")]
    Section(#[from] SectionHeaderError),
}

/// Decode every section from a slice of a file.
///
/// An error reading or validating the file header is returned as `Err`.
/// Later errors halt decoding; sections decoded before the halt are returned
/// alongside the error.
///
/// This method is also re-exported as `apt_transcoder::avec::transcode_slice`.
pub fn transcode(r: &[u8]) -> Result<Transcoded<Error>, Error> {
    let i = &mut 0;

    let (header, state) = decode_file_header(r, i)?;
    let mut collector = Collector::new(header);

    let halted = decode_sections(state, r, i, &mut collector).err();
    if let Some(err) = &halted {
        warn!(%err, "halted transcoding, keeping sections decoded so far");
    }

    Ok(collector.finish(halted))
}

/// Decode sections from a slice of a file, publishing to a receiver.
///
/// On error, sections published before the error remain with the receiver.
///
/// This method is also re-exported as `apt_transcoder::avec::decode_slice`.
pub fn decode(r: &[u8], o: &mut impl FromSections) -> Result<(), Error> {
    let i = &mut 0; // Counter of bytes read, used to read bytes from the tip.

    let (header, state) = decode_file_header(r, i)?;
    o.add_file_header(&header);

    decode_sections(state, r, i, o).inspect_err(|err| {
        warn!(%err, "halted decoding, keeping sections published so far");
    })
}

fn decode_file_header(
    r: &[u8],
    i: &mut usize,
) -> Result<(FileHeader, SectionHeaderState), Error> {
    let offset = *i;
    let bytes = take(r, i).ok_or(Error::TruncatedHeader { offset })?;

    let (header, state) = Decoder::advance(bytes)?;
    debug!(
        ions = header.ion_count,
        filename = %header.filename,
        "decoded file header"
    );

    Ok((header, state))
}

fn decode_sections(
    mut state: SectionHeaderState,
    r: &[u8],
    i: &mut usize,
    o: &mut impl FromSections,
) -> Result<(), Error> {
    loop {
        if *i == r.len() {
            trace!(offset = *i, "slice ended on a section boundary");
            return Ok(());
        }

        let offset = *i;
        let bytes = take(r, i).ok_or(Error::TruncatedHeader { offset })?;

        let (header, successor) = state.advance(bytes)?;
        let keep = o.accepts(&header);
        trace!(section = %header.section_type, keep, "validated section header");

        let scalars = match successor {
            Left(state) => {
                let offset = *i;
                let bytes = take(r, i).ok_or_else(|| Error::TruncatedPayload {
                    section: header.section_type.clone(),
                    offset,
                })?;

                let (bounding_box, scalars) = state.advance(bytes);
                if keep {
                    o.add_bounding_box(bounding_box);
                }
                scalars
            }
            Right(scalars) => scalars,
        };

        let (values, successor) = decode_payload(scalars, r, i, &header.section_type, keep)?;
        debug!(
            section = %header.section_type,
            columns = header.layout.columns,
            kind = ?header.layout.kind,
            kept = keep,
            "decoded section"
        );

        if let Some(data) = values.and_then(|v| SectionData::new(header.layout.columns, v)) {
            o.add_section(header, data);
        }

        state = match successor {
            Left(state) => state,
            Right(_done) => {
                trace!("read the maximum number of sections");
                return Ok(());
            }
        };
    }
}

fn decode_payload(
    scalars: AnyScalars,
    r: &[u8],
    i: &mut usize,
    section: &str,
    keep: bool,
) -> Result<(Option<Values>, Either<SectionHeaderState, Done>), Error> {
    fn decode_scalars<T: Scalar<From = [u8; N]>, const N: usize>(
        mut state: Scalars<T>,
        r: &[u8],
        i: &mut usize,
        section: &str,
        keep: bool,
        wrap: fn(Vec<T::Into>) -> Values,
    ) -> Result<(Option<Values>, Either<SectionHeaderState, Done>), Error> {
        // Fail before reading anything if the slice cannot hold the payload.
        let needed = state.remaining().saturating_mul(N as u64);
        if needed > (r.len() - *i) as u64 {
            Err(Error::TruncatedPayload {
                section: String::from(section),
                offset: r.len(),
            })?;
        }

        let mut values = Vec::with_capacity(if keep {
            initial_capacity(state.remaining())
        } else {
            0
        });

        loop {
            let offset = *i;
            let bytes = take(r, i).ok_or_else(|| Error::TruncatedPayload {
                section: String::from(section),
                offset,
            })?;

            let (value, successor) = state.advance(bytes);
            if keep {
                values.push(value);
            }

            state = match successor {
                Left(successor) => return Ok((keep.then(|| wrap(values)), successor)),
                Right(state) => state,
            }
        }
    }

    match scalars {
        AnyScalars::I16(s) => decode_scalars(s, r, i, section, keep, Values::I16),
        AnyScalars::I32(s) => decode_scalars(s, r, i, section, keep, Values::I32),
        AnyScalars::I64(s) => decode_scalars(s, r, i, section, keep, Values::I64),
        AnyScalars::U16(s) => decode_scalars(s, r, i, section, keep, Values::U16),
        AnyScalars::F32(s) => decode_scalars(s, r, i, section, keep, Values::F32),
    }
}

/// Take an exact number of bytes from an offset in a slice, advancing the offset.
fn take<const N: usize>(r: &[u8], i: &mut usize) -> Option<[u8; N]> {
    let bytes = r.get(*i..)?.first_chunk::<N>()?;
    *i += N;

    Some(*bytes)
}
