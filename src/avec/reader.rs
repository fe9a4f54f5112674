//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::{
    fs::File,
    io::{self, BufReader, ErrorKind, Read},
    path::{Path, PathBuf},
    string::String,
    vec::Vec,
};

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

extern crate std;

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The named input does not exist.
    #[error("Input file {} does not exist.", .0.display())]
    MissingFile(PathBuf),
    /// The stream ended part-way through a header.
    #[error("Stream ended inside a header at byte {offset}.")]
    TruncatedHeader { offset: u64 },
    /// The stream ended part-way through a section payload.
    #[error("Stream ended inside the payload of section \"{section}\" at byte {offset}.")]
    TruncatedPayload { section: String, offset: u64 },
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] FileHeaderError),
    /// Incorrect section header.
    #[error("Incorrect section header: {0}")]
    Section(#[from] SectionHeaderError),
}

/// Sequential decoder owning its input for the duration of one file.
///
/// Consuming the transcoder releases the input on every exit path, including
/// an early halt.
#[derive(Debug)]
pub struct Transcoder<R> {
    reader: R,
}

impl Transcoder<BufReader<File>> {
    /// Open a file on disk for decoding.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::MissingFile(path.to_path_buf()),
            _ => Error::Io(err),
        })?;

        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> Transcoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Decode the input, publishing to a receiver. See [`decode`].
    pub fn decode(mut self, o: &mut impl FromSections) -> Result<(), Error> {
        decode(&mut self.reader, o)
    }

    /// Decode every section of the input. See [`transcode`].
    pub fn transcode(mut self) -> Result<Transcoded<Error>, Error> {
        transcode(&mut self.reader)
    }
}

/// Decode every section of a file on disk. See [`transcode`].
pub fn transcode_path(path: impl AsRef<Path>) -> Result<Transcoded<Error>, Error> {
    Transcoder::open(path)?.transcode()
}

/// Decode every section from a reader of a file.
///
/// An error reading or validating the file header is returned as `Err`.
/// Later errors halt decoding; sections decoded before the halt are returned
/// alongside the error.
///
/// This method is also re-exported as `apt_transcoder::avec::transcode_reader`.
pub fn transcode(r: &mut impl Read) -> Result<Transcoded<Error>, Error> {
    let i = &mut 0;

    let (header, state) = decode_file_header(r, i)?;
    let mut collector = Collector::new(header);

    let halted = decode_sections(state, r, i, &mut collector).err();
    if let Some(err) = &halted {
        warn!(%err, "halted transcoding, keeping sections decoded so far");
    }

    Ok(collector.finish(halted))
}

/// Decode sections from a reader of a file, publishing to a receiver.
///
/// On error, sections published before the error remain with the receiver.
///
/// This method is also re-exported as `apt_transcoder::avec::decode_reader`.
pub fn decode(r: &mut impl Read, o: &mut impl FromSections) -> Result<(), Error> {
    let i = &mut 0; // Counter of bytes read, used in error context.

    let (header, state) = decode_file_header(r, i)?;
    o.add_file_header(&header);

    decode_sections(state, r, i, o).inspect_err(|err| {
        warn!(%err, "halted decoding, keeping sections published so far");
    })
}

fn decode_file_header(
    r: &mut impl Read,
    i: &mut u64,
) -> Result<(FileHeader, SectionHeaderState), Error> {
    let offset = *i;
    let bytes = take(r, i).map_err(|err| truncated(err, Error::TruncatedHeader { offset }))?;

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
    r: &mut impl Read,
    i: &mut u64,
    o: &mut impl FromSections,
) -> Result<(), Error> {
    loop {
        let Some(bytes) = take_or_end(r, i)? else {
            trace!(offset = *i, "stream ended on a section boundary");
            return Ok(());
        };

        let (header, successor) = state.advance(bytes)?;
        let keep = o.accepts(&header);
        trace!(section = %header.section_type, keep, "validated section header");

        let scalars = match successor {
            Left(state) => {
                let offset = *i;
                let bytes = take(r, i).map_err(|err| {
                    truncated(
                        err,
                        Error::TruncatedPayload {
                            section: header.section_type.clone(),
                            offset,
                        },
                    )
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
    r: &mut impl Read,
    i: &mut u64,
    section: &str,
    keep: bool,
) -> Result<(Option<Values>, Either<SectionHeaderState, Done>), Error> {
    fn decode_scalars<T: Scalar<From = [u8; N]>, const N: usize>(
        mut state: Scalars<T>,
        r: &mut impl Read,
        i: &mut u64,
        section: &str,
        keep: bool,
        wrap: fn(Vec<T::Into>) -> Values,
    ) -> Result<(Option<Values>, Either<SectionHeaderState, Done>), Error> {
        let mut values = Vec::with_capacity(if keep {
            initial_capacity(state.remaining())
        } else {
            0
        });

        loop {
            let offset = *i;
            let bytes = take(r, i).map_err(|err| {
                truncated(
                    err,
                    Error::TruncatedPayload {
                        section: String::from(section),
                        offset,
                    },
                )
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

/// Replace an unexpected end of stream with a more specific error.
fn truncated(err: io::Error, replacement: Error) -> Error {
    match err.kind() {
        ErrorKind::UnexpectedEof => replacement,
        _ => Error::Io(err),
    }
}

/// Take an exact number of bytes from a reader, advancing a counter.
fn take<const N: usize>(r: &mut impl Read, i: &mut u64) -> Result<[u8; N], io::Error> {
    let mut buf = [0; N];
    r.read_exact(&mut buf)?;
    *i += N as u64;

    Ok(buf)
}

/// Take an exact number of bytes from a reader, or `None` if the reader is
/// already exhausted.
fn take_or_end<const N: usize>(r: &mut impl Read, i: &mut u64) -> Result<Option<[u8; N]>, Error> {
    let mut buf = [0; N];
    let mut filled = 0;

    while filled < N {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => Err(Error::TruncatedHeader {
                offset: *i + filled as u64,
            })?,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => Err(err)?,
        }
    }

    *i += N as u64;
    Ok(Some(buf))
}
