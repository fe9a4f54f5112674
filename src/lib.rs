#![no_std]

//! A strict, sequential decoder for atom probe tomography `*.apt` files.
//!
//! An `*.apt` file holds a fixed file header followed by a series of
//! self-describing sections: ion positions, mass-to-charge ratios, and
//! auxiliary instrument channels. Every section header is checked field by
//! field against a registry of known section schemas before its payload is
//! read, and decoding stops at the first section that does not match.
//!
//! Most users should begin with the [`avec`] module, which decodes whole files
//! into a [`TranscodeResult`](avec::TranscodeResult) or into a custom receiver.
//! The underlying finite-state machine is exposed in [`sans`] for applications
//! needing finer control over reading.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros (default).
//! - `std`: enable reader-based decoder and file access (default).

extern crate alloc;

pub mod avec;
pub mod pos;
pub mod sans;
