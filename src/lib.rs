#![cfg_attr(docsrs, feature(doc_cfg))]

//! The parser and playback engine for the PT (PTFF) rhythm-game chart format.
//!
//! A PT file is a packed little-endian binary: a header, a table of sound
//! resources, and a list of tracks whose notes are tagged-variant 16-byte
//! records (sound trigger, track volume, tempo change, beat change). This
//! crate decodes that format and drives a tick-accurate playback/judgment
//! engine over it.
//!
//! - [`chart`] decodes raw bytes into a [`chart::Chart`] (and encodes it
//!   back, byte-identically). Obfuscated files are detected and exchanged
//!   for plaintext through an injected [`chart::Decryptor`].
//! - [`unpack`] (feature `unpack`, default on) implements [`chart::Decryptor`]
//!   against the UnpackMe HTTP service, with a local content-addressed cache.
//! - [`play`] turns a chart into per-tick timing tables, allocates audio
//!   output channels per track, and schedules/judges notes against a
//!   caller-sampled millisecond clock.
//!
//! Rendering, audio output and input mapping are out of scope: the engine
//! emits [`play::AudioEvent`]s and [`play::PlayResult`]s for the embedding
//! application to act on.
//!
//! ```
//! use pt_rs::prelude::*;
//!
//! # fn demo(bytes: &[u8]) -> Result<(), pt_rs::chart::ChartError> {
//! let chart = Chart::parse(bytes)?;
//! assert_eq!(chart.header.number_of_tracks as usize, chart.tracks.len());
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod play;
pub mod prelude;
#[cfg(feature = "unpack")]
#[cfg_attr(docsrs, doc(cfg(feature = "unpack")))]
pub mod unpack;
