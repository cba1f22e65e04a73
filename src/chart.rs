//! The decoder module of PT (.pt) chart files.
//!
//! A PT file is tightly packed little-endian binary data:
//!
//! - a 24-byte header opened by the magic `PTFF`,
//! - `number_of_sounds` fixed 68-byte sound-table records,
//! - `number_of_tracks` track records opened by the magic `EZTR`, each
//!   carrying `data_size / 16` note records.
//!
//! [`Chart::parse`] decodes a plaintext buffer; [`Chart::parse_with_decryptor`]
//! additionally exchanges an obfuscated buffer for plaintext through a
//! [`Decryptor`] before structural parsing. Parsing is total: it yields a
//! [`Chart`] or a [`ChartError`], never a partially decoded value, and it
//! mutates no state outside its return value.
//!
//! [`Chart::encode`] writes the model back out byte-identically (including
//! padding), so a decode/encode round trip reproduces the input.

pub(crate) mod encode;
pub mod model;
pub(crate) mod parse;
pub(crate) mod reader;

use thiserror::Error;

pub use self::model::{
    Chart, ChartHeader, CommandType, GeneralParams, Note, NoteParams, SoundEntry, Track,
};

/// Byte offset of the obfuscation probe: a plaintext file stores the first
/// sound-table index (always 1) as a little-endian u16 here.
pub(crate) const OBFUSCATION_PROBE_OFFSET: usize = 0x18;

/// An error occurred while decoding a PT chart.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChartError {
    /// A magic literal did not match at the given byte offset.
    #[error("expected magic {expected:?} at offset {offset:#x}, found {found:?}")]
    BadMagic {
        /// The magic bytes the format requires here.
        expected: [u8; 4],
        /// The bytes actually present.
        found: [u8; 4],
        /// Byte offset of the mismatch in the input buffer.
        offset: usize,
    },
    /// The buffer ended before a field could be read in full.
    #[error("unexpected end of data at offset {offset:#x} (needed {needed} more bytes)")]
    UnexpectedEof {
        /// Byte offset at which the read started.
        offset: usize,
        /// How many bytes the read required.
        needed: usize,
    },
    /// A note record carried a command type outside 1..=4.
    #[error("unsupported command type {command} at offset {offset:#x}")]
    UnsupportedCommand {
        /// The unrecognized command-type byte.
        command: u8,
        /// Byte offset of the note record.
        offset: usize,
    },
    /// The buffer is obfuscated and no [`Decryptor`] was supplied.
    #[error("buffer is obfuscated; a decryptor is required to parse it")]
    Obfuscated,
    /// The decryption gateway failed to exchange the buffer.
    #[error("decryption failed")]
    DecryptionFailed(#[from] DecryptError),
}

/// An error from the decryption gateway contract.
///
/// The gateway is an external collaborator; the decoder only depends on this
/// bytes-in/bytes-out surface. Any failure here is fatal to `parse`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DecryptError {
    /// Authenticating against the decryption service failed.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// A service request failed or returned an unusable response.
    #[error("service request failed: {0}")]
    Service(String),
    /// Reading or writing the local decryption cache failed.
    #[error("cache I/O failed")]
    Cache(#[from] std::io::Error),
}

/// Exchanges an obfuscated buffer for its plaintext form.
///
/// Implementations receive the whole raw buffer, never a partial header. The
/// exchange may be slow (a remote round trip); implementations are expected
/// to cache by content so repeated loads of the same file are local.
pub trait Decryptor {
    /// Decrypt `raw` into plaintext chart bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`DecryptError`] when authentication, the remote exchange or
    /// local caching fails.
    fn decrypt(&mut self, raw: &[u8]) -> Result<Vec<u8>, DecryptError>;
}

/// Whether a raw buffer is obfuscated.
///
/// Plaintext PT files store the first sound-table entry's index, always `1`,
/// as a little-endian u16 at offset `0x18`; anything else (including a buffer
/// too short to hold the probe) marks the buffer as obfuscated.
#[must_use]
pub fn is_obfuscated(raw: &[u8]) -> bool {
    let Some(bytes) = raw
        .get(OBFUSCATION_PROBE_OFFSET..OBFUSCATION_PROBE_OFFSET + 2)
        .and_then(|slice| <[u8; 2]>::try_from(slice).ok())
    else {
        return true;
    };
    u16::from_le_bytes(bytes) != 1
}
