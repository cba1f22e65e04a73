//! Structural decoding of the packed chart layout.

use super::model::{
    Chart, ChartHeader, GeneralParams, NAME_FIELD_WIDTH, NOTE_RECORD_SIZE, Note, NoteParams,
    SoundEntry, Track,
};
use super::reader::ByteReader;
use super::{ChartError, Decryptor, is_obfuscated};

/// Magic literal opening the file header.
pub(crate) const FILE_MAGIC: [u8; 4] = *b"PTFF";
/// Magic literal opening every track record.
pub(crate) const TRACK_MAGIC: [u8; 4] = *b"EZTR";

impl Chart {
    /// Decode a plaintext chart buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::Obfuscated`] when the buffer fails the
    /// plaintext probe, and a [`ChartError`] describing the first structural
    /// problem otherwise. On error no partial chart is produced.
    pub fn parse(raw: &[u8]) -> Result<Self, ChartError> {
        if is_obfuscated(raw) {
            return Err(ChartError::Obfuscated);
        }
        parse_plaintext(raw)
    }

    /// Decode a chart buffer, exchanging it through `decryptor` first when
    /// the plaintext probe fails.
    ///
    /// Both the probe and the exchange operate on the whole raw buffer.
    ///
    /// # Errors
    ///
    /// Propagates [`ChartError::DecryptionFailed`] from the gateway and any
    /// structural [`ChartError`] from decoding the plaintext.
    pub fn parse_with_decryptor(
        raw: &[u8],
        decryptor: &mut impl Decryptor,
    ) -> Result<Self, ChartError> {
        if is_obfuscated(raw) {
            let plain = decryptor.decrypt(raw)?;
            parse_plaintext(&plain)
        } else {
            parse_plaintext(raw)
        }
    }
}

fn parse_plaintext(buf: &[u8]) -> Result<Chart, ChartError> {
    let mut reader = ByteReader::new(buf);

    let header = parse_header(&mut reader)?;

    let sounds = (0..header.number_of_sounds)
        .map(|_| parse_sound(&mut reader))
        .collect::<Result<Vec<_>, _>>()?;

    let tracks = (0..header.number_of_tracks)
        .map(|_| parse_track(&mut reader))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Chart {
        header,
        sounds,
        tracks,
    })
}

fn expect_magic(reader: &mut ByteReader<'_>, expected: [u8; 4]) -> Result<(), ChartError> {
    let offset = reader.offset();
    let found = reader.array::<4>()?;
    if found == expected {
        Ok(())
    } else {
        Err(ChartError::BadMagic {
            expected,
            found,
            offset,
        })
    }
}

fn parse_header(reader: &mut ByteReader<'_>) -> Result<ChartHeader, ChartError> {
    expect_magic(reader, FILE_MAGIC)?;
    Ok(ChartHeader {
        version_major: reader.u8()?,
        version_minor: reader.u8()?,
        ticks_per_measure: reader.u16()?,
        master_bpm: reader.f32()?,
        number_of_tracks: reader.u16()?,
        total_ticks: reader.u32()?,
        time_in_seconds: reader.f32()?,
        number_of_sounds: reader.u16()?,
    })
}

fn parse_sound(reader: &mut ByteReader<'_>) -> Result<SoundEntry, ChartError> {
    Ok(SoundEntry {
        index: reader.u16()?,
        command: reader.u16()?,
        filename: reader.fixed_str(NAME_FIELD_WIDTH)?,
    })
}

fn parse_track(reader: &mut ByteReader<'_>) -> Result<Track, ChartError> {
    expect_magic(reader, TRACK_MAGIC)?;
    reader.pad(2)?;
    let name = reader.fixed_str(NAME_FIELD_WIDTH)?;
    let ticks = reader.u32()?;
    let data_size = reader.u32()?;
    reader.pad(2)?;

    let number_of_notes = data_size / NOTE_RECORD_SIZE;
    let notes = (0..number_of_notes)
        .map(|_| parse_note(reader))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Track { name, ticks, notes })
}

fn parse_note(reader: &mut ByteReader<'_>) -> Result<Note, ChartError> {
    let record_offset = reader.offset();
    let position = reader.u32()?;
    let command = reader.u8()?;
    reader.pad(3)?;

    // The remaining 8 bytes are the parameter blob; each variant consumes its
    // fields and the variant-specific trailing padding.
    let params = match command {
        1 => {
            let params = GeneralParams {
                sound_index: reader.u16()?,
                volume: reader.u8()?,
                pan: reader.u8()?,
                attribute: reader.u8()?,
                duration: reader.u16()?,
            };
            reader.pad(1)?;
            NoteParams::General(params)
        }
        2 => {
            let volume = reader.u8()?;
            reader.pad(7)?;
            NoteParams::Volume { volume }
        }
        3 => {
            let tempo = reader.f32()?;
            reader.pad(4)?;
            NoteParams::Bpm { tempo }
        }
        4 => {
            let beat = reader.u16()?;
            reader.pad(6)?;
            NoteParams::Beat { beat }
        }
        other => {
            return Err(ChartError::UnsupportedCommand {
                command: other,
                offset: record_offset,
            });
        }
    };

    Ok(Note { position, params })
}
