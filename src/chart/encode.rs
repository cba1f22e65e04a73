//! Byte-exact encoding of a chart back into the packed layout.
//!
//! Built directly from the model without re-parsing; decoding then encoding
//! reproduces the input byte for byte, with name fields NUL-padded to their
//! fixed width.

use super::model::{Chart, GeneralParams, NAME_FIELD_WIDTH, NOTE_RECORD_SIZE, Note, NoteParams};
use super::parse::{FILE_MAGIC, TRACK_MAGIC};

impl Chart {
    /// Encode the chart into the on-disk byte layout.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(&FILE_MAGIC);
        out.push(self.header.version_major);
        out.push(self.header.version_minor);
        out.extend_from_slice(&self.header.ticks_per_measure.to_le_bytes());
        out.extend_from_slice(&self.header.master_bpm.to_le_bytes());
        out.extend_from_slice(&self.header.number_of_tracks.to_le_bytes());
        out.extend_from_slice(&self.header.total_ticks.to_le_bytes());
        out.extend_from_slice(&self.header.time_in_seconds.to_le_bytes());
        out.extend_from_slice(&self.header.number_of_sounds.to_le_bytes());

        for sound in &self.sounds {
            out.extend_from_slice(&sound.index.to_le_bytes());
            out.extend_from_slice(&sound.command.to_le_bytes());
            push_name_field(&mut out, &sound.filename);
        }

        for track in &self.tracks {
            out.extend_from_slice(&TRACK_MAGIC);
            out.extend_from_slice(&[0; 2]);
            push_name_field(&mut out, &track.name);
            out.extend_from_slice(&track.ticks.to_le_bytes());
            let data_size = track.notes.len() as u32 * NOTE_RECORD_SIZE;
            out.extend_from_slice(&data_size.to_le_bytes());
            out.extend_from_slice(&[0; 2]);
            for note in &track.notes {
                push_note(&mut out, note);
            }
        }

        out
    }
}

fn push_name_field(out: &mut Vec<u8>, name: &str) {
    let bytes = name.as_bytes();
    let used = bytes.len().min(NAME_FIELD_WIDTH);
    out.extend_from_slice(&bytes[..used]);
    out.extend(std::iter::repeat_n(0u8, NAME_FIELD_WIDTH - used));
}

fn push_note(out: &mut Vec<u8>, note: &Note) {
    out.extend_from_slice(&note.position.to_le_bytes());
    out.push(note.params.command_type() as u8);
    out.extend_from_slice(&[0; 3]);
    match note.params {
        NoteParams::General(GeneralParams {
            sound_index,
            volume,
            pan,
            attribute,
            duration,
        }) => {
            out.extend_from_slice(&sound_index.to_le_bytes());
            out.push(volume);
            out.push(pan);
            out.push(attribute);
            out.extend_from_slice(&duration.to_le_bytes());
            out.push(0);
        }
        NoteParams::Volume { volume } => {
            out.push(volume);
            out.extend_from_slice(&[0; 7]);
        }
        NoteParams::Bpm { tempo } => {
            out.extend_from_slice(&tempo.to_le_bytes());
            out.extend_from_slice(&[0; 4]);
        }
        NoteParams::Beat { beat } => {
            out.extend_from_slice(&beat.to_le_bytes());
            out.extend_from_slice(&[0; 6]);
        }
    }
}
