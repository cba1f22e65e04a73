//! Decoded chart model.
//!
//! Every type here is a plain value: decoded once per file load, immutable
//! afterwards, and introspectable field by field (all fields are public and
//! serializable with the `serde` feature) so external tooling can dump or
//! structurally diff charts.

use itertools::Itertools;

/// Number of ticks above which a GENERAL note requires a sustained hold.
pub const LONG_NOTE_THRESHOLD_TICKS: u16 = 6;

/// Width in bytes of the fixed name fields (sound filename, track name).
pub(crate) const NAME_FIELD_WIDTH: usize = 64;

/// Size in bytes of one on-disk note record.
pub(crate) const NOTE_RECORD_SIZE: u32 = 0x10;

/// The fixed header of a chart file.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartHeader {
    /// Format major version.
    pub version_major: u8,
    /// Format minor version.
    pub version_minor: u8,
    /// Ticks in one measure; with the tempo this fixes the tick duration.
    pub ticks_per_measure: u16,
    /// The chart's nominal tempo in beats per minute.
    pub master_bpm: f32,
    /// Number of track records that follow the sound table.
    pub number_of_tracks: u16,
    /// Total length of the chart in ticks.
    pub total_ticks: u32,
    /// Total length of the chart in seconds, as declared by the file.
    pub time_in_seconds: f32,
    /// Number of sound-table records.
    pub number_of_sounds: u16,
}

/// One sound-table record: a sound resource referenced by GENERAL notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundEntry {
    /// Index that GENERAL notes use to refer to this sound.
    pub index: u16,
    /// Authoring-tool command word; unused by playback.
    pub command: u16,
    /// Waveform filename, relative to the chart file.
    pub filename: String,
}

/// Discriminant of a note record's parameter payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandType {
    /// A sound trigger.
    General = 1,
    /// A track-volume change.
    Volume = 2,
    /// A tempo change.
    Bpm = 3,
    /// A beat (time-signature numerator) change.
    Beat = 4,
}

/// Parameters of a GENERAL (sound trigger) note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneralParams {
    /// Sound-table index of the waveform to trigger.
    pub sound_index: u16,
    /// Trigger volume, 0..=127.
    pub volume: u8,
    /// Stereo pan, 0..=127 with 64 meaning center.
    pub pan: u8,
    /// Authoring attribute byte; carried through untouched.
    pub attribute: u8,
    /// Note length in ticks; above [`LONG_NOTE_THRESHOLD_TICKS`] the note is
    /// a long (hold) note.
    pub duration: u16,
}

impl GeneralParams {
    /// Whether the note requires a sustained hold (start and finish are
    /// judged separately).
    #[must_use]
    pub const fn is_long_note(&self) -> bool {
        self.duration > LONG_NOTE_THRESHOLD_TICKS
    }

    /// Field-by-field equality ignoring `duration`.
    ///
    /// Authoring tools emit re-timed copies of a trigger that differ only in
    /// length; diff tooling treats those as the same event.
    #[must_use]
    pub fn eq_except_duration(&self, other: &Self) -> bool {
        self.sound_index == other.sound_index
            && self.volume == other.volume
            && self.pan == other.pan
            && self.attribute == other.attribute
    }
}

/// The tagged parameter payload of a note record.
///
/// The on-disk record stores a command-type byte followed by an 8-byte blob;
/// this sum type replaces that dynamic dispatch, and every consumer matches
/// it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteParams {
    /// Trigger a sound on the owning track.
    General(GeneralParams),
    /// Set the owning track's volume, 0..=127.
    Volume {
        /// New track volume.
        volume: u8,
    },
    /// Change the live tempo.
    Bpm {
        /// New tempo in beats per minute.
        tempo: f32,
    },
    /// Change the live beat value.
    Beat {
        /// New beat value (defaults to 4 before the first BEAT note).
        beat: u16,
    },
}

impl NoteParams {
    /// The discriminant this payload is stored under.
    #[must_use]
    pub const fn command_type(&self) -> CommandType {
        match self {
            Self::General(_) => CommandType::General,
            Self::Volume { .. } => CommandType::Volume,
            Self::Bpm { .. } => CommandType::Bpm,
            Self::Beat { .. } => CommandType::Beat,
        }
    }
}

/// One note record: a position in ticks plus a tagged payload.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    /// Position of the note in ticks from the start of the chart.
    pub position: u32,
    /// The tagged parameter payload.
    pub params: NoteParams,
}

impl Note {
    /// Whether this is a GENERAL (sound trigger) note.
    #[must_use]
    pub const fn is_general(&self) -> bool {
        matches!(self.params, NoteParams::General(_))
    }

    /// The GENERAL payload, when this is a sound trigger.
    #[must_use]
    pub const fn general(&self) -> Option<&GeneralParams> {
        match &self.params {
            NoteParams::General(params) => Some(params),
            _ => None,
        }
    }

    /// Equality between two GENERAL notes ignoring their durations.
    ///
    /// `false` whenever either note is not GENERAL.
    #[must_use]
    pub fn eq_except_duration(&self, other: &Self) -> bool {
        match (self.general(), other.general()) {
            (Some(own), Some(theirs)) => {
                self.position == other.position && own.eq_except_duration(theirs)
            }
            _ => false,
        }
    }
}

/// One track: a name, a declared tick length and its ordered notes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    /// Track name as stored in the file.
    pub name: String,
    /// Declared length of the track in ticks.
    pub ticks: u32,
    /// Notes in on-disk order. The playback engine relies on positions being
    /// non-decreasing and never re-sorts.
    pub notes: Vec<Note>,
}

impl Track {
    /// Whether the track participates in playback at all.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        !self.notes.is_empty()
    }

    /// Whether the track carries at least one GENERAL note.
    #[must_use]
    pub fn has_general_notes(&self) -> bool {
        self.notes.iter().any(Note::is_general)
    }

    /// Whether note positions are non-decreasing.
    ///
    /// The decoder trusts the source file and does not check this; callers
    /// that load untrusted charts can verify before playback.
    #[must_use]
    pub fn is_sorted_by_position(&self) -> bool {
        self.notes
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.position <= b.position)
    }
}

/// A fully decoded chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chart {
    /// The file header.
    pub header: ChartHeader,
    /// The sound table, in on-disk order.
    pub sounds: Vec<SoundEntry>,
    /// The tracks, in on-disk order.
    pub tracks: Vec<Track>,
}

impl Chart {
    /// Look up a sound-table entry by its index field.
    #[must_use]
    pub fn sound(&self, index: u16) -> Option<&SoundEntry> {
        self.sounds.iter().find(|sound| sound.index == index)
    }
}
