//! The playback and judgment engine over a decoded [`Chart`].
//!
//! [`Chart`]: crate::chart::Chart
//!
//! A loaded chart is turned into immutable derived structures once:
//!
//! - [`timeline::Timeline`] maps every tick to its active tempo, cumulative
//!   played milliseconds and tick-interval milliseconds, and flags tracks
//!   whose consecutive sounds overlap.
//! - [`channel::ChannelPlan`] carves a contiguous audio-channel range per
//!   track out of one global pool.
//!
//! [`sequencer::Sequencer`] then drives the mutable per-frame state: it is
//! fed a wall-clock millisecond sample each frame and emits [`AudioEvent`]s
//! for the host's audio backend plus [`PlayResult`]s for every judged or
//! auto-failed note. [`score::ScoreBoard`] folds those results into combo
//! and accuracy figures.
//!
//! The engine never plays audio and never reads the clock itself; both stay
//! on the host side of the [`AudioEvent`] contract.

pub mod channel;
pub mod judge;
pub mod score;
pub mod sequencer;
pub mod timeline;
pub(crate) mod track;

use std::collections::HashMap;

use thiserror::Error;

use crate::chart::SoundEntry;

pub use self::channel::{ChannelPicker, ChannelPlan};
pub use self::judge::{FailReason, Grade, JudgeWindow, PlayResult};
pub use self::score::ScoreBoard;
pub use self::sequencer::{AudioEvent, FrameOutput, KeyResponse, Sequencer};
pub use self::timeline::Timeline;
pub use self::track::NoteState;

/// Default base timing tolerance in milliseconds; the three judgment grades
/// are its 1x/2x/3x multiples.
pub const UNIT_JUDGE_MILLIS: f64 = 42.0;

/// An error preparing a chart for playback.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PlayError {
    /// A sound-table entry could not be resolved to a playable resource.
    #[error("sound resource {filename:?} (index {index}) is unavailable")]
    SoundUnavailable {
        /// Sound-table index of the entry.
        index: u16,
        /// Filename the entry points at.
        filename: String,
    },
    /// A note references a sound index absent from the sound table.
    #[error("note references sound index {index} absent from the sound table")]
    MissingSound {
        /// The unresolved sound index.
        index: u16,
    },
}

/// Category of a track, fixed by its index in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackKind {
    /// Control tracks carrying tempo/beat commands.
    Cmd,
    /// Foreground melody tracks; always granted two audio channels.
    Fg1,
    /// Secondary foreground tracks.
    Fg2,
    /// The background-music track, resumed mid-sample after a seek.
    Mr,
    /// Remaining background tracks.
    Bg,
}

impl TrackKind {
    /// The kind of the track at `track_index`.
    #[must_use]
    pub const fn of(track_index: usize) -> Self {
        match track_index {
            0..2 => Self::Cmd,
            2..12 => Self::Fg1,
            12..22 => Self::Fg2,
            22 => Self::Mr,
            _ => Self::Bg,
        }
    }
}

/// Playback gain of one triggered sound, already combining note volume and
/// pan but not yet the owning track's volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundLevel {
    /// Centered: one gain for both speakers.
    Mono(f32),
    /// Panned: independent left/right gains.
    Stereo {
        /// Left-speaker gain.
        left: f32,
        /// Right-speaker gain.
        right: f32,
    },
}

impl SoundLevel {
    /// Compute the level for a note's `volume` and `pan` fields (both
    /// 0..=127, pan 64 meaning center).
    ///
    /// Off-center pans split the gain so the louder side carries the full
    /// note volume and the other side is attenuated proportionally.
    #[must_use]
    pub fn from_note(volume: u8, pan: u8) -> Self {
        let volume = f32::from(volume) / 127.0;
        if pan == 64 {
            return Self::Mono(volume);
        }
        let right = f32::from(pan) / 127.0;
        let left = 1.0 - right;
        let peak = left.max(right);
        Self::Stereo {
            left: left / peak * volume,
            right: right / peak * volume,
        }
    }

    /// This level with both sides scaled by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        match self {
            Self::Mono(gain) => Self::Mono(gain * factor),
            Self::Stereo { left, right } => Self::Stereo {
                left: left * factor,
                right: right * factor,
            },
        }
    }
}

/// Playback durations of the chart's sound resources, in milliseconds.
///
/// The timeline sweep needs each sound's natural length to detect overlap;
/// the engine never decodes audio itself, so the host supplies the lengths
/// through a probe over the sound table.
#[derive(Debug, Clone, Default)]
pub struct SoundDurations {
    millis: HashMap<u16, f64>,
}

impl SoundDurations {
    /// Resolve every sound-table entry through `probe`.
    ///
    /// # Errors
    ///
    /// [`PlayError::SoundUnavailable`] as soon as `probe` fails to resolve an
    /// entry; a chart with an unreadable sound never reaches playback.
    pub fn probe(
        sounds: &[SoundEntry],
        mut probe: impl FnMut(&SoundEntry) -> Option<f64>,
    ) -> Result<Self, PlayError> {
        let mut millis = HashMap::with_capacity(sounds.len());
        for sound in sounds {
            let duration = probe(sound).ok_or_else(|| PlayError::SoundUnavailable {
                index: sound.index,
                filename: sound.filename.clone(),
            })?;
            millis.insert(sound.index, duration);
        }
        Ok(Self { millis })
    }

    /// Assign every entry the same duration. Mostly useful for tools that
    /// need a timeline but have no audio files at hand.
    #[must_use]
    pub fn uniform(sounds: &[SoundEntry], duration_millis: f64) -> Self {
        Self {
            millis: sounds
                .iter()
                .map(|sound| (sound.index, duration_millis))
                .collect(),
        }
    }

    /// Duration of the sound at `index`, if the table has it.
    #[must_use]
    pub fn millis(&self, index: u16) -> Option<f64> {
        self.millis.get(&index).copied()
    }
}
