//! Prelude module for the crate.
//!
//! Re-exports the commonly used public types so `use pt_rs::prelude::*;`
//! brings the whole decode-and-play surface into scope at once.

pub use crate::chart::{
    Chart, ChartError, ChartHeader, CommandType, DecryptError, Decryptor, GeneralParams, Note,
    NoteParams, SoundEntry, Track, is_obfuscated,
    model::LONG_NOTE_THRESHOLD_TICKS,
};
pub use crate::play::{
    AudioEvent, ChannelPicker, ChannelPlan, FailReason, FrameOutput, Grade, JudgeWindow,
    KeyResponse, NoteState, PlayError, PlayResult, ScoreBoard, Sequencer, SoundDurations,
    SoundLevel, Timeline, TrackKind, UNIT_JUDGE_MILLIS,
};

#[cfg(feature = "unpack")]
pub use crate::unpack::{
    CommandEntry, UnpackAuth, UnpackClient,
    cache::{CachedDecryptor, DECRYPT_COMMAND_TITLE},
};
