//! The tick-to-time mapping derived from a chart.
//!
//! One forward sweep over `0..total_ticks` builds three parallel per-tick
//! tables (active tempo, cumulative played milliseconds, tick-interval
//! milliseconds) and, in the same pass, flags every track whose consecutive
//! sounds overlap. The sweep is amortized linear: per-track cursors only
//! move forward.

use crate::chart::{Chart, Note, NoteParams};

use super::{PlayError, SoundDurations};

/// Milliseconds per measure at 1 BPM; divided by ticks-per-measure and tempo
/// it yields the tick interval.
pub(crate) const MEASURE_MILLIS: f64 = 240_000.0;

/// The canonical tick-to-time mapping, built once per chart load.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    tempo_per_tick: Vec<f64>,
    played_millis_per_tick: Vec<f64>,
    tick_interval_millis_per_tick: Vec<f64>,
    track_overlap: Vec<bool>,
}

impl Timeline {
    /// Sweep `chart` once and build the mapping.
    ///
    /// The tempo starts at 0 (not the header's master BPM): played time does
    /// not accrue until the first BPM note, which real charts place at tick
    /// 0 on a control track.
    ///
    /// # Errors
    ///
    /// [`PlayError::MissingSound`] when a GENERAL note within the swept range
    /// references a sound index absent from `durations`.
    pub fn build(chart: &Chart, durations: &SoundDurations) -> Result<Self, PlayError> {
        let total_ticks = chart.header.total_ticks as usize;
        let ticks_per_measure = f64::from(chart.header.ticks_per_measure);

        let mut tempo_per_tick = Vec::with_capacity(total_ticks);
        let mut played_millis_per_tick = Vec::with_capacity(total_ticks);
        let mut tick_interval_millis_per_tick = Vec::with_capacity(total_ticks);

        let mut tempo = 0.0;
        let mut played_millis = 0.0;
        let mut tick_interval_millis = 0.0;

        let mut cursors = vec![0usize; chart.tracks.len()];
        let mut track_overlap = vec![false; chart.tracks.len()];
        // Last GENERAL note seen per track: (position, sound duration).
        let mut last_general: Vec<Option<(u32, f64)>> = vec![None; chart.tracks.len()];

        for tick in 0..total_ticks as u32 {
            played_millis += tick_interval_millis;
            for (track_index, track) in chart.tracks.iter().enumerate() {
                let cursor = &mut cursors[track_index];
                while let Some(note) = track.notes.get(*cursor) {
                    if note.position > tick {
                        break;
                    }
                    match note.params {
                        NoteParams::General(params) => {
                            let duration = durations.millis(params.sound_index).ok_or(
                                PlayError::MissingSound {
                                    index: params.sound_index,
                                },
                            )?;
                            if !track_overlap[track_index] {
                                if let Some((prev_position, prev_duration)) =
                                    last_general[track_index]
                                {
                                    // A previous note at the current tick has
                                    // no recorded entry yet; its start time is
                                    // the running total.
                                    let prev_start = played_millis_per_tick
                                        .get(prev_position as usize)
                                        .copied()
                                        .unwrap_or(played_millis);
                                    if prev_start + prev_duration > played_millis {
                                        track_overlap[track_index] = true;
                                    }
                                }
                            }
                            last_general[track_index] = Some((note.position, duration));
                        }
                        NoteParams::Bpm { tempo: new_tempo } => {
                            tempo = f64::from(new_tempo);
                            tick_interval_millis = MEASURE_MILLIS / ticks_per_measure / tempo;
                        }
                        NoteParams::Volume { .. } | NoteParams::Beat { .. } => {}
                    }
                    *cursor += 1;
                }
            }
            tempo_per_tick.push(tempo);
            played_millis_per_tick.push(played_millis);
            tick_interval_millis_per_tick.push(tick_interval_millis);
        }

        Ok(Self {
            tempo_per_tick,
            played_millis_per_tick,
            tick_interval_millis_per_tick,
            track_overlap,
        })
    }

    /// Number of ticks covered by the tables.
    #[must_use]
    pub fn total_ticks(&self) -> usize {
        self.played_millis_per_tick.len()
    }

    /// Tempo in effect at `tick`, clamped to the last entry past the end.
    #[must_use]
    pub fn tempo_at(&self, tick: u32) -> f64 {
        Self::at(&self.tempo_per_tick, tick)
    }

    /// Cumulative played milliseconds at `tick`, clamped to the last entry
    /// past the end (a long note may end after the final tick).
    #[must_use]
    pub fn played_millis_at(&self, tick: u32) -> f64 {
        Self::at(&self.played_millis_per_tick, tick)
    }

    /// Tick-interval milliseconds in effect at `tick`.
    #[must_use]
    pub fn tick_interval_at(&self, tick: u32) -> f64 {
        Self::at(&self.tick_interval_millis_per_tick, tick)
    }

    /// Whether the track at `track_index` ever overlaps its own sounds.
    #[must_use]
    pub fn track_has_overlap(&self, track_index: usize) -> bool {
        self.track_overlap.get(track_index).copied().unwrap_or(false)
    }

    /// The cumulative played-milliseconds table, indexed by tick.
    #[must_use]
    pub fn played_millis_per_tick(&self) -> &[f64] {
        &self.played_millis_per_tick
    }

    /// Milliseconds at which `note` is due.
    #[must_use]
    pub fn note_position_millis(&self, note: &Note) -> f64 {
        self.played_millis_at(note.position)
    }

    fn at(table: &[f64], tick: u32) -> f64 {
        table
            .get(tick as usize)
            .or_else(|| table.last())
            .copied()
            .unwrap_or(0.0)
    }
}
