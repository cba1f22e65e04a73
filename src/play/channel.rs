//! Audio-channel budgeting per track.

use std::ops::Range;

use crate::chart::Chart;

use super::{Timeline, TrackKind};

/// The per-track slice of one global audio-channel pool.
///
/// A track with no sounds gets 0 channels. A track flagged for overlap, or
/// in the foreground-melody category, gets 2 so a new trigger never cuts off
/// a still-sounding voice; every other sounding track gets 1. Ranges are
/// carved contiguously in track order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPlan {
    ranges: Vec<Range<usize>>,
    total: usize,
}

impl ChannelPlan {
    /// Budget channels for every track of `chart`.
    #[must_use]
    pub fn assign(chart: &Chart, timeline: &Timeline) -> Self {
        let mut ranges = Vec::with_capacity(chart.tracks.len());
        let mut next = 0;
        for (track_index, track) in chart.tracks.iter().enumerate() {
            let count = if !track.has_general_notes() {
                0
            } else if timeline.track_has_overlap(track_index)
                || TrackKind::of(track_index) == TrackKind::Fg1
            {
                2
            } else {
                1
            };
            ranges.push(next..next + count);
            next += count;
        }
        Self {
            ranges,
            total: next,
        }
    }

    /// Channel range of the track at `track_index`; empty for silent tracks.
    #[must_use]
    pub fn range(&self, track_index: usize) -> Range<usize> {
        self.ranges.get(track_index).cloned().unwrap_or(0..0)
    }

    /// Channel count of the track at `track_index`.
    #[must_use]
    pub fn count(&self, track_index: usize) -> usize {
        self.range(track_index).len()
    }

    /// Size of the global pool the host must provide.
    #[must_use]
    pub fn total_channels(&self) -> usize {
        self.total
    }
}

/// Round-robin cursor over one track's channel range.
///
/// Each trigger takes the next channel in the range, so back-to-back sounds
/// on a two-channel track alternate instead of restarting the same voice.
#[derive(Debug, Clone)]
pub struct ChannelPicker {
    range: Range<usize>,
    offset: usize,
}

impl ChannelPicker {
    /// A picker cycling through `range`.
    #[must_use]
    pub const fn new(range: Range<usize>) -> Self {
        Self { range, offset: 0 }
    }

    /// The next channel, or `None` when the track has no channels.
    pub fn pick(&mut self) -> Option<usize> {
        if self.range.is_empty() {
            return None;
        }
        let channel = self.range.start + self.offset;
        self.offset = (self.offset + 1) % self.range.len();
        Some(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartHeader, GeneralParams, Note, NoteParams, SoundEntry, Track};
    use crate::play::SoundDurations;
    use pretty_assertions::assert_eq;

    fn general(position: u32) -> Note {
        Note {
            position,
            params: NoteParams::General(GeneralParams {
                sound_index: 1,
                volume: 127,
                pan: 64,
                attribute: 0,
                duration: 0,
            }),
        }
    }

    fn chart(tracks: Vec<Track>) -> Chart {
        Chart {
            header: ChartHeader {
                version_major: 1,
                version_minor: 0,
                ticks_per_measure: 480,
                master_bpm: 120.0,
                number_of_tracks: tracks.len() as u16,
                total_ticks: 40,
                time_in_seconds: 0.0,
                number_of_sounds: 1,
            },
            sounds: vec![SoundEntry {
                index: 1,
                command: 0,
                filename: "a.wav".into(),
            }],
            tracks,
        }
    }

    fn track(notes: Vec<Note>) -> Track {
        Track {
            name: "t".into(),
            ticks: 0,
            notes,
        }
    }

    #[test]
    fn budget_is_contiguous_in_track_order() {
        let chart = chart(vec![
            // Control track without sounds: 0 channels.
            track(vec![Note {
                position: 0,
                params: NoteParams::Bpm { tempo: 120.0 },
            }]),
            // Overlapping sounds: 2 channels.
            track(vec![general(0), general(1)]),
            // Single isolated sound: 1 channel.
            track(vec![general(0)]),
        ]);
        let durations = SoundDurations::uniform(&chart.sounds, 50.0);
        let timeline = Timeline::build(&chart, &durations).unwrap();
        let plan = ChannelPlan::assign(&chart, &timeline);

        assert_eq!(plan.count(0), 0);
        assert_eq!(plan.count(1), 2);
        assert_eq!(plan.count(2), 1);
        assert_eq!(plan.range(1), 0..2);
        assert_eq!(plan.range(2), 2..3);
        assert_eq!(plan.total_channels(), 3);
    }

    #[test]
    fn foreground_melody_tracks_always_get_two_channels() {
        let mut tracks: Vec<Track> = (0..3).map(|_| track(vec![])).collect();
        tracks[0] = track(vec![Note {
            position: 0,
            params: NoteParams::Bpm { tempo: 120.0 },
        }]);
        // Track 2 is in the FG1 band; one isolated note still earns 2.
        tracks[2] = track(vec![general(0)]);
        let chart = chart(tracks);
        let durations = SoundDurations::uniform(&chart.sounds, 1.0);
        let timeline = Timeline::build(&chart, &durations).unwrap();
        let plan = ChannelPlan::assign(&chart, &timeline);

        assert!(!timeline.track_has_overlap(2));
        assert_eq!(plan.count(2), 2);
    }

    #[test]
    fn picker_cycles_round_robin() {
        let mut picker = ChannelPicker::new(3..5);
        assert_eq!(picker.pick(), Some(3));
        assert_eq!(picker.pick(), Some(4));
        assert_eq!(picker.pick(), Some(3));

        let mut silent = ChannelPicker::new(0..0);
        assert_eq!(silent.pick(), None);
    }
}
