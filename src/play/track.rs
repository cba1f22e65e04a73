//! Per-track runtime state: cursors, note states and input judgment.

use crate::chart::Note;

use super::channel::ChannelPicker;
use super::judge::{FailReason, Grade, JudgeWindow, PlayResult};
use super::sequencer::{AudioEvent, KeyResponse};
use super::timeline::Timeline;
use super::{SoundLevel, TrackKind};

/// Judgment state of one GENERAL note.
///
/// `NotStarted -> Playing -> Played` for long notes, `NotStarted -> Played`
/// for short notes, with `Failed` as the alternative terminal from either
/// live state. Mutated exclusively by the judgment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    /// Not yet pressed.
    NotStarted,
    /// A long note currently held.
    Playing,
    /// Resolved by input (or consumed by auto-play).
    Played,
    /// Auto-failed.
    Failed,
}

/// The mutable per-track half of the scheduler.
///
/// Two forward-only cursors over the same note list: the processing cursor
/// (advanced by the sequencer's dispatch sweep over every note type) and the
/// judgment cursor, which only ever rests on the next judgable GENERAL note.
#[derive(Debug, Clone)]
pub(crate) struct TrackRuntime<'a> {
    pub(crate) index: usize,
    pub(crate) kind: TrackKind,
    pub(crate) notes: &'a [Note],
    pub(crate) states: Vec<NoteState>,
    pub(crate) process_cursor: usize,
    pub(crate) volume: f32,
    pub(crate) picker: ChannelPicker,
    judge_cursor: usize,
    holding: bool,
    start_grade: Option<Grade>,
}

impl<'a> TrackRuntime<'a> {
    pub(crate) fn new(index: usize, notes: &'a [Note], picker: ChannelPicker) -> Self {
        let mut runtime = Self {
            index,
            kind: TrackKind::of(index),
            notes,
            states: vec![NoteState::NotStarted; notes.len()],
            process_cursor: 0,
            volume: 1.0,
            picker,
            judge_cursor: 0,
            holding: false,
            start_grade: None,
        };
        runtime.normalize_judge_cursor(0);
        runtime
    }

    /// Index of the note under the judgment cursor.
    pub(crate) fn judge_head(&self) -> Option<usize> {
        (self.judge_cursor < self.notes.len()).then_some(self.judge_cursor)
    }

    pub(crate) fn state(&self, note_index: usize) -> NoteState {
        self.states[note_index]
    }

    /// Move the cursor to the first judgable note at or after `from`.
    fn normalize_judge_cursor(&mut self, from: usize) {
        self.judge_cursor = (from..self.notes.len())
            .find(|&i| self.notes[i].is_general() && self.states[i] == NoteState::NotStarted)
            .unwrap_or(self.notes.len());
    }

    fn advance_judge_cursor(&mut self) {
        self.normalize_judge_cursor(self.judge_cursor + 1);
    }

    /// Re-aim the judgment cursor at the first judgable note from `tick` on.
    pub(crate) fn seek_judge_cursor(&mut self, tick: u32) {
        let base = self
            .notes
            .iter()
            .position(|note| note.position >= tick)
            .unwrap_or(self.notes.len());
        self.normalize_judge_cursor(base);
    }

    /// Clear all judgment state; the processing cursor is untouched.
    pub(crate) fn reset_judgment(&mut self) {
        self.states.fill(NoteState::NotStarted);
        self.holding = false;
        self.start_grade = None;
        self.normalize_judge_cursor(0);
    }

    fn end_millis(&self, note: &Note, timeline: &Timeline) -> f64 {
        let duration = note.general().map_or(0, |params| params.duration);
        timeline.played_millis_at(note.position + u32::from(duration))
    }

    /// The sound trigger for a GENERAL note at `note_index`, scaled by the
    /// track's current volume.
    pub(crate) fn trigger_event(&mut self, note_index: usize) -> Option<AudioEvent> {
        let params = self.notes.get(note_index)?.general()?;
        let channel = self.picker.pick()?;
        Some(AudioEvent::PlaySound {
            track: self.index,
            channel,
            sound_index: params.sound_index,
            level: SoundLevel::from_note(params.volume, params.pan).scaled(self.volume),
        })
    }

    /// Key-down: trigger the head note's sound and judge the press.
    ///
    /// The sound fires even when the press is too early to judge; only the
    /// judgment is withheld. A press more than three units late consumes the
    /// note without producing a result.
    pub(crate) fn key_down(
        &mut self,
        elapsed_millis: f64,
        timeline: &Timeline,
        window: &JudgeWindow,
    ) -> KeyResponse {
        if self.holding {
            return KeyResponse::default();
        }
        self.holding = true;

        let Some(idx) = self.judge_head() else {
            return KeyResponse::default();
        };
        let note = self.notes[idx];
        let Some(params) = note.general().copied() else {
            return KeyResponse::default();
        };

        let event = self.trigger_event(idx);

        let position_millis = timeline.played_millis_at(note.position);
        let diff = position_millis - elapsed_millis;
        if window.exceeds_limit(diff) {
            // Too early: no state change, no judgment.
            return KeyResponse {
                event,
                result: None,
            };
        }

        if self.states[idx] == NoteState::NotStarted {
            self.start_grade = None;
        }
        if let Some(grade) = window.classify(diff) {
            self.start_grade = Some(grade);
        }

        if params.is_long_note() {
            self.states[idx] = NoteState::Playing;
            KeyResponse {
                event,
                result: None,
            }
        } else {
            self.states[idx] = NoteState::Played;
            let result = self.start_grade.take().map(|grade| PlayResult {
                grade,
                timing_diff_millis: elapsed_millis - position_millis,
                reason: None,
            });
            self.advance_judge_cursor();
            KeyResponse { event, result }
        }
    }

    /// Key-up: resolve a held long note.
    ///
    /// A release more than three units before the end overrides the start
    /// grade with BREAK; any later release keeps it.
    pub(crate) fn key_up(
        &mut self,
        elapsed_millis: f64,
        timeline: &Timeline,
        window: &JudgeWindow,
    ) -> Option<PlayResult> {
        if !self.holding {
            return None;
        }
        self.holding = false;

        let idx = self.judge_head()?;
        if self.states[idx] != NoteState::Playing {
            return None;
        }
        let note = self.notes[idx];
        self.states[idx] = NoteState::Played;

        let end_millis = self.end_millis(&note, timeline);
        let timing_diff_millis = elapsed_millis - end_millis;
        let result = if window.exceeds_limit(end_millis - elapsed_millis) {
            Some(PlayResult {
                grade: Grade::Break,
                timing_diff_millis,
                reason: Some(FailReason::TooEarlyToFinish),
            })
        } else {
            self.start_grade.take().map(|grade| PlayResult {
                grade,
                timing_diff_millis,
                reason: None,
            })
        };
        self.advance_judge_cursor();
        result
    }

    /// Fail every overdue head note.
    ///
    /// An unstarted note more than three units past its position BREAKs; a
    /// held note more than three units past its end still scores MAX1, never
    /// BREAK. Under auto-play the cursor advances without results.
    pub(crate) fn sweep_failures(
        &mut self,
        elapsed_millis: f64,
        timeline: &Timeline,
        window: &JudgeWindow,
        auto_play: bool,
        results: &mut Vec<PlayResult>,
    ) {
        while let Some(idx) = self.judge_head() {
            let note = self.notes[idx];
            let overdue = if self.states[idx] == NoteState::Playing {
                let end_millis = self.end_millis(&note, timeline);
                if !window.exceeds_limit(elapsed_millis - end_millis) {
                    break;
                }
                PlayResult {
                    grade: Grade::Max1,
                    timing_diff_millis: elapsed_millis - end_millis,
                    reason: Some(FailReason::TooLateToFinish),
                }
            } else {
                let position_millis = timeline.played_millis_at(note.position);
                if !window.exceeds_limit(elapsed_millis - position_millis) {
                    break;
                }
                PlayResult {
                    grade: Grade::Break,
                    timing_diff_millis: elapsed_millis - position_millis,
                    reason: Some(FailReason::TooLateToStart),
                }
            };

            if auto_play {
                self.states[idx] = NoteState::Played;
            } else {
                self.states[idx] = NoteState::Failed;
                results.push(overdue);
            }
            self.advance_judge_cursor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Chart, ChartHeader, GeneralParams, NoteParams, SoundEntry, Track};
    use crate::play::SoundDurations;
    use pretty_assertions::assert_eq;

    // 480 ticks/measure at 120 BPM: one tick is 240000/480/120 ~ 4.1667ms.
    fn fixture(notes: Vec<Note>) -> (Chart, Timeline) {
        let chart = Chart {
            header: ChartHeader {
                version_major: 1,
                version_minor: 0,
                ticks_per_measure: 480,
                master_bpm: 120.0,
                number_of_tracks: 2,
                total_ticks: 2000,
                time_in_seconds: 0.0,
                number_of_sounds: 1,
            },
            sounds: vec![SoundEntry {
                index: 1,
                command: 0,
                filename: "a.wav".into(),
            }],
            tracks: vec![
                Track {
                    name: "cmd".into(),
                    ticks: 0,
                    notes: vec![Note {
                        position: 0,
                        params: NoteParams::Bpm { tempo: 120.0 },
                    }],
                },
                Track {
                    name: "fg".into(),
                    ticks: 0,
                    notes,
                },
            ],
        };
        let durations = SoundDurations::uniform(&chart.sounds, 10.0);
        let timeline = Timeline::build(&chart, &durations).unwrap();
        (chart, timeline)
    }

    fn general(position: u32, duration: u16) -> Note {
        Note {
            position,
            params: NoteParams::General(GeneralParams {
                sound_index: 1,
                volume: 127,
                pan: 64,
                attribute: 0,
                duration,
            }),
        }
    }

    fn runtime(notes: &[Note]) -> TrackRuntime<'_> {
        TrackRuntime::new(2, notes, ChannelPicker::new(0..2))
    }

    #[test]
    fn on_time_short_press_is_max100_with_zero_diff() {
        let (chart, timeline) = fixture(vec![general(240, 4)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        let at = timeline.played_millis_at(240);
        let response = track.key_down(at, &timeline, &window);
        assert!(matches!(
            response.event,
            Some(AudioEvent::PlaySound { channel: 0, .. })
        ));
        let result = response.result.unwrap();
        assert_eq!(result.grade, Grade::Max100);
        assert_eq!(result.timing_diff_millis, 0.0);
        assert_eq!(track.state(0), NoteState::Played);
    }

    #[test]
    fn fifty_millis_late_is_max90() {
        let (chart, timeline) = fixture(vec![general(240, 4)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        let at = timeline.played_millis_at(240) + 50.0;
        let result = track.key_down(at, &timeline, &window).result.unwrap();
        assert_eq!(result.grade, Grade::Max90);
        assert_eq!(result.timing_diff_millis, 50.0);
    }

    #[test]
    fn too_early_press_triggers_sound_but_is_not_judged() {
        let (chart, timeline) = fixture(vec![general(240, 4)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        let at = timeline.played_millis_at(240) - 200.0;
        let response = track.key_down(at, &timeline, &window);
        assert!(response.event.is_some());
        assert!(response.result.is_none());
        assert_eq!(track.state(0), NoteState::NotStarted);
    }

    #[test]
    fn far_late_press_consumes_the_note_silently() {
        let (chart, timeline) = fixture(vec![general(240, 4)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        let at = timeline.played_millis_at(240) + 200.0;
        let response = track.key_down(at, &timeline, &window);
        assert!(response.result.is_none());
        assert_eq!(track.state(0), NoteState::Played);
        assert_eq!(track.judge_head(), None);
    }

    #[test]
    fn long_note_released_on_time_keeps_the_start_grade() {
        let (chart, timeline) = fixture(vec![general(240, 96)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        let start = timeline.played_millis_at(240) + 30.0;
        let response = track.key_down(start, &timeline, &window);
        assert!(response.result.is_none());
        assert_eq!(track.state(0), NoteState::Playing);

        let end = timeline.played_millis_at(240 + 96);
        let result = track.key_up(end + 10.0, &timeline, &window).unwrap();
        assert_eq!(result.grade, Grade::Max100);
        assert_eq!(result.timing_diff_millis, 10.0);
        assert_eq!(track.state(0), NoteState::Played);
    }

    #[test]
    fn long_note_released_far_too_early_breaks_regardless_of_start_grade() {
        let (chart, timeline) = fixture(vec![general(240, 960)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        let start = timeline.played_millis_at(240);
        track.key_down(start, &timeline, &window);
        let result = track.key_up(start + 100.0, &timeline, &window).unwrap();
        assert_eq!(result.grade, Grade::Break);
        assert_eq!(result.reason, Some(FailReason::TooEarlyToFinish));
    }

    #[test]
    fn unstarted_note_breaks_but_overheld_note_still_scores() {
        let (chart, timeline) = fixture(vec![general(240, 96), general(1200, 96)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        // The first note is long overdue by the time the second is due.
        let mut results = Vec::new();
        let second_start = timeline.played_millis_at(1200);
        track.sweep_failures(second_start, &timeline, &window, false, &mut results);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].grade, Grade::Break);
        assert_eq!(results[0].reason, Some(FailReason::TooLateToStart));
        assert_eq!(track.state(0), NoteState::Failed);

        // Hold the second note far past its end: lenient MAX1, never BREAK.
        track.key_down(second_start, &timeline, &window);
        assert_eq!(track.state(1), NoteState::Playing);

        results.clear();
        let long_after = timeline.played_millis_at(1200 + 96) + 200.0;
        track.sweep_failures(long_after, &timeline, &window, false, &mut results);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].grade, Grade::Max1);
        assert_eq!(results[0].reason, Some(FailReason::TooLateToFinish));
        assert_eq!(track.state(1), NoteState::Failed);
    }

    #[test]
    fn auto_play_consumes_overdue_notes_without_results() {
        let (chart, timeline) = fixture(vec![general(240, 4)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        let mut results = Vec::new();
        let late = timeline.played_millis_at(240) + 500.0;
        track.sweep_failures(late, &timeline, &window, true, &mut results);
        assert!(results.is_empty());
        assert_eq!(track.state(0), NoteState::Played);
    }

    #[test]
    fn seek_re_aims_the_judgment_cursor() {
        let (chart, timeline) = fixture(vec![general(240, 4), general(480, 4)]);
        let mut track = runtime(&chart.tracks[1].notes);
        let window = JudgeWindow::default();

        track.seek_judge_cursor(300);
        assert_eq!(track.judge_head(), Some(1));

        let at = timeline.played_millis_at(480);
        let result = track.key_down(at, &timeline, &window).result.unwrap();
        assert_eq!(result.grade, Grade::Max100);
    }
}
