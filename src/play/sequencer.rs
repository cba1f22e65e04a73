//! The frame-driven scheduler over a chart.
//!
//! The sequencer owns all mutable playback state. Each frame the host
//! samples its clock once and calls [`Sequencer::frame`]; the sequencer
//! advances the tick counter, drains processing cursors into [`AudioEvent`]s,
//! runs the auto-fail sweep, and hands both back in a [`FrameOutput`]. Key
//! input goes through [`Sequencer::key_down`] / [`Sequencer::key_up`]
//! between frames. Single-writer discipline: nothing here is touched from
//! more than one thread.

use std::collections::BTreeSet;

use crate::chart::{Chart, NoteParams};

use super::channel::{ChannelPicker, ChannelPlan};
use super::judge::{JudgeWindow, PlayResult};
use super::timeline::{MEASURE_MILLIS, Timeline};
use super::track::{NoteState, TrackRuntime};
use super::{PlayError, SoundDurations, SoundLevel, TrackKind};

/// An instruction to the host's audio backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEvent {
    /// Start the sound on the given global channel at the given level.
    PlaySound {
        /// Chart index of the emitting track.
        track: usize,
        /// Global channel to play on.
        channel: usize,
        /// Sound-table index of the waveform.
        sound_index: u16,
        /// Combined note and track gain.
        level: SoundLevel,
    },
    /// Start the sound mid-sample, skipping `offset_millis` of it. Emitted
    /// once after a seek to re-enter the background music at the right spot.
    ResumeSound {
        /// Chart index of the emitting track.
        track: usize,
        /// Global channel to play on.
        channel: usize,
        /// Sound-table index of the waveform.
        sound_index: u16,
        /// How far into the waveform playback resumes.
        offset_millis: f64,
        /// Combined note and track gain.
        level: SoundLevel,
    },
    /// Halt every playing channel.
    StopAll,
    /// Pause every playing channel, resumable.
    PauseAll,
    /// Resume every paused channel.
    ResumeAll,
}

/// Everything one frame produced, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// Audio instructions for the host.
    pub events: Vec<AudioEvent>,
    /// Judgment results from the auto-fail sweep.
    pub results: Vec<PlayResult>,
}

/// What one key press or release produced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyResponse {
    /// Sound to trigger, if the press reached a note.
    pub event: Option<AudioEvent>,
    /// Judgment outcome, if the note resolved with a grade.
    pub result: Option<PlayResult>,
}

#[derive(Debug, Clone, Copy)]
struct PendingResume {
    slot: usize,
    note: usize,
    offset_millis: f64,
}

/// The playback scheduler for one loaded chart.
#[derive(Debug)]
pub struct Sequencer<'a> {
    chart: &'a Chart,
    timeline: Timeline,
    plan: ChannelPlan,
    window: JudgeWindow,
    tracks: Vec<TrackRuntime<'a>>,
    playable_tracks: BTreeSet<usize>,
    auto_play: bool,

    tempo: f64,
    beat: u16,
    tick_interval_millis: f64,
    current_tick: u32,

    // Clock sentinels: negative means "not sampled yet".
    current_millis: f64,
    started_millis: f64,
    elapsed_millis: f64,
    played_millis: f64,
    paused_millis: f64,

    playing: bool,
    pending_resume: Option<PendingResume>,
}

impl<'a> Sequencer<'a> {
    /// Derive the timeline and channel plan and set up runtime state.
    ///
    /// The live tempo starts at the header's master BPM with a beat of 4;
    /// both are replaced by the chart's own BPM/BEAT notes as they dispatch.
    ///
    /// # Errors
    ///
    /// Propagates [`PlayError`] from the timeline sweep when a note
    /// references an unresolvable sound.
    pub fn new(chart: &'a Chart, durations: &SoundDurations) -> Result<Self, PlayError> {
        let timeline = Timeline::build(chart, durations)?;
        let plan = ChannelPlan::assign(chart, &timeline);
        let tracks = chart
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, track)| track.is_effective())
            .map(|(index, track)| {
                TrackRuntime::new(index, &track.notes, ChannelPicker::new(plan.range(index)))
            })
            .collect();

        let mut sequencer = Self {
            chart,
            timeline,
            plan,
            window: JudgeWindow::default(),
            tracks,
            playable_tracks: BTreeSet::new(),
            auto_play: false,
            tempo: 0.0,
            beat: 4,
            tick_interval_millis: 0.0,
            current_tick: 0,
            current_millis: -1.0,
            started_millis: -1.0,
            elapsed_millis: -1.0,
            played_millis: -1.0,
            paused_millis: -1.0,
            playing: false,
            pending_resume: None,
        };
        sequencer.set_tempo(f64::from(chart.header.master_bpm));
        Ok(sequencer)
    }

    /// Begin playback from the load-time baseline.
    pub fn start(&mut self) {
        if !self.playing {
            self.reset_progress();
            self.playing = true;
        }
    }

    /// Stop playback and return to the load-time baseline.
    ///
    /// Returns the [`AudioEvent::StopAll`] the host must act on when audio
    /// was running.
    pub fn stop(&mut self) -> Option<AudioEvent> {
        let stopped = self.playing.then_some(AudioEvent::StopAll);
        self.playing = false;
        self.reset_progress();
        stopped
    }

    /// Freeze the clock at `current_millis`.
    pub fn pause(&mut self, current_millis: f64) -> Option<AudioEvent> {
        if !self.playing {
            return None;
        }
        self.playing = false;
        self.paused_millis = current_millis;
        Some(AudioEvent::PauseAll)
    }

    /// Continue after a pause, or after a seek.
    ///
    /// After a pause the next frame re-bases the start time so elapsed-time
    /// accounting stays continuous. Without a pending pause (a seek, or a
    /// host-side audio reset) the processing sweep is replayed from tick 0
    /// to rebuild tempo, interval and played time at the current tick.
    pub fn resume(&mut self) {
        if self.playing {
            return;
        }
        if self.paused_millis < 0.0 {
            self.sync_with_current_tick();
        }
        self.playing = true;
    }

    /// Advance playback against one wall-clock sample.
    pub fn frame(&mut self, current_millis: f64) -> FrameOutput {
        let mut out = FrameOutput::default();
        if !self.playing {
            return out;
        }
        self.current_millis = current_millis;

        if self.started_millis < 0.0 {
            self.started_millis = if self.played_millis < 0.0 {
                self.current_millis
            } else {
                self.current_millis - self.played_millis
            };
        }
        if self.played_millis < 0.0 {
            self.played_millis = 0.0;
        }
        if self.paused_millis > 0.0 {
            self.started_millis += self.current_millis - self.paused_millis;
            self.paused_millis = -1.0;
            out.events.push(AudioEvent::ResumeAll);
        }

        if let Some(pending) = self.pending_resume.take() {
            if let Some(event) = self.resume_event(pending) {
                out.events.push(event);
            }
        }

        self.elapsed_millis = self.current_millis - self.started_millis;
        let incremental_millis = self.elapsed_millis - self.played_millis;
        if self.tick_interval_millis > 0.0 {
            let incremental_ticks = (incremental_millis / self.tick_interval_millis) as i64;
            if incremental_ticks > 0 {
                self.current_tick += incremental_ticks as u32;
                self.played_millis += self.tick_interval_millis * incremental_ticks as f64;
            }
        }

        self.dispatch_due_notes(&mut out);

        for slot in 0..self.tracks.len() {
            if !self.playable_tracks.contains(&self.tracks[slot].index) {
                continue;
            }
            self.tracks[slot].sweep_failures(
                self.elapsed_millis,
                &self.timeline,
                &self.window,
                self.auto_play,
                &mut out.results,
            );
        }

        if self.current_tick > self.chart.header.total_ticks {
            self.playing = false;
        }
        out
    }

    /// Key-down on a track: trigger and judge its head note.
    pub fn key_down(&mut self, track_index: usize) -> KeyResponse {
        let Some(slot) = self.slot_of(track_index) else {
            return KeyResponse::default();
        };
        self.tracks[slot].key_down(self.elapsed_millis, &self.timeline, &self.window)
    }

    /// Key-up on a track: resolve a held long note.
    pub fn key_up(&mut self, track_index: usize) -> Option<PlayResult> {
        let slot = self.slot_of(track_index)?;
        self.tracks[slot].key_up(self.elapsed_millis, &self.timeline, &self.window)
    }

    /// Seek to `tick`, stopping live audio and resetting judgment state.
    ///
    /// Playback does not continue until [`Sequencer::resume`], which replays
    /// the sweep from tick 0 to rebuild the clock state for the new target.
    pub fn set_current_tick(&mut self, tick: u32) -> Option<AudioEvent> {
        let mut stopped = None;
        if self.playing {
            self.playing = false;
            stopped = Some(AudioEvent::StopAll);
        }
        if self.paused_millis > 0.0 {
            self.paused_millis = -1.0;
            stopped = Some(AudioEvent::StopAll);
        }
        self.current_tick = tick;
        for track in &mut self.tracks {
            track.reset_judgment();
        }
        stopped
    }

    /// Seek relative to the current tick, clamped at 0.
    pub fn offset_ticks(&mut self, delta: i64) -> Option<AudioEvent> {
        let target = (i64::from(self.current_tick) + delta).max(0);
        self.set_current_tick(target as u32)
    }

    /// The current tick including the fraction accumulated since the last
    /// whole-tick advance; for smooth scrolling consumers.
    #[must_use]
    pub fn current_tick_precise(&self) -> f64 {
        let mut tick = f64::from(self.current_tick);
        if self.current_millis > 0.0
            && self.started_millis > 0.0
            && self.played_millis > 0.0
            && self.tick_interval_millis > 0.0
        {
            let mut started_millis = self.started_millis;
            if self.paused_millis > 0.0 {
                started_millis += self.current_millis - self.paused_millis;
            }
            let elapsed_millis = self.current_millis - started_millis;
            tick += (elapsed_millis - self.played_millis) / self.tick_interval_millis;
        }
        tick
    }

    /// Declare which chart tracks receive key input. Everything else is
    /// dispatched automatically by the processing sweep.
    pub fn set_playable_tracks(&mut self, tracks: impl IntoIterator<Item = usize>) {
        self.playable_tracks = tracks.into_iter().collect();
        let current_tick = self.current_tick;
        for slot in 0..self.tracks.len() {
            if self.playable_tracks.contains(&self.tracks[slot].index) {
                self.tracks[slot].seek_judge_cursor(current_tick);
            }
        }
    }

    /// Let playable tracks dispatch their sounds without judgment.
    pub fn set_auto_play(&mut self, auto_play: bool) {
        self.auto_play = auto_play;
    }

    /// Whether auto-play is active.
    #[must_use]
    pub const fn auto_play(&self) -> bool {
        self.auto_play
    }

    /// Replace the base judgment tolerance.
    pub fn set_unit_judge_millis(&mut self, unit_millis: f64) {
        self.window = JudgeWindow::new(unit_millis);
    }

    /// The live tempo in beats per minute.
    #[must_use]
    pub const fn tempo(&self) -> f64 {
        self.tempo
    }

    /// The live beat value.
    #[must_use]
    pub const fn beat(&self) -> u16 {
        self.beat
    }

    /// The live tick interval in milliseconds.
    #[must_use]
    pub const fn tick_interval_millis(&self) -> f64 {
        self.tick_interval_millis
    }

    /// The current whole tick.
    #[must_use]
    pub const fn current_tick(&self) -> u32 {
        self.current_tick
    }

    /// Milliseconds of playback elapsed; negative before the first frame.
    #[must_use]
    pub const fn elapsed_millis(&self) -> f64 {
        self.elapsed_millis
    }

    /// Whether the sequencer is advancing.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// The derived tick-to-time mapping.
    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The derived channel budget.
    #[must_use]
    pub const fn channel_plan(&self) -> &ChannelPlan {
        &self.plan
    }

    /// Judgment state of one note, for introspection.
    #[must_use]
    pub fn note_state(&self, track_index: usize, note_index: usize) -> Option<NoteState> {
        let slot = self.slot_of(track_index)?;
        let track = &self.tracks[slot];
        (note_index < track.notes.len()).then(|| track.state(note_index))
    }

    fn slot_of(&self, track_index: usize) -> Option<usize> {
        self.tracks.iter().position(|track| track.index == track_index)
    }

    fn set_tempo(&mut self, tempo: f64) {
        self.tempo = tempo;
        self.tick_interval_millis = if tempo > 0.0 {
            MEASURE_MILLIS / f64::from(self.chart.header.ticks_per_measure) / tempo
        } else {
            0.0
        };
    }

    fn reset_progress(&mut self) {
        self.current_tick = 0;
        self.current_millis = -1.0;
        self.started_millis = -1.0;
        self.elapsed_millis = -1.0;
        self.played_millis = -1.0;
        self.paused_millis = -1.0;
        self.pending_resume = None;
        self.set_tempo(f64::from(self.chart.header.master_bpm));
        self.beat = 4;
        for track in &mut self.tracks {
            track.process_cursor = 0;
            track.volume = 1.0;
            track.reset_judgment();
        }
    }

    /// Drain every processing cursor up to the current tick and apply the
    /// due notes in collection order.
    ///
    /// GENERAL notes on playable tracks are left to the judgment path unless
    /// auto-play is on; everything else always dispatches.
    fn dispatch_due_notes(&mut self, out: &mut FrameOutput) {
        let mut due = Vec::new();
        for slot in 0..self.tracks.len() {
            let playable = self.playable_tracks.contains(&self.tracks[slot].index);
            let track = &mut self.tracks[slot];
            while let Some(note) = track.notes.get(track.process_cursor) {
                if note.position > self.current_tick {
                    break;
                }
                if !note.is_general() || !playable || self.auto_play {
                    due.push((slot, track.process_cursor));
                }
                track.process_cursor += 1;
            }
        }

        for (slot, note_index) in due {
            match self.tracks[slot].notes[note_index].params {
                NoteParams::General(_) => {
                    if let Some(event) = self.tracks[slot].trigger_event(note_index) {
                        out.events.push(event);
                    }
                }
                NoteParams::Volume { volume } => {
                    self.tracks[slot].volume = f32::from(volume) / 127.0;
                }
                NoteParams::Bpm { tempo } => self.set_tempo(f64::from(tempo)),
                NoteParams::Beat { beat } => self.beat = beat,
            }
        }
    }

    /// Replay the processing sweep from tick 0 up to the current tick.
    ///
    /// Rebuilds the live tempo, tick interval and played time, repositions
    /// every cursor, and schedules a mid-sample resume of the last
    /// background-music sound that started before the target tick.
    fn sync_with_current_tick(&mut self) {
        let current_tick = self.current_tick;
        let ticks_per_measure = f64::from(self.chart.header.ticks_per_measure);

        for slot in 0..self.tracks.len() {
            if self.playable_tracks.contains(&self.tracks[slot].index) {
                self.tracks[slot].seek_judge_cursor(current_tick);
            }
            self.tracks[slot].process_cursor = 0;
        }

        let mut tempo = 0.0;
        let mut played_millis = 0.0;
        let mut tick_interval_millis = 0.0;
        let mut mr_note: Option<(usize, usize)> = None;
        let mut mr_started_millis = -1.0;

        for tick in 0..current_tick {
            played_millis += tick_interval_millis;
            for (slot, track) in self.tracks.iter_mut().enumerate() {
                while let Some(note) = track.notes.get(track.process_cursor) {
                    if note.position > tick {
                        break;
                    }
                    match note.params {
                        NoteParams::Bpm { tempo: new_tempo } => {
                            tempo = f64::from(new_tempo);
                            tick_interval_millis = MEASURE_MILLIS / ticks_per_measure / tempo;
                        }
                        NoteParams::General(_) if track.kind == TrackKind::Mr => {
                            mr_note = Some((slot, track.process_cursor));
                            mr_started_millis = played_millis;
                        }
                        _ => {}
                    }
                    track.process_cursor += 1;
                }
            }
        }

        self.tempo = tempo;
        self.tick_interval_millis = tick_interval_millis;
        self.started_millis = -1.0;
        self.played_millis = played_millis;

        self.pending_resume = mr_note.filter(|_| mr_started_millis >= 0.0).map(
            |(slot, note)| PendingResume {
                slot,
                note,
                offset_millis: played_millis - mr_started_millis,
            },
        );
    }

    fn resume_event(&mut self, pending: PendingResume) -> Option<AudioEvent> {
        let track = &mut self.tracks[pending.slot];
        let params = track.notes.get(pending.note)?.general().copied()?;
        let channel = track.picker.pick()?;
        Some(AudioEvent::ResumeSound {
            track: track.index,
            channel,
            sound_index: params.sound_index,
            offset_millis: pending.offset_millis,
            level: SoundLevel::from_note(params.volume, params.pan).scaled(track.volume),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartHeader, GeneralParams, Note, SoundEntry, Track};
    use pretty_assertions::assert_eq;

    fn bpm(position: u32, tempo: f32) -> Note {
        Note {
            position,
            params: NoteParams::Bpm { tempo },
        }
    }

    fn volume(position: u32, volume: u8) -> Note {
        Note {
            position,
            params: NoteParams::Volume { volume },
        }
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

    fn empty_track() -> Track {
        Track {
            name: String::new(),
            ticks: 0,
            notes: vec![],
        }
    }

    // 240 ticks/measure at 125 BPM: exactly 8ms per tick.
    fn chart(slots: Vec<(usize, Vec<Note>)>) -> Chart {
        let track_count = slots.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
        let mut tracks: Vec<Track> = (0..track_count).map(|_| empty_track()).collect();
        for (index, notes) in slots {
            tracks[index] = Track {
                name: format!("track{index}"),
                ticks: 0,
                notes,
            };
        }
        Chart {
            header: ChartHeader {
                version_major: 1,
                version_minor: 0,
                ticks_per_measure: 240,
                master_bpm: 125.0,
                number_of_tracks: tracks.len() as u16,
                total_ticks: 100_000,
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

    fn durations(chart: &Chart) -> SoundDurations {
        SoundDurations::uniform(&chart.sounds, 10.0)
    }

    #[test]
    fn frame_advances_ticks_and_dispatches_background_sounds() {
        let chart = chart(vec![
            (0, vec![bpm(0, 125.0)]),
            (23, vec![general(0, 0), general(125, 0)]),
        ]);
        let sounds = durations(&chart);
        let mut sequencer = Sequencer::new(&chart, &sounds).unwrap();
        assert_eq!(sequencer.tick_interval_millis(), 8.0);

        sequencer.start();
        let first = sequencer.frame(1000.0);
        assert_eq!(sequencer.current_tick(), 0);
        assert_eq!(
            first.events,
            vec![AudioEvent::PlaySound {
                track: 23,
                channel: 0,
                sound_index: 1,
                level: SoundLevel::Mono(1.0),
            }]
        );

        let second = sequencer.frame(2000.0);
        assert_eq!(sequencer.current_tick(), 125);
        assert_eq!(sequencer.elapsed_millis(), 1000.0);
        assert_eq!(second.events.len(), 1);
    }

    #[test]
    fn volume_note_scales_future_triggers_only() {
        let chart = chart(vec![
            (0, vec![bpm(0, 125.0)]),
            (23, vec![general(0, 0), volume(24, 64), general(48, 0)]),
        ]);
        let sounds = durations(&chart);
        let mut sequencer = Sequencer::new(&chart, &sounds).unwrap();

        sequencer.start();
        let first = sequencer.frame(1000.0);
        let [AudioEvent::PlaySound { level, .. }] = first.events.as_slice() else {
            panic!("expected one sound, got {:?}", first.events);
        };
        assert_eq!(*level, SoundLevel::Mono(1.0));

        let second = sequencer.frame(1384.0);
        assert_eq!(sequencer.current_tick(), 48);
        let [AudioEvent::PlaySound { level, .. }] = second.events.as_slice() else {
            panic!("expected one sound, got {:?}", second.events);
        };
        assert_eq!(*level, SoundLevel::Mono(64.0 / 127.0));
    }

    #[test]
    fn playable_track_sounds_wait_for_key_input() {
        let chart = chart(vec![(0, vec![bpm(0, 125.0)]), (2, vec![general(50, 0)])]);
        let sounds = durations(&chart);
        let mut sequencer = Sequencer::new(&chart, &sounds).unwrap();
        sequencer.set_playable_tracks([2]);

        sequencer.start();
        sequencer.frame(0.0);
        let out = sequencer.frame(400.0);
        assert!(out.events.is_empty());
        assert_eq!(sequencer.current_tick(), 50);

        let response = sequencer.key_down(2);
        let result = response.result.unwrap();
        assert_eq!(result.grade, crate::play::Grade::Max100);
        assert_eq!(result.timing_diff_millis, 0.0);
        assert!(response.event.is_some());
    }

    #[test]
    fn missed_note_is_break_and_auto_play_suppresses_it() {
        let chart = chart(vec![(0, vec![bpm(0, 125.0)]), (2, vec![general(0, 0)])]);
        let sounds = durations(&chart);

        let mut judged = Sequencer::new(&chart, &sounds).unwrap();
        judged.set_playable_tracks([2]);
        judged.start();
        judged.frame(0.0);
        let out = judged.frame(400.0);
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].grade, crate::play::Grade::Break);
        assert_eq!(judged.note_state(2, 0), Some(NoteState::Failed));

        let mut auto = Sequencer::new(&chart, &sounds).unwrap();
        auto.set_playable_tracks([2]);
        auto.set_auto_play(true);
        auto.start();
        let first = auto.frame(0.0);
        assert_eq!(first.events.len(), 1);
        let out = auto.frame(400.0);
        assert!(out.results.is_empty());
        assert_eq!(auto.note_state(2, 0), Some(NoteState::Played));
    }

    #[test]
    fn pause_freezes_elapsed_time() {
        let chart = chart(vec![(0, vec![bpm(0, 125.0)])]);
        let sounds = durations(&chart);
        let mut sequencer = Sequencer::new(&chart, &sounds).unwrap();

        sequencer.start();
        sequencer.frame(0.0);
        sequencer.frame(1000.0);
        assert_eq!(sequencer.elapsed_millis(), 1000.0);

        assert_eq!(sequencer.pause(1200.0), Some(AudioEvent::PauseAll));
        assert!(!sequencer.is_playing());

        sequencer.resume();
        let out = sequencer.frame(2200.0);
        assert_eq!(out.events, vec![AudioEvent::ResumeAll]);
        assert_eq!(sequencer.elapsed_millis(), 1200.0);
    }

    #[test]
    fn seek_then_resume_replays_clock_state_and_resumes_background_music() {
        let chart = chart(vec![
            (0, vec![bpm(0, 125.0)]),
            (22, vec![general(0, 0)]),
            (23, vec![general(50, 0)]),
        ]);
        let sounds = durations(&chart);
        let mut sequencer = Sequencer::new(&chart, &sounds).unwrap();

        assert_eq!(sequencer.set_current_tick(100), None);
        sequencer.resume();
        assert_eq!(sequencer.tempo(), 125.0);
        assert_eq!(sequencer.current_tick(), 100);

        let out = sequencer.frame(10_000.0);
        // 99 accruing ticks of 8ms each were replayed.
        assert_eq!(sequencer.elapsed_millis(), 792.0);
        assert_eq!(
            out.events,
            vec![AudioEvent::ResumeSound {
                track: 22,
                channel: 0,
                sound_index: 1,
                offset_millis: 792.0,
                level: SoundLevel::Mono(1.0),
            }]
        );
        // The background note at tick 50 was passed over, not re-triggered.
        assert!(out.results.is_empty());
    }

    #[test]
    fn stop_returns_to_the_load_time_baseline() {
        let chart = chart(vec![(0, vec![bpm(0, 250.0)])]);
        let sounds = durations(&chart);
        let mut sequencer = Sequencer::new(&chart, &sounds).unwrap();

        sequencer.start();
        sequencer.frame(0.0);
        sequencer.frame(1000.0);
        assert_eq!(sequencer.tempo(), 250.0);
        assert!(sequencer.current_tick() > 0);

        assert_eq!(sequencer.stop(), Some(AudioEvent::StopAll));
        assert_eq!(sequencer.tempo(), 125.0);
        assert_eq!(sequencer.beat(), 4);
        assert_eq!(sequencer.current_tick(), 0);
        assert_eq!(sequencer.stop(), None);
    }

    #[test]
    fn precise_tick_carries_the_fractional_remainder() {
        let chart = chart(vec![(0, vec![bpm(0, 125.0)])]);
        let sounds = durations(&chart);
        let mut sequencer = Sequencer::new(&chart, &sounds).unwrap();

        sequencer.start();
        sequencer.frame(100.0);
        sequencer.frame(1104.0);
        assert_eq!(sequencer.current_tick(), 125);
        assert!((sequencer.current_tick_precise() - 125.5).abs() < 1e-9);
    }
}
