//! Grades, results and the concentric timing windows.

use super::UNIT_JUDGE_MILLIS;

/// Grade of one judged note. The numeric value doubles as the note's
/// accuracy contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Grade {
    /// Hit within one unit window.
    Max100 = 100,
    /// Hit within two unit windows.
    Max90 = 90,
    /// Hit within three unit windows, or held too long.
    Max1 = 1,
    /// Missed or released far too early; resets the combo.
    Break = 0,
}

impl Grade {
    /// The grade's accuracy value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }
}

/// Why a note was failed (or down-graded) without a clean resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailReason {
    /// The note was never pressed within its window.
    TooLateToStart,
    /// A long note was held past its judgeable end.
    TooLateToFinish,
    /// A long note was released far before its end.
    TooEarlyToFinish,
}

/// The outcome of judging one note.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayResult {
    /// The awarded grade.
    pub grade: Grade,
    /// Signed offset in milliseconds from the judged position (start for
    /// presses and missed notes, end for releases); positive means late.
    pub timing_diff_millis: f64,
    /// The failure that produced this result, if any.
    pub reason: Option<FailReason>,
}

/// The three concentric judgment windows, derived from one base tolerance.
///
/// A press within 1x the unit is [`Grade::Max100`], within 2x [`Grade::Max90`],
/// within 3x [`Grade::Max1`]. Anything beyond 3x is outside the window: an
/// early press is ignored outright, a late note is auto-failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeWindow {
    unit_millis: f64,
}

impl Default for JudgeWindow {
    fn default() -> Self {
        Self::new(UNIT_JUDGE_MILLIS)
    }
}

impl JudgeWindow {
    /// A window set with the given base tolerance.
    #[must_use]
    pub const fn new(unit_millis: f64) -> Self {
        Self { unit_millis }
    }

    /// The base tolerance in milliseconds.
    #[must_use]
    pub const fn unit_millis(&self) -> f64 {
        self.unit_millis
    }

    /// Grade a press by its absolute distance from the note position, or
    /// `None` outside all three windows.
    #[must_use]
    pub fn classify(&self, diff_millis: f64) -> Option<Grade> {
        let distance = diff_millis.abs();
        if distance < self.unit_millis {
            Some(Grade::Max100)
        } else if distance < 2.0 * self.unit_millis {
            Some(Grade::Max90)
        } else if distance < 3.0 * self.unit_millis {
            Some(Grade::Max1)
        } else {
            None
        }
    }

    /// Whether a signed offset lies beyond the outermost window.
    ///
    /// Used in every direction: a press this early is ignored, a start this
    /// late is auto-failed, a release this early BREAKs, a hold this late is
    /// auto-finished.
    #[must_use]
    pub fn exceeds_limit(&self, diff_millis: f64) -> bool {
        diff_millis > 3.0 * self.unit_millis
    }
}
