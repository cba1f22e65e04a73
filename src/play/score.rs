//! Running score aggregation over play results.

use super::judge::{Grade, PlayResult};

/// Accumulates judged results into combo, accuracy and per-grade counts.
///
/// Every operation is O(1). The board carries no reference to the chart;
/// reset it whenever playback restarts or the chart changes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreBoard {
    result_count: u32,
    combo: u32,
    average_accuracy: f64,
    max100_count: u32,
    max90_count: u32,
    max1_count: u32,
    break_count: u32,
}

impl ScoreBoard {
    /// An empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one result into the running totals.
    pub fn record(&mut self, result: &PlayResult) {
        self.result_count += 1;

        let count = f64::from(self.result_count);
        self.average_accuracy = self.average_accuracy * (count - 1.0) / count
            + f64::from(result.grade.value()) / count;

        match result.grade {
            Grade::Break => {
                self.combo = 0;
                self.break_count += 1;
            }
            Grade::Max100 => {
                self.combo += 1;
                self.max100_count += 1;
            }
            Grade::Max90 => {
                self.combo += 1;
                self.max90_count += 1;
            }
            Grade::Max1 => {
                self.combo += 1;
                self.max1_count += 1;
            }
        }
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Total number of recorded results.
    #[must_use]
    pub const fn result_count(&self) -> u32 {
        self.result_count
    }

    /// Current combo: consecutive non-BREAK results.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Running mean of the grade values, 0.0 when nothing was recorded.
    #[must_use]
    pub const fn average_accuracy(&self) -> f64 {
        self.average_accuracy
    }

    /// How many results carried `grade`.
    #[must_use]
    pub const fn count_of(&self, grade: Grade) -> u32 {
        match grade {
            Grade::Max100 => self.max100_count,
            Grade::Max90 => self.max90_count,
            Grade::Max1 => self.max1_count,
            Grade::Break => self.break_count,
        }
    }
}
