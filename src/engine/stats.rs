use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::progress::{StudyProgress, calendar_day};
use crate::session::result::QuizResult;

/// Running totals across every finished quiz.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyStats {
    pub total_words: usize,
    pub studied_words: usize,
    pub correct_answers: usize,
    pub total_answers: usize,
    /// Mean seconds spent per answered question.
    pub average_time: f64,
    pub streak_days: u32,
    pub last_study_date: Option<DateTime<Utc>>,
}

impl StudyStats {
    /// Fold a finished quiz into the previous totals (None on the first quiz).
    ///
    /// The streak grows by one whenever the quiz lands on a different calendar
    /// day than the last recorded study, stays put within the same day, and
    /// starts at 1 when nothing was recorded before. Days are taken on the
    /// calendar of `now`'s offset.
    pub fn after_quiz(
        previous: Option<&StudyStats>,
        result: &QuizResult,
        progress: StudyProgress,
        now: DateTime<FixedOffset>,
    ) -> StudyStats {
        let prev = previous.cloned().unwrap_or_default();

        let total_answers = prev.total_answers + result.total_questions;
        let average_time = if total_answers > 0 {
            (prev.average_time * prev.total_answers as f64 + result.elapsed_secs)
                / total_answers as f64
        } else {
            prev.average_time
        };

        let streak_days = match prev.last_study_date {
            Some(last) if calendar_day(last.with_timezone(now.offset())) == calendar_day(now) => {
                prev.streak_days
            }
            Some(_) => prev.streak_days + 1,
            None => 1,
        };

        StudyStats {
            total_words: progress.total,
            studied_words: progress.studied,
            correct_answers: prev.correct_answers + result.correct_answers,
            total_answers,
            average_time,
            streak_days,
            last_study_date: Some(now.with_timezone(&Utc)),
        }
    }

    /// Rounded percentage of correct answers, 0 before any answer.
    pub fn accuracy(&self) -> u32 {
        if self.total_answers == 0 {
            return 0;
        }
        (self.correct_answers as f64 / self.total_answers as f64 * 100.0).round() as u32
    }
}
