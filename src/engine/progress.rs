use chrono::{DateTime, FixedOffset};

use crate::words::Word;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StudyProgress {
    pub total: usize,
    pub studied: usize,
    pub percentage: u32,
}

pub fn study_progress(words: &[Word]) -> StudyProgress {
    let total = words.len();
    let studied = words.iter().filter(|w| w.is_studied()).count();
    let percentage = if total > 0 {
        (studied as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };
    StudyProgress {
        total,
        studied,
        percentage,
    }
}

/// Day key such as "Sun Oct 18 2026", taken on the calendar of `at`'s offset.
/// Two instants share a calendar day exactly when their keys are equal.
pub fn calendar_day(at: DateTime<FixedOffset>) -> String {
    at.format("%a %b %d %Y").to_string()
}

/// Featured word for the day containing `today`: the sum of the day key's
/// character codes, modulo the word count.
pub fn word_of_the_day(words: &[Word], today: DateTime<FixedOffset>) -> Option<&Word> {
    if words.is_empty() {
        return None;
    }
    let seed: u64 = calendar_day(today).chars().map(|c| c as u64).sum();
    words.get((seed % words.len() as u64) as usize)
}
