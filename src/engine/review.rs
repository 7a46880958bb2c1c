use std::collections::{HashMap, HashSet};

use crate::engine::bookmarks::BookmarkSet;
use crate::session::result::QuizResult;
use crate::words::{ALL_LEVELS, Level, Word, WordId};

/// Bookmarked words in word-list order.
pub fn bookmarked_words<'a>(words: &'a [Word], bookmarks: &BookmarkSet) -> Vec<&'a Word> {
    words.iter().filter(|w| bookmarks.contains(&w.id)).collect()
}

/// Ids answered incorrectly anywhere in `results`, first occurrence wins.
pub fn wrong_answer_ids(results: &[QuizResult]) -> Vec<WordId> {
    let mut seen = HashSet::new();
    results
        .iter()
        .flat_map(|r| r.answers.iter())
        .filter(|a| !a.is_correct)
        .filter(|a| seen.insert(a.word_id.clone()))
        .map(|a| a.word_id.clone())
        .collect()
}

/// Words answered incorrectly across the result history, deduplicated by id in
/// history order. Each id resolves to the live word when it still exists so
/// study metadata is current; otherwise the copy stored in the result is used.
pub fn wrong_answer_words<'a>(words: &'a [Word], results: &'a [QuizResult]) -> Vec<&'a Word> {
    let live: HashMap<&str, &Word> = words.iter().map(|w| (w.id.as_str(), w)).collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for snapshot in results.iter().flat_map(QuizResult::wrong_words) {
        if !seen.insert(snapshot.id.as_str()) {
            continue;
        }
        out.push(live.get(snapshot.id.as_str()).copied().unwrap_or(snapshot));
    }
    out
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelAccuracy {
    pub easy: Option<u32>,
    pub medium: Option<u32>,
    pub hard: Option<u32>,
}

impl LevelAccuracy {
    pub fn get(&self, level: Level) -> Option<u32> {
        match level {
            Level::Easy => self.easy,
            Level::Medium => self.medium,
            Level::Hard => self.hard,
        }
    }
}

/// Rounded percentage of correct answers per word level over all results.
/// A level with no answers has no accuracy.
pub fn level_accuracy(results: &[QuizResult]) -> LevelAccuracy {
    let mut tally: HashMap<Level, (usize, usize)> = HashMap::new();
    for result in results {
        for (word, answer) in result.questions.iter().zip(&result.answers) {
            let entry = tally.entry(word.level).or_default();
            entry.1 += 1;
            if answer.is_correct {
                entry.0 += 1;
            }
        }
    }

    let pct = |level: Level| {
        tally
            .get(&level)
            .filter(|(_, total)| *total > 0)
            .map(|(correct, total)| (*correct as f64 / *total as f64 * 100.0).round() as u32)
    };

    let mut acc = LevelAccuracy::default();
    for level in ALL_LEVELS {
        let value = pct(level);
        match level {
            Level::Easy => acc.easy = value,
            Level::Medium => acc.medium = value,
            Level::Hard => acc.hard = value,
        }
    }
    acc
}
