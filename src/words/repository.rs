use rust_embed::Embed;
use tracing::warn;

use crate::words::model::{Level, Word};

#[derive(Embed)]
#[folder = "assets/"]
struct SeedAssets;

const SEED_FILE: &str = "words.json";

/// Word counts of a word list, overall and per level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub total: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

/// The bundled seed vocabulary. Only consulted on first run and after a reset;
/// afterwards the persisted copy is the live data.
pub struct WordRepository {
    words: Vec<Word>,
}

impl WordRepository {
    pub fn load() -> Self {
        let words = SeedAssets::get(SEED_FILE)
            .and_then(|file| match serde_json::from_slice::<Vec<Word>>(&file.data) {
                Ok(words) => Some(words),
                Err(e) => {
                    warn!(error = %e, "bundled seed vocabulary is malformed");
                    None
                }
            })
            .unwrap_or_default();
        Self { words }
    }

    pub fn from_words(words: Vec<Word>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    pub fn by_level(&self, level: Level) -> Vec<&Word> {
        self.words.iter().filter(|w| w.level == level).collect()
    }

    pub fn level_counts(&self) -> LevelCounts {
        level_counts(&self.words)
    }

    pub fn find_by_english(&self, english: &str) -> Option<&Word> {
        self.words
            .iter()
            .find(|w| w.english.to_lowercase() == english.to_lowercase())
    }

    pub fn find_by_korean(&self, korean: &str) -> Vec<&Word> {
        self.words
            .iter()
            .filter(|w| w.korean.contains(korean))
            .collect()
    }
}

pub fn level_counts(words: &[Word]) -> LevelCounts {
    words.iter().fold(
        LevelCounts {
            total: words.len(),
            ..LevelCounts::default()
        },
        |mut counts, w| {
            match w.level {
                Level::Easy => counts.easy += 1,
                Level::Medium => counts.medium += 1,
                Level::Hard => counts.hard += 1,
            }
            counts
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_seed_loads_with_unique_ids() {
        let repo = WordRepository::load();
        assert!(repo.words().len() >= 100);
        let ids: HashSet<&str> = repo.words().iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids.len(), repo.words().len());
    }

    #[test]
    fn test_seed_words_are_unstudied() {
        let repo = WordRepository::load();
        assert!(repo.words().iter().all(|w| w.study_count == 0));
        assert!(repo.words().iter().all(|w| w.last_studied.is_none()));
    }

    #[test]
    fn test_level_counts_sum_to_total() {
        let counts = WordRepository::load().level_counts();
        assert_eq!(counts.easy + counts.medium + counts.hard, counts.total);
        assert!(counts.easy > 0 && counts.medium > 0 && counts.hard > 0);
    }

    #[test]
    fn test_find_by_english_is_case_insensitive() {
        let repo = WordRepository::load();
        let apple = repo.find_by_english("APPLE").unwrap();
        assert_eq!(apple.korean, "사과");
    }

    #[test]
    fn test_find_by_korean_substring() {
        let repo = WordRepository::from_words(vec![
            Word::new("a", "happy", "행복한", Level::Easy),
            Word::new("b", "happiness", "행복", Level::Medium),
            Word::new("c", "water", "물", Level::Easy),
        ]);
        let found: Vec<&str> = repo
            .find_by_korean("행복")
            .iter()
            .map(|w| w.id.as_str())
            .collect();
        assert_eq!(found, vec!["a", "b"]);
        assert_eq!(repo.by_level(Level::Easy).len(), 2);
    }
}
