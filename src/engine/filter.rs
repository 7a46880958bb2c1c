use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::bookmarks::BookmarkSet;
use crate::words::{LevelFilter, Word};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    English,
    Korean,
    Level,
    LastStudied,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key `{0}` (expected english, korean, level or last-studied)")]
pub struct ParseSortKeyError(pub String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "english" => Ok(SortKey::English),
            "korean" => Ok(SortKey::Korean),
            "level" => Ok(SortKey::Level),
            "laststudied" => Ok(SortKey::LastStudied),
            _ => Err(ParseSortKeyError(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// View-scoped filter state for the word list. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub level: LevelFilter,
    pub bookmarked_only: bool,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

/// Search match: case-insensitive on the english headword, plain substring on
/// the korean meaning and the example sentence. A blank query matches everything.
pub fn matches_query(word: &Word, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    word.english.to_lowercase().contains(&query.to_lowercase())
        || word.korean.contains(query)
        || word.example.contains(query)
}

/// Text ordering used for the english and korean sort keys: case-folded first,
/// then by code point so the order is total.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_by(key: SortKey, a: &Word, b: &Word) -> Ordering {
    match key {
        SortKey::English => compare_text(&a.english, &b.english),
        SortKey::Korean => compare_text(&a.korean, &b.korean),
        SortKey::Level => a.level.cmp(&b.level),
        SortKey::LastStudied => a.last_studied_ms().cmp(&b.last_studied_ms()),
    }
}

/// Apply search, level and bookmark restrictions, then a stable sort.
pub fn filtered_words<'a>(
    words: &'a [Word],
    query: &str,
    filter: &FilterOptions,
    bookmarks: &BookmarkSet,
) -> Vec<&'a Word> {
    let mut filtered: Vec<&Word> = words
        .iter()
        .filter(|w| matches_query(w, query))
        .filter(|w| filter.level.matches(w.level))
        .filter(|w| !filter.bookmarked_only || bookmarks.contains(&w.id))
        .collect();

    filtered.sort_by(|a, b| {
        let ord = compare_by(filter.sort_by, a, b);
        match filter.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    filtered
}
