use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::engine::bookmarks::BookmarkSet;
use crate::engine::stats::StudyStats;
use crate::session::result::QuizResult;
use crate::store::kv::{KeyValueStore, StorageError, StorageResult};
use crate::store::schema::{
    ALL_KEYS, BOOKMARKS_KEY, EXPORT_VERSION, ExportData, NOTIFICATIONS_KEY, NotificationSettings,
    QUIZ_RESULTS_KEY, STUDY_STATS_KEY, Settings, THEME_KEY, ThemeMode, WORDS_KEY,
};
use crate::words::Word;

/// Everything the app keeps durably, read in one pass.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub words: Vec<Word>,
    pub quiz_results: Vec<QuizResult>,
    pub study_stats: Option<StudyStats>,
    pub bookmarks: BookmarkSet,
    pub settings: Settings,
}

/// Typed access to the key space. The only component that reads or writes
/// durable state.
///
/// The `load_*` accessors never fail: a backend error or an unparsable
/// document is logged and replaced by the empty value. `load_snapshot` is the
/// strict variant and surfaces backend errors.
pub struct Gateway<S> {
    kv: S,
}

impl<S: KeyValueStore> Gateway<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Backend errors propagate; a corrupt document reads as absent.
    fn read<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(raw) = self.kv.get_item(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "stored document is unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(key, error = %e, "storage read failed, using default");
                T::default()
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.kv.set_item(key, &json)
    }

    pub fn load_snapshot(&self) -> StorageResult<Snapshot> {
        let snapshot = Snapshot {
            words: self.read(WORDS_KEY)?.unwrap_or_default(),
            quiz_results: self.read(QUIZ_RESULTS_KEY)?.unwrap_or_default(),
            study_stats: self.read::<Option<StudyStats>>(STUDY_STATS_KEY)?.flatten(),
            bookmarks: self.read(BOOKMARKS_KEY)?.unwrap_or_default(),
            settings: Settings {
                theme: self.read(THEME_KEY)?.unwrap_or_default(),
                notifications: self.read(NOTIFICATIONS_KEY)?.unwrap_or_default(),
            },
        };
        debug!(
            words = snapshot.words.len(),
            results = snapshot.quiz_results.len(),
            bookmarks = snapshot.bookmarks.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    pub fn load_words(&self) -> Vec<Word> {
        self.read_or_default(WORDS_KEY)
    }

    pub fn save_words(&self, words: &[Word]) -> StorageResult<()> {
        self.write(WORDS_KEY, words)
    }

    pub fn load_quiz_results(&self) -> Vec<QuizResult> {
        self.read_or_default(QUIZ_RESULTS_KEY)
    }

    pub fn save_quiz_results(&self, results: &[QuizResult]) -> StorageResult<()> {
        self.write(QUIZ_RESULTS_KEY, results)
    }

    pub fn load_study_stats(&self) -> Option<StudyStats> {
        self.read_or_default(STUDY_STATS_KEY)
    }

    pub fn save_study_stats(&self, stats: &StudyStats) -> StorageResult<()> {
        self.write(STUDY_STATS_KEY, stats)
    }

    pub fn load_bookmarks(&self) -> BookmarkSet {
        self.read_or_default(BOOKMARKS_KEY)
    }

    pub fn save_bookmarks(&self, bookmarks: &BookmarkSet) -> StorageResult<()> {
        self.write(BOOKMARKS_KEY, bookmarks)
    }

    pub fn load_theme(&self) -> ThemeMode {
        self.read_or_default(THEME_KEY)
    }

    pub fn save_theme(&self, theme: ThemeMode) -> StorageResult<()> {
        self.write(THEME_KEY, &theme)
    }

    pub fn load_notifications(&self) -> NotificationSettings {
        self.read_or_default(NOTIFICATIONS_KEY)
    }

    pub fn save_notifications(&self, settings: &NotificationSettings) -> StorageResult<()> {
        self.write(NOTIFICATIONS_KEY, settings)
    }

    /// Remove every key the app owns in one call.
    pub fn clear_all(&self) -> StorageResult<()> {
        self.kv.multi_remove(&ALL_KEYS)?;
        info!("cleared all stored data");
        Ok(())
    }

    pub fn export_all(&self, exported_at: DateTime<Utc>) -> ExportData {
        ExportData {
            wordbook_export_version: EXPORT_VERSION,
            exported_at,
            words: self.load_words(),
            quiz_results: self.load_quiz_results(),
            study_stats: self.load_study_stats(),
            bookmarks: self.load_bookmarks(),
            theme: self.load_theme(),
            notifications: self.load_notifications(),
        }
    }

    /// Replace every key with the bundle's contents in one multi-key commit.
    /// Either every key is replaced or none is.
    pub fn import_all(&self, data: &ExportData) -> StorageResult<()> {
        if data.wordbook_export_version != EXPORT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: data.wordbook_export_version,
                expected: EXPORT_VERSION,
            });
        }

        let encode = |key: &'static str, value: Result<String, serde_json::Error>| {
            value.map_err(|source| StorageError::Serialize {
                key: key.to_string(),
                source,
            })
        };

        // A bundle without stats stores `null`, which reads back as absent.
        let entries: Vec<(&str, String)> = vec![
            (WORDS_KEY, encode(WORDS_KEY, serde_json::to_string(&data.words))?),
            (
                QUIZ_RESULTS_KEY,
                encode(QUIZ_RESULTS_KEY, serde_json::to_string(&data.quiz_results))?,
            ),
            (BOOKMARKS_KEY, encode(BOOKMARKS_KEY, serde_json::to_string(&data.bookmarks))?),
            (THEME_KEY, encode(THEME_KEY, serde_json::to_string(&data.theme))?),
            (
                NOTIFICATIONS_KEY,
                encode(NOTIFICATIONS_KEY, serde_json::to_string(&data.notifications))?,
            ),
            (
                STUDY_STATS_KEY,
                encode(STUDY_STATS_KEY, serde_json::to_string(&data.study_stats))?,
            ),
        ];

        self.kv.set_many(&entries)?;
        info!(
            words = data.words.len(),
            results = data.quiz_results.len(),
            "imported backup"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;
    use crate::store::json_store::JsonStore;
    use crate::store::kv::MemoryStore;
    use crate::words::Level;

    fn gateway() -> (MemoryStore, Gateway<MemoryStore>) {
        let mem = MemoryStore::new();
        (mem.clone(), Gateway::new(mem))
    }

    #[test]
    fn test_empty_store_loads_defaults() {
        let (_mem, gw) = gateway();
        let snapshot = gw.load_snapshot().unwrap();
        assert!(snapshot.words.is_empty());
        assert!(snapshot.study_stats.is_none());
        assert_eq!(snapshot.settings, Settings::default());
    }

    #[test]
    fn test_words_round_trip_as_camel_case_array() {
        let (mem, gw) = gateway();
        let mut word = Word::new("word_1", "apple", "사과", Level::Easy);
        word.study_count = 2;
        gw.save_words(&[word.clone()]).unwrap();
        assert!(mem.raw(WORDS_KEY).unwrap().contains("\"studyCount\":2"));
        assert_eq!(gw.load_words(), vec![word]);
    }

    #[test]
    fn test_corrupt_document_falls_back() {
        let (mem, gw) = gateway();
        mem.set_item(BOOKMARKS_KEY, "{not json").unwrap();
        assert!(gw.load_bookmarks().is_empty());
        assert!(gw.load_snapshot().unwrap().bookmarks.is_empty());
    }

    #[test]
    fn test_read_failure_falls_back_but_snapshot_errors() {
        let (mem, gw) = gateway();
        gw.save_theme(ThemeMode::Dark).unwrap();
        mem.set_fail_reads(true);
        assert_eq!(gw.load_theme(), ThemeMode::Auto);
        assert!(gw.load_snapshot().is_err());
    }

    #[test]
    fn test_clear_all_removes_every_key() {
        let (mem, gw) = gateway();
        gw.save_words(&[]).unwrap();
        gw.save_bookmarks(&BookmarkSet::new()).unwrap();
        gw.save_theme(ThemeMode::Light).unwrap();
        gw.save_notifications(&NotificationSettings::default()).unwrap();
        gw.clear_all().unwrap();
        for key in ALL_KEYS {
            assert!(!mem.contains(key), "{key} should be gone");
        }
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let (_mem, gw) = gateway();
        let mut bookmarks = BookmarkSet::new();
        bookmarks.toggle("word_9");
        gw.save_words(&[Word::new("word_9", "tree", "나무", Level::Easy)]).unwrap();
        gw.save_bookmarks(&bookmarks).unwrap();
        gw.save_theme(ThemeMode::Dark).unwrap();

        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let export = gw.export_all(at);
        assert_eq!(export.wordbook_export_version, EXPORT_VERSION);

        let (_mem2, gw2) = gateway();
        gw2.import_all(&export).unwrap();
        assert_eq!(gw2.load_words().len(), 1);
        assert!(gw2.load_bookmarks().contains("word_9"));
        assert_eq!(gw2.load_theme(), ThemeMode::Dark);
        assert!(gw2.load_study_stats().is_none());
    }

    #[test]
    fn test_import_without_stats_clears_stored_stats() {
        let (mem, gw) = gateway();
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let export = gw.export_all(at);
        gw.save_study_stats(&StudyStats {
            total_answers: 42,
            ..StudyStats::default()
        })
        .unwrap();

        gw.import_all(&export).unwrap();
        assert_eq!(mem.raw(STUDY_STATS_KEY).as_deref(), Some("null"));
        assert!(gw.load_study_stats().is_none());
        assert!(gw.load_snapshot().unwrap().study_stats.is_none());
    }

    #[test]
    fn test_failed_import_keeps_existing_stats() {
        let dir = TempDir::new().unwrap();
        let gw = Gateway::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
        gw.save_study_stats(&StudyStats {
            total_answers: 42,
            ..StudyStats::default()
        })
        .unwrap();
        let export = ExportData {
            study_stats: None,
            ..gw.export_all(Utc::now())
        };

        // A directory in the way of the staged words file fails the commit.
        fs::create_dir_all(dir.path().join("words.json.tmp")).unwrap();
        let err = gw.import_all(&export).unwrap_err();
        assert!(matches!(err, StorageError::Import { stage: "staging", .. }));
        assert_eq!(gw.load_study_stats().unwrap().total_answers, 42);
    }

    #[test]
    fn test_import_rejects_unknown_version() {
        let (_mem, gw) = gateway();
        let mut export = gw.export_all(Utc::now());
        export.wordbook_export_version = 99;
        let err = gw.import_all(&export).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unsupported export version"));
        assert!(msg.contains("99"));
    }
}
