use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::engine::bookmarks::BookmarkSet;
use crate::engine::filter::{self, FilterOptions};
use crate::engine::progress::{self, StudyProgress};
use crate::engine::review::{self, LevelAccuracy};
use crate::engine::stats::StudyStats;
use crate::session::quiz::{self, QuizError, QuizPhase, QuizSession};
use crate::session::result::QuizResult;
use crate::store::gateway::Gateway;
use crate::store::json_store::JsonStore;
use crate::store::kv::{KeyValueStore, StorageResult};
use crate::store::schema::{ExportData, NotificationSettings, Settings, ThemeMode};
use crate::words::repository::{LevelCounts, level_counts};
use crate::words::{LevelFilter, Word, WordId, WordRepository};

pub const LOAD_ERROR_MESSAGE: &str = "failed to load saved data";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// What happened to a submitted answer. `result` is set when the answer
/// completed the quiz.
#[derive(Clone, Debug)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_answer: String,
    pub result: Option<QuizResult>,
}

/// Owner of all in-memory app state.
///
/// Every mutating action updates memory first and then writes the affected
/// keys through the gateway. A failed write is logged and remembered in
/// `last_write_error`; the in-memory change is kept.
pub struct AppStore<S: KeyValueStore = JsonStore> {
    gateway: Gateway<S>,
    seed: Vec<Word>,
    words: Vec<Word>,
    study_stats: Option<StudyStats>,
    bookmarks: BookmarkSet,
    /// Newest first.
    quiz_results: Vec<QuizResult>,
    settings: Settings,
    status: LoadStatus,
    filter: FilterOptions,
    search_query: String,
    current_quiz: Option<QuizSession>,
    last_write_error: Option<String>,
    rng: SmallRng,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> AppStore<S> {
    pub fn new(kv: S) -> Self {
        let seed = WordRepository::load().into_words();
        Self {
            gateway: Gateway::new(kv),
            words: seed.clone(),
            seed,
            study_stats: None,
            bookmarks: BookmarkSet::new(),
            quiz_results: Vec::new(),
            settings: Settings::default(),
            status: LoadStatus::default(),
            filter: FilterOptions::default(),
            search_query: String::new(),
            current_quiz: None,
            last_write_error: None,
            rng: SmallRng::from_entropy(),
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the bundled seed vocabulary (used on first run and after a reset).
    pub fn with_seed_words(mut self, words: Vec<Word>) -> Self {
        self.words = words.clone();
        self.seed = words;
        self
    }

    pub fn with_rng(mut self, rng: SmallRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(SmallRng::seed_from_u64(seed))
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn gateway(&self) -> &Gateway<S> {
        &self.gateway
    }

    fn record_write(&mut self, key: &'static str, result: StorageResult<()>) {
        if let Err(e) = result {
            warn!(key, error = %e, "durable write failed, keeping in-memory state");
            self.last_write_error = Some(e.to_string());
        }
    }

    fn persist_words(&mut self) {
        let result = self.gateway.save_words(&self.words);
        self.record_write("words", result);
    }

    // --- data actions ---

    /// Bulk read of every key into memory. On the first run (no stored words)
    /// the seed vocabulary is written out.
    pub fn load_data(&mut self) -> StorageResult<()> {
        self.status = LoadStatus {
            loading: true,
            error: None,
        };

        let snapshot = match self.gateway.load_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "failed to load data");
                self.status = LoadStatus {
                    loading: false,
                    error: Some(LOAD_ERROR_MESSAGE.to_string()),
                };
                return Err(e);
            }
        };

        if snapshot.words.is_empty() {
            info!(words = self.seed.len(), "no stored words, seeding vocabulary");
            self.words = self.seed.clone();
            self.persist_words();
        } else {
            self.words = snapshot.words;
        }
        self.quiz_results = snapshot.quiz_results;
        self.study_stats = snapshot.study_stats;
        self.bookmarks = snapshot.bookmarks;
        self.settings = snapshot.settings;
        self.status.loading = false;
        debug!(
            words = self.words.len(),
            results = self.quiz_results.len(),
            "data loaded"
        );
        Ok(())
    }

    /// Returns true when `id` is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, id: &str) -> bool {
        let bookmarked = self.bookmarks.toggle(id);
        debug!(word_id = id, bookmarked, "toggled bookmark");
        let result = self.gateway.save_bookmarks(&self.bookmarks);
        self.record_write("bookmarks", result);
        bookmarked
    }

    /// Count one study of `id`. Returns false (and writes nothing) for an
    /// unknown id.
    pub fn update_word_study(&mut self, id: &str, is_correct: bool) -> bool {
        let now = self.clock.now();
        let Some(word) = self.words.iter_mut().find(|w| w.id == id) else {
            debug!(word_id = id, "study update for unknown word ignored");
            return false;
        };
        word.record_study(is_correct, now);
        self.persist_words();
        true
    }

    /// Prepend `result` to the history and fold it into the study stats.
    pub fn add_quiz_result(&mut self, result: QuizResult) {
        let offset = self.clock.offset_at(result.timestamp);
        let stats = StudyStats::after_quiz(
            self.study_stats.as_ref(),
            &result,
            progress::study_progress(&self.words),
            result.timestamp.with_timezone(&offset),
        );
        self.quiz_results.insert(0, result);
        self.study_stats = Some(stats);

        let saved = self.gateway.save_quiz_results(&self.quiz_results);
        self.record_write("quiz_results", saved);
        if let Some(stats) = &self.study_stats {
            let saved = self.gateway.save_study_stats(stats);
            self.record_write("study_stats", saved);
        }
    }

    /// Delete every stored key and go back to the seed vocabulary.
    pub fn clear_all_data(&mut self) {
        let result = self.gateway.clear_all();
        self.record_write("*", result);
        self.words = self.seed.clone();
        self.study_stats = None;
        self.bookmarks = BookmarkSet::new();
        self.quiz_results.clear();
        self.settings = Settings::default();
        self.current_quiz = None;
        info!("reset to seed vocabulary");
    }

    pub fn export_data(&self) -> ExportData {
        self.gateway.export_all(self.clock.now())
    }

    /// Write a backup bundle to storage and reload memory from it.
    pub fn import_data(&mut self, data: &ExportData) -> StorageResult<()> {
        self.gateway.import_all(data)?;
        self.current_quiz = None;
        self.load_data()
    }

    // --- settings ---

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.settings.theme = theme;
        let result = self.gateway.save_theme(theme);
        self.record_write("theme", result);
    }

    pub fn set_notification_settings(&mut self, notifications: NotificationSettings) {
        let result = self.gateway.save_notifications(&notifications);
        self.settings.notifications = notifications;
        self.record_write("notifications", result);
    }

    // --- view state ---

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn last_write_error(&self) -> Option<&str> {
        self.last_write_error.as_deref()
    }

    pub fn clear_write_error(&mut self) {
        self.last_write_error = None;
    }

    pub fn filter_options(&self) -> FilterOptions {
        self.filter
    }

    pub fn set_filter_options(&mut self, filter: FilterOptions) {
        self.filter = filter;
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    // --- quiz ---

    /// Generate a new question set, replacing any previous quiz.
    pub fn start_quiz(
        &mut self,
        level: LevelFilter,
        count: usize,
    ) -> Result<&QuizSession, QuizError> {
        let questions = quiz::generate_questions(&self.words, level, count, &mut self.rng)?;
        info!(%level, questions = questions.len(), "quiz started");
        let session = QuizSession::new(level, questions, self.clock.now());
        Ok(&*self.current_quiz.insert(session))
    }

    /// Answer the current question. Answering the last one finishes the quiz.
    pub fn answer_question(&mut self, answer: &str) -> Result<AnswerOutcome, QuizError> {
        let session = self.current_quiz.as_mut().ok_or(QuizError::NoActiveQuiz)?;
        let correct_answer = session
            .current_question()
            .map(|q| q.correct_answer.clone())
            .ok_or(QuizError::AlreadyFinished)?;
        let is_correct = session.answer(answer)?;
        debug!(index = session.current_index, is_correct, "answer recorded");

        let result = if session.is_complete() {
            Some(self.finish_quiz()?)
        } else {
            None
        };
        Ok(AnswerOutcome {
            is_correct,
            correct_answer,
            result,
        })
    }

    /// Score the current quiz, update each asked word's study record, append
    /// the result to the history and update the study stats.
    pub fn finish_quiz(&mut self) -> Result<QuizResult, QuizError> {
        let now = self.clock.now();
        let session = self.current_quiz.as_mut().ok_or(QuizError::NoActiveQuiz)?;
        session.finish(now)?;
        let result = QuizResult::from_session(session, now);

        for answer in &result.answers {
            if let Some(word) = self.words.iter_mut().find(|w| w.id == answer.word_id) {
                word.record_study(answer.is_correct, now);
            }
        }
        self.persist_words();
        self.add_quiz_result(result.clone());

        info!(
            correct = result.correct_answers,
            total = result.total_questions,
            "quiz finished"
        );
        Ok(result)
    }

    pub fn quiz_phase(&self) -> QuizPhase {
        self.current_quiz
            .as_ref()
            .map(QuizSession::phase)
            .unwrap_or(QuizPhase::Idle)
    }

    pub fn current_quiz(&self) -> Option<&QuizSession> {
        self.current_quiz.as_ref()
    }

    // --- derived views ---

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word(&self, id: &str) -> Option<&Word> {
        self.words.iter().find(|w| w.id == id)
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.bookmarks.contains(id)
    }

    pub fn bookmarks(&self) -> &BookmarkSet {
        &self.bookmarks
    }

    pub fn filtered_words(&self) -> Vec<&Word> {
        filter::filtered_words(&self.words, &self.search_query, &self.filter, &self.bookmarks)
    }

    pub fn bookmarked_words(&self) -> Vec<&Word> {
        review::bookmarked_words(&self.words, &self.bookmarks)
    }

    pub fn wrong_answer_ids(&self) -> Vec<WordId> {
        review::wrong_answer_ids(&self.quiz_results)
    }

    pub fn wrong_answer_words(&self) -> Vec<&Word> {
        review::wrong_answer_words(&self.words, &self.quiz_results)
    }

    pub fn word_of_the_day(&self) -> Option<&Word> {
        progress::word_of_the_day(&self.words, self.clock.local_now())
    }

    pub fn study_progress(&self) -> StudyProgress {
        progress::study_progress(&self.words)
    }

    pub fn study_stats(&self) -> Option<&StudyStats> {
        self.study_stats.as_ref()
    }

    pub fn quiz_results(&self) -> &[QuizResult] {
        &self.quiz_results
    }

    pub fn recent_results(&self, n: usize) -> &[QuizResult] {
        &self.quiz_results[..n.min(self.quiz_results.len())]
    }

    pub fn level_accuracy(&self) -> LevelAccuracy {
        review::level_accuracy(&self.quiz_results)
    }

    pub fn level_counts(&self) -> LevelCounts {
        level_counts(&self.words)
    }
}
