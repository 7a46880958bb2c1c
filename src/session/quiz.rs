use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::words::{LevelFilter, Word};

pub const OPTION_COUNT: usize = 4;
const DISTRACTOR_COUNT: usize = OPTION_COUNT - 1;

pub const DEFAULT_QUESTION_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("no words available for level `{level}`")]
    EmptyPool { level: LevelFilter },
    #[error("a quiz needs at least {required} distinct meanings, only {available} available")]
    InsufficientMeanings { available: usize, required: usize },
    #[error("a quiz needs at least one question")]
    ZeroQuestions,
    #[error("no quiz has been started")]
    NoActiveQuiz,
    #[error("the current quiz is already finished")]
    AlreadyFinished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    InProgress,
    Finished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuizQuestion {
    pub word: Word,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

/// One run through a generated question set. Answers are append-only: each
/// recorded answer belongs to the question at the same index.
#[derive(Clone, Debug)]
pub struct QuizSession {
    pub level: LevelFilter,
    pub questions: Vec<QuizQuestion>,
    pub answers: Vec<String>,
    pub current_index: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new(
        level: LevelFilter,
        questions: Vec<QuizQuestion>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            level,
            questions,
            answers: Vec::new(),
            current_index: 0,
            started_at,
            finished_at: None,
        }
    }

    pub fn phase(&self) -> QuizPhase {
        if self.finished_at.is_some() {
            QuizPhase::Finished
        } else {
            QuizPhase::InProgress
        }
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        if self.finished_at.is_some() {
            return None;
        }
        self.questions.get(self.current_index)
    }

    /// All questions have an answer.
    pub fn is_complete(&self) -> bool {
        self.answers.len() >= self.questions.len()
    }

    /// Record `answer` for the current question and advance. Returns whether it
    /// was correct.
    pub fn answer(&mut self, answer: &str) -> Result<bool, QuizError> {
        if self.finished_at.is_some() {
            return Err(QuizError::AlreadyFinished);
        }
        let question = self
            .questions
            .get(self.current_index)
            .ok_or(QuizError::AlreadyFinished)?;
        let correct = question.is_correct(answer);
        self.answers.push(answer.to_string());
        self.current_index += 1;
        Ok(correct)
    }

    pub fn finish(&mut self, at: DateTime<Utc>) -> Result<(), QuizError> {
        if self.finished_at.is_some() {
            return Err(QuizError::AlreadyFinished);
        }
        self.finished_at = Some(at);
        Ok(())
    }

    pub fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .zip(&self.questions)
            .filter(|(answer, q)| q.is_correct(answer))
            .count()
    }

    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.answers.len() as f64 / self.questions.len() as f64
    }
}

fn distinct_meanings(words: &[Word]) -> usize {
    words
        .iter()
        .map(|w| w.korean.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn build_question<R: Rng + ?Sized>(word: &Word, words: &[Word], rng: &mut R) -> QuizQuestion {
    let mut seen = HashSet::new();
    let candidates: Vec<&str> = words
        .iter()
        .filter(|w| w.id != word.id && w.korean != word.korean)
        .map(|w| w.korean.as_str())
        .filter(|k| seen.insert(*k))
        .collect();

    let mut options: Vec<String> = candidates
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .map(|k| k.to_string())
        .collect();
    options.push(word.korean.clone());
    options.shuffle(rng);

    QuizQuestion {
        word: word.clone(),
        options,
        correct_answer: word.korean.clone(),
    }
}

/// Draw up to `count` words from the `level` pool without replacement and build
/// a question for each. Distractors come from the whole word list.
pub fn generate_questions<R: Rng + ?Sized>(
    words: &[Word],
    level: LevelFilter,
    count: usize,
    rng: &mut R,
) -> Result<Vec<QuizQuestion>, QuizError> {
    if count == 0 {
        return Err(QuizError::ZeroQuestions);
    }
    let available = distinct_meanings(words);
    if available < OPTION_COUNT {
        return Err(QuizError::InsufficientMeanings {
            available,
            required: OPTION_COUNT,
        });
    }

    let mut pool: Vec<&Word> = words.iter().filter(|w| level.matches(w.level)).collect();
    if pool.is_empty() {
        return Err(QuizError::EmptyPool { level });
    }
    pool.shuffle(rng);
    pool.truncate(count);

    Ok(pool
        .into_iter()
        .map(|word| build_question(word, words, rng))
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::words::Level;

    fn words(n: usize) -> Vec<Word> {
        (0..n)
            .map(|i| {
                let level = if i % 2 == 0 { Level::Easy } else { Level::Hard };
                Word::new(format!("w{i}"), format!("word{i}"), format!("뜻{i}"), level)
            })
            .collect()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_generates_requested_count_with_four_distinct_options() {
        let list = words(12);
        let mut rng = SmallRng::seed_from_u64(7);
        let questions = generate_questions(&list, LevelFilter::All, 5, &mut rng).unwrap();
        assert_eq!(questions.len(), 5);
        for q in &questions {
            assert_eq!(q.options.len(), OPTION_COUNT);
            let unique: HashSet<&String> = q.options.iter().collect();
            assert_eq!(unique.len(), OPTION_COUNT);
            assert_eq!(q.options.iter().filter(|o| **o == q.correct_answer).count(), 1);
            assert_eq!(q.correct_answer, q.word.korean);
        }
        let ids: HashSet<&str> = questions.iter().map(|q| q.word.id.as_str()).collect();
        assert_eq!(ids.len(), 5, "questions are drawn without replacement");
    }

    #[test]
    fn test_count_is_capped_by_level_pool() {
        let list = words(10);
        let mut rng = SmallRng::seed_from_u64(1);
        let questions = generate_questions(&list, LevelFilter::Hard, 20, &mut rng).unwrap();
        assert_eq!(questions.len(), 5);
        assert!(questions.iter().all(|q| q.word.level == Level::Hard));
    }

    #[test]
    fn test_distractors_skip_duplicate_meanings() {
        let mut list = words(4);
        list.push(Word::new("dup", "another", "뜻0", Level::Medium));
        let mut rng = SmallRng::seed_from_u64(3);
        let questions = generate_questions(&list, LevelFilter::Medium, 1, &mut rng).unwrap();
        let q = &questions[0];
        let unique: HashSet<&String> = q.options.iter().collect();
        assert_eq!(unique.len(), OPTION_COUNT);
        assert_eq!(q.options.iter().filter(|o| o.as_str() == "뜻0").count(), 1);
    }

    #[test]
    fn test_rejects_pool_with_too_few_meanings() {
        let list = words(3);
        let mut rng = SmallRng::seed_from_u64(0);
        let err = generate_questions(&list, LevelFilter::All, 3, &mut rng).unwrap_err();
        assert_eq!(
            err,
            QuizError::InsufficientMeanings {
                available: 3,
                required: 4
            }
        );
    }

    #[test]
    fn test_rejects_empty_level_pool_and_zero_count() {
        let list = words(6);
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(
            generate_questions(&list, LevelFilter::Medium, 3, &mut rng).unwrap_err(),
            QuizError::EmptyPool {
                level: LevelFilter::Medium
            }
        );
        assert_eq!(
            generate_questions(&list, LevelFilter::All, 0, &mut rng).unwrap_err(),
            QuizError::ZeroQuestions
        );
    }

    #[test]
    fn test_same_seed_same_quiz() {
        let list = words(20);
        let a = generate_questions(&list, LevelFilter::All, 6, &mut SmallRng::seed_from_u64(42))
            .unwrap();
        let b = generate_questions(&list, LevelFilter::All, 6, &mut SmallRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_session_answers_advance_and_lock_after_finish() {
        let list = words(8);
        let questions =
            generate_questions(&list, LevelFilter::All, 2, &mut SmallRng::seed_from_u64(5))
                .unwrap();
        let mut session = QuizSession::new(LevelFilter::All, questions, t0());
        assert_eq!(session.phase(), QuizPhase::InProgress);

        let first = session.current_question().unwrap().correct_answer.clone();
        assert!(session.answer(&first).unwrap());
        assert_eq!(session.current_index, 1);
        assert!(!session.answer("wrong").unwrap());
        assert!(session.is_complete());
        assert_eq!(session.correct_count(), 1);

        // Past the last question there is nothing left to answer.
        assert_eq!(session.answer("late"), Err(QuizError::AlreadyFinished));

        session.finish(t0()).unwrap();
        assert_eq!(session.phase(), QuizPhase::Finished);
        assert!(session.current_question().is_none());
        assert_eq!(session.finish(t0()), Err(QuizError::AlreadyFinished));
    }
}
