use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::quiz::QuizSession;
use crate::words::{LevelFilter, Word, WordId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub word_id: WordId,
    /// None when the quiz was finished before this question was reached.
    #[serde(default)]
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Immutable record of a finished quiz. `questions[i]` is the word asked and
/// `answers[i]` what happened to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub level: LevelFilter,
    pub questions: Vec<Word>,
    pub answers: Vec<AnswerRecord>,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    #[serde(default)]
    pub elapsed_secs: f64,
}

impl QuizResult {
    pub fn from_session(session: &QuizSession, finished_at: DateTime<Utc>) -> Self {
        let answers: Vec<AnswerRecord> = session
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let user_answer = session.answers.get(i).cloned();
                let is_correct = user_answer
                    .as_deref()
                    .is_some_and(|a| q.is_correct(a));
                AnswerRecord {
                    word_id: q.word.id.clone(),
                    user_answer,
                    correct_answer: q.correct_answer.clone(),
                    is_correct,
                }
            })
            .collect();

        let total_questions = answers.len();
        let correct_answers = answers.iter().filter(|a| a.is_correct).count();
        let elapsed_secs = (finished_at - session.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Self {
            id: finished_at.timestamp_millis().to_string(),
            timestamp: finished_at,
            level: session.level,
            questions: session.questions.iter().map(|q| q.word.clone()).collect(),
            answers,
            total_questions,
            correct_answers,
            wrong_answers: total_questions - correct_answers,
            elapsed_secs,
        }
    }

    /// Percentage of correct answers, rounded.
    pub fn accuracy(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        (self.correct_answers as f64 / self.total_questions as f64 * 100.0).round() as u32
    }

    /// Words answered incorrectly, in question order.
    pub fn wrong_words(&self) -> impl Iterator<Item = &Word> {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(_, a)| !a.is_correct)
            .map(|(w, _)| w)
    }
}
