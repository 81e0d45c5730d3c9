use std::collections::BTreeMap;

use crate::error::{QuizError, Result};
use crate::quiz::{Label, Question};

/// A loaded question set plus the answers recorded against it.
/// Question indices are 1-based everywhere in this type.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    questions: Vec<Question>,
    answers: BTreeMap<usize, Label>,
    round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unanswered,
    Correct,
    Incorrect { chosen: Label, correct: Label },
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// `false` until the first question set is loaded.
    pub fn is_active(&self) -> bool {
        !self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        index.checked_sub(1).and_then(|i| self.questions.get(i))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Bumped on every `load`, so stale answer buttons can be told apart.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn selected(&self, index: usize) -> Option<Label> {
        self.answers.get(&index).copied()
    }

    /// Replaces the question set and forgets every previous answer.
    pub fn load(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.answers.clear();
        self.round = self.round.wrapping_add(1);
    }

    /// Records `label` for question `index`, overwriting any earlier choice.
    pub fn answer(&mut self, index: usize, label: Label) -> Result<Outcome> {
        if self.question(index).is_none() {
            return Err(QuizError::InvalidSelection {
                index,
                label: label.to_string(),
            });
        }
        self.answers.insert(index, label);
        Ok(self.outcome(index))
    }

    /// Like [`QuizSession::answer`] but takes the label as received off the wire.
    pub fn answer_raw(&mut self, index: usize, label: &str) -> Result<Outcome> {
        let label = label
            .parse::<Label>()
            .map_err(|_| QuizError::InvalidSelection {
                index,
                label: label.to_string(),
            })?;
        self.answer(index, label)
    }

    pub fn outcome(&self, index: usize) -> Outcome {
        let (Some(question), Some(chosen)) = (self.question(index), self.selected(index)) else {
            return Outcome::Unanswered;
        };
        if question.is_correct(chosen) {
            Outcome::Correct
        } else {
            Outcome::Incorrect {
                chosen,
                correct: question.correct_label(),
            }
        }
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        (1..=self.len()).map(|i| self.outcome(i)).collect()
    }

    pub fn score(&self) -> Score {
        let outcomes = self.outcomes();
        Score {
            correct: outcomes.iter().filter(|o| **o == Outcome::Correct).count(),
            answered: outcomes
                .iter()
                .filter(|o| **o != Outcome::Unanswered)
                .count(),
            total: outcomes.len(),
        }
    }
}
