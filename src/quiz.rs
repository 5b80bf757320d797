//! Multiple-choice quiz state.
//!
//! `QuizState` is a plain value owned by the caller. Every operation takes
//! the state by value and hands back the next one, so there is no hidden
//! progress anywhere else.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::catalog::QuizQuestion;

/// Progress through one run of the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizState {
    questions: Vec<QuizQuestion>,
    current: usize,
    score: usize,
    submitted: bool,
    done: bool,
}

/// What submitting an answer produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "feedback", rename_all = "snake_case")]
pub enum Feedback {
    Correct,
    Incorrect { correct: String },
    /// The current question was already answered, or the quiz is over.
    Ignored,
}

/// Final judgement on a completed quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    Excellent,
    Good,
    KeepPracticing,
}

impl Assessment {
    /// Bands a percentage score.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            Self::Excellent
        } else if percentage >= 60.0 {
            Self::Good
        } else {
            Self::KeepPracticing
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent! You have a solid grasp of SQL."),
            Self::Good => write!(f, "Good job! A little more practice and you'll master it."),
            Self::KeepPracticing => write!(f, "Keep practicing! Review the basics and try again."),
        }
    }
}

impl QuizState {
    /// Starts a quiz over the given questions in a random order.
    pub fn start<R: Rng + ?Sized>(questions: &[QuizQuestion], rng: &mut R) -> Self {
        let mut questions = questions.to_vec();
        questions.shuffle(rng);
        let done = questions.is_empty();
        Self {
            questions,
            current: 0,
            score: 0,
            submitted: false,
            done,
        }
    }

    /// Answers the current question.
    ///
    /// A second submission for the same question is ignored and leaves the
    /// score untouched.
    pub fn submit(mut self, answer: &str) -> (Self, Feedback) {
        if self.submitted || self.done {
            return (self, Feedback::Ignored);
        }
        let Some(question) = self.questions.get(self.current) else {
            return (self, Feedback::Ignored);
        };

        let feedback = if answer.trim() == question.correct {
            Feedback::Correct
        } else {
            Feedback::Incorrect {
                correct: question.correct.clone(),
            }
        };

        if feedback == Feedback::Correct {
            self.score += 1;
        }
        self.submitted = true;
        (self, feedback)
    }

    /// Moves to the next question, or finishes after the last one.
    ///
    /// Does nothing until the current question has been answered.
    pub fn advance(mut self) -> Self {
        if self.done || !self.submitted {
            return self;
        }
        if self.current + 1 >= self.questions.len() {
            self.done = true;
        } else {
            self.current += 1;
        }
        self.submitted = false;
        self
    }

    /// Starts over with the same questions in a new order.
    pub fn restart<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        Self::start(&self.questions, rng)
    }

    /// The question awaiting an answer, if the quiz is still running.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        if self.done {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    /// One-based position of the current question.
    pub fn position(&self) -> usize {
        self.current + 1
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn percentage(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            self.score as f64 * 100.0 / self.questions.len() as f64
        }
    }

    /// The final assessment, once every question has been seen.
    pub fn assessment(&self) -> Option<Assessment> {
        self.done
            .then(|| Assessment::from_percentage(self.percentage()))
    }
}
