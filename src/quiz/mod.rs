pub mod ai_helper;
pub mod model_client;
pub mod parser;
pub mod prompt;
pub mod session;

use std::fmt;
use std::str::FromStr;

use crate::error::QuizError;

/// One of the four option labels of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Label {
    A,
    B,
    C,
    D,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::D];

    pub fn index(self) -> usize {
        match self {
            Label::A => 0,
            Label::B => 1,
            Label::C => 2,
            Label::D => 3,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Label::A),
            'B' => Some(Label::B),
            'C' => Some(Label::C),
            'D' => Some(Label::D),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Label::A => 'A',
            Label::B => 'B',
            Label::C => 'C',
            Label::D => 'D',
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Label {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let label = match (chars.next(), chars.next()) {
            (Some(c), None) => Label::from_char(c),
            _ => None,
        };
        label.ok_or_else(|| QuizError::InvalidInput(format!("not an option label: {:?}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuizError::InvalidInput(format!("unknown difficulty: {:?}", s)))
    }
}

/// A parsed multiple-choice question. Fields are only readable once built.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    text: String,
    options: [String; 4],
    correct_label: Label,
}

impl Question {
    pub fn new(text: String, options: [String; 4], correct_label: Label) -> Self {
        Self {
            text,
            options,
            correct_label,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; 4] {
        &self.options
    }

    pub fn option(&self, label: Label) -> &str {
        &self.options[label.index()]
    }

    pub fn correct_label(&self) -> Label {
        self.correct_label
    }

    pub fn is_correct(&self, label: Label) -> bool {
        self.correct_label == label
    }
}
