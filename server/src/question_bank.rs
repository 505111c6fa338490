use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answer: String,
}

impl Question {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

static DEFAULT_QUESTIONS: Lazy<Vec<Question>> = Lazy::new(|| {
    vec![
        Question::new("What is 15 + 27?", "42"),
        Question::new("What is the capital of France?", "Paris"),
        Question::new("What is 100 - 35?", "65"),
        Question::new("What color is a clear daytime sky?", "Blue"),
        Question::new("What is 12 * 12?", "144"),
        Question::new("How many continents are there on Earth?", "7"),
        Question::new("What is 81 / 9?", "9"),
        Question::new("What is the largest planet in our solar system?", "Jupiter"),
        Question::new("What is 7 * 8?", "56"),
        Question::new("What is the chemical symbol for water?", "H2O"),
    ]
});

/// Ordered questions handed out to rounds; cycles when rounds outnumber questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self {
            questions: DEFAULT_QUESTIONS.clone(),
        }
    }
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            bail!("Question bank must contain at least one question");
        }
        if let Some(q) = questions
            .iter()
            .find(|q| q.question.trim().is_empty() || q.answer.trim().is_empty())
        {
            bail!("Question bank entry has an empty question or answer: {:?}", q);
        }
        Ok(Self { questions })
    }

    /// Loads `[{"question": "...", "answer": "..."}]` from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read questions file {}", path.display()))?;
        let questions: Vec<Question> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse questions file {}", path.display()))?;
        Self::new(questions)
    }

    /// Question for a 1-based round number.
    pub fn for_round(&self, round_number: u32) -> &Question {
        let idx = (round_number.saturating_sub(1) as usize) % self.questions.len();
        &self.questions[idx]
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
