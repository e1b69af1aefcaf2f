//! Question sets that charts are generated from
//!
//! Each set is a fill-in-the-blank prompt, one correct answer and a handful
//! of distractors. The built-in curriculum drills irregular English past
//! tense; other curricula can be supplied as JSON.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Marks where the answer goes in an instruction
pub const BLANK_MARKER: &str = "___";

/// One fill-in-the-blank question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    /// Prompt containing [`BLANK_MARKER`]
    pub instruction: String,
    /// The answer the player must strike
    pub answer: String,
    /// Wrong answers the player must avoid
    pub distractors: Vec<String>,
}

impl QuestionSet {
    pub fn new(instruction: &str, answer: &str, distractors: &[&str]) -> Self {
        Self {
            instruction: instruction.to_string(),
            answer: answer.to_string(),
            distractors: distractors.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Instruction with the blank filled in by the correct answer
    pub fn solved(&self) -> String {
        self.instruction.replacen(BLANK_MARKER, &self.answer, 1)
    }

    fn validate(&self, index: usize) -> Result<(), EngineError> {
        if !self.instruction.contains(BLANK_MARKER) {
            return Err(EngineError::invalid_question(
                index,
                format!("instruction has no {BLANK_MARKER} blank"),
            ));
        }
        if self.answer.trim().is_empty() {
            return Err(EngineError::invalid_question(index, "answer is empty"));
        }
        if self.distractors.iter().any(|d| d.trim().is_empty()) {
            return Err(EngineError::invalid_question(index, "empty distractor"));
        }
        if self
            .distractors
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&self.answer))
        {
            return Err(EngineError::invalid_question(
                index,
                "answer is also listed as a distractor",
            ));
        }
        Ok(())
    }
}

/// Ordered list of question sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curriculum {
    questions: Vec<QuestionSet>,
}

impl Curriculum {
    /// Build a curriculum, rejecting empty or malformed question sets
    pub fn new(questions: Vec<QuestionSet>) -> Result<Self, EngineError> {
        if questions.is_empty() {
            return Err(EngineError::EmptyCurriculum);
        }
        for (index, question) in questions.iter().enumerate() {
            question.validate(index)?;
        }
        Ok(Self { questions })
    }

    /// Parse a JSON array of question sets
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let questions: Vec<QuestionSet> = serde_json::from_str(json)?;
        let curriculum = Self::new(questions)?;
        log::info!("Loaded curriculum with {} questions", curriculum.len());
        Ok(curriculum)
    }

    /// The built-in past tense curriculum
    pub fn builtin() -> Self {
        let questions = vec![
            QuestionSet::new("Yesterday I ___ to the park.", "WENT", &["GO", "GOES", "GOING"]),
            QuestionSet::new("She ___ a letter last week.", "WROTE", &["WRITE", "WRITTEN", "WRITES"]),
            QuestionSet::new("We ___ pizza for dinner.", "ATE", &["EAT", "EATEN", "EATS"]),
            QuestionSet::new("He ___ the bus this morning.", "CAUGHT", &["CATCHED", "CATCH", "CATCHES"]),
            QuestionSet::new("They ___ a new song.", "SANG", &["SING", "SUNG", "SINGED"]),
            QuestionSet::new("I ___ my keys at home.", "LEFT", &["LEAVED", "LEAVE", "LEAVES"]),
            QuestionSet::new("The dog ___ across the yard.", "RAN", &["RUN", "RUNNED", "RUNS"]),
            QuestionSet::new("You ___ the answer!", "KNEW", &["KNOWED", "KNOW", "KNOWN"]),
        ];
        Self { questions }
    }

    pub fn questions(&self) -> &[QuestionSet] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::builtin()
    }
}
