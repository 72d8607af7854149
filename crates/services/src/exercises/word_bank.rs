use std::collections::HashMap;

use grammar_core::model::AnswerPatch;

/// Token bookkeeping for sentence construction.
///
/// Only the joined sentence ever reaches the answer; the available/used split
/// is view state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordBank {
    available: Vec<String>,
    used: Vec<String>,
}

impl WordBank {
    #[must_use]
    pub fn new(words: &[String]) -> Self {
        let mut available = words.to_vec();
        available.sort();
        Self {
            available,
            used: Vec::new(),
        }
    }

    /// Rebuilds the split from a sentence typed or restored earlier.
    ///
    /// Each bank word is consumed at most as many times as the sentence
    /// uses it.
    #[must_use]
    pub fn from_sentence(words: &[String], sentence: &str) -> Self {
        let used: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();
        let mut consumed: HashMap<&str, usize> = HashMap::new();
        for token in &used {
            *consumed.entry(token.as_str()).or_default() += 1;
        }

        let mut available = Vec::with_capacity(words.len());
        for word in words {
            match consumed.get_mut(word.as_str()) {
                Some(remaining) if *remaining > 0 => *remaining -= 1,
                _ => available.push(word.clone()),
            }
        }
        available.sort();
        Self { available, used }
    }

    #[must_use]
    pub fn available(&self) -> &[String] {
        &self.available
    }

    #[must_use]
    pub fn used(&self) -> &[String] {
        &self.used
    }

    /// Moves the first available copy of `word` to the end of the sentence.
    pub fn add(&mut self, word: &str) -> bool {
        let Some(index) = self.available.iter().position(|w| w == word) else {
            return false;
        };
        let word = self.available.remove(index);
        self.used.push(word);
        true
    }

    /// Returns the word at `position` in the sentence to the bank.
    pub fn remove(&mut self, position: usize) -> Option<&str> {
        if position >= self.used.len() {
            return None;
        }
        let word = self.used.remove(position);
        let at = self.available.partition_point(|w| *w <= word);
        self.available.insert(at, word);
        Some(self.available[at].as_str())
    }

    /// Returns every used word to the bank.
    pub fn clear(&mut self) {
        self.available.append(&mut self.used);
        self.available.sort();
    }

    #[must_use]
    pub fn sentence(&self) -> String {
        self.used.join(" ")
    }

    /// Patch carrying the current sentence into the answer.
    #[must_use]
    pub fn patch(&self) -> AnswerPatch {
        AnswerPatch::SetSentence(self.sentence())
    }
}
