//! Label encoding for categorical columns

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Maps category labels to dense integer codes.
///
/// Classes are sorted, so fitting on the same labels in any order yields
/// the same codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit an encoder on every label yielded by `labels`
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    /// Number of distinct classes (the vocabulary size)
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, label: &str) -> Result<u32> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .map(|idx| idx as u32)
            .map_err(|_| MathError::UnknownCategory(label.to_string()))
    }

    pub fn decode(&self, code: u32) -> Result<&str> {
        self.classes
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                MathError::InvalidInput(format!(
                    "Code {} is outside a vocabulary of {} classes",
                    code,
                    self.classes.len()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sorted_labels() {
        let encoder = LabelEncoder::fit(["north", "east", "north", "west"]);
        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.encode("east").unwrap(), 0);
        assert_eq!(encoder.encode("north").unwrap(), 1);
        assert_eq!(encoder.encode("west").unwrap(), 2);
        assert_eq!(encoder.decode(2).unwrap(), "west");
    }

    #[test]
    fn unknown_label_is_an_error() {
        let encoder = LabelEncoder::fit(["a", "b"]);
        assert!(matches!(encoder.encode("c"), Err(MathError::UnknownCategory(_))));
        assert!(encoder.decode(5).is_err());
    }
}
