//! Restartable example streams over a labeled token corpus
//!
//! A corpus file is read once; every stream and fold view over it shares the
//! same backing storage, so resets rewind without touching the file again and
//! ordering is stable across resets.

use crate::error::{Result, TagTuneError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One supervised training example: a token with its gold label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub token: String,
    pub label: String,
}

impl Example {
    pub fn new(token: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            label: label.into(),
        }
    }
}

/// A restartable, finite stream of examples.
#[derive(Debug, Clone)]
pub struct TokenStream {
    examples: Arc<Vec<Example>>,
    /// Backing positions to yield, in stream order. Derived views (folds,
    /// rare-vocabulary filters) restrict this without copying examples.
    indices: Arc<Vec<usize>>,
    cursor: usize,
}

impl TokenStream {
    /// Build a stream over an in-memory example list.
    pub fn from_examples(examples: Vec<Example>) -> Self {
        let indices = (0..examples.len()).collect();
        Self {
            examples: Arc::new(examples),
            indices: Arc::new(indices),
            cursor: 0,
        }
    }

    /// Load a bracket-format corpus file: whitespace-separated `(TAG token)`
    /// groups, possibly spanning multiple lines.
    pub fn from_bracket_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            TagTuneError::DataAccessError(format!(
                "cannot read corpus {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::from_examples(parse_bracket(&text)?))
    }

    fn view(examples: Arc<Vec<Example>>, indices: Vec<usize>) -> Self {
        Self {
            examples,
            indices: Arc::new(indices),
            cursor: 0,
        }
    }

    /// Restrict this stream to the given positions (indices into *this*
    /// stream's order). Used by the fold splitter.
    pub(crate) fn subview(&self, positions: &[usize]) -> Self {
        let indices = positions.iter().map(|&p| self.indices[p]).collect();
        Self::view(self.examples.clone(), indices)
    }

    /// Next example, or `None` at the end of the stream.
    pub fn next_example(&mut self) -> Option<Example> {
        let idx = *self.indices.get(self.cursor)?;
        self.cursor += 1;
        Some(self.examples[idx].clone())
    }

    /// Rewind to the first example. Ordering is identical on every pass.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Derived stream containing only rare-vocabulary tokens: those whose
    /// frequency in this stream is at or below `rarity_threshold`. This is
    /// the training view for the unknown-word classifier.
    pub fn unknown_view(&self, rarity_threshold: usize) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for &i in self.indices.iter() {
            *counts.entry(self.examples[i].token.as_str()).or_insert(0) += 1;
        }
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| counts[self.examples[i].token.as_str()] <= rarity_threshold)
            .collect();
        Self::view(self.examples.clone(), indices)
    }
}

fn parse_bracket(text: &str) -> Result<Vec<Example>> {
    let mut examples = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        let close = after.find(')').ok_or_else(|| {
            TagTuneError::DataAccessError("unterminated corpus group".to_string())
        })?;
        let inner = &after[..close];
        let mut parts = inner.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(tag), Some(token), None) => examples.push(Example::new(token, tag)),
            _ => {
                return Err(TagTuneError::DataAccessError(format!(
                    "malformed corpus group '({inner})'"
                )))
            }
        }
        rest = &after[close + 1..];
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Example> {
        vec![
            Example::new("The", "DT"),
            Example::new("dog", "NN"),
            Example::new("barks", "VBZ"),
        ]
    }

    #[test]
    fn test_parse_bracket() {
        let examples = parse_bracket("(DT The) (NN dog)\n(VBZ barks)").unwrap();
        assert_eq!(examples, sample());
    }

    #[test]
    fn test_parse_bracket_malformed() {
        let err = parse_bracket("(DT)").unwrap_err();
        assert!(matches!(err, TagTuneError::DataAccessError(_)));
    }

    #[test]
    fn test_reset_preserves_order() {
        let mut stream = TokenStream::from_examples(sample());
        let first: Vec<Example> = std::iter::from_fn(|| stream.next_example()).collect();
        stream.reset();
        let second: Vec<Example> = std::iter::from_fn(|| stream.next_example()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_unknown_view_keeps_rare_tokens() {
        let mut examples = sample();
        examples.push(Example::new("dog", "NN"));
        let stream = TokenStream::from_examples(examples);
        let mut rare = stream.unknown_view(1);
        assert_eq!(rare.len(), 2);
        assert_eq!(rare.next_example().unwrap().token, "The");
        assert_eq!(rare.next_example().unwrap().token, "barks");
    }

    #[test]
    fn test_missing_corpus_is_data_access_error() {
        let err = TokenStream::from_bracket_file("no/such/corpus.br").unwrap_err();
        assert!(matches!(err, TagTuneError::DataAccessError(_)));
    }
}
