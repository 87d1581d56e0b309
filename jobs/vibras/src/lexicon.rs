use crate::errors::LoadError;
use std::collections::HashMap;
use std::io::BufRead;

/// Term-to-score table loaded once per run and shared with every mapper.
/// Terms are stored exactly as written in the file; lookups lowercase the
/// queried token, so a lexicon shipped in lowercase matches any casing.
#[derive(Debug)]
pub struct SentimentLexicon {
    scores: HashMap<String, f64>,
}

impl SentimentLexicon {
    /// Parses tab-separated `term<TAB>score` lines. A line that does not
    /// split into exactly two fields, or whose score is not a float, is
    /// fatal: a broken lexicon must stop the run before any mapping starts.
    pub fn load(reader: impl BufRead) -> Result<Self, LoadError> {
        let mut scores = HashMap::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split('\t');
            let (Some(term), Some(score), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(LoadError::MalformedLexiconEntry {
                    line: idx + 1,
                    text: line.clone(),
                });
            };
            let value: f64 = score.trim().parse().map_err(|_| LoadError::MalformedLexiconEntry {
                line: idx + 1,
                text: line.clone(),
            })?;
            scores.insert(term.to_string(), value);
        }
        Ok(Self { scores })
    }

    /// Score for one token, or `None` when the lexicon does not know it.
    /// A miss contributes zero to a text's score; it is never an error.
    pub fn score(&self, term: &str) -> Option<f64> {
        self.scores.get(&term.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
