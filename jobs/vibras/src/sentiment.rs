use crate::lexicon::SentimentLexicon;
use regex::Regex;

/// Scores raw text against the lexicon. Built once per run; the compiled
/// regex and the lexicon reference are shared by every mapper invocation.
pub struct SentimentScorer<'a> {
    lexicon: &'a SentimentLexicon,
    word_re: Regex,
}

impl<'a> SentimentScorer<'a> {
    pub fn new(lexicon: &'a SentimentLexicon) -> Self {
        // \w is Unicode-aware, so accented words stay whole tokens
        let word_re = Regex::new(r"[\w']+").unwrap();
        Self { lexicon, word_re }
    }

    /// Sum of lexicon scores over the text's `[\w']+` tokens. Tokens the
    /// lexicon does not know contribute zero, as does empty text.
    pub fn score(&self, text: &str) -> f64 {
        self.word_re
            .find_iter(text)
            .filter_map(|token| self.lexicon.score(token.as_str()))
            .sum()
    }
}
