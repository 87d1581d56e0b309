use crate::lexicon::SentimentLexicon;
use crate::record::Tweet;
use crate::regions::RegionIndex;
use crate::sentiment::SentimentScorer;
use clap::ValueEnum;
use molino::{LocalPipeline, Mapper, MaxSelect, SumCombiner, SumReducer, TopK};

/// Hard cap on the trending ranking.
pub const TRENDING_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobKind {
    /// Total sentiment per region
    Sentiments,
    /// The single region with the highest total sentiment
    MostHappy,
    /// The ten most mentioned hashtag terms
    Trending,
}

impl JobKind {
    pub fn needs_sentiment_inputs(&self) -> bool {
        matches!(self, JobKind::Sentiments | JobKind::MostHappy)
    }
}

/// Resolves each record's bounding box to a region and scores its text.
/// Emits `(region, score)`; records that fail the filter or resolve to no
/// region emit nothing.
pub struct RegionSentimentMapper<'a> {
    regions: &'a RegionIndex,
    scorer: SentimentScorer<'a>,
}

impl<'a> RegionSentimentMapper<'a> {
    pub fn new(regions: &'a RegionIndex, scorer: SentimentScorer<'a>) -> Self {
        Self { regions, scorer }
    }
}

impl Mapper for RegionSentimentMapper<'_> {
    type Input = Tweet;
    type Key = String;
    type Value = f64;

    fn do_map<I, F>(&self, input: I, emit: &mut F)
    where
        I: IntoIterator<Item = Tweet>,
        F: FnMut(String, f64),
    {
        for tweet in input {
            let Some((bounding_box, text)) = tweet.geo_text() else {
                continue;
            };
            let Some(region) = self.regions.resolve(&bounding_box) else {
                continue;
            };
            emit(region.to_string(), self.scorer.score(text));
        }
    }
}

/// Emits `(term, 1)` per hashtag mention: for every whitespace-separated
/// word containing `#`, the segment between the first `#` and the next `#`
/// or the word's end. A bare `#` counts an empty term.
pub struct HashtagMapper;

impl Mapper for HashtagMapper {
    type Input = Tweet;
    type Key = String;
    type Value = u64;

    fn do_map<I, F>(&self, input: I, emit: &mut F)
    where
        I: IntoIterator<Item = Tweet>,
        F: FnMut(String, u64),
    {
        for tweet in input {
            let Some(text) = tweet.trending_text() else {
                continue;
            };
            for word in text.split_whitespace() {
                if let Some((_, rest)) = word.split_once('#') {
                    let term = match rest.find('#') {
                        Some(end) => &rest[..end],
                        None => rest,
                    };
                    emit(term.to_string(), 1);
                }
            }
        }
    }
}

/// Per-region sentiment totals, ordered by region name.
pub fn run_sentiments(
    pipeline: &mut LocalPipeline,
    records: Vec<Tweet>,
    lexicon: &SentimentLexicon,
    regions: &RegionIndex,
) -> Vec<(String, f64)> {
    let mapper = RegionSentimentMapper::new(regions, SentimentScorer::new(lexicon));
    pipeline.map_combine_reduce(records, &mapper, &SumCombiner::new(), &SumReducer::new())
}

/// Per-region totals, then a global pass keeping the maximum
/// `(total, region)` entry. Empty or fully filtered input emits nothing.
pub fn run_most_happy(
    pipeline: &mut LocalPipeline,
    records: Vec<Tweet>,
    lexicon: &SentimentLexicon,
    regions: &RegionIndex,
) -> Vec<(f64, String)> {
    let totals = run_sentiments(pipeline, records, lexicon, regions);
    let entries: Vec<(f64, String)> = totals
        .into_iter()
        .map(|(region, total)| (total, region))
        .collect();
    pipeline.reduce_global(entries, &MaxSelect::new())
}

/// Hashtag mention counts, then a global pass keeping the
/// `TRENDING_LIMIT` greatest `(count, term)` entries in ranked order.
pub fn run_trending(pipeline: &mut LocalPipeline, records: Vec<Tweet>) -> Vec<(String, u64)> {
    let counts = pipeline.map_combine_reduce(
        records,
        &HashtagMapper,
        &SumCombiner::new(),
        &SumReducer::new(),
    );
    let entries: Vec<(u64, String)> = counts
        .into_iter()
        .map(|(term, count)| (count, term))
        .collect();
    pipeline.reduce_global(entries, &TopK::new(TRENDING_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> SentimentLexicon {
        SentimentLexicon::load("good\t1.0\nbad\t-1.0\ngreat\t2.0\n".as_bytes()).unwrap()
    }

    fn regions() -> RegionIndex {
        let json = r#"{
            "RegionX": {"type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]},
            "RegionY": {"type": "Polygon", "coordinates": [[[20, 20], [30, 20], [30, 30], [20, 30], [20, 20]]]}
        }"#;
        RegionIndex::load(json.as_bytes()).unwrap()
    }

    fn geo_tweet(text: &str, x: f64, y: f64) -> Tweet {
        let json = format!(
            "{{\"text\": {text:?}, \"lang\": \"es\", \"place\": {{\"country_code\": \"ES\", \
             \"bounding_box\": {{\"type\": \"Polygon\", \"coordinates\": \
             [[[{x}, {y}], [{x2}, {y}], [{x2}, {y2}], [{x}, {y2}]]]}}}}}}",
            x2 = x + 1.0,
            y2 = y + 1.0,
        );
        serde_json::from_str(&json).unwrap()
    }

    fn trending_tweet(text: &str) -> Tweet {
        let json =
            format!("{{\"text\": {text:?}, \"lang\": \"es\", \"place\": {{\"country_code\": \"ES\"}}}}");
        serde_json::from_str(&json).unwrap()
    }

    fn pipeline() -> LocalPipeline {
        LocalPipeline::with_tasks(2)
    }

    #[test]
    fn sentiments_scores_text_into_its_region() {
        let records = vec![geo_tweet("good good bad", 2.0, 2.0)];
        let out = run_sentiments(&mut pipeline(), records, &lexicon(), &regions());
        assert_eq!(out, vec![("RegionX".to_string(), 1.0)]);
    }

    #[test]
    fn sentiments_sums_across_records_and_regions() {
        let records = vec![
            geo_tweet("good", 1.0, 1.0),
            geo_tweet("great good", 3.0, 3.0),
            geo_tweet("bad", 21.0, 21.0),
            geo_tweet("good", 50.0, 50.0), // outside every region
        ];
        let out = run_sentiments(&mut pipeline(), records, &lexicon(), &regions());
        assert_eq!(
            out,
            vec![("RegionX".to_string(), 4.0), ("RegionY".to_string(), -1.0)]
        );
    }

    #[test]
    fn empty_text_scores_zero_but_keeps_its_region() {
        let records = vec![geo_tweet("", 1.0, 1.0), geo_tweet("bad", 21.0, 21.0)];
        let out = run_sentiments(&mut pipeline(), records.clone(), &lexicon(), &regions());
        assert_eq!(
            out,
            vec![("RegionX".to_string(), 0.0), ("RegionY".to_string(), -1.0)]
        );
        let best = run_most_happy(&mut pipeline(), records, &lexicon(), &regions());
        assert_eq!(best, vec![(0.0, "RegionX".to_string())]);
    }

    #[test]
    fn most_happy_keeps_the_maximum_region() {
        let records = vec![geo_tweet("good", 1.0, 1.0), geo_tweet("great great", 21.0, 21.0)];
        let out = run_most_happy(&mut pipeline(), records, &lexicon(), &regions());
        assert_eq!(out, vec![(4.0, "RegionY".to_string())]);
    }

    #[test]
    fn most_happy_tie_prefers_greatest_region_name() {
        let records = vec![geo_tweet("good", 1.0, 1.0), geo_tweet("good", 21.0, 21.0)];
        let out = run_most_happy(&mut pipeline(), records, &lexicon(), &regions());
        assert_eq!(out, vec![(1.0, "RegionY".to_string())]);
    }

    #[test]
    fn most_happy_emits_nothing_for_fully_filtered_input() {
        let records = vec![trending_tweet("good")]; // no bounding box
        let out = run_most_happy(&mut pipeline(), records, &lexicon(), &regions());
        assert!(out.is_empty());
    }

    #[test]
    fn trending_counts_hashtag_mentions() {
        let records = vec![trending_tweet("#a #a #b")];
        let out = run_trending(&mut pipeline(), records);
        assert_eq!(out, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
    }

    #[test]
    fn trending_takes_segment_after_first_hash() {
        let records = vec![trending_tweet("ho#la#lo otra#vez #solo")];
        let out = run_trending(&mut pipeline(), records);
        assert_eq!(
            out,
            vec![
                ("vez".to_string(), 1),
                ("solo".to_string(), 1),
                ("la".to_string(), 1),
            ]
        );
    }

    #[test]
    fn trending_ignores_non_spanish_records() {
        let foreign: Tweet = serde_json::from_str(
            "{\"text\": \"#a #a\", \"lang\": \"en\", \"place\": {\"country_code\": \"ES\"}}",
        )
        .unwrap();
        let records = vec![trending_tweet("#a"), foreign];
        let out = run_trending(&mut pipeline(), records);
        assert_eq!(out, vec![("a".to_string(), 1)]);
    }

    #[test]
    fn trending_caps_at_ten_with_a_strict_boundary_cut() {
        let mut text = String::new();
        for i in 0..12 {
            text.push_str(&format!("#t{i:02} "));
        }
        text.push_str("#t00 #t01");
        let records = vec![trending_tweet(&text)];
        let out = run_trending(&mut pipeline(), records);
        assert_eq!(out.len(), TRENDING_LIMIT);
        assert_eq!(out[0], ("t01".to_string(), 2));
        assert_eq!(out[1], ("t00".to_string(), 2));
        assert_eq!(out[2], ("t11".to_string(), 1));
        assert_eq!(out[9], ("t04".to_string(), 1));
        assert!(!out.iter().any(|(term, _)| term == "t02" || term == "t03"));
    }

    #[test]
    fn bare_hash_counts_an_empty_term() {
        let records = vec![trending_tweet("# #x")];
        let out = run_trending(&mut pipeline(), records);
        assert_eq!(out, vec![("x".to_string(), 1), (String::new(), 1)]);
    }

    #[test]
    fn job_kind_values_render_kebab_case() {
        assert_eq!(JobKind::value_variants().len(), 3);
        assert_eq!(
            JobKind::MostHappy.to_possible_value().unwrap().get_name(),
            "most-happy"
        );
    }
}
