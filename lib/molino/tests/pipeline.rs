use molino::{LocalPipeline, Mapper, SumCombiner, SumReducer, TopK};

struct TokenMapper;

impl Mapper for TokenMapper {
    type Input = String;
    type Key = String;
    type Value = u64;

    fn do_map<I, F>(&self, input: I, emit: &mut F)
    where
        I: IntoIterator<Item = String>,
        F: FnMut(String, u64),
    {
        for line in input {
            for token in line.split_whitespace() {
                emit(token.to_string(), 1);
            }
        }
    }
}

fn sample_lines() -> Vec<String> {
    vec![
        "sol sol playa".to_string(),
        "playa sol".to_string(),
        String::new(),
        "montaña".to_string(),
    ]
}

fn expected_counts() -> Vec<(String, u64)> {
    vec![
        ("montaña".to_string(), 1),
        ("playa".to_string(), 2),
        ("sol".to_string(), 3),
    ]
}

#[test]
fn combined_and_plain_stages_agree_for_any_task_count() {
    for tasks in [1, 2, 3, 7] {
        let combined = LocalPipeline::with_tasks(tasks).map_combine_reduce(
            sample_lines(),
            &TokenMapper,
            &SumCombiner::new(),
            &SumReducer::new(),
        );
        let plain =
            LocalPipeline::with_tasks(tasks).map_reduce(sample_lines(), &TokenMapper, &SumReducer::new());
        assert_eq!(combined, plain, "tasks = {tasks}");
        assert_eq!(combined, expected_counts(), "tasks = {tasks}");
    }
}

#[test]
fn output_is_ordered_by_key() {
    let output = LocalPipeline::with_tasks(2).map_combine_reduce(
        sample_lines(),
        &TokenMapper,
        &SumCombiner::new(),
        &SumReducer::new(),
    );
    let keys: Vec<&str> = output.iter().map(|(k, _)| k.as_str()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn task_count_does_not_change_output() {
    let one = LocalPipeline::with_tasks(1).map_combine_reduce(
        sample_lines(),
        &TokenMapper,
        &SumCombiner::new(),
        &SumReducer::new(),
    );
    let many = LocalPipeline::with_tasks(5).map_combine_reduce(
        sample_lines(),
        &TokenMapper,
        &SumCombiner::new(),
        &SumReducer::new(),
    );
    assert_eq!(one, many);
}

#[test]
fn empty_input_produces_empty_output() {
    let mut pipeline = LocalPipeline::with_tasks(4);
    let output = pipeline.map_combine_reduce(
        Vec::new(),
        &TokenMapper,
        &SumCombiner::new(),
        &SumReducer::new(),
    );
    assert!(output.is_empty());
}

#[test]
fn global_stage_sees_every_stage_one_key() {
    let mut pipeline = LocalPipeline::with_tasks(3);
    let counts = pipeline.map_combine_reduce(
        sample_lines(),
        &TokenMapper,
        &SumCombiner::new(),
        &SumReducer::new(),
    );
    let entries: Vec<(u64, String)> = counts.into_iter().map(|(term, n)| (n, term)).collect();
    let ranked = pipeline.reduce_global(entries, &TopK::new(2));
    assert_eq!(
        ranked,
        vec![("sol".to_string(), 3), ("playa".to_string(), 2)]
    );
}

#[test]
fn zero_tasks_clamps_to_one() {
    assert_eq!(LocalPipeline::with_tasks(0).tasks(), 1);
}
