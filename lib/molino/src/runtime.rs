use crate::api::{Combiner, GlobalReducer, Mapper, Reducer};
use crate::constants::ENV_TASKS;
use crate::stats::StatsCollector;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// In-process map/combine/reduce runner. Records are split into task-sized
/// batches mapped in parallel; each task pre-aggregates its own emissions
/// before the merge, and the reduce phase starts only once every map task
/// has finished, so a reducer always sees its key's complete value set.
pub struct LocalPipeline {
    tasks: usize,
    stats: StatsCollector,
}

impl LocalPipeline {
    /// Task count comes from `MOLINO_TASKS` when set, the CPU count otherwise.
    pub fn new() -> Self {
        let tasks = std::env::var(ENV_TASKS)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(num_cpus::get);
        Self::with_tasks(tasks)
    }

    pub fn with_tasks(tasks: usize) -> Self {
        Self { tasks: tasks.max(1), stats: StatsCollector::new() }
    }

    pub fn tasks(&self) -> usize {
        self.tasks
    }

    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    /// Runs one full stage: parallel map over `records`, per-task combining,
    /// grouping by key, one reduce per key. Output is ordered by key.
    pub fn map_combine_reduce<M, C, R>(
        &mut self,
        records: Vec<M::Input>,
        mapper: &M,
        combiner: &C,
        reducer: &R,
    ) -> Vec<(R::KeyOut, R::ValueOut)>
    where
        M: Mapper + Sync,
        C: Combiner<Key = M::Key, Value = M::Value> + Sync,
        R: Reducer<Key = M::Key, ValueIn = M::Value> + Sync,
    {
        let map_start = Instant::now();
        let batches = split_into_batches(records, self.tasks);
        info!(tasks = batches.len(), "Molino starting map phase");
        let task_stats: Mutex<Vec<(u64, u64, u64, u64)>> = Mutex::new(Vec::new());

        let partials: Vec<HashMap<M::Key, M::Value>> = batches
            .into_par_iter()
            .enumerate()
            .map(|(task_id, batch)| {
                let task_start = Instant::now();
                let records_in = batch.len() as u64;
                let mut emits: u64 = 0;
                let mut local: HashMap<M::Key, Vec<M::Value>> = HashMap::new();
                let mut emit = |key: M::Key, value: M::Value| {
                    emits += 1;
                    local.entry(key).or_default().push(value);
                };
                mapper.do_map(batch, &mut emit);
                let mut combined: HashMap<M::Key, M::Value> = HashMap::with_capacity(local.len());
                for (key, values) in local {
                    let value = combiner.do_combine(&key, values);
                    combined.insert(key, value);
                }
                debug!(
                    task_id,
                    records = records_in,
                    emits,
                    partial_pairs = combined.len(),
                    "map task complete"
                );
                task_stats.lock().unwrap().push((
                    records_in,
                    emits,
                    combined.len() as u64,
                    task_start.elapsed().as_millis() as u64,
                ));
                combined
            })
            .collect();

        let mut groups: HashMap<M::Key, Vec<M::Value>> = HashMap::new();
        for partial in partials {
            for (key, value) in partial {
                groups.entry(key).or_default().push(value);
            }
        }

        let per_task = task_stats.into_inner().unwrap();
        let wall_ms = map_start.elapsed().as_millis() as u64;
        log_map_phase(&per_task, wall_ms);
        self.stats.record_map(&per_task, wall_ms);

        self.reduce_groups(groups, reducer)
    }

    /// Same stage without a combiner: every emitted value reaches the
    /// reducer. With an associative, commutative combiner the combined
    /// variant must produce identical output.
    pub fn map_reduce<M, R>(
        &mut self,
        records: Vec<M::Input>,
        mapper: &M,
        reducer: &R,
    ) -> Vec<(R::KeyOut, R::ValueOut)>
    where
        M: Mapper + Sync,
        R: Reducer<Key = M::Key, ValueIn = M::Value> + Sync,
    {
        let map_start = Instant::now();
        let batches = split_into_batches(records, self.tasks);
        info!(tasks = batches.len(), "Molino starting map phase");
        let task_stats: Mutex<Vec<(u64, u64, u64, u64)>> = Mutex::new(Vec::new());

        let partials: Vec<HashMap<M::Key, Vec<M::Value>>> = batches
            .into_par_iter()
            .enumerate()
            .map(|(task_id, batch)| {
                let task_start = Instant::now();
                let records_in = batch.len() as u64;
                let mut emits: u64 = 0;
                let mut local: HashMap<M::Key, Vec<M::Value>> = HashMap::new();
                let mut emit = |key: M::Key, value: M::Value| {
                    emits += 1;
                    local.entry(key).or_default().push(value);
                };
                mapper.do_map(batch, &mut emit);
                debug!(
                    task_id,
                    records = records_in,
                    emits,
                    partial_pairs = local.len(),
                    "map task complete"
                );
                task_stats.lock().unwrap().push((
                    records_in,
                    emits,
                    local.len() as u64,
                    task_start.elapsed().as_millis() as u64,
                ));
                local
            })
            .collect();

        let mut groups: HashMap<M::Key, Vec<M::Value>> = HashMap::new();
        for partial in partials {
            for (key, mut values) in partial {
                groups.entry(key).or_default().append(&mut values);
            }
        }

        let per_task = task_stats.into_inner().unwrap();
        let wall_ms = map_start.elapsed().as_millis() as u64;
        log_map_phase(&per_task, wall_ms);
        self.stats.record_map(&per_task, wall_ms);

        self.reduce_groups(groups, reducer)
    }

    /// The explicit global aggregation stage: one reducer invocation that
    /// sees every entry of a previous stage's output.
    pub fn reduce_global<G>(
        &mut self,
        entries: Vec<G::Entry>,
        reducer: &G,
    ) -> Vec<(G::KeyOut, G::ValueOut)>
    where
        G: GlobalReducer,
    {
        let start = Instant::now();
        let entries_in = entries.len() as u64;
        let mut output = Vec::new();
        let mut emit = |key: G::KeyOut, value: G::ValueOut| output.push((key, value));
        reducer.do_reduce_global(entries, &mut emit);
        let wall_ms = start.elapsed().as_millis() as u64;
        info!(
            phase = "global",
            entries = entries_in,
            pairs_out = output.len(),
            wall_ms,
            "Global stage complete"
        );
        self.stats.record_global(entries_in, output.len() as u64, wall_ms);
        output
    }

    fn reduce_groups<R>(
        &mut self,
        groups: HashMap<R::Key, Vec<R::ValueIn>>,
        reducer: &R,
    ) -> Vec<(R::KeyOut, R::ValueOut)>
    where
        R: Reducer + Sync,
    {
        let reduce_start = Instant::now();
        let mut grouped: Vec<(R::Key, Vec<R::ValueIn>)> = groups.into_iter().collect();
        // key order fixes reducer invocation order, and with it output order
        grouped.sort_by(|a, b| a.0.cmp(&b.0));
        let num_groups = grouped.len() as u64;
        let values_in: u64 = grouped.iter().map(|g| g.1.len() as u64).sum();

        let per_key: Vec<Vec<(R::KeyOut, R::ValueOut)>> = grouped
            .into_par_iter()
            .map(|(key, values)| {
                let mut out = Vec::new();
                let mut emit = |k: R::KeyOut, v: R::ValueOut| out.push((k, v));
                reducer.do_reduce(&key, values, &mut emit);
                out
            })
            .collect();
        let output: Vec<(R::KeyOut, R::ValueOut)> = per_key.into_iter().flatten().collect();

        let wall_ms = reduce_start.elapsed().as_millis() as u64;
        info!(
            phase = "reduce",
            groups = num_groups,
            values_in,
            pairs_out = output.len(),
            wall_ms,
            "Reduce phase complete"
        );
        self.stats.record_reduce(num_groups, values_in, output.len() as u64, wall_ms);
        output
    }
}

impl Default for LocalPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn log_map_phase(per_task: &[(u64, u64, u64, u64)], wall_ms: u64) {
    let records: u64 = per_task.iter().map(|t| t.0).sum();
    let emits: u64 = per_task.iter().map(|t| t.1).sum();
    let partial_pairs: u64 = per_task.iter().map(|t| t.2).sum();
    let min_task_ms = per_task.iter().map(|t| t.3).min().unwrap_or(0);
    let max_task_ms = per_task.iter().map(|t| t.3).max().unwrap_or(0);
    info!(
        phase = "map",
        tasks = per_task.len(),
        records,
        emits,
        partial_pairs,
        min_task_ms,
        max_task_ms,
        wall_ms,
        "Map phase complete"
    );
}

fn split_into_batches<T>(records: Vec<T>, tasks: usize) -> Vec<Vec<T>> {
    let chunk = records.len().div_ceil(tasks.max(1)).max(1);
    let mut batches = Vec::new();
    let mut it = records.into_iter();
    loop {
        let batch: Vec<T> = it.by_ref().take(chunk).collect();
        if batch.is_empty() {
            break;
        }
        batches.push(batch);
    }
    batches
}
