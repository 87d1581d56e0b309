use serde::Serialize;

#[derive(Default, Clone, Debug, Serialize)]
pub struct MapStats {
    pub tasks: usize,
    pub records_in: u64,
    pub emits: u64,
    pub partial_pairs: u64,
    pub min_task_ms: u64,
    pub max_task_ms: u64,
    pub wall_ms: u64,
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct ReduceStats {
    pub groups: u64,
    pub values_in: u64,
    pub pairs_out: u64,
    pub wall_ms: u64,
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct GlobalStats {
    pub entries_in: u64,
    pub pairs_out: u64,
    pub wall_ms: u64,
}

#[derive(Default)]
pub struct StatsCollector {
    pub map: Option<MapStats>,
    pub reduce: Option<ReduceStats>,
    pub global: Option<GlobalStats>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `per_task` entries are `(records_in, emits, partial_pairs, task_ms)`.
    pub fn record_map(&mut self, per_task: &[(u64, u64, u64, u64)], wall_ms: u64) {
        let tasks = per_task.len();
        let records_in = per_task.iter().map(|t| t.0).sum();
        let emits = per_task.iter().map(|t| t.1).sum();
        let partial_pairs = per_task.iter().map(|t| t.2).sum();
        let min_task_ms = per_task.iter().map(|t| t.3).min().unwrap_or(0);
        let max_task_ms = per_task.iter().map(|t| t.3).max().unwrap_or(0);
        self.map = Some(MapStats {
            tasks,
            records_in,
            emits,
            partial_pairs,
            min_task_ms,
            max_task_ms,
            wall_ms,
        });
    }

    pub fn record_reduce(&mut self, groups: u64, values_in: u64, pairs_out: u64, wall_ms: u64) {
        self.reduce = Some(ReduceStats { groups, values_in, pairs_out, wall_ms });
    }

    pub fn record_global(&mut self, entries_in: u64, pairs_out: u64, wall_ms: u64) {
        self.global = Some(GlobalStats { entries_in, pairs_out, wall_ms });
    }
}
