use crate::api::GlobalReducer;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::marker::PhantomData;

/// Total order for ranking values. `f64` ranks use the IEEE total order so
/// selection stays deterministic for every input.
pub trait RankOrd: Copy {
    fn cmp_rank(&self, other: &Self) -> Ordering;
}

impl RankOrd for f64 {
    fn cmp_rank(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl RankOrd for u64 {
    fn cmp_rank(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Ordering key for selection: rank first, label breaks ties.
#[derive(Clone, Debug)]
struct Ranked<R> {
    rank: R,
    label: String,
}

impl<R: RankOrd> Ord for Ranked<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp_rank(&other.rank)
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl<R: RankOrd> PartialOrd for Ranked<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R: RankOrd> PartialEq for Ranked<R> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<R: RankOrd> Eq for Ranked<R> {}

/// Keeps the `limit` greatest `(rank, label)` entries and emits them as
/// `(label, rank)` pairs in descending `(rank, label)` order. The cut is
/// strict: on a boundary tie the greater tuple survives and nothing past
/// `limit` is ever emitted. Memory stays O(limit) however many entries flow
/// through.
pub struct TopK<R> {
    limit: usize,
    _rank: PhantomData<fn() -> R>,
}

impl<R> TopK<R> {
    pub fn new(limit: usize) -> Self {
        Self { limit, _rank: PhantomData }
    }
}

impl<R> GlobalReducer for TopK<R>
where
    R: RankOrd + Send + Serialize,
{
    type Entry = (R, String);
    type KeyOut = String;
    type ValueOut = R;

    fn do_reduce_global<I, F>(&self, entries: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::Entry>,
        F: FnMut(String, R),
    {
        if self.limit == 0 {
            return;
        }
        // min-heap of survivors; the root is the next entry to evict
        let mut heap: BinaryHeap<Reverse<Ranked<R>>> = BinaryHeap::with_capacity(self.limit + 1);
        for (rank, label) in entries {
            heap.push(Reverse(Ranked { rank, label }));
            if heap.len() > self.limit {
                heap.pop();
            }
        }
        let mut kept: Vec<Ranked<R>> = heap.into_iter().map(|Reverse(entry)| entry).collect();
        kept.sort_by(|a, b| b.cmp(a));
        for entry in kept {
            emit(entry.label, entry.rank);
        }
    }
}

/// Keeps the single greatest `(rank, label)` entry and emits it as one
/// `(rank, label)` pair. Rank ties resolve to the lexicographically greatest
/// label. An empty entry set emits nothing.
pub struct MaxSelect<R> {
    _rank: PhantomData<fn() -> R>,
}

impl<R> MaxSelect<R> {
    pub fn new() -> Self {
        Self { _rank: PhantomData }
    }
}

impl<R> Default for MaxSelect<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> GlobalReducer for MaxSelect<R>
where
    R: RankOrd + Send + Serialize,
{
    type Entry = (R, String);
    type KeyOut = R;
    type ValueOut = String;

    fn do_reduce_global<I, F>(&self, entries: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::Entry>,
        F: FnMut(R, String),
    {
        let mut best: Option<Ranked<R>> = None;
        for (rank, label) in entries {
            let candidate = Ranked { rank, label };
            let replace = match &best {
                None => true,
                Some(current) => candidate.cmp(current) == Ordering::Greater,
            };
            if replace {
                best = Some(candidate);
            }
        }
        if let Some(entry) = best {
            emit(entry.rank, entry.label);
        }
    }
}
