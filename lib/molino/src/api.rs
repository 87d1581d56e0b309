use serde::Serialize;
use std::hash::Hash;
use std::iter::Sum;
use std::marker::PhantomData;

// ========== Core map/combine/reduce traits ==========

pub trait Mapper {
    type Input: Send;
    type Key: Send + Serialize + Hash + Eq + Ord + Clone;
    type Value: Send + Serialize + Clone;

    fn do_map<I, F>(&self, input: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::Input>,
        F: FnMut(Self::Key, Self::Value);
}

/// Pre-aggregates a subset of one key's values inside a single map task.
/// Implementations must be associative and commutative: the runtime applies
/// the combiner zero or more times per key, on arbitrary partial groupings,
/// and the reducer output must not change.
pub trait Combiner {
    type Key: Send + Serialize + Hash + Eq + Ord + Clone;
    type Value: Send + Serialize + Clone;

    fn do_combine<I>(&self, key: &Self::Key, values: I) -> Self::Value
    where
        I: IntoIterator<Item = Self::Value>;
}

/// Finalizes one grouped key. The runtime guarantees that `values` holds the
/// complete value set for `key` (possibly pre-aggregated by a combiner) and
/// that the reducer runs exactly once per key.
pub trait Reducer {
    type Key: Send + Serialize + Hash + Eq + Ord + Clone;
    type ValueIn: Send + Serialize + Clone;
    type KeyOut: Send + Serialize + Clone;
    type ValueOut: Send + Serialize + Clone;

    fn do_reduce<I, F>(&self, key: &Self::Key, values: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::ValueIn>,
        F: FnMut(Self::KeyOut, Self::ValueOut);
}

/// A reduction over the entire output of a previous stage, invoked exactly
/// once with every entry. This is the explicit form of the "route everything
/// to one reducer" stage that global rankings need.
pub trait GlobalReducer {
    type Entry: Send;
    type KeyOut: Send + Serialize + Clone;
    type ValueOut: Send + Serialize + Clone;

    fn do_reduce_global<I, F>(&self, entries: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::Entry>,
        F: FnMut(Self::KeyOut, Self::ValueOut);
}

// ========== Stock stages ==========

/// Sums a key's values.
pub struct SumCombiner<K, V> {
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> SumCombiner<K, V> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<K, V> Default for SumCombiner<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Combiner for SumCombiner<K, V>
where
    K: Send + Serialize + Hash + Eq + Ord + Clone,
    V: Send + Serialize + Clone + Sum,
{
    type Key = K;
    type Value = V;

    fn do_combine<I>(&self, _key: &K, values: I) -> V
    where
        I: IntoIterator<Item = V>,
    {
        values.into_iter().sum()
    }
}

/// Emits `(key, sum of values)` per group.
pub struct SumReducer<K, V> {
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> SumReducer<K, V> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<K, V> Default for SumReducer<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Reducer for SumReducer<K, V>
where
    K: Send + Serialize + Hash + Eq + Ord + Clone,
    V: Send + Serialize + Clone + Sum,
{
    type Key = K;
    type ValueIn = V;
    type KeyOut = K;
    type ValueOut = V;

    fn do_reduce<I, F>(&self, key: &K, values: I, emit: &mut F)
    where
        I: IntoIterator<Item = V>,
        F: FnMut(K, V),
    {
        let total: V = values.into_iter().sum();
        emit(key.clone(), total);
    }
}
