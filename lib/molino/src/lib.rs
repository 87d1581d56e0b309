pub mod api;
pub mod constants;
pub mod io;
pub mod runtime;
pub mod stats;
pub mod topk;

pub use api::{Combiner, GlobalReducer, Mapper, Reducer, SumCombiner, SumReducer};
pub use runtime::LocalPipeline;
pub use topk::{MaxSelect, RankOrd, TopK};
