pub mod dyadic;
pub mod error;
pub mod index;
pub mod parameters;
pub mod sample_sink;
pub mod store;
pub mod workload;

pub type Key = u64;
pub type Value = u64;
pub type Weight = f64;

pub mod prelude {
    use super::*;

    pub use super::{Key, Value, Weight};
    pub use error::SampleError;
    pub use index::bucket_method::BucketMethod;
    pub use index::proposal_array::DynamicProposalArray;
    pub use index::SamplingIndex;
    pub use sample_sink::SampleSink;
    pub use store::ItemStore;
}
