use crate::error::SampleError;
use crate::{Key, Value, Weight};
use rand::Rng;

pub mod bucket_method;
pub mod proposal_array;

pub use bucket_method::BucketMethod;
pub use proposal_array::DynamicProposalArray;

/// Common surface of the dynamic weighted sampling structures.
///
/// An index maps keys to `(value, weight)` pairs and draws keys with
/// probability proportional to their weight. Mutations keep the structure
/// consistent; a failed precondition returns the error and changes nothing.
pub trait SamplingIndex: Sized {
    const NAME: &'static str;

    fn with_capacity(items: usize) -> Self;

    fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Builds an index over an initial population in one pass.
    fn build(items: impl IntoIterator<Item = (Key, Value, Weight)>) -> Result<Self, SampleError> {
        let mut index = Self::new();
        for (key, value, weight) in items {
            index.insert(key, value, weight)?;
        }
        Ok(index)
    }

    fn insert(&mut self, key: Key, value: Value, weight: Weight) -> Result<(), SampleError>;

    fn delete(&mut self, key: Key) -> Result<(), SampleError>;

    /// Changes the weight of a live key; a weight of zero keeps the key
    /// live but removes it from the sampled domain.
    fn update(&mut self, key: Key, weight: Weight) -> Result<(), SampleError>;

    /// Draws one key with probability `weight / total_weight`.
    fn sample(&self, rng: &mut impl Rng) -> Result<(Key, Value), SampleError>;

    fn lookup(&self, key: Key) -> Option<(Value, Weight)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: Key) -> bool {
        self.lookup(key).is_some()
    }

    fn weight_of(&self, key: Key) -> Option<Weight> {
        self.lookup(key).map(|(_, weight)| weight)
    }

    fn total_weight(&self) -> f64;
}
