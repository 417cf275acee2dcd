use pcg_rand::Pcg64;
use rand::prelude::*;
use rand::SeedableRng;
use rust_wss::index::{BucketMethod, DynamicProposalArray, SamplingIndex};
use rust_wss::workload::{WeightDistribution, WeightGenerator};
use rust_wss::Key;
use std::time::Instant;

const SEED: u64 = 42;
const NUM_SAMPLES: usize = 1_000_000;
const MIN_SIZE_EXPONENT: u32 = 3;
const MAX_SIZE_EXPONENT: u32 = 7;
const MAX_WEIGHT: f64 = 1e30;

/// Sampled keys should average out near the middle of the key range; far off
/// means the structure is biased or broken.
fn assert_plausible_key_mean(key_sum: u64, draws: usize, items: usize) {
    let mean = key_sum / draws as u64;
    let items = items as u64;
    assert!(
        ((items / 4)..(3 * items / 4)).contains(&mean),
        "mean sampled key {} out of range for {} items",
        mean,
        items
    );
}

fn benchmark_structure<T: SamplingIndex>(rng: &mut impl Rng, items: usize) {
    let generator = WeightGenerator::new(WeightDistribution::Uniform, MAX_WEIGHT, 2.0);

    let start = Instant::now();
    let mut index = T::build(generator.initial_items(items, rng)).unwrap();
    println!(
        "{},{},setup,{}",
        T::NAME,
        items,
        start.elapsed().as_nanos() / items as u128
    );

    let mut key_sum: u64 = 0;
    let start = Instant::now();
    for _ in 0..NUM_SAMPLES {
        key_sum += index.sample(rng).unwrap().0;
    }
    println!(
        "{},{},sample,{}",
        T::NAME,
        items,
        start.elapsed().as_nanos() / NUM_SAMPLES as u128
    );
    assert_plausible_key_mean(key_sum, NUM_SAMPLES, items);

    // one full cycle of delete, sample under the gap, reinsert fresh
    let mut key_sum: u64 = 0;
    let start = Instant::now();
    for key in 0..items as Key {
        index.delete(key).unwrap();
        key_sum += index.sample(rng).unwrap().0;
        index.insert(key, key, generator.sample(rng)).unwrap();
    }
    println!(
        "{},{},churn,{}",
        T::NAME,
        items,
        start.elapsed().as_nanos() / items as u128
    );
    assert_plausible_key_mean(key_sum, items, items);
}

fn main() {
    let mut rng = Pcg64::seed_from_u64(SEED);

    for size_exponent in MIN_SIZE_EXPONENT..=MAX_SIZE_EXPONENT {
        let items = 10usize.pow(size_exponent);
        benchmark_structure::<BucketMethod>(&mut rng, items);
        benchmark_structure::<DynamicProposalArray>(&mut rng, items);
    }
}
