use rust_wss::parameters::{get_and_check_options, MutationKind, Parameters, SamplingStructure};
use std::io::stdout;
use std::time::Instant;

use pcg_rand::Pcg64;
use rand::SeedableRng;
use rust_wss::index::{BucketMethod, DynamicProposalArray, SamplingIndex};
use rust_wss::sample_sink::{FrequencyCount, SampleCounter, SampleSink};
use rust_wss::workload::WeightGenerator;
use rust_wss::Key;

/// Builds the index, times a pure sampling phase and a churn phase, and
/// prints per-operation costs. Keys stay `0..items` throughout, so frequency
/// sinks can index by key.
fn run_phases<T: SamplingIndex>(opt: &Parameters, rng: &mut Pcg64, sink: &mut impl SampleSink) {
    let generator = WeightGenerator::new(opt.distribution, opt.max_weight, opt.tail_exponent);

    let start = Instant::now();
    let mut index = T::build(generator.initial_items(opt.items, rng)).unwrap();
    println!(
        "setup_ns:{}",
        start.elapsed().as_nanos() as f64 / opt.items as f64
    );

    let samples = opt.samples.unwrap();
    let start = Instant::now();
    for _ in 0..samples {
        let (key, _) = index.sample(rng).unwrap();
        sink.record(key);
    }
    println!(
        "sample_ns:{}",
        start.elapsed().as_nanos() as f64 / samples as f64
    );

    let rounds = opt.churn_rounds.unwrap();
    if rounds > 0 {
        let start = Instant::now();
        for round in 0..rounds {
            let key = (round % opt.items) as Key;
            match opt.mutation {
                MutationKind::Reinsert => {
                    index.delete(key).unwrap();
                    let (sampled, _) = index.sample(rng).unwrap();
                    sink.record(sampled);
                    index.insert(key, key, generator.sample(rng)).unwrap();
                }
                MutationKind::Reweight => {
                    index.update(key, 0.0).unwrap();
                    let (sampled, _) = index.sample(rng).unwrap();
                    sink.record(sampled);
                    index.update(key, generator.sample(rng)).unwrap();
                }
            }
        }
        println!(
            "churn_ns:{}",
            start.elapsed().as_nanos() as f64 / rounds as f64
        );
    }

    assert_eq!(index.len(), opt.items);
}

fn execute<T: SamplingIndex>(opt: &Parameters) {
    let mut rng = if let Some(seed_value) = opt.seed_value {
        Pcg64::seed_from_u64(seed_value)
    } else {
        Pcg64::from_entropy()
    };

    let expected_samples = opt.samples.unwrap() + opt.churn_rounds.unwrap();

    let runtime = if opt.report_sample_distribution {
        let mut sink = FrequencyCount::new(opt.items);

        let start = Instant::now();
        run_phases::<T>(opt, &mut rng, &mut sink);
        assert_eq!(sink.number_of_samples(), expected_samples);
        let duration = start.elapsed();

        sink.report_distribution(&mut stdout().lock()).unwrap();

        duration
    } else {
        let mut sink = SampleCounter::default();
        let start = Instant::now();

        run_phases::<T>(opt, &mut rng, &mut sink);
        assert_eq!(sink.number_of_samples(), expected_samples);

        start.elapsed()
    };

    println!("runtime_s:{}", runtime.as_secs_f64());
}

fn main() {
    let opt = get_and_check_options();

    match opt.structure {
        SamplingStructure::BucketMethod => execute::<BucketMethod>(&opt),
        SamplingStructure::ProposalArray => execute::<DynamicProposalArray>(&opt),
    };
}
