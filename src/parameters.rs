use crate::workload::WeightDistribution;
use std::str::FromStr;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "rust-wss",
    about = "Benchmarks dynamic weighted set sampling structures"
)]
pub struct Parameters {
    #[structopt(short = "a", long, default_value = "bucket")]
    pub structure: SamplingStructure,

    #[structopt(short = "n", long)]
    pub items: usize,

    #[structopt(short = "s", long)]
    pub seed_value: Option<u64>,

    #[structopt(short = "q", long)]
    pub samples: Option<usize>,

    #[structopt(short = "u", long)]
    pub churn_rounds: Option<usize>,

    #[structopt(short = "d", long, default_value = "uniform")]
    pub distribution: WeightDistribution,

    #[structopt(short = "w", long, default_value = "1e30")]
    pub max_weight: f64,

    #[structopt(short = "t", long, default_value = "2.0")]
    pub tail_exponent: f64,

    #[structopt(short = "m", long, default_value = "reinsert")]
    pub mutation: MutationKind,

    #[structopt(short = "r", long)]
    pub report_sample_distribution: bool,
}

#[derive(Eq, Clone, Copy, PartialEq, Debug)]
pub enum SamplingStructure {
    BucketMethod,
    ProposalArray,
}

impl FromStr for SamplingStructure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bucket" => Ok(SamplingStructure::BucketMethod),
            "proposal" => Ok(SamplingStructure::ProposalArray),
            _ => Err(format!("Unknown structure type: {}", s)),
        }
    }
}

#[derive(Eq, Clone, Copy, PartialEq, Debug)]
pub enum MutationKind {
    /// Delete a key, sample, then insert the key back with a fresh weight.
    Reinsert,
    /// Zero a key's weight, sample, then assign a fresh weight.
    Reweight,
}

impl FromStr for MutationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reinsert" => Ok(MutationKind::Reinsert),
            "reweight" => Ok(MutationKind::Reweight),
            _ => Err(format!("Unknown mutation type: {}", s)),
        }
    }
}

pub fn get_and_check_options() -> Parameters {
    let mut opt = Parameters::from_args();

    assert!(opt.items >= 2);
    if opt.samples.is_none() {
        opt.samples = Some(opt.items * 10);
    }
    if opt.churn_rounds.is_none() {
        opt.churn_rounds = Some(opt.items);
    }
    assert!(opt.samples.unwrap() >= 1);

    assert!(opt.max_weight > 0.0 && opt.max_weight.is_finite());
    assert!(opt.tail_exponent > 0.0);

    opt
}
