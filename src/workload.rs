use crate::{Key, Value, Weight};
use rand::Rng;
use rand_distr::{Distribution, Pareto};
use std::str::FromStr;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WeightDistribution {
    Uniform,
    LogUniform,
    Pareto,
}

impl FromStr for WeightDistribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(WeightDistribution::Uniform),
            "log-uniform" => Ok(WeightDistribution::LogUniform),
            "pareto" => Ok(WeightDistribution::Pareto),
            _ => Err(format!("Unknown weight distribution: {}", s)),
        }
    }
}

/// Draws item weights for benchmark populations.
///
/// `Uniform` covers `[0, max_weight)` and matches a memoryless reweighting
/// workload. `LogUniform` spreads the same number of items over every decade
/// up to `max_weight`, which is the stress case for magnitude-sensitive
/// structures. `Pareto` starts at 1 and is clamped to `max_weight`.
///
/// # Example
/// ```
/// use pcg_rand::Pcg64;
/// use rand::SeedableRng;
/// use rust_wss::workload::{WeightDistribution, WeightGenerator};
///
/// let generator = WeightGenerator::new(WeightDistribution::LogUniform, 1e30, 2.0);
/// let mut rng = Pcg64::seed_from_u64(1);
///
/// let w = generator.sample(&mut rng);
/// assert!((1.0..=1e30).contains(&w));
/// ```
pub struct WeightGenerator {
    distribution: WeightDistribution,
    max_weight: f64,
    pareto: Pareto<f64>,
}

impl WeightGenerator {
    pub fn new(distribution: WeightDistribution, max_weight: f64, tail_exponent: f64) -> Self {
        assert!(max_weight > 0.0 && max_weight.is_finite());
        assert!(tail_exponent > 0.0);

        Self {
            distribution,
            max_weight,
            pareto: Pareto::new(1.0, tail_exponent).unwrap(),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Weight {
        match self.distribution {
            WeightDistribution::Uniform => rng.gen::<f64>() * self.max_weight,
            WeightDistribution::LogUniform => self.max_weight.powf(rng.gen::<f64>()),
            WeightDistribution::Pareto => self.pareto.sample(rng).min(self.max_weight),
        }
    }

    /// Population of `items` keyed `0..items`, each valued like its key.
    pub fn initial_items<R: Rng + ?Sized>(
        &self,
        items: usize,
        rng: &mut R,
    ) -> Vec<(Key, Value, Weight)> {
        (0..items as Key)
            .map(|key| (key, key, self.sample(rng)))
            .collect()
    }
}
