use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const SUFFIX_LEN: usize = 8;

/// Produces the synthetic names (pipeline ids and the like) a template needs.
pub trait IdGenerator {
    /// Returns a fresh id starting with `prefix`, e.g. `ingest_pipeline_k3x9a0qz`.
    fn generate(&mut self, prefix: &str) -> String;
}

/// Appends a random lowercase alphanumeric suffix.
pub struct RandomIdGenerator<R: Rng = StdRng> {
    rng: R,
}

impl RandomIdGenerator<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// A generator whose output is fully determined by `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIdGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomIdGenerator<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> IdGenerator for RandomIdGenerator<R> {
    fn generate(&mut self, prefix: &str) -> String {
        let suffix: String = (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!("{}_{}", prefix, suffix)
    }
}

/// Numbers ids per prefix: `prefix_0`, `prefix_1`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counters: ahash::AHashMap<String, usize>,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        let id = format!("{}_{}", prefix, counter);
        *counter += 1;
        id
    }
}

/// How the compiler obtains a fresh `IdGenerator` for each compile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    #[default]
    Random,
    Seeded(u64),
    Sequential,
}

impl IdStrategy {
    pub fn generator(self) -> Box<dyn IdGenerator> {
        match self {
            IdStrategy::Random => Box::new(RandomIdGenerator::new()),
            IdStrategy::Seeded(seed) => Box::new(RandomIdGenerator::seeded(seed)),
            IdStrategy::Sequential => Box::new(SequentialIdGenerator::new()),
        }
    }
}
