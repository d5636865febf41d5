use illusio_core::Condition;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Condition values, each run `repetitions` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignSpec {
    pub values: Vec<Condition>,
    pub repetitions: usize,
}

impl DesignSpec {
    pub fn new(values: impl IntoIterator<Item = i32>, repetitions: usize) -> Self {
        Self {
            values: values.into_iter().map(Condition).collect(),
            repetitions,
        }
    }

    pub fn trial_count(&self) -> usize {
        self.values.len() * self.repetitions
    }
}

/// Fixed, shuffled order of conditions for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialPlan {
    conditions: Vec<Condition>,
}

impl TrialPlan {
    /// Builds the full multiset and applies a Fisher-Yates shuffle.
    pub fn generate<R: Rng + ?Sized>(design: &DesignSpec, rng: &mut R) -> Self {
        let mut conditions = Vec::with_capacity(design.trial_count());
        for value in &design.values {
            conditions.extend(std::iter::repeat_n(*value, design.repetitions));
        }
        conditions.shuffle(rng);
        Self { conditions }
    }

    pub fn seeded(design: &DesignSpec, seed: u64) -> Self {
        Self::generate(design, &mut StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(design: &DesignSpec) -> Self {
        Self::generate(design, &mut StdRng::from_os_rng())
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn iter(&self) -> impl Iterator<Item = Condition> + '_ {
        self.conditions.iter().copied()
    }
}
