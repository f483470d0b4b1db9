// ============================================================
// Layer 6 — Seeding
// ============================================================
// One run seed fans out to every consumer of randomness:
//
//   backend       Burn's tensor RNG (parameter initialisation)
//   shuffle       DataLoader shuffling of the train split
//   augmentation  random-crop offsets in the train batcher
//   synthetic     the synthetic image generator
//
// Call `seed_everything` once, before any model or loader is
// built, and hand the returned seeds to the components that
// need them.

use burn::tensor::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seeds {
    pub backend:      u64,
    pub shuffle:      u64,
    pub augmentation: u64,
    pub synthetic:    u64,
}

impl Seeds {
    pub fn derive(seed: u64) -> Self {
        Self {
            backend:      seed,
            shuffle:      seed.wrapping_add(1),
            augmentation: seed.wrapping_add(2),
            synthetic:    seed.wrapping_add(3),
        }
    }
}

/// Seed the backend RNG and return the component seeds.
pub fn seed_everything<B: Backend>(seed: u64) -> Seeds {
    let seeds = Seeds::derive(seed);
    B::seed(seeds.backend);
    tracing::debug!("Seeded run with {} ({:?})", seed, seeds);
    seeds
}
