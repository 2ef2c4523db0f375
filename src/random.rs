use crate::{
    context::{Context, DataPlugin},
    log::trace,
    type_of, HashMap, TypeId,
};
use rand::{
    distr::uniform::{SampleRange, SampleUniform},
    prelude::Distribution,
    seq::SliceRandom,
    Rng, SeedableRng,
};
use rustc_hash::FxHasher;
use std::{
    any::Any,
    hash::{Hash, Hasher},
};

/// Identifies a named random stream. Use `define_rng!` rather than implementing this by hand.
pub trait RngId: Any {
    #![allow(non_upper_case_globals)]
    const new: &'static dyn Fn(u64) -> Self;
    const name: &'static str;
    type RngType: SeedableRng;
    fn rng(&mut self) -> &mut Self::RngType;
}

pub(crate) fn hash_str(data: &str) -> u64 {
    let mut hasher = FxHasher::default();
    data.hash(&mut hasher);
    hasher.finish()
}

struct RngPlugin {
    base_seed: u64,
    // This is actually a `HashMap<TypeId, Box<R: RngId>>`
    rng_map: HashMap<TypeId, Box<dyn Any>>,
}

impl RngPlugin {
    fn clear(&mut self) {
        self.rng_map.clear();
    }

    fn get_rng<R: RngId>(&mut self) -> &mut R::RngType {
        let base_seed = self.base_seed;
        self.rng_map
            .entry(type_of::<R>())
            .or_insert_with(|| Box::new(R::new(base_seed.wrapping_add(hash_str(R::name)))))
            .downcast_mut::<R>()
            .unwrap() // Only an `R` is ever stored under `type_of::<R>()`
            .rng()
    }
}

impl DataPlugin for RngPlugin {
    const new: &'static dyn Fn() -> Self = &|| RngPlugin {
        base_seed: 0,
        rng_map: HashMap::default(),
    };
}

/// Gets a mutable reference to the random number generator associated with the given
/// `RngId`.
// This is a private free function so that it's not leaked to the public API.
fn get_rng<R: RngId>(context: &mut Context) -> &mut R::RngType {
    context.get_data_container_mut::<RngPlugin>().get_rng::<R>()
}

pub trait ContextRandomExt {
    /// Sets the base seed and discards existing streams so they are re-seeded on next use.
    fn init_random(&mut self, base_seed: u64);

    /// Gets a random sample from the random number generator associated with the given
    /// `RngId` by applying the specified sampler function. If the Rng has not been used
    /// before, one will be created with the base seed you defined in `init_random`.
    fn sample<R: RngId, T>(&mut self, sampler: impl FnOnce(&mut R::RngType) -> T) -> T;

    /// Gets a random sample from the specified distribution.
    fn sample_distr<R: RngId, T>(&mut self, distribution: impl Distribution<T>) -> T
    where
        R::RngType: Rng;

    /// Gets a random sample within the range provided by `range`.
    fn sample_range<R: RngId, S, T>(&mut self, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform;

    /// A coin toss that comes up `true` with probability `p`: a uniform draw in `[0, 1]` is
    /// compared against `p`. A probability of exactly zero is `false` and consumes nothing
    /// from the stream.
    fn sample_bool<R: RngId>(&mut self, p: f64) -> bool
    where
        R::RngType: Rng;

    /// Shuffles `values` in place.
    fn shuffle<R: RngId, T>(&mut self, values: &mut [T])
    where
        R::RngType: Rng;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module with seed {base_seed}");
        let rng_container = self.get_data_container_mut::<RngPlugin>();
        rng_container.base_seed = base_seed;

        // Clear any existing Rngs to ensure they get re-seeded when `get_rng` is called
        rng_container.clear();
    }

    fn sample<R: RngId, T>(&mut self, sampler: impl FnOnce(&mut R::RngType) -> T) -> T {
        let rng = get_rng::<R>(self);
        sampler(rng)
    }

    fn sample_distr<R: RngId, T>(&mut self, distribution: impl Distribution<T>) -> T
    where
        R::RngType: Rng,
    {
        let rng = get_rng::<R>(self);
        distribution.sample::<R::RngType>(rng)
    }

    fn sample_range<R: RngId, S, T>(&mut self, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample::<R, T>(|rng| rng.random_range(range))
    }

    fn sample_bool<R: RngId>(&mut self, p: f64) -> bool
    where
        R::RngType: Rng,
    {
        if p == 0.0 {
            return false;
        }
        self.sample::<R, bool>(|rng| rng.random_range(0.0..=1.0) <= p)
    }

    fn shuffle<R: RngId, T>(&mut self, values: &mut [T])
    where
        R::RngType: Rng,
    {
        let rng = get_rng::<R>(self);
        values.shuffle(rng);
    }
}

#[macro_export]
macro_rules! define_rng {
    ($vis:vis $random_id:ident) => {
        $vis struct $random_id {
            rng: $crate::rand::rngs::StdRng,
        }

        impl $crate::random::RngId for $random_id {
            #![allow(non_upper_case_globals)]
            type RngType = $crate::rand::rngs::StdRng;
            const name: &'static str = stringify!($random_id);
            const new: &'static dyn Fn(u64) -> Self = &|seed| {
                use $crate::rand::SeedableRng;
                Self {
                    rng: $crate::rand::rngs::StdRng::seed_from_u64(seed),
                }
            };

            fn rng(&mut self) -> &mut Self::RngType {
                &mut self.rng
            }
        }
    };
}
pub use define_rng;

// Every draw of a run comes from this one stream, so a seed fully determines the run.
define_rng!(pub SimulationRng);
