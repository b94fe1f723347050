//! Choice Ordering - display order for choices.
//!
//! Three variants, all pure:
//! - **deterministic_shuffle**: canonical sort by stable key, then a seeded permutation.
//! - **gravity_strict**: gravity weight descending, stable key ascending.
//! - **gravity_bucket_shuffle**: buckets by rounded weight (heaviest first), each
//!   bucket shuffled with the seed salted by its weight.

mod gravity;
mod shuffle;

pub use gravity::*;
pub use shuffle::*;

use std::collections::BTreeMap;
use story_rules::{Choice, OrderingVariant, NEUTRAL_WEIGHT};

/// Anything that can be placed in display order.
pub trait DisplayOrdered {
    /// Stable identity: explicit ID, falling back to display text.
    fn ordering_key(&self) -> &str;

    /// Separates items whose ordering keys collide.
    fn tie_breaker(&self) -> &str {
        ""
    }

    fn gravity_weight(&self) -> f32 {
        NEUTRAL_WEIGHT
    }
}

impl DisplayOrdered for Choice {
    fn ordering_key(&self) -> &str {
        self.stable_key()
    }

    fn tie_breaker(&self) -> &str {
        &self.next_node_id
    }
}

/// Which algorithm to use and the seed to key it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingOptions {
    pub variant: OrderingVariant,
    pub seed: String,
}

impl OrderingOptions {
    pub fn new(variant: OrderingVariant, seed: impl Into<String>) -> Self {
        Self {
            variant,
            seed: seed.into(),
        }
    }

    /// The default variant (gravity bucket shuffle).
    pub fn seeded(seed: impl Into<String>) -> Self {
        Self::new(OrderingVariant::default(), seed)
    }
}

/// Weight rounded to one decimal, as an integer bucket key.
fn bucket_of(weight: f32) -> i32 {
    (weight * 10.0).round() as i32
}

/// Sort by stable key so input array order never matters.
fn canonicalize<T: DisplayOrdered + Clone>(choices: &[T]) -> Vec<T> {
    let mut sorted = choices.to_vec();
    sorted.sort_by(|a, b| {
        a.ordering_key()
            .cmp(b.ordering_key())
            .then_with(|| a.tie_breaker().cmp(b.tie_breaker()))
    });
    sorted
}

/// Order choices for display. Same choice identities and seed, same order.
pub fn order_choices_for_display<T: DisplayOrdered + Clone>(
    choices: &[T],
    options: &OrderingOptions,
) -> Vec<T> {
    let mut ordered = canonicalize(choices);

    match options.variant {
        OrderingVariant::DeterministicShuffle => {
            seeded_shuffle(&mut ordered, &options.seed);
            ordered
        }
        OrderingVariant::GravityStrict => {
            ordered.sort_by(|a, b| {
                b.gravity_weight()
                    .total_cmp(&a.gravity_weight())
                    .then_with(|| a.ordering_key().cmp(b.ordering_key()))
            });
            ordered
        }
        OrderingVariant::GravityBucketShuffle => {
            let mut buckets: BTreeMap<i32, Vec<T>> = BTreeMap::new();
            for choice in ordered {
                buckets
                    .entry(bucket_of(choice.gravity_weight()))
                    .or_default()
                    .push(choice);
            }

            buckets
                .into_iter()
                .rev()
                .flat_map(|(bucket, mut members)| {
                    let salted = format!("{}:{:.1}", options.seed, bucket as f32 / 10.0);
                    seeded_shuffle(&mut members, &salted);
                    members
                })
                .collect()
        }
    }
}
