//! Model presentation order shuffling
//!
//! Fisher-Yates over a copy of the input: every one of the n! permutations of n
//! distinct elements is equally likely, in O(n).

use rand::Rng;

/// Return a uniformly shuffled copy of `items` using the thread RNG
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rand::thread_rng())
}

/// Return a uniformly shuffled copy of `items` drawing from `rng`
///
/// Scans from the last index down to 1, swapping position `i` with a uniform
/// `j` in `[0, i]`. Empty and single-element inputs come back unchanged.
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut result = items.to_vec();
    for i in (1..result.len()).rev() {
        let j = rng.gen_range(0..=i);
        result.swap(i, j);
    }
    result
}
