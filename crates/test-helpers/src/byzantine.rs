//! Byzantine fixtures: shares altered the way a malicious party would.

use mpcsim_field::Zp;
use mpcsim_sharing::Share;
use rand::seq::index::sample;
use rand::Rng;

/// Replace the value at each index with a different random field element.
///
/// The replacement is guaranteed to differ from the original so the number of
/// corrupted points is exact.
pub fn corrupt_at<R: Rng + ?Sized>(shares: &mut [Share], indices: &[usize], rng: &mut R) {
    for &i in indices {
        let original = shares[i].value;
        let offset = rng.gen_range(1..original.prime());
        shares[i].value = original + Zp::new(original.prime(), offset);
    }
}

/// Corrupt `count` distinct shares chosen at random. Returns the indices.
pub fn corrupt_random<R: Rng + ?Sized>(shares: &mut [Share], count: usize, rng: &mut R) -> Vec<usize> {
    let mut indices = sample(rng, shares.len(), count).into_vec();
    indices.sort_unstable();
    corrupt_at(shares, &indices, rng);
    indices
}

/// Move a share to a different evaluation point, keeping its value.
pub fn misattribute(share: &Share, point: Zp) -> Share {
    Share::new(point, share.value)
}
