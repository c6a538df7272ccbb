use std::ops::RangeInclusive;

use rand::Rng;

/// Suffix range for generated names. Collisions are possible and not checked.
pub const NAME_SUFFIX_RANGE: RangeInclusive<u32> = 10_000..=99_999;

/// Policy and watch names used by one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanNames {
    pub policy: String,
    pub watch: String,
}

impl ScanNames {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self::generate_with(&mut rng)
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            policy: format!("sec_policy_{}", rng.gen_range(NAME_SUFFIX_RANGE)),
            watch: format!("watch{}", rng.gen_range(NAME_SUFFIX_RANGE)),
        }
    }
}
