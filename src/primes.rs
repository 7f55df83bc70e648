//! Bucket-count growth policy: table sizes are always prime.

/// Sizes handed out for small and medium tables. Each is roughly 1.2x the
/// previous one, so doubling a size always lands on a nearby entry.
const PRIMES: &[usize] = &[
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293, 353, 431, 521, 631,
    761, 919, 1103, 1327, 1597, 1931, 2333, 2801, 3371, 4049, 4861, 5839, 7013, 8419, 10103,
    12143, 14591, 17519, 21023, 25229, 30293, 36353, 43627, 52361, 62851, 75431, 90523, 108631,
    130363, 156437, 187751, 225307, 270371, 324449, 389357, 467237, 560689, 672827, 807403,
    968897, 1162687, 1395263, 1674319, 2009191, 2411033, 2893249, 3471899, 4166287, 4999559,
    5999471, 7199369,
];

/// Largest table size; growth stops here.
pub(crate) const MAX_PRIME: usize = 0x7FEF_FFFD;

pub(crate) fn is_prime(candidate: usize) -> bool {
    if candidate & 1 == 0 {
        return candidate == 2;
    }
    let mut divisor = 3;
    while divisor * divisor <= candidate {
        if candidate % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    candidate != 1
}

/// Smallest prime `>= min`, clamped to [`MAX_PRIME`].
pub(crate) fn get_prime(min: usize) -> usize {
    if let Some(&p) = PRIMES.iter().find(|&&p| p >= min) {
        return p;
    }
    let mut candidate = min | 1;
    while candidate < MAX_PRIME {
        if is_prime(candidate) {
            return candidate;
        }
        candidate += 2;
    }
    MAX_PRIME
}

/// Next table size for a table currently holding `old_size` entries: the
/// smallest prime at least twice as large, always strictly greater.
pub(crate) fn expand_prime(old_size: usize) -> usize {
    let new_size = old_size.saturating_mul(2);
    if new_size > MAX_PRIME && old_size < MAX_PRIME {
        return MAX_PRIME;
    }
    get_prime(new_size)
}
