//! Probable-prime candidate generator.
//!
//! Candidates are random odd integers of exactly the requested bit length.
//! Each is screened by trial division against small primes and then by
//! Miller-Rabin with bases drawn from the same secure source. The result is a
//! probable prime: a composite survives `k` rounds with probability at most
//! `4^-k`.

use num_bigint::BigUint;
use zeroize::Zeroizing;

use crate::{CandidateGenerator, Error, Result, SecureRandomSource};

/// Small odd primes used to reject most candidates before Miller-Rabin.
const SMALL_PRIMES: [u32; 53] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// Largest target size a candidate can be drawn for.
pub const MAX_TARGET_BITS: u64 = 1 << 20;

/// Extra random bytes drawn for each Miller-Rabin base to flatten the
/// reduction bias.
const BASE_EXTRA_BYTES: usize = 8;

/// Generates probable primes of a target bit length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbablePrimeGenerator {
    rounds: u32,
}

impl ProbablePrimeGenerator {
    /// Default number of Miller-Rabin rounds.
    pub const DEFAULT_ROUNDS: u32 = 40;

    /// Creates a generator running `rounds` Miller-Rabin rounds per candidate.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `rounds` is zero.
    pub fn new(rounds: u32) -> Result<Self> {
        if rounds == 0 {
            return Err(Error::InvalidArgument(
                "at least one Miller-Rabin round is required".to_string(),
            ));
        }
        Ok(Self { rounds })
    }

    /// Miller-Rabin rounds per candidate.
    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

impl Default for ProbablePrimeGenerator {
    fn default() -> Self {
        Self {
            rounds: Self::DEFAULT_ROUNDS,
        }
    }
}

impl CandidateGenerator for ProbablePrimeGenerator {
    type Output = BigUint;

    fn try_candidate(
        &self,
        target_bits: u64,
        rng: &mut SecureRandomSource,
    ) -> Result<Option<BigUint>> {
        let candidate = random_odd_candidate(target_bits, rng)?;
        if is_probable_prime(&candidate, self.rounds, rng)? {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }
}

/// Draws a random odd integer with exactly `bits` bits (top bit set).
///
/// # Errors
/// [`Error::InvalidArgument`] if `bits` is outside `[2, MAX_TARGET_BITS]`, or
/// any error of the random source.
pub fn random_odd_candidate(bits: u64, rng: &mut SecureRandomSource) -> Result<BigUint> {
    check_target_bits(bits)?;
    let byte_len = (bits as usize).div_ceil(8);

    let mut bytes = Zeroizing::new(vec![0u8; byte_len]);
    rng.fill_bytes(&mut bytes)?;

    // Big-endian: byte 0 holds the top bits.
    let excess = (byte_len as u64 * 8 - bits) as u32;
    bytes[0] &= 0xFF >> excess;
    bytes[0] |= 0x80 >> excess;
    bytes[byte_len - 1] |= 1;

    Ok(BigUint::from_bytes_be(&bytes))
}

/// Checks that `bits` is a target size candidates can be drawn for.
///
/// # Errors
/// [`Error::InvalidArgument`] if `bits` is outside `[2, MAX_TARGET_BITS]`.
pub fn check_target_bits(bits: u64) -> Result<()> {
    if !(2..=MAX_TARGET_BITS).contains(&bits) {
        return Err(Error::InvalidArgument(format!(
            "target size must be between 2 and {MAX_TARGET_BITS} bits, got {bits}"
        )));
    }
    Ok(())
}

/// Tests `n` for primality with trial division and `rounds` Miller-Rabin rounds.
///
/// Values small enough to be settled by trial division never touch `rng`.
///
/// # Errors
/// Any error of the random source while drawing bases.
pub fn is_probable_prime(n: &BigUint, rounds: u32, rng: &mut SecureRandomSource) -> Result<bool> {
    let zero = BigUint::from(0u32);
    let one = BigUint::from(1u32);
    let two = BigUint::from(2u32);

    if *n < two {
        return Ok(false);
    }
    if *n == two {
        return Ok(true);
    }
    if (n % &two) == zero {
        return Ok(false);
    }
    for p in SMALL_PRIMES {
        let p = BigUint::from(p);
        if *n == p {
            return Ok(true);
        }
        if (n % &p) == zero {
            return Ok(false);
        }
    }
    let largest = BigUint::from(SMALL_PRIMES[SMALL_PRIMES.len() - 1]);
    if *n < &largest * &largest {
        return Ok(true);
    }

    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = random_base(n, rng)?;
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
            if x == one {
                return Ok(false);
            }
        }
        return Ok(false);
    }
    Ok(true)
}

/// Draws a Miller-Rabin base in `[2, n - 2]`. Requires `n > 4`.
fn random_base(n: &BigUint, rng: &mut SecureRandomSource) -> Result<BigUint> {
    let span = n - BigUint::from(3u32);
    let byte_len = usize::try_from(n.bits().div_ceil(8)).unwrap_or(usize::MAX) + BASE_EXTRA_BYTES;

    let mut bytes = Zeroizing::new(vec![0u8; byte_len]);
    rng.fill_bytes(&mut bytes)?;

    Ok(BigUint::from_bytes_be(&bytes) % span + BigUint::from(2u32))
}
