// Utilities: bit helpers and float exponent helpers shared by the graph modules

// ===== Bit helpers =====

/// Number of set bits in a coverage mask.
pub fn pop_count8(x: u8) -> u32 {
    let mut n = 0;
    for bit in 0..8 {
        n += ((x >> bit) & 1) as u32;
    }
    n
}

/// Largest power of two not greater than `x`. Returns 0 for 0.
pub fn power_of_2_floor(x: usize) -> usize {
    if x == 0 {
        return 0;
    }
    1 << (usize::BITS - 1 - x.leading_zeros())
}

// ===== Float helpers =====

/// Binary exponent `e` such that `x = m * 2^e` with `m` in `[0.5, 1)`,
/// like C's `frexp`. Zero, negative, subnormal and non-finite inputs map to
/// values that callers clamp anyway; infinity reports one past `f64::MAX`.
pub fn frexp_exponent(x: f64) -> i32 {
    if !(x > 0.0) {
        return 0;
    }
    if x.is_infinite() {
        return f64::MAX_EXP + 1;
    }
    let biased = ((x.to_bits() >> 52) & 0x7FF) as i32;
    if biased == 0 {
        // Subnormal: exponent is below the normal range.
        return f64::MIN_EXP - 1;
    }
    biased - 1022
}

/// `2^exp` saturated at `f64::MAX` instead of overflowing to infinity.
pub fn pow2_saturating(exp: i32) -> f64 {
    if exp >= f64::MAX_EXP {
        return f64::MAX;
    }
    if exp < f64::MIN_EXP - 1 {
        return 0.0;
    }
    f64::from_bits(((exp + 1023) as u64) << 52)
}

/// `value * 2^exp`, saturated at `f64::MAX`.
pub fn ldexp_saturating(value: f64, exp: i32) -> f64 {
    let scaled = value * pow2_saturating(exp);
    if scaled <= f64::MAX { scaled } else { f64::MAX }
}
