//! Bit twiddling helpers.

/// Set bit `bit` of `x` on if `toggle` is true, otherwise off.
pub fn bit(bit: u32, x: u64, toggle: bool) -> u64 {
    if toggle {
        x | (1 << bit)
    } else {
        x & !(1 << bit)
    }
}

/// Test whether bit `bit` of `x` is set.
pub fn test_bit(bit: u32, x: u64) -> bool {
    (x >> bit) & 1 == 1
}

/// Set bit `bit` of a bitmap stored as 32-bit words, most significant word first.
///
/// Bit 0 lives in the last word, so `[u32; 4]` lines up with a `u128` split high word first.
pub fn set_word_bit(words: &mut [u32], bit: u32) {
    let word = words.len() - 1 - (bit / 32) as usize;
    words[word] |= 1 << (bit % 32);
}
