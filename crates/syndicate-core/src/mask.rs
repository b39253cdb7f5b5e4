// crates/syndicate-core/src/mask.rs
//
// 256-bit permission masks shared by roles and features.

use primitive_types::U256;

/// A 256-bit bitmask of roles or features.
pub type Mask = U256;

/// Mask with only bit `index` set. `index` must be below 256.
pub const fn bit(index: usize) -> Mask {
    let limb = 1u64 << (index % 64);
    match index / 64 {
        0 => U256([limb, 0, 0, 0]),
        1 => U256([0, limb, 0, 0]),
        2 => U256([0, 0, limb, 0]),
        _ => U256([0, 0, 0, limb]),
    }
}

/// Mask with every bit set (2^256 - 1).
pub const FULL_MASK: Mask = U256([u64::MAX; 4]);

/// Mask with no bits set.
pub const EMPTY_MASK: Mask = U256([0; 4]);

/// True when every bit of `required` is set in `mask`.
pub fn contains(mask: Mask, required: Mask) -> bool {
    mask & required == required
}
