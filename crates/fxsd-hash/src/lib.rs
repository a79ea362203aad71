//! 32-bit FNV-1a hashing used to tag FXSD records with a name.
//!
//! The hash is computed at compile time when called from a `const`
//! context, so record tags can be declared as constants:
//!
//! ```
//! use fxsd_hash::{NameHash, hash_str};
//!
//! const TEST_STRUCT_A: NameHash = hash_str("TestStructA");
//! assert_ne!(TEST_STRUCT_A, 0);
//! ```
//!
//! See <http://www.isthe.com/chongo/tech/comp/fnv/index.html#FNV-param>.

/// A 32-bit record name tag. Zero means "unchecked".
pub type NameHash = u32;

/// FNV-1a 32-bit offset basis.
pub const FNV1A_SEED: u32 = 0x811C_9DC5;

/// FNV-1a 32-bit prime.
pub const FNV1A_PRIME: u32 = 0x0100_0193;

/// Hash a byte string with FNV-1a.
#[must_use]
pub const fn hash_bytes(bytes: &[u8]) -> NameHash {
    let mut hash = FNV1A_SEED;
    let mut i = 0;
    while i < bytes.len() {
        hash = (hash ^ bytes[i] as u32).wrapping_mul(FNV1A_PRIME);
        i += 1;
    }
    hash
}

/// Hash a string with FNV-1a.
///
/// Hashing stops at the first NUL byte, so `"abc"` and `"abc\0def"` share
/// a tag.
#[must_use]
pub const fn hash_str(text: &str) -> NameHash {
    let bytes = text.as_bytes();
    let mut len = 0;
    while len < bytes.len() && bytes[len] != 0 {
        len += 1;
    }
    let (head, _) = bytes.split_at(len);
    hash_bytes(head)
}
