//! Fixed-width bit signatures.
//!
//! A [`Signature`] is a small value type over an array of words. Two kinds are
//! used by the managers:
//!
//! - [`ComponentSignature`]: bit `i` means "uses (or requires) component `i`",
//!   and the last bit, index [`MAX_NUM_COMPONENTS`], is the enabled flag.
//! - [`DependencySignature`]: bit `j` means "must run after system `j`", and
//!   the last bit, index [`MAX_NUM_SYSTEMS`], is the enabled flag.
//!
//! Every "does this entity qualify for this system" question is answered by
//! [`Signature::matches`], the masked-equality predicate
//! `want == (have & want)`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::BitAnd;

use crate::constants::{MAX_NUM_COMPONENTS, MAX_NUM_SYSTEMS};

const WORD_BITS: usize = u64::BITS as usize;

const fn widest_signature() -> usize {
    let widest = if MAX_NUM_COMPONENTS > MAX_NUM_SYSTEMS {
        MAX_NUM_COMPONENTS
    } else {
        MAX_NUM_SYSTEMS
    };
    widest + 1
}

/// Words backing every signature, enough for the widest kind.
pub const SIGNATURE_WORDS: usize = widest_signature().div_ceil(WORD_BITS);

// ---------------------------------------------------------------------------
// Signature kinds
// ---------------------------------------------------------------------------

/// Width of a signature kind.
pub trait SignatureKind: 'static {
    /// Number of bits, the trailing enabled flag included.
    const LEN: usize;
}

/// Kind of [`ComponentSignature`].
#[derive(Debug)]
pub enum ComponentBits {}

impl SignatureKind for ComponentBits {
    const LEN: usize = MAX_NUM_COMPONENTS + 1;
}

/// Kind of [`DependencySignature`].
#[derive(Debug)]
pub enum SystemBits {}

impl SignatureKind for SystemBits {
    const LEN: usize = MAX_NUM_SYSTEMS + 1;
}

/// Components used by an entity or required by a system.
pub type ComponentSignature = Signature<ComponentBits>;

/// Systems a system must run after, plus its enabled flag.
pub type DependencySignature = Signature<SystemBits>;

/// A bit index past the end of a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bit {bit} is outside a {len}-bit signature")]
pub struct BitOutOfRange {
    pub bit: usize,
    pub len: usize,
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Fixed-width bitset of `K::LEN` bits.
pub struct Signature<K> {
    words: [u64; SIGNATURE_WORDS],
    kind: PhantomData<fn() -> K>,
}

impl<K: SignatureKind> Signature<K> {
    /// Number of bits in this kind of signature.
    pub const LEN: usize = K::LEN;

    /// Index of the enabled flag, the last bit.
    pub const ENABLED_BIT: usize = K::LEN - 1;

    /// A signature with no bits set.
    pub const fn new() -> Self {
        Self {
            words: [0; SIGNATURE_WORDS],
            kind: PhantomData,
        }
    }

    /// Build a signature from a list of set bits.
    pub fn from_bits(bits: impl IntoIterator<Item = usize>) -> Result<Self, BitOutOfRange> {
        let mut signature = Self::new();
        for bit in bits {
            if bit >= K::LEN {
                return Err(BitOutOfRange { bit, len: K::LEN });
            }
            signature.set(bit);
        }
        Ok(signature)
    }

    #[inline]
    fn locate(bit: usize) -> (usize, u64) {
        assert!(
            bit < K::LEN,
            "bit {bit} is outside a {}-bit signature",
            K::LEN
        );
        (bit / WORD_BITS, 1u64 << (bit % WORD_BITS))
    }

    /// Set `bit`.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= LEN`. The same holds for [`clear`](Self::clear) and
    /// [`test`](Self::test).
    #[inline]
    pub fn set(&mut self, bit: usize) {
        let (word, mask) = Self::locate(bit);
        self.words[word] |= mask;
    }

    /// Clear `bit`.
    #[inline]
    pub fn clear(&mut self, bit: usize) {
        let (word, mask) = Self::locate(bit);
        self.words[word] &= !mask;
    }

    /// Whether `bit` is set.
    #[inline]
    pub fn test(&self, bit: usize) -> bool {
        let (word, mask) = Self::locate(bit);
        self.words[word] & mask != 0
    }

    /// Clear every bit.
    #[inline]
    pub fn reset(&mut self) {
        self.words = [0; SIGNATURE_WORDS];
    }

    /// Bits set in both signatures.
    #[inline]
    pub fn intersect(&self, other: &Self) -> Self {
        let mut words = self.words;
        for (word, other) in words.iter_mut().zip(other.words) {
            *word &= other;
        }
        Self {
            words,
            kind: PhantomData,
        }
    }

    /// Masked equality: every bit of `want` is also set in `self`.
    #[inline]
    pub fn matches(&self, want: &Self) -> bool {
        self.intersect(want) == *want
    }

    /// Whether any bit is set.
    #[inline]
    pub fn any(&self) -> bool {
        self.words.iter().any(|&word| word != 0)
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Whether the enabled flag is set.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.test(Self::ENABLED_BIT)
    }

    /// Set or clear the enabled flag.
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.set(Self::ENABLED_BIT);
        } else {
            self.clear(Self::ENABLED_BIT);
        }
    }

    /// Indices of set bits, enabled flag included, in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..K::LEN).filter(move |&bit| self.test(bit))
    }

    /// Indices of set bits below the enabled flag.
    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::ENABLED_BIT).filter(move |&bit| self.test(bit))
    }
}

impl<K: SignatureKind> BitAnd for Signature<K> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersect(&rhs)
    }
}

// Manual impls so the marker type needs no bounds of its own.

impl<K> Clone for Signature<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Signature<K> {}

impl<K> PartialEq for Signature<K> {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}

impl<K> Eq for Signature<K> {}

impl<K> Hash for Signature<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.words.hash(state);
    }
}

impl<K: SignatureKind> Default for Signature<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SignatureKind> fmt::Debug for Signature<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter_ones()).finish()
    }
}

impl<K: SignatureKind> Serialize for Signature<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter_ones())
    }
}

impl<'de, K: SignatureKind> Deserialize<'de> for Signature<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = Vec::<usize>::deserialize(deserializer)?;
        Self::from_bits(bits).map_err(serde::de::Error::custom)
    }
}
