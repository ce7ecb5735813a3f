//! Priority types and injectable priority sources.
//!
//! The tree never draws randomness on its own. Callers either pass a priority to
//! [`MerkleTreap::insert`](crate::MerkleTreap::insert) or hand a [`PrioritySource`] to
//! [`MerkleTreap::insert_with`](crate::MerkleTreap::insert_with).

use core::fmt::Debug;
use core::marker::PhantomData;
use sha3::Digest;

/// Unsigned integer type used to order nodes into a max-heap.
pub trait Priority: Copy + Ord + Default + Debug {
    /// Constructs a priority from the leading bytes of `bytes` (big-endian, zero padded).
    fn from_digest_bytes(bytes: &[u8]) -> Self;
}

macro_rules! impl_priority_from_bytes {
    ($($ty:ty),+) => {
        $(
            impl Priority for $ty {
                #[inline(always)]
                fn from_digest_bytes(bytes: &[u8]) -> Self {
                    let mut out = [0u8; core::mem::size_of::<$ty>()];
                    let copy_len = bytes.len().min(out.len());
                    out[..copy_len].copy_from_slice(&bytes[..copy_len]);
                    <$ty>::from_be_bytes(out)
                }
            }
        )+
    };
}

impl_priority_from_bytes!(u16, u32, u64, u128);

/// Capability that assigns a priority to a key about to be inserted.
pub trait PrioritySource<P: Priority> {
    /// Returns the priority for `key`.
    fn priority_for(&mut self, key: &[u8]) -> P;
}

impl<P, F> PrioritySource<P> for F
where
    P: Priority,
    F: FnMut(&[u8]) -> P,
{
    #[inline]
    fn priority_for(&mut self, key: &[u8]) -> P {
        self(key)
    }
}

/// Derives each priority from the digest of the key.
///
/// The resulting shape depends only on the key set, so two trees holding the same keys have
/// the same root hash no matter the insertion order.
pub struct KeyDerived<H: Digest> {
    _hasher: PhantomData<H>,
}

impl<H: Digest> KeyDerived<H> {
    /// Creates a key-derived priority source.
    #[inline]
    pub const fn new() -> Self {
        Self {
            _hasher: PhantomData,
        }
    }
}

impl<H: Digest> Default for KeyDerived<H> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Digest, P: Priority> PrioritySource<P> for KeyDerived<H> {
    #[inline]
    fn priority_for(&mut self, key: &[u8]) -> P {
        P::from_digest_bytes(H::digest(key).as_ref())
    }
}

/// Uniformly random priorities drawn from a caller-owned generator.
#[cfg(feature = "rand")]
pub struct RandomPriorities<R> {
    rng: R,
}

#[cfg(feature = "rand")]
impl<R: rand::RngCore> RandomPriorities<R> {
    /// Wraps `rng` as a priority source.
    #[inline]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Returns the wrapped generator.
    pub fn into_inner(self) -> R {
        self.rng
    }
}

#[cfg(feature = "rand")]
impl<R: rand::RngCore, P: Priority> PrioritySource<P> for RandomPriorities<R> {
    #[inline]
    fn priority_for(&mut self, _key: &[u8]) -> P {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        P::from_digest_bytes(&bytes)
    }
}
