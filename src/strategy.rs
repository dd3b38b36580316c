//! Hash and equality strategies, supplied to a table at construction time.

use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use hashbrown::hash_map::DefaultHashBuilder;

/// The pair of key capabilities a `ProbeTable` probes with.
///
/// Implementations must be pure and consistent: keys that compare equal
/// must produce equal hashes. A table only calls into its strategy while
/// hashing a new or queried key and while comparing keys during a probe.
pub trait KeyStrategy<Q: ?Sized> {
    fn hash(&self, key: &Q) -> u64;
    fn eq(&self, a: &Q, b: &Q) -> bool;
}

/// Strategy built from `Hash + Eq` and a `BuildHasher`.
///
/// Implements `KeyStrategy<Q>` for every `Q: Hash + Eq`, which lets a table
/// of `String` keys be queried with `&str`.
#[derive(Clone, Debug, Default)]
pub struct StdStrategy<B = DefaultHashBuilder> {
    build: B,
}

impl<B> StdStrategy<B> {
    pub fn new(build: B) -> Self {
        Self { build }
    }

    pub fn build_hasher(&self) -> &B {
        &self.build
    }
}

impl<Q, B> KeyStrategy<Q> for StdStrategy<B>
where
    Q: ?Sized + Hash + Eq,
    B: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &Q) -> u64 {
        self.build.hash_one(key)
    }

    #[inline]
    fn eq(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}

/// Strategy made of two plain function pointers.
pub struct FnStrategy<Q: ?Sized> {
    hash: fn(&Q) -> u64,
    eq: fn(&Q, &Q) -> bool,
}

impl<Q: ?Sized> FnStrategy<Q> {
    pub const fn new(hash: fn(&Q) -> u64, eq: fn(&Q, &Q) -> bool) -> Self {
        Self { hash, eq }
    }
}

impl FnStrategy<str> {
    /// djb2 over the UTF-8 bytes, byte-wise equality.
    pub fn djb2() -> Self {
        fn hash(s: &str) -> u64 {
            djb2(s.as_bytes())
        }
        fn eq(a: &str, b: &str) -> bool {
            a == b
        }
        Self::new(hash, eq)
    }
}

impl<Q: ?Sized> KeyStrategy<Q> for FnStrategy<Q> {
    #[inline]
    fn hash(&self, key: &Q) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn eq(&self, a: &Q, b: &Q) -> bool {
        (self.eq)(a, b)
    }
}

// Lets `FnStrategy<str>` serve tables keyed by `&str` borrowed from the
// caller's buffer.
impl<'a, Q: ?Sized> KeyStrategy<&'a Q> for FnStrategy<Q> {
    #[inline]
    fn hash(&self, key: &&'a Q) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn eq(&self, a: &&'a Q, b: &&'a Q) -> bool {
        (self.eq)(a, b)
    }
}

impl<Q: ?Sized> Clone for FnStrategy<Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: ?Sized> Copy for FnStrategy<Q> {}

impl<Q: ?Sized> fmt::Debug for FnStrategy<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").finish_non_exhaustive()
    }
}

const DJB2_SEED: u64 = 5381;

/// Dan Bernstein's string hash: `h = h * 33 + byte`, seeded with 5381.
pub fn djb2(bytes: &[u8]) -> u64 {
    let mut h = Djb2Hasher::default();
    h.write(bytes);
    h.finish()
}

/// `BuildHasher` for djb2, for use as `StdStrategy<Djb2>`.
///
/// Deterministic and unkeyed; fine for counting words in trusted input,
/// not for keys chosen by an adversary.
#[derive(Clone, Copy, Debug, Default)]
pub struct Djb2;

impl BuildHasher for Djb2 {
    type Hasher = Djb2Hasher;

    fn build_hasher(&self) -> Djb2Hasher {
        Djb2Hasher::default()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Djb2Hasher(u64);

impl Default for Djb2Hasher {
    fn default() -> Self {
        Djb2Hasher(DJB2_SEED)
    }
}

impl Hasher for Djb2Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 5).wrapping_add(self.0).wrapping_add(u64::from(b));
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}
