// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.


//! Bit-index generators.
//!
//! A mixer is built for one element and one bit-space size, and hands out the `k` bit
//! positions that element maps to. Both built-in mixers hash the element once with
//! MurmurHash3 and then walk a counter-based generator seeded by the digest, so building the
//! same mixer twice replays the same positions.

use std::hash::Hash;

use crate::hash::DEFAULT_MIXER_SEED;
use crate::hash::fmix64;
use crate::hash::hash_item;

/// Golden-ratio increment of the SplitMix64 generator.
const GOLDEN_GAMMA: u64 = 0x9e3779b97f4a7c15;

/// Produces the bit positions of one element.
///
/// Implementations must be deterministic: two mixers created from equal `(item, bit_count)`
/// pairs return equal index sequences.
pub trait Mixer<T: ?Sized> {
    /// Width in bits of the aligned region all indices are confined to, or 0 when indices
    /// may land anywhere in the bit space.
    ///
    /// A nonzero value must be a multiple of the storage block width.
    const BLOCK_BITS: usize;

    /// Creates the generator for `item` in a bit space of `bit_count` bits.
    fn new(item: &T, bit_count: usize) -> Self;

    /// Returns the next bit index, always in `[0, bit_count)`.
    fn next_index(&mut self) -> usize;

    /// First bit of the region the indices are confined to. Fixed before the first call to
    /// [`next_index`](Self::next_index); 0 for unconstrained mixers.
    fn base_offset(&self) -> usize {
        0
    }
}

/// SplitMix-style stream seeded from an element digest.
#[derive(Debug, Clone)]
struct DigestStream {
    state: u64,
    salt: u64,
}

impl DigestStream {
    fn new<T: Hash + ?Sized>(item: &T) -> Self {
        let (h1, h2) = hash_item(item, DEFAULT_MIXER_SEED);
        DigestStream {
            state: h1,
            salt: h2,
        }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        fmix64(self.state ^ self.salt)
    }

    /// Next value, reduced to `[0, range)` by multiply-shift.
    #[inline]
    fn next_below(&mut self, range: usize) -> usize {
        reduce(self.next_u64(), range)
    }
}

/// Maps a uniformly distributed `hash` to `[0, range)` without a division.
#[inline]
fn reduce(hash: u64, range: usize) -> usize {
    ((u128::from(hash) * range as u128) >> 64) as usize
}

/// Mixer whose indices are spread independently over the whole bit space.
#[derive(Debug, Clone)]
pub struct DefaultMixer {
    stream: DigestStream,
    bit_count: usize,
}

impl<T: Hash + ?Sized> Mixer<T> for DefaultMixer {
    const BLOCK_BITS: usize = 0;

    fn new(item: &T, bit_count: usize) -> Self {
        DefaultMixer {
            stream: DigestStream::new(item),
            bit_count,
        }
    }

    #[inline]
    fn next_index(&mut self) -> usize {
        self.stream.next_below(self.bit_count)
    }
}

/// Mixer that confines every index of an element to one `ALIGN_BITS`-wide region.
///
/// The region is picked from the first output of the stream, and every probe after that
/// stays inside it. With the default of 512 bits a whole element lives in one 64-byte cache
/// line, at the price of a slightly higher false positive rate than [`DefaultMixer`].
///
/// The bit space must be a positive multiple of `ALIGN_BITS`.
#[derive(Debug, Clone)]
pub struct CacheAlignedMixer<const ALIGN_BITS: usize = 512> {
    stream: DigestStream,
    base_offset: usize,
}

impl<T: Hash + ?Sized, const ALIGN_BITS: usize> Mixer<T> for CacheAlignedMixer<ALIGN_BITS> {
    const BLOCK_BITS: usize = ALIGN_BITS;

    fn new(item: &T, bit_count: usize) -> Self {
        const { assert!(ALIGN_BITS > 0, "ALIGN_BITS must be positive") };

        let mut stream = DigestStream::new(item);
        let region = stream.next_below(bit_count / ALIGN_BITS);
        CacheAlignedMixer {
            stream,
            base_offset: region * ALIGN_BITS,
        }
    }

    #[inline]
    fn next_index(&mut self) -> usize {
        self.base_offset + self.stream.next_below(ALIGN_BITS)
    }

    fn base_offset(&self) -> usize {
        self.base_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices<M: Mixer<T>, T: ?Sized>(item: &T, bit_count: usize, k: usize) -> Vec<usize> {
        let mut mixer = M::new(item, bit_count);
        (0..k).map(|_| mixer.next_index()).collect()
    }

    #[test]
    fn test_reduce_stays_in_range() {
        assert_eq!(reduce(0, 10), 0);
        assert_eq!(reduce(u64::MAX, 10), 9);
        assert_eq!(reduce(u64::MAX / 2, 10), 4);
        assert_eq!(reduce(12345, 1), 0);
    }

    #[test]
    fn test_default_mixer_is_deterministic() {
        let a = indices::<DefaultMixer, _>(&"apple", 1000, 16);
        let b = indices::<DefaultMixer, _>(&"apple", 1000, 16);
        let c = indices::<DefaultMixer, _>(&"grape", 1000, 16);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|&idx| idx < 1000));
    }

    #[test]
    fn test_default_mixer_spreads_indices() {
        let mut hits = [0usize; 8];
        for item in 0..1000u64 {
            for idx in indices::<DefaultMixer, _>(&item, 8, 4) {
                hits[idx] += 1;
            }
        }
        // 4000 draws over 8 buckets, 500 expected in each.
        assert!(hits.iter().all(|&n| (400..600).contains(&n)), "{hits:?}");
    }

    #[test]
    fn test_cache_aligned_mixer_stays_in_region() {
        for item in 0..200u32 {
            let mut mixer = <CacheAlignedMixer as Mixer<u32>>::new(&item, 512 * 8);
            let base = Mixer::<u32>::base_offset(&mixer);
            assert_eq!(base % 512, 0);
            assert!(base < 512 * 8);
            for _ in 0..10 {
                let idx = Mixer::<u32>::next_index(&mut mixer);
                assert!((base..base + 512).contains(&idx));
            }
        }
    }

    #[test]
    fn test_cache_aligned_mixer_uses_every_region() {
        let mut seen = [false; 4];
        for item in 0..100u64 {
            let mixer = <CacheAlignedMixer<64> as Mixer<u64>>::new(&item, 256);
            seen[Mixer::<u64>::base_offset(&mixer) / 64] = true;
        }
        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn test_cache_aligned_mixer_is_deterministic() {
        let a = indices::<CacheAlignedMixer<128>, _>(&42u64, 1024, 8);
        let b = indices::<CacheAlignedMixer<128>, _>(&42u64, 1024, 8);
        assert_eq!(a, b);
    }
}
