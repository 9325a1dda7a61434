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


use std::fmt;
use std::marker::PhantomData;

use super::CacheAlignedMixer;
use super::DefaultMixer;
use super::FilterParams;
use super::Mixer;
use super::storage::AtomicStorage;
use super::storage::Block;
use super::storage::ConcurrentStorage;
use super::storage::Storage;
use super::storage::VecStorage;
use crate::error::Error;
use crate::error::ensure;

/// Upper bound on the number of storage blocks one aligned mixer region may span.
///
/// Region bookkeeping lives on the stack in arrays of this length, so
/// `M::BLOCK_BITS / Block::BITS` must not exceed it (512 bits of `u8` blocks, 4096 bits of
/// `u64` blocks).
pub const MAX_REGION_BLOCKS: usize = 64;

/// A probabilistic set with no false negatives and a tunable false positive rate.
///
/// - `T` is the element type.
/// - `M` generates the bit positions of an element; see [`Mixer`].
/// - `S` holds the bit vector; see [`Storage`].
///
/// When `M::BLOCK_BITS` is nonzero all probes of an element fall in one aligned region, and
/// inserts and queries work on a local copy of that region's blocks.
///
/// # Examples
///
/// ```
/// # use blockbloom::bloom::BloomFilter;
/// let mut filter = BloomFilter::<str>::create_ideal(0.01, 1000).unwrap();
/// filter.insert("apple");
///
/// assert_eq!(filter.count("apple"), 1);
/// assert!(!filter.contains("grape")); // (probably)
/// ```
pub struct BloomFilter<T: ?Sized, M = DefaultMixer, S = VecStorage> {
    data: S,
    params: FilterParams,
    _marker: PhantomData<(fn(&T), fn() -> M)>,
}

/// Bloom filter with unconstrained probes over plain storage.
pub type StandardBloomFilter<T> = BloomFilter<T, DefaultMixer, VecStorage>;

/// Bloom filter whose probes for one element share a 512-bit region.
pub type CacheAlignedBloomFilter<T> = BloomFilter<T, CacheAlignedMixer, VecStorage>;

/// Bloom filter that can be filled from many threads at once through
/// [`BloomFilter::insert_shared`].
pub type ConcurrentBloomFilter<T, M = DefaultMixer> = BloomFilter<T, M, AtomicStorage>;

impl<T, M, S> BloomFilter<T, M, S>
where
    T: ?Sized,
    M: Mixer<T>,
    S: Storage,
{
    /// Creates an empty filter with freshly allocated storage of `params.bit_count` bits.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if either
    /// parameter is 0, or if the mixer confines probes to aligned regions and
    /// `params.bit_count` is not a multiple of the region width.
    pub fn new(params: FilterParams) -> Result<Self, Error> {
        Self::check_shape(&params, params.bit_count)?;

        log::debug!(
            "creating Bloom filter {params} with {}-bit blocks and {}-bit mixer regions",
            S::Block::BITS,
            M::BLOCK_BITS
        );
        Ok(BloomFilter {
            data: S::with_bit_count(params.bit_count),
            params,
            _marker: PhantomData,
        })
    }

    /// Creates a filter on top of an existing `storage`, which is not cleared.
    ///
    /// The storage is trusted to have been filled by a filter with the same parameters and
    /// mixer; nothing beyond its size can be checked.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if
    /// `params.bit_count` does not fit in `storage`, or under the same conditions as
    /// [`new`](Self::new).
    pub fn with_storage(params: FilterParams, storage: S) -> Result<Self, Error> {
        ensure!(
            params.bit_count <= storage.bit_count(),
            InvalidArgument,
            "parameters cannot fit into storage: params.bit_count={} storage.bit_count={}",
            params.bit_count,
            storage.bit_count()
        );
        Self::check_shape(&params, storage.bit_count())?;

        log::debug!(
            "adopting {}-bit storage for Bloom filter {params}",
            storage.bit_count()
        );
        Ok(BloomFilter {
            data: storage,
            params,
            _marker: PhantomData,
        })
    }

    /// Creates a filter from [`FilterParams::create_ideal`], rounding the bit count up to a
    /// multiple of `M::BLOCK_BITS` when the mixer works in aligned regions.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if `desired_fpr`
    /// is not strictly between 0 and 1, or if `expected_elements` is 0.
    pub fn create_ideal(desired_fpr: f64, expected_elements: usize) -> Result<Self, Error> {
        let ideal = FilterParams::create_ideal(desired_fpr, expected_elements)?;
        let params = ideal.align_bit_count(M::BLOCK_BITS);
        if params.bit_count != ideal.bit_count {
            log::debug!(
                "rounded ideal bit_count {} up to {} for {}-bit mixer regions",
                ideal.bit_count,
                params.bit_count,
                M::BLOCK_BITS
            );
        }
        Self::new(params)
    }

    fn check_shape(params: &FilterParams, bit_count: usize) -> Result<(), Error> {
        ensure!(
            params.bit_count > 0,
            InvalidArgument,
            "cannot create a Bloom filter with bit_count=0"
        );
        ensure!(
            params.num_hashes > 0,
            InvalidArgument,
            "cannot create a Bloom filter with num_hashes=0"
        );
        ensure!(
            M::BLOCK_BITS == 0 || bit_count % M::BLOCK_BITS == 0,
            InvalidArgument,
            "bit_count={bit_count} is not a multiple of the {}-bit mixer region",
            M::BLOCK_BITS
        );
        Ok(())
    }

    /// The parameters this filter was created with.
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// The underlying storage.
    pub fn data(&self) -> &S {
        &self.data
    }

    /// Consumes the filter, returning its storage.
    pub fn into_storage(self) -> S {
        self.data
    }

    /// Tests for the likely presence of `item`.
    ///
    /// Returns 0 if `item` is definitely not in the filter and 1 if it probably is. An item
    /// that was inserted always yields 1; an item that was not may still yield 1 at the
    /// false positive rate of the filter.
    pub fn count(&self, item: &T) -> usize {
        let mut mixer = M::new(item, self.data.bit_count());
        let present = if M::BLOCK_BITS == 0 {
            self.probe_scattered(&mut mixer)
        } else {
            self.probe_region(&mut mixer)
        };
        usize::from(present)
    }

    /// Returns `true` if `item` is probably in the filter, `false` if it definitely is not.
    pub fn contains(&self, item: &T) -> bool {
        self.count(item) == 1
    }

    /// Inserts `item`. Inserting the same item again has no effect.
    pub fn insert(&mut self, item: &T) {
        let mut mixer = M::new(item, self.data.bit_count());
        let data = &mut self.data;
        Self::for_each_mask(&mut mixer, self.params.num_hashes, |block_index, mask| {
            expect_in_range(data.set_mask(block_index, mask))
        });
    }

    /// Resets the filter to the empty set. The parameters are kept.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Number of bits currently set in the storage.
    pub fn set_bits(&self) -> usize {
        self.data.count_ones()
    }

    /// Estimates how many distinct items were inserted, from the share of set bits.
    ///
    /// Returns [`f64::INFINITY`] once every bit is set.
    pub fn estimated_count(&self) -> f64 {
        self.effective_params().estimated_count(self.set_bits())
    }

    /// The false positive rate to expect once `elements` distinct items are inserted.
    pub fn expected_fpr(&self, elements: usize) -> f64 {
        self.effective_params().expected_fpr(elements)
    }

    /// Probes are spread over the whole storage, which may be larger than the parameters
    /// asked for when it was adopted through [`with_storage`](Self::with_storage).
    fn effective_params(&self) -> FilterParams {
        FilterParams::new(self.data.bit_count(), self.params.num_hashes)
    }

    /// Feeds the `num_hashes` probe masks of one element to `apply`, one call per touched
    /// block.
    fn for_each_mask(
        mixer: &mut M,
        num_hashes: usize,
        mut apply: impl FnMut(usize, S::Block),
    ) {
        if M::BLOCK_BITS == 0 {
            for _ in 0..num_hashes {
                let bit_index = mixer.next_index();
                apply(
                    bit_index / S::Block::BITS,
                    S::Block::bit(bit_index % S::Block::BITS),
                );
            }
            return;
        }

        const {
            assert!(
                M::BLOCK_BITS % S::Block::BITS == 0,
                "mixer region is not a whole number of storage blocks"
            );
            assert!(
                M::BLOCK_BITS / S::Block::BITS <= MAX_REGION_BLOCKS,
                "mixer region spans too many storage blocks"
            );
        };
        let region_blocks = M::BLOCK_BITS / S::Block::BITS;
        let base_bit = mixer.base_offset();
        let base_block = base_bit / S::Block::BITS;

        // Accumulate locally so that each touched block is written once.
        let mut masks = [<S::Block as Block>::ZERO; MAX_REGION_BLOCKS];
        for _ in 0..num_hashes {
            let inner_bit = mixer.next_index() - base_bit;
            masks[inner_bit / S::Block::BITS] |= S::Block::bit(inner_bit % S::Block::BITS);
        }

        for (offset, &mask) in masks[..region_blocks].iter().enumerate() {
            if mask != <S::Block as Block>::ZERO {
                apply(base_block + offset, mask);
            }
        }
    }

    fn probe_scattered(&self, mixer: &mut M) -> bool {
        for _ in 0..self.params.num_hashes {
            let bit_index = mixer.next_index();
            let block = self.data.load(bit_index / S::Block::BITS);
            if block & S::Block::bit(bit_index % S::Block::BITS) == <S::Block as Block>::ZERO {
                return false;
            }
        }
        true
    }

    fn probe_region(&self, mixer: &mut M) -> bool {
        const {
            assert!(
                M::BLOCK_BITS % S::Block::BITS == 0,
                "mixer region is not a whole number of storage blocks"
            );
            assert!(
                M::BLOCK_BITS / S::Block::BITS <= MAX_REGION_BLOCKS,
                "mixer region spans too many storage blocks"
            );
        };
        let base_bit = mixer.base_offset();
        let base_block = base_bit / S::Block::BITS;

        // Each block of the region is loaded at most once.
        let mut loaded: [Option<S::Block>; MAX_REGION_BLOCKS] = [None; MAX_REGION_BLOCKS];
        for _ in 0..self.params.num_hashes {
            let inner_bit = mixer.next_index() - base_bit;
            let offset = inner_bit / S::Block::BITS;
            let block = *loaded[offset].get_or_insert_with(|| self.data.load(base_block + offset));
            if block & S::Block::bit(inner_bit % S::Block::BITS) == <S::Block as Block>::ZERO {
                return false;
            }
        }
        true
    }
}

impl<T, M, S> BloomFilter<T, M, S>
where
    T: ?Sized,
    M: Mixer<T>,
    S: ConcurrentStorage,
{
    /// Inserts `item` through a shared reference.
    ///
    /// Every touched block is updated with one relaxed atomic OR. A concurrent
    /// [`count`](Self::count) of the same item may see only part of its bits until this call
    /// returns, and so report a transient 0; once all writers are joined, no inserted item is
    /// missed.
    pub fn insert_shared(&self, item: &T) {
        let mut mixer = M::new(item, self.data.bit_count());
        Self::for_each_mask(&mut mixer, self.params.num_hashes, |block_index, mask| {
            expect_in_range(self.data.set_mask_shared(block_index, mask))
        });
    }
}

/// Probe indices are below the storage bit count by construction, so a failed write means
/// the filter was assembled from inconsistent parts.
#[inline]
fn expect_in_range(result: Result<(), Error>) {
    if let Err(err) = result {
        panic!("Bloom filter probe escaped its storage: {err}");
    }
}

impl<T: ?Sized, M, S: Clone> Clone for BloomFilter<T, M, S> {
    fn clone(&self) -> Self {
        BloomFilter {
            data: self.data.clone(),
            params: self.params,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized, M, S: PartialEq> PartialEq for BloomFilter<T, M, S> {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.data == other.data
    }
}

impl<T: ?Sized, M, S: fmt::Debug> fmt::Debug for BloomFilter<T, M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("params", &self.params)
            .field("data", &self.data)
            .finish()
    }
}

impl<T: ?Sized, M, S: fmt::Display> fmt::Display for BloomFilter<T, M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{params={} data={}}}", self.params, self.data)
    }
}
