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


//! Block storage for the bit vector of a Bloom filter.
//!
//! A storage owns a fixed number of blocks, each an unsigned word whose bits are addressed
//! individually. The filter only ever reads whole blocks and ORs masks into them, which is
//! what lets [`AtomicStorage`] offer the same contract with relaxed atomics.

use std::fmt;
use std::ops::BitAnd;
use std::ops::BitOr;
use std::ops::BitOrAssign;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::AtomicU16;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::error::Error;

/// An unsigned word used as the unit of storage.
pub trait Block:
    Copy
    + Eq
    + Default
    + fmt::Debug
    + fmt::LowerHex
    + BitOr<Output = Self>
    + BitOrAssign
    + BitAnd<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Width of the block in bits.
    const BITS: usize;

    /// The block with no bits set.
    const ZERO: Self;

    /// Atomic cell holding one block.
    type Atomic: Send + Sync + fmt::Debug;

    /// Returns a block with only the bit at `offset` set. `offset` must be below
    /// [`Self::BITS`].
    fn bit(offset: usize) -> Self;

    /// Number of set bits in the block.
    fn count_ones(self) -> u32;

    /// Wraps `self` in an atomic cell.
    fn into_atomic(self) -> Self::Atomic;

    /// Relaxed load.
    fn load_relaxed(cell: &Self::Atomic) -> Self;

    /// Relaxed store.
    fn store_relaxed(cell: &Self::Atomic, value: Self);

    /// Relaxed `fetch_or`.
    fn fetch_or_relaxed(cell: &Self::Atomic, mask: Self);
}

macro_rules! impl_block {
    ($($ty:ty => $atomic:ty),+ $(,)?) => {
        $(
            impl Block for $ty {
                const BITS: usize = <$ty>::BITS as usize;
                const ZERO: Self = 0;
                type Atomic = $atomic;

                #[inline]
                fn bit(offset: usize) -> Self {
                    1 << offset
                }

                #[inline]
                fn count_ones(self) -> u32 {
                    <$ty>::count_ones(self)
                }

                fn into_atomic(self) -> Self::Atomic {
                    <$atomic>::new(self)
                }

                #[inline]
                fn load_relaxed(cell: &Self::Atomic) -> Self {
                    cell.load(Ordering::Relaxed)
                }

                #[inline]
                fn store_relaxed(cell: &Self::Atomic, value: Self) {
                    cell.store(value, Ordering::Relaxed)
                }

                #[inline]
                fn fetch_or_relaxed(cell: &Self::Atomic, mask: Self) {
                    cell.fetch_or(mask, Ordering::Relaxed);
                }
            }
        )+
    };
}

impl_block! {
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    u64 => AtomicU64,
    usize => AtomicUsize,
}

/// Number of `B` blocks needed to hold `bit_count` bits.
pub fn block_count_for<B: Block>(bit_count: usize) -> usize {
    bit_count.div_ceil(B::BITS)
}

/// The bit vector behind a Bloom filter.
pub trait Storage: Sized {
    /// The word type blocks are stored as.
    type Block: Block;

    /// Creates a storage with room for at least `bit_count` bits, all zero.
    fn with_bit_count(bit_count: usize) -> Self;

    /// The logical number of bits, as given at construction.
    ///
    /// This may be smaller than `block_count() * Block::BITS`; the trailing bits exist but
    /// a filter never addresses them.
    fn bit_count(&self) -> usize;

    /// Number of blocks.
    fn block_count(&self) -> usize;

    /// Loads the block at `block_index`.
    ///
    /// # Panics
    ///
    /// Panics if `block_index >= block_count()`.
    fn load(&self, block_index: usize) -> Self::Block;

    /// ORs `mask` into the block at `block_index`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`](crate::error::ErrorKind::OutOfRange) if `block_index` is not
    /// below `block_count()`.
    fn set_mask(&mut self, block_index: usize, mask: Self::Block) -> Result<(), Error>;

    /// Resets every block to zero.
    fn clear(&mut self);

    /// Number of set bits across all blocks.
    fn count_ones(&self) -> usize {
        (0..self.block_count())
            .map(|idx| self.load(idx).count_ones() as usize)
            .sum()
    }
}

/// A storage whose blocks can be updated through a shared reference.
pub trait ConcurrentStorage: Storage + Sync {
    /// ORs `mask` into the block at `block_index` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`](crate::error::ErrorKind::OutOfRange) if `block_index` is not
    /// below `block_count()`.
    fn set_mask_shared(&self, block_index: usize, mask: Self::Block) -> Result<(), Error>;
}

/// Heap-allocated block storage with plain read-modify-write updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecStorage<B: Block = u64> {
    blocks: Box<[B]>,
    bit_count: usize,
}

impl<B: Block> VecStorage<B> {
    /// Creates a storage of `bit_count` bits with zeroed blocks.
    pub fn new(bit_count: usize) -> Self {
        let block_count = block_count_for::<B>(bit_count);
        log::trace!("allocating {block_count} blocks of {} bits", B::BITS);
        VecStorage {
            blocks: vec![B::ZERO; block_count].into_boxed_slice(),
            bit_count,
        }
    }

    /// Reconstitutes a storage from previously captured blocks.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if the number of
    /// blocks does not match `bit_count`.
    pub fn from_blocks(bit_count: usize, blocks: Vec<B>) -> Result<Self, Error> {
        check_block_count::<B>(bit_count, blocks.len())?;
        Ok(VecStorage {
            blocks: blocks.into_boxed_slice(),
            bit_count,
        })
    }

    /// The raw blocks, in index order.
    pub fn blocks(&self) -> &[B] {
        &self.blocks
    }
}

impl<B: Block> Storage for VecStorage<B> {
    type Block = B;

    fn with_bit_count(bit_count: usize) -> Self {
        Self::new(bit_count)
    }

    fn bit_count(&self) -> usize {
        self.bit_count
    }

    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    fn load(&self, block_index: usize) -> B {
        self.blocks[block_index]
    }

    #[inline]
    fn set_mask(&mut self, block_index: usize, mask: B) -> Result<(), Error> {
        let block_count = self.blocks.len();
        let block = self
            .blocks
            .get_mut(block_index)
            .ok_or_else(|| Error::out_of_range(block_index, block_count))?;
        *block |= mask;
        Ok(())
    }

    fn clear(&mut self) {
        self.blocks.fill(B::ZERO);
    }
}

/// Block storage updated with relaxed atomic operations.
///
/// Each `load` and `set_mask` is atomic for its own block only. A reader racing an insert may
/// observe some of the inserted bits and not others, but never a partially written block.
#[derive(Debug)]
pub struct AtomicStorage<B: Block = u64> {
    blocks: Box<[B::Atomic]>,
    bit_count: usize,
}

impl<B: Block> AtomicStorage<B> {
    /// Creates a storage of `bit_count` bits with zeroed blocks.
    pub fn new(bit_count: usize) -> Self {
        let block_count = block_count_for::<B>(bit_count);
        log::trace!("allocating {block_count} atomic blocks of {} bits", B::BITS);
        AtomicStorage {
            blocks: (0..block_count).map(|_| B::ZERO.into_atomic()).collect(),
            bit_count,
        }
    }

    /// Reconstitutes a storage from previously captured blocks.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if the number of
    /// blocks does not match `bit_count`.
    pub fn from_blocks(bit_count: usize, blocks: Vec<B>) -> Result<Self, Error> {
        check_block_count::<B>(bit_count, blocks.len())?;
        Ok(AtomicStorage {
            blocks: blocks.into_iter().map(B::into_atomic).collect(),
            bit_count,
        })
    }

    /// A snapshot of the blocks, in index order.
    pub fn to_blocks(&self) -> Vec<B> {
        self.blocks.iter().map(B::load_relaxed).collect()
    }

    fn cell(&self, block_index: usize) -> Result<&B::Atomic, Error> {
        self.blocks
            .get(block_index)
            .ok_or_else(|| Error::out_of_range(block_index, self.blocks.len()))
    }
}

impl<B: Block> Storage for AtomicStorage<B> {
    type Block = B;

    fn with_bit_count(bit_count: usize) -> Self {
        Self::new(bit_count)
    }

    fn bit_count(&self) -> usize {
        self.bit_count
    }

    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    fn load(&self, block_index: usize) -> B {
        B::load_relaxed(&self.blocks[block_index])
    }

    #[inline]
    fn set_mask(&mut self, block_index: usize, mask: B) -> Result<(), Error> {
        self.set_mask_shared(block_index, mask)
    }

    fn clear(&mut self) {
        for cell in self.blocks.iter() {
            B::store_relaxed(cell, B::ZERO);
        }
    }
}

impl<B: Block> ConcurrentStorage for AtomicStorage<B> {
    #[inline]
    fn set_mask_shared(&self, block_index: usize, mask: B) -> Result<(), Error> {
        B::fetch_or_relaxed(self.cell(block_index)?, mask);
        Ok(())
    }
}

fn check_block_count<B: Block>(bit_count: usize, actual: usize) -> Result<(), Error> {
    let expected = block_count_for::<B>(bit_count);
    if actual != expected {
        return Err(Error::new(
            crate::error::ErrorKind::InvalidArgument,
            format!("{bit_count} bits need {expected} blocks, got {actual}"),
        )
        .with_context("block_bits", B::BITS));
    }
    Ok(())
}

/// Writes every block as zero-padded lowercase hex, in block index order.
fn write_hex_blocks<B: Block>(
    f: &mut fmt::Formatter<'_>,
    blocks: impl Iterator<Item = B>,
) -> fmt::Result {
    let width = B::BITS / 4;
    for block in blocks {
        write!(f, "{block:0width$x}")?;
    }
    Ok(())
}

impl<B: Block> fmt::Display for VecStorage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex_blocks(f, self.blocks.iter().copied())
    }
}

impl<B: Block> fmt::Display for AtomicStorage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex_blocks(f, self.blocks.iter().map(B::load_relaxed))
    }
}
