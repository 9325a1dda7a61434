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


//! Hashing of filter elements.
//!
//! Every mixer starts from the same place: the element is fed through [`std::hash::Hash`] into
//! a seeded MurmurHash3 x64/128 hasher, and the two 64-bit halves of the digest become the
//! state of the index generator.

mod murmurhash;

use std::hash::Hash;

pub(crate) use self::murmurhash::MurmurHash3X64128;
pub(crate) use self::murmurhash::fmix64;

/// Seed used by the built-in mixers.
///
/// Filters only agree on bit positions when they hash with the same seed, so this value is
/// fixed for the lifetime of the crate.
pub(crate) const DEFAULT_MIXER_SEED: u64 = 9001;

/// Hashes `item` into the two 64-bit words of a MurmurHash3 x64/128 digest.
pub(crate) fn hash_item<T: Hash + ?Sized>(item: &T, seed: u64) -> (u64, u64) {
    let mut hasher = MurmurHash3X64128::with_seed(seed);
    item.hash(&mut hasher);
    hasher.finish128()
}
