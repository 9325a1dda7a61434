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


//! Bloom filters with pluggable mixers and storage.
//!
//! A Bloom filter is a space-efficient probabilistic data structure used to test whether
//! an element is a member of a set. False positive matches are possible, but false negatives
//! are not: a query answers either "possibly in set" or "definitely not in set".
//!
//! # Building blocks
//!
//! - [`FilterParams`]: the bit count `m` and hash count `k`, plus the math relating them to
//!   the element count `n` and false positive rate `p`.
//! - [`Storage`]: the bit vector, as an array of fixed-width blocks. [`VecStorage`] updates
//!   blocks in place; [`AtomicStorage`] uses relaxed atomics so that one filter can be
//!   filled from many threads.
//! - [`Mixer`]: turns one element into its `k` bit positions. [`DefaultMixer`] spreads them
//!   over the whole vector; [`CacheAlignedMixer`] keeps them inside one aligned region so an
//!   operation touches a single cache line.
//! - [`BloomFilter`]: composes the three.
//!
//! # Usage
//!
//! ```rust
//! use blockbloom::bloom::CacheAlignedBloomFilter;
//!
//! // Sized for 1000 items at a 1% false positive rate
//! let mut filter = CacheAlignedBloomFilter::<u64>::create_ideal(0.01, 1000).unwrap();
//!
//! filter.insert(&42);
//! assert_eq!(filter.count(&42), 1); // always - inserted
//! assert_eq!(filter.count(&7), 0); // probably - never inserted
//!
//! println!("{}", filter.params()); // (m=9728, k=7)
//! ```
//!
//! ## Filling from several threads
//!
//! ```rust
//! use blockbloom::bloom::ConcurrentBloomFilter;
//!
//! let filter = ConcurrentBloomFilter::<u64>::create_ideal(0.01, 4000).unwrap();
//! std::thread::scope(|s| {
//!     for t in 0..4u64 {
//!         let filter = &filter;
//!         s.spawn(move || {
//!             for i in 0..1000 {
//!                 filter.insert_shared(&(t * 1000 + i));
//!             }
//!         });
//!     }
//! });
//! assert!((0..4000u64).all(|i| filter.contains(&i)));
//! ```
//!
//! # References
//!
//! - Bloom, Burton H. (1970). "Space/time trade-offs in hash coding with allowable errors"
//! - Putze, Sanders and Singler (2007). "Cache-, Hash- and Space-Efficient Bloom Filters"

mod filter;
mod mixer;
mod params;
mod storage;

pub use self::filter::BloomFilter;
pub use self::filter::CacheAlignedBloomFilter;
pub use self::filter::ConcurrentBloomFilter;
pub use self::filter::MAX_REGION_BLOCKS;
pub use self::filter::StandardBloomFilter;
pub use self::mixer::CacheAlignedMixer;
pub use self::mixer::DefaultMixer;
pub use self::mixer::Mixer;
pub use self::params::FilterParams;
pub use self::storage::AtomicStorage;
pub use self::storage::Block;
pub use self::storage::ConcurrentStorage;
pub use self::storage::Storage;
pub use self::storage::VecStorage;
pub use self::storage::block_count_for;
