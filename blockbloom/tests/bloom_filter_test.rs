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


use blockbloom::bloom::AtomicStorage;
use blockbloom::bloom::BloomFilter;
use blockbloom::bloom::CacheAlignedBloomFilter;
use blockbloom::bloom::CacheAlignedMixer;
use blockbloom::bloom::DefaultMixer;
use blockbloom::bloom::FilterParams;
use blockbloom::bloom::StandardBloomFilter;
use blockbloom::bloom::Storage;
use blockbloom::bloom::VecStorage;
use googletest::assert_that;
use googletest::prelude::near;

#[test]
fn test_inserted_values_are_counted() {
    let params = FilterParams::create_ideal(0.05, 1000).unwrap();
    let mut filter = StandardBloomFilter::<u64>::new(params).unwrap();
    for i in 0..1000u64 {
        filter.insert(&i);
    }

    assert!((0..1000u64).all(|i| filter.count(&i) == 1));
    assert_that!(filter.params().expected_fpr(1000), near(0.05, 0.02));
}

#[test]
fn test_cache_aligned_inserted_values_are_counted() {
    let mut filter = CacheAlignedBloomFilter::<u64>::create_ideal(0.05, 1000).unwrap();
    for i in 0..1000u64 {
        filter.insert(&i);
    }

    assert!((0..1000u64).all(|i| filter.count(&i) == 1));
    assert_that!(filter.params().expected_fpr(1000), near(0.05, 0.02));
}

#[test]
fn test_unsized_and_owned_elements() {
    let mut words = BloomFilter::<str>::create_ideal(0.01, 100).unwrap();
    let mut owned = CacheAlignedBloomFilter::<String>::create_ideal(0.01, 100).unwrap();
    for word in ["apple", "banana", "cherry", ""] {
        words.insert(word);
        owned.insert(&word.to_string());
    }

    for word in ["apple", "banana", "cherry", ""] {
        assert!(words.contains(word));
        assert!(owned.contains(&word.to_string()));
    }
}

#[test]
fn test_empty_filter_counts_nothing() {
    let mut filter = StandardBloomFilter::<u64>::create_ideal(0.01, 1000).unwrap();
    assert!((0..10u64).all(|i| filter.count(&i) == 0));
    assert_eq!(filter.set_bits(), 0);

    for i in 0..10u64 {
        filter.insert(&i);
    }
    filter.clear();
    assert!((0..10u64).all(|i| filter.count(&i) == 0));
    assert_eq!(filter.set_bits(), 0);
}

#[test]
fn test_insert_is_idempotent() {
    let mut once = CacheAlignedBloomFilter::<u64>::create_ideal(0.01, 1000).unwrap();
    let mut twice = once.clone();

    once.insert(&42);
    twice.insert(&42);
    twice.insert(&42);
    assert_eq!(once.data(), twice.data());

    let mut once = StandardBloomFilter::<u64>::create_ideal(0.01, 1000).unwrap();
    let mut twice = once.clone();
    once.insert(&42);
    twice.insert(&42);
    twice.insert(&42);
    assert_eq!(once.data(), twice.data());
}

#[test]
fn test_identical_inserts_give_identical_storage() {
    let params = FilterParams::new(4096, 5);
    let mut left = StandardBloomFilter::<u64>::new(params).unwrap();
    let mut right = StandardBloomFilter::<u64>::new(params).unwrap();
    for i in (0..500u64).map(|i| i * 7919) {
        left.insert(&i);
        right.insert(&i);
    }
    assert_eq!(left, right);
    assert_eq!(left.data().blocks(), right.data().blocks());
}

#[test]
fn test_block_width_does_not_change_bit_positions() {
    type Wide = BloomFilter<u64, CacheAlignedMixer, VecStorage<u64>>;
    type Narrow = BloomFilter<u64, CacheAlignedMixer, VecStorage<u8>>;

    let mut wide = Wide::create_ideal(0.01, 500).unwrap();
    let mut narrow = Narrow::create_ideal(0.01, 500).unwrap();
    for i in 0..500u64 {
        wide.insert(&i);
        narrow.insert(&i);
    }

    let wide_bytes: Vec<u8> = wide
        .data()
        .blocks()
        .iter()
        .flat_map(|block| block.to_le_bytes())
        .collect();
    assert_eq!(wide_bytes, narrow.data().blocks());
    assert!((0..500u64).all(|i| narrow.contains(&i)));
}

#[test]
fn test_ideal_bit_count_is_region_aligned() {
    for (fpr, n) in [(0.05, 1000), (0.01, 12_345), (0.001, 7), (0.5, 1)] {
        let ideal = FilterParams::create_ideal(fpr, n).unwrap();

        let filter = CacheAlignedBloomFilter::<u64>::create_ideal(fpr, n).unwrap();
        assert_eq!(filter.params().bit_count % 512, 0);
        assert!(filter.params().bit_count >= ideal.bit_count);
        assert!(filter.params().bit_count < ideal.bit_count + 512);

        let filter =
            BloomFilter::<u64, CacheAlignedMixer<256>, VecStorage<u32>>::create_ideal(fpr, n)
                .unwrap();
        assert_eq!(filter.params().bit_count % 256, 0);
        assert!(filter.params().bit_count >= ideal.bit_count);
    }
}

#[test]
fn test_estimated_count() {
    let mut filter = StandardBloomFilter::<u64>::create_ideal(0.01, 10_000).unwrap();
    assert_eq!(filter.estimated_count(), 0.0);

    for i in 0..10_000u64 {
        filter.insert(&i);
    }
    assert_that!(filter.estimated_count(), near(10_000.0, 300.0));
}

#[test]
fn test_saturated_filter_estimates_infinity() {
    let mut filter = StandardBloomFilter::<u64>::new(FilterParams::new(64, 3)).unwrap();
    for i in 0..10_000u64 {
        filter.insert(&i);
    }
    assert_eq!(filter.set_bits(), 64);
    assert_eq!(filter.estimated_count(), f64::INFINITY);
    assert_eq!(filter.count(&123_456_789), 1);
}

#[test]
fn test_adopted_storage_keeps_contents() {
    let params = FilterParams::new(2048, 4);
    let mut original = BloomFilter::<u64, DefaultMixer, AtomicStorage<u32>>::new(params).unwrap();
    for i in 0..100u64 {
        original.insert(&i);
    }

    let blocks = original.into_storage().to_blocks();
    let storage = AtomicStorage::<u32>::from_blocks(2048, blocks).unwrap();
    assert_eq!(storage.bit_count(), 2048);

    let restored =
        BloomFilter::<u64, DefaultMixer, AtomicStorage<u32>>::with_storage(params, storage)
            .unwrap();
    assert!((0..100u64).all(|i| restored.contains(&i)));
}

#[test]
fn test_adopted_storage_may_be_larger() {
    let storage = VecStorage::<u64>::new(4096);
    let mut filter =
        StandardBloomFilter::<u64>::with_storage(FilterParams::new(1000, 3), storage).unwrap();
    filter.insert(&1);
    assert!(filter.contains(&1));
    assert_eq!(filter.params().bit_count, 1000);
    assert_eq!(filter.data().bit_count(), 4096);
}
