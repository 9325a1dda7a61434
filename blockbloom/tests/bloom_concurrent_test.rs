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


use std::thread;

use blockbloom::bloom::AtomicStorage;
use blockbloom::bloom::BloomFilter;
use blockbloom::bloom::CacheAlignedMixer;
use blockbloom::bloom::ConcurrentBloomFilter;
use blockbloom::bloom::DefaultMixer;
use blockbloom::bloom::Mixer;
use blockbloom::bloom::VecStorage;

const THREADS: u64 = 8;
const PER_THREAD: u64 = 5_000;

fn fill_from_threads<M: Mixer<u64>>(filter: &BloomFilter<u64, M, AtomicStorage>) {
    thread::scope(|s| {
        for t in 0..THREADS {
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    filter.insert_shared(&(t * PER_THREAD + i));
                }
            });
        }
    });
}

fn fill_sequentially<M: Mixer<u64>>(filter: &mut BloomFilter<u64, M, VecStorage>) {
    for x in 0..THREADS * PER_THREAD {
        filter.insert(&x);
    }
}

#[test]
fn test_concurrent_inserts_have_no_false_negatives() {
    let n = (THREADS * PER_THREAD) as usize;
    let filter = ConcurrentBloomFilter::<u64>::create_ideal(0.01, n).unwrap();
    fill_from_threads(&filter);
    assert!((0..THREADS * PER_THREAD).all(|x| filter.count(&x) == 1));

    let filter = ConcurrentBloomFilter::<u64, CacheAlignedMixer>::create_ideal(0.01, n).unwrap();
    fill_from_threads(&filter);
    assert!((0..THREADS * PER_THREAD).all(|x| filter.contains(&x)));
}

#[test]
fn test_concurrent_fill_matches_sequential_fill() {
    let n = (THREADS * PER_THREAD) as usize;

    let shared = ConcurrentBloomFilter::<u64, DefaultMixer>::create_ideal(0.01, n).unwrap();
    let mut plain = BloomFilter::<u64, DefaultMixer, VecStorage>::create_ideal(0.01, n).unwrap();
    fill_from_threads(&shared);
    fill_sequentially(&mut plain);
    assert_eq!(shared.params(), plain.params());
    assert_eq!(shared.data().to_blocks(), plain.data().blocks());

    let shared = ConcurrentBloomFilter::<u64, CacheAlignedMixer>::create_ideal(0.01, n).unwrap();
    let mut plain =
        BloomFilter::<u64, CacheAlignedMixer, VecStorage>::create_ideal(0.01, n).unwrap();
    fill_from_threads(&shared);
    fill_sequentially(&mut plain);
    assert_eq!(shared.data().to_blocks(), plain.data().blocks());
}

#[test]
fn test_readers_alongside_writers() {
    let filter = ConcurrentBloomFilter::<u64>::create_ideal(0.01, 20_000).unwrap();
    for x in 0..10_000u64 {
        filter.insert_shared(&x);
    }

    thread::scope(|s| {
        let filter = &filter;
        s.spawn(move || {
            for x in 10_000..20_000u64 {
                filter.insert_shared(&x);
            }
        });
        for _ in 0..4 {
            s.spawn(move || {
                // Inserted before the writer started, so never missed.
                assert!((0..10_000u64).all(|x| filter.contains(&x)));
            });
        }
    });

    assert!((0..20_000u64).all(|x| filter.contains(&x)));
}

#[test]
fn test_clear_through_exclusive_access() {
    let mut filter = ConcurrentBloomFilter::<u64>::create_ideal(0.01, 100).unwrap();
    filter.insert_shared(&1);
    filter.insert(&2);
    assert!(filter.contains(&1) && filter.contains(&2));

    filter.clear();
    assert_eq!(filter.set_bits(), 0);
    assert!(!filter.contains(&1));
}
