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


use std::f64::consts::LN_2;
use std::fmt;

use crate::error::Error;
use crate::error::ensure;

/// Parameters of a Bloom filter.
///
/// For the math-related functions, these letters name the quantities involved:
/// - `k`: hash count
/// - `m`: bit vector length
/// - `n`: number of elements
/// - `p`: false positive rate
///
/// The value is plain data and can be computed without ever building a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterParams {
    /// `m`: the number of bits the filter should have.
    pub bit_count: usize,
    /// `k`: the number of bits to set per element.
    pub num_hashes: usize,
}

impl FilterParams {
    /// Creates parameters from an explicit bit count and hash count.
    pub const fn new(bit_count: usize, num_hashes: usize) -> Self {
        FilterParams {
            bit_count,
            num_hashes,
        }
    }

    /// Calculates the expected false positive rate after `elements` distinct items were
    /// inserted into a filter with these parameters.
    ///
    /// Formula: `p = (1 - (1 - 1/m)^(k*n))^k`
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::FilterParams;
    /// let params = FilterParams::new(9586, 7);
    /// let fpr = params.expected_fpr(1000);
    /// assert!(fpr > 0.009 && fpr < 0.011);
    /// ```
    pub fn expected_fpr(&self, elements: usize) -> f64 {
        let m = self.bit_count as f64;
        let k = self.num_hashes as f64;
        let inner = (1.0 - 1.0 / m).powf(k * elements as f64);
        (1.0 - inner).powf(k)
    }

    /// Estimates the number of distinct elements in a filter from its count of set bits.
    ///
    /// Formula: `n' = -(m/k) * ln(1 - X/m)` where `X` is `set_bits`.
    ///
    /// A saturated filter (`set_bits >= m`) carries no information about how many elements
    /// went in, so the estimate is [`f64::INFINITY`].
    pub fn estimated_count(&self, set_bits: usize) -> f64 {
        if set_bits >= self.bit_count {
            return f64::INFINITY;
        }

        let m = self.bit_count as f64;
        let k = self.num_hashes as f64;
        -(m / k) * (1.0 - set_bits as f64 / m).ln()
    }

    /// Creates "ideally sized" parameters: the bit count yields a false positive rate close
    /// to `desired_fpr` once `expected_elements` are inserted, with the hash count that
    /// minimizes that rate.
    ///
    /// Formulas:
    /// - `m = ceil(-n * ln(p) / ln(2)^2)`
    /// - `k = round(m/n * ln(2))`, never less than 1
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if `desired_fpr`
    /// is not strictly between 0 and 1, or if `expected_elements` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::FilterParams;
    /// let params = FilterParams::create_ideal(0.01, 1000).unwrap();
    /// assert_eq!(params.bit_count, 9586);
    /// assert_eq!(params.num_hashes, 7);
    /// ```
    pub fn create_ideal(desired_fpr: f64, expected_elements: usize) -> Result<Self, Error> {
        ensure!(
            0.0 < desired_fpr && desired_fpr < 1.0,
            InvalidArgument,
            "desired_fpr={desired_fpr} is not in range (0.0..1.0)"
        );
        ensure!(
            expected_elements != 0,
            InvalidArgument,
            "cannot create Bloom filter parameters with expected_elements=0"
        );

        let n = expected_elements as f64;
        let bit_count = (-n * desired_fpr.ln() / (LN_2 * LN_2)).ceil() as usize;
        let num_hashes = Self::suggest_num_hashes(bit_count, expected_elements);
        Ok(FilterParams::new(bit_count, num_hashes))
    }

    /// Suggests the hash count that minimizes the false positive rate for `expected_elements`
    /// in `bit_count` bits.
    ///
    /// Rounding to nearest can reach 0 when the filter is tiny relative to the element count;
    /// the result is clamped to 1 so that every filter probes at least one bit.
    pub fn suggest_num_hashes(bit_count: usize, expected_elements: usize) -> usize {
        let k = (bit_count as f64 / expected_elements as f64 * LN_2).round();
        (k as usize).max(1)
    }

    /// Rounds `bit_count` up to the next multiple of `align_bits`. An `align_bits` of 0
    /// leaves the parameters unchanged.
    pub(crate) fn align_bit_count(self, align_bits: usize) -> Self {
        if align_bits == 0 {
            return self;
        }
        FilterParams::new(self.bit_count.next_multiple_of(align_bits), self.num_hashes)
    }
}

impl fmt::Display for FilterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(m={}, k={})", self.bit_count, self.num_hashes)
    }
}
