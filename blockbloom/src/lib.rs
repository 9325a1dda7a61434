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


//! # blockbloom
//!
//! Generic Bloom filters: probabilistic set membership with no false negatives and a false
//! positive rate that follows from the chosen parameters.
//!
//! The filter is generic over the element type, over the [`Mixer`](bloom::Mixer) that turns an
//! element into bit positions, and over the [`Storage`](bloom::Storage) holding the bits. See
//! the [`bloom`] module for an overview.
//!
//! # Features
//!
//! - `skip-validation`: constructor checks are still evaluated but never fail. Only useful
//!   when parameters are known to be valid ahead of time.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod bloom;
pub mod error;

mod hash;
