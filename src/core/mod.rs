// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Arbitration core
//!
//! - [`interrupt`]: the arbitration units (latch, mask, priority, aging, arbiter, vectors, service)
//! - [`registers`]: register map and staged configuration
//! - [`controller`]: the clocked controller tying the units together
//! - [`bus`]: memory-mapped device interface
//! - [`error`]: error type shared by every module

pub mod bus;
pub mod controller;
pub mod error;
pub mod interrupt;
pub mod registers;
