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

//! Arbitration throughput
//!
//! Every source requests continuously and the consumer acks each grant on the
//! following tick, so half of all ticks are full arbitration rounds.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use irqarb::core::interrupt::{pick_winner, SourceSet};
use irqarb::{ControllerConfig, InterruptController, TickInputs};
use std::hint::black_box;

const TICKS: u64 = 1024;

fn saturated(sources: u8) -> InterruptController {
    let config = ControllerConfig {
        sources,
        priorities: (0..sources).map(|i| i % 16).collect(),
        mask: SourceSet::all(sources).bits(),
        ..ControllerConfig::default()
    };
    InterruptController::new(config).expect("valid bench config")
}

fn bench_tick_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_loop");
    group.throughput(Throughput::Elements(TICKS));

    for sources in [4u8, 8, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(sources), &sources, |b, &n| {
            let mut ic = saturated(n);
            let requests = SourceSet::all(n);
            b.iter(|| {
                let mut valid = false;
                for _ in 0..TICKS {
                    let out = ic.tick(TickInputs {
                        requests,
                        ack: valid,
                        reset: false,
                    });
                    valid = out.interrupt_valid;
                }
                black_box(valid)
            });
        });
    }
    group.finish();
}

fn bench_pick_winner(c: &mut Criterion) {
    let effective: Vec<u8> = (0..32u8).map(|i| (i * 7) % 16).collect();
    let visible = SourceSet::from_bits(0xDEAD_BEEF);

    c.bench_function("pick_winner_32", |b| {
        b.iter(|| pick_winner(black_box(visible), black_box(&effective)))
    });
}

criterion_group!(benches, bench_tick_loop, bench_pick_winner);
criterion_main!(benches);
