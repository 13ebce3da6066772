// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use criterion::Criterion;

use pprof::criterion::{Output, PProfProfiler};

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse::<T>().ok()).unwrap_or(default)
}

/// Criterion preset with a pprof flamegraph profiler (`cargo bench -- --profile-time <secs>`).
///
/// `DOTFLOW_PROFILE_FREQ`, `DOTFLOW_BENCH_SAMPLE_SIZE`, `DOTFLOW_BENCH_WARMUP_SECS` and
/// `DOTFLOW_BENCH_MEASUREMENT_SECS` override the defaults.
pub fn criterion() -> Criterion {
    let frequency = env_parse::<i32>("DOTFLOW_PROFILE_FREQ", 100).clamp(1, 1000);
    let sample_size = env_parse::<usize>("DOTFLOW_BENCH_SAMPLE_SIZE", 30).clamp(10, 200);
    let warmup_secs = env_parse::<u64>("DOTFLOW_BENCH_WARMUP_SECS", 2).clamp(1, 60);
    let measurement_secs = env_parse::<u64>("DOTFLOW_BENCH_MEASUREMENT_SECS", 5).clamp(1, 120);

    Criterion::default()
        .sample_size(sample_size)
        .warm_up_time(Duration::from_secs(warmup_secs))
        .measurement_time(Duration::from_secs(measurement_secs))
        .with_profiler(PProfProfiler::new(frequency, Output::Flamegraph(None)))
}
