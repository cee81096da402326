// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use serde::Serialize;

/// One query's answer, in the shape a (not-implemented-here) CLI would serialize to YAML/CSV.
#[derive(Clone, Debug, Serialize)]
pub struct ReportItem {
    pub query: String,
    pub lower_bound: String,
    pub upper_bound: String,
    pub exact: bool,
}

/// Wall-clock and resource accounting for one compilation run, mirroring the fields `getrusage`
/// can report plus the timings `workunit_store` already tracks per phase.
#[derive(Clone, Debug, Serialize)]
pub struct RunStatistics {
    pub time_user_secs: f64,
    pub time_system_secs: f64,
    pub time_elapsed_secs: f64,
    pub mem_virtual_bytes: u64,
    pub mem_resident_bytes: u64,
}

/// Per-input-model compilation result: every query's bound interval plus the run statistics for
/// that model's compilation, the abstract `Result` of spec.md §6. Serialization format (YAML or
/// CSV) is left to a CLI crate this repo does not implement.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub model_name: String,
    pub items: Vec<ReportItem>,
    pub statistics: RunStatistics,
}
