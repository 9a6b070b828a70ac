//! Pipeline orchestration for healthpull.
//!
//! One parameterized pipeline with two fetch modes: org-unit listing and
//! value extraction. Each run flows authenticate → fetch → transform →
//! export, sequentially and fail-fast.

pub mod pipeline;

pub use pipeline::{
    OrgUnitParams, PipelineConfig, RunReporter, RunResult, SilentRun, ValueParams,
    run_org_unit_extraction, run_value_extraction,
};
