//! Risk assessment engine.
//!
//! [`RiskEngine::assess`] is a pure function of its inputs: the same
//! verification, documents, screening results, and clock instant always
//! produce the same score, level, and factor set. Point values and
//! thresholds are hand-tuned compliance constants carried in [`RiskConfig`],
//! not semantics to re-derive.
//!
//! The engine fails closed: if an internal step errors it returns HIGH /
//! score 80 with a single `assessment_error` factor and forces manual
//! review. It never silently approves.

mod config;
mod engine;
mod factors;

pub use config::RiskConfig;
pub use engine::RiskEngine;
pub use factors::{FactorCategory, Impact, RiskAssessment, RiskFactor};
