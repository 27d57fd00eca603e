//! Orchestration for progscout: the ingestion pipeline and the query
//! context built from its artifacts.
//!
//! [`pipeline::ingest_all`] runs fetch → extract → parse → persist for
//! every configured program; [`Knowledge`] loads the persisted artifacts
//! back and serves questions, curriculum plans, and recommendations.

pub mod knowledge;
pub mod pipeline;

pub use knowledge::Knowledge;
pub use pipeline::{IngestProgress, IngestReport, ProgramReport, SilentProgress, ingest_all};

// Callers match on answer outcomes without depending on the index crate.
pub use progscout_index::AnswerOutcome;
