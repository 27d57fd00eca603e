//! Shared types, error model, and configuration for progscout.
//!
//! This crate is the foundation depended on by all other progscout crates.
//! It provides:
//! - [`ProgScoutError`] — the unified error type
//! - Domain types ([`ProgramKey`], [`TextFragment`], [`CourseRow`],
//!   [`ProgramCorpus`], [`LearnerProfile`], [`Recommendation`])
//! - Configuration ([`AppConfig`], keyword tables, config loading)

pub mod config;
pub mod error;
pub mod keywords;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, ProgramEntry, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{ProgScoutError, Result};
pub use keywords::{ColumnKeywords, KeywordTables, LinkKeywords, ScoringKeywords, matches_any};
pub use types::{
    CourseRow, Goal, LearnerProfile, MAX_FRAGMENT_CHARS, MIN_FRAGMENT_CHARS, MIN_TITLE_CHARS,
    MathLevel, ProgramCorpus, ProgramKey, PythonLevel, Recommendation, TextFragment,
};
