//! Core domain types for the progscout knowledge engine.

use serde::{Deserialize, Serialize};

use crate::error::{ProgScoutError, Result};

/// Shortest span of page text worth keeping, in characters (after trimming).
pub const MIN_FRAGMENT_CHARS: usize = 20;

/// Longest fragment emitted by extraction; longer segments are windowed.
pub const MAX_FRAGMENT_CHARS: usize = 400;

/// Shortest course title accepted from a curriculum table row.
pub const MIN_TITLE_CHARS: usize = 2;

// ---------------------------------------------------------------------------
// ProgramKey
// ---------------------------------------------------------------------------

/// Identifier of a study program, the partition key for all per-program
/// artifacts. Lowercase ASCII alphanumerics and underscores only, so it is
/// safe to use as a directory and file-name component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProgramKey(String);

impl ProgramKey {
    /// Validate and wrap a raw key. The set of programs is open: any
    /// well-formed key is accepted here, membership is checked against the
    /// configured programs at the call boundary.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let well_formed = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !well_formed {
            return Err(ProgScoutError::validation(format!(
                "invalid program key {raw:?}: expected lowercase ASCII, digits, underscores"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProgramKey {
    type Err = ProgScoutError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProgramKey {
    type Error = ProgScoutError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProgramKey> for String {
    fn from(key: ProgramKey) -> Self {
        key.0
    }
}

// ---------------------------------------------------------------------------
// TextFragment
// ---------------------------------------------------------------------------

/// A short span of page-derived prose, the unit indexed for retrieval.
/// Construction enforces the length bounds, so every fragment in a corpus
/// is non-trivial and short enough to read as an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TextFragment(String);

impl TextFragment {
    /// Trim and wrap a span. Returns `None` when the trimmed text falls
    /// outside `(MIN_FRAGMENT_CHARS, MAX_FRAGMENT_CHARS]`.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        let chars = trimmed.chars().count();
        if chars <= MIN_FRAGMENT_CHARS || chars > MAX_FRAGMENT_CHARS {
            return None;
        }
        Some(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TextFragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TextFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CourseRow
// ---------------------------------------------------------------------------

/// One structured curriculum entry. Semester and credits stay optional:
/// source tables routinely omit or mangle them, and the scorer treats a
/// missing semester as "sorts last".
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRow {
    /// Course title, non-empty, at least [`MIN_TITLE_CHARS`] characters.
    pub title: String,
    /// First run of digits found in the semester cell, if any.
    pub semester: Option<u32>,
    /// First decimal number found in the credits cell, if any.
    pub credits: Option<f64>,
    /// Free-text course category, possibly empty.
    pub course_type: String,
}

// ---------------------------------------------------------------------------
// ProgramCorpus
// ---------------------------------------------------------------------------

/// Everything extracted for one program in one refresh cycle: the ordered
/// page fragments plus the parsed curriculum rows (empty when no plan
/// document was found or parsed). Replaced wholesale on the next refresh.
#[derive(Debug, Clone)]
pub struct ProgramCorpus {
    pub program: ProgramKey,
    pub fragments: Vec<TextFragment>,
    pub rows: Vec<CourseRow>,
}

// ---------------------------------------------------------------------------
// Learner profile
// ---------------------------------------------------------------------------

/// Career goal stated by the learner. Unrecognized strings map to
/// [`Goal::Other`], which matches no keyword group and scores nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    MlEngineer,
    DataEngineer,
    AiProductManager,
    Analyst,
    Other,
}

impl Goal {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "ml_engineer" => Self::MlEngineer,
            "data_engineer" => Self::DataEngineer,
            "ai_product_manager" => Self::AiProductManager,
            "analyst" => Self::Analyst,
            _ => Self::Other,
        }
    }
}

/// Python proficiency. Unrecognized strings fall back to `Basic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonLevel {
    None,
    Basic,
    Intermediate,
    Advanced,
}

impl PythonLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "none" => Self::None,
            "basic" => Self::Basic,
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            _ => Self::Basic,
        }
    }
}

/// Math proficiency. Unrecognized strings fall back to `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathLevel {
    Weak,
    Medium,
    Strong,
}

impl MathLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "weak" => Self::Weak,
            "medium" => Self::Medium,
            "strong" => Self::Strong,
            _ => Self::Medium,
        }
    }
}

/// Caller-supplied attributes used to personalize elective scoring.
/// Transient: supplied per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnerProfile {
    pub goal: Goal,
    pub python: PythonLevel,
    pub math: MathLevel,
}

impl LearnerProfile {
    /// Build a profile from free-form strings, applying the documented
    /// fallbacks instead of erroring.
    pub fn from_raw(goal: &str, python: &str, math: &str) -> Self {
        Self {
            goal: Goal::parse(goal),
            python: PythonLevel::parse(python),
            math: MathLevel::parse(math),
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// One scored elective. Derived on every request, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub title: String,
    pub semester: Option<u32>,
    pub course_type: String,
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_key_accepts_well_formed_keys() {
        for key in ["ai", "ai_product", "ds2024"] {
            let parsed = ProgramKey::new(key).expect("valid key");
            assert_eq!(parsed.as_str(), key);
        }
    }

    #[test]
    fn program_key_rejects_malformed_keys() {
        for key in ["", "AI", "ai product", "ai-product", "ai/../etc"] {
            assert!(ProgramKey::new(key).is_err(), "{key:?} should be rejected");
        }
    }

    #[test]
    fn program_key_serde_validates() {
        let key: ProgramKey = serde_json::from_str("\"ai_product\"").expect("valid key");
        assert_eq!(key.as_str(), "ai_product");

        let bad: std::result::Result<ProgramKey, _> = serde_json::from_str("\"AI Product\"");
        assert!(bad.is_err());
    }

    #[test]
    fn fragment_enforces_length_bounds() {
        assert!(TextFragment::new("short").is_none());
        // Exactly at the minimum is still noise.
        assert!(TextFragment::new("a".repeat(MIN_FRAGMENT_CHARS)).is_none());
        assert!(TextFragment::new("a".repeat(MIN_FRAGMENT_CHARS + 1)).is_some());
        assert!(TextFragment::new("a".repeat(MAX_FRAGMENT_CHARS)).is_some());
        assert!(TextFragment::new("a".repeat(MAX_FRAGMENT_CHARS + 1)).is_none());
    }

    #[test]
    fn fragment_counts_characters_not_bytes() {
        // 21 Cyrillic characters, 42 bytes.
        let text = "п".repeat(MIN_FRAGMENT_CHARS + 1);
        let fragment = TextFragment::new(&text).expect("21 chars is above the minimum");
        assert_eq!(fragment.as_str(), text);
    }

    #[test]
    fn fragment_trims_before_measuring() {
        let padded = format!("   {}   ", "a".repeat(MIN_FRAGMENT_CHARS + 1));
        let fragment = TextFragment::new(&padded).expect("trimmed length qualifies");
        assert!(!fragment.as_str().starts_with(' '));
        assert!(!fragment.as_str().ends_with(' '));
    }

    #[test]
    fn profile_parsing_applies_fallbacks() {
        let profile = LearnerProfile::from_raw("ml_engineer", "basic", "medium");
        assert_eq!(profile.goal, Goal::MlEngineer);
        assert_eq!(profile.python, PythonLevel::Basic);
        assert_eq!(profile.math, MathLevel::Medium);

        let fallback = LearnerProfile::from_raw("quant", "wizard", "");
        assert_eq!(fallback.goal, Goal::Other);
        assert_eq!(fallback.python, PythonLevel::Basic);
        assert_eq!(fallback.math, MathLevel::Medium);
    }

    #[test]
    fn profile_parsing_is_case_insensitive() {
        assert_eq!(Goal::parse(" ML_Engineer "), Goal::MlEngineer);
        assert_eq!(PythonLevel::parse("ADVANCED"), PythonLevel::Advanced);
        assert_eq!(MathLevel::parse("Weak"), MathLevel::Weak);
    }
}
