//! Rule-based elective scoring against a learner profile.
//!
//! Every curriculum row earns an integer score from keyword matches on its
//! title and type label; rows at or above the qualifying score become
//! recommendations. Scoring is pure and deterministic: identical rows,
//! profile, and keyword tables always yield the identical ordered list.

use tracing::{debug, instrument};

use progscout_shared::{
    CourseRow, Goal, LearnerProfile, MathLevel, PythonLevel, Recommendation, ScoringKeywords,
    matches_any,
};

/// Upper bound on the returned list, even when more rows qualify.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Minimum total score for a row to qualify as a recommendation.
pub const QUALIFYING_SCORE: u32 = 3;

/// Sort key for rows whose semester is unknown, placing them last.
const UNKNOWN_SEMESTER: u32 = 99;

/// Score every row against the profile and return the qualifying ones,
/// ordered by ascending semester (unknown last), then descending score,
/// then ascending title.
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn score_electives(
    rows: &[CourseRow],
    profile: &LearnerProfile,
    keywords: &ScoringKeywords,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = rows
        .iter()
        .filter_map(|row| {
            let score = score_row(row, profile, keywords);
            (score >= QUALIFYING_SCORE).then(|| Recommendation {
                title: row.title.clone(),
                semester: row.semester,
                course_type: row.course_type.clone(),
                score,
            })
        })
        .collect();

    recommendations.sort_by(|a, b| {
        sort_semester(a)
            .cmp(&sort_semester(b))
            .then(b.score.cmp(&a.score))
            .then_with(|| a.title.cmp(&b.title))
    });
    recommendations.truncate(MAX_RECOMMENDATIONS);

    debug!(qualified = recommendations.len(), "electives scored");
    recommendations
}

/// Keyword score for one row. Title matches drive the goal rules; the
/// type label drives the elective bonus.
fn score_row(row: &CourseRow, profile: &LearnerProfile, keywords: &ScoringKeywords) -> u32 {
    let mut score = 0;

    let (primary, secondary) = goal_groups(profile.goal, keywords);
    if primary.iter().any(|group| matches_any(&row.title, group)) {
        score += 3;
    }
    if secondary.is_some_and(|group| matches_any(&row.title, group)) {
        score += 1;
    }

    if matches!(profile.python, PythonLevel::None | PythonLevel::Basic)
        && matches_any(&row.title, &keywords.prog)
    {
        score += 1;
    }
    if profile.math == MathLevel::Weak && matches_any(&row.title, &keywords.math) {
        score += 1;
    }
    if matches_any(&row.course_type, &keywords.elective) {
        score += 1;
    }

    score
}

/// Primary keyword groups (worth +3 on any match) and the goal-adjacent
/// secondary group (worth +1) for each career goal. [`Goal::Other`] maps
/// to no groups, so such profiles score on the bonus rules alone.
fn goal_groups(goal: Goal, keywords: &ScoringKeywords) -> (Vec<&[String]>, Option<&[String]>) {
    match goal {
        Goal::MlEngineer => (
            vec![
                keywords.ml.as_slice(),
                keywords.mlops.as_slice(),
                keywords.prog.as_slice(),
            ],
            Some(keywords.data_eng.as_slice()),
        ),
        Goal::DataEngineer => (
            vec![keywords.data_eng.as_slice(), keywords.prog.as_slice()],
            Some(keywords.mlops.as_slice()),
        ),
        Goal::AiProductManager => (
            vec![
                keywords.product.as_slice(),
                keywords.analytics.as_slice(),
                keywords.ux.as_slice(),
            ],
            Some(keywords.ml.as_slice()),
        ),
        Goal::Analyst => (
            vec![keywords.analytics.as_slice()],
            Some(keywords.ml.as_slice()),
        ),
        Goal::Other => (Vec::new(), None),
    }
}

fn sort_semester(recommendation: &Recommendation) -> u32 {
    recommendation.semester.unwrap_or(UNKNOWN_SEMESTER)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
