//! Query-side view of the artifact store.
//!
//! [`Knowledge::load`] reads `index.json`, loads every program's corpus
//! and builds one similarity index per program, once. All query methods
//! then work off that in-memory snapshot; re-ingesting requires a new
//! load to pick up fresh artifacts.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use progscout_index::{AnswerOutcome, DEFAULT_TOP_K, SimilarityIndex};
use progscout_recommend::score_electives;
use progscout_shared::{
    AppConfig, CourseRow, LearnerProfile, ProgScoutError, ProgramCorpus, ProgramKey,
    Recommendation, Result, ScoringKeywords,
};
use progscout_store::{ArtifactStore, plan_csv_bytes};

// ---------------------------------------------------------------------------
// Knowledge
// ---------------------------------------------------------------------------

/// One loaded program: its corpus plus the index over its fragments.
struct ProgramKnowledge {
    corpus: ProgramCorpus,
    index: SimilarityIndex,
}

/// Read-only snapshot of everything the last ingestion produced, keyed by
/// program, ready to answer questions, export plans and score electives.
pub struct Knowledge {
    programs: BTreeMap<ProgramKey, ProgramKnowledge>,
    scoring: ScoringKeywords,
}

impl Knowledge {
    /// Load every program listed in the artifact index. Fails when the
    /// index file itself is missing or malformed; problems with individual
    /// artifacts degrade to empty fragments or rows instead.
    #[instrument(skip_all, fields(data_dir = %config.data_dir))]
    pub fn load(config: &AppConfig) -> Result<Self> {
        let store = ArtifactStore::new(&config.data_dir);
        let entries = store.read_index()?;

        let mut programs = BTreeMap::new();
        for entry in entries.values() {
            let corpus = store.load_program(entry);
            let index = SimilarityIndex::build(&corpus.fragments);
            debug!(
                program = %corpus.program,
                fragments = corpus.fragments.len(),
                rows = corpus.rows.len(),
                "program loaded"
            );
            programs.insert(corpus.program.clone(), ProgramKnowledge { corpus, index });
        }

        info!(programs = programs.len(), "knowledge loaded");
        Ok(Self {
            programs,
            scoring: config.keywords.scoring.clone(),
        })
    }

    /// Keys of the loaded programs, in sorted order.
    pub fn programs(&self) -> Vec<&ProgramKey> {
        self.programs.keys().collect()
    }

    pub fn contains(&self, program: &ProgramKey) -> bool {
        self.programs.contains_key(program)
    }

    /// Answer a free-form question from the program's page fragments.
    pub fn answer(&self, program: &ProgramKey, question: &str) -> Result<AnswerOutcome> {
        let loaded = self.get(program)?;
        Ok(loaded.index.answer(question, DEFAULT_TOP_K))
    }

    /// Parsed curriculum rows for the program. Empty when no plan document
    /// was found or parsed during ingestion.
    pub fn plan_rows(&self, program: &ProgramKey) -> Result<&[CourseRow]> {
        Ok(&self.get(program)?.corpus.rows)
    }

    /// Curriculum rows rendered as a CSV document, BOM included.
    pub fn plan_csv(&self, program: &ProgramKey) -> Result<Vec<u8>> {
        Ok(plan_csv_bytes(self.plan_rows(program)?))
    }

    /// Score the program's electives against a learner profile.
    pub fn recommend(
        &self,
        program: &ProgramKey,
        profile: &LearnerProfile,
    ) -> Result<Vec<Recommendation>> {
        let loaded = self.get(program)?;
        Ok(score_electives(&loaded.corpus.rows, profile, &self.scoring))
    }

    fn get(&self, program: &ProgramKey) -> Result<&ProgramKnowledge> {
        self.programs
            .get(program)
            .ok_or_else(|| ProgScoutError::validation(format!("unknown program '{program}'")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use progscout_shared::TextFragment;

    fn temp_data_dir() -> PathBuf {
        std::env::temp_dir().join(format!("progscout-knowledge-{}", uuid::Uuid::now_v7()))
    }

    fn config_for(data_dir: &Path) -> AppConfig {
        AppConfig {
            data_dir: data_dir.to_string_lossy().into_owned(),
            ..AppConfig::default()
        }
    }

    fn fragment(text: &str) -> TextFragment {
        TextFragment::new(text).expect("fragment within bounds")
    }

    fn cost_corpus(key: &str) -> ProgramCorpus {
        ProgramCorpus {
            program: ProgramKey::new(key).expect("valid key"),
            fragments: vec![
                fragment("Стоимость обучения составляет 599 тысяч рублей в год для всех студентов"),
                fragment("Занятия проходят в вечернем формате в кампусе университета"),
                fragment("Партнеры программы помогают студентам со стажировками и проектами"),
            ],
            rows: vec![
                CourseRow {
                    title: "Машинное обучение".to_owned(),
                    semester: Some(1),
                    credits: Some(4.0),
                    course_type: "Элективная".to_owned(),
                },
                CourseRow {
                    title: "Философия техники".to_owned(),
                    semester: Some(2),
                    credits: Some(2.0),
                    course_type: "Элективная".to_owned(),
                },
            ],
        }
    }

    fn seed(store: &ArtifactStore, corpora: &[ProgramCorpus]) {
        let mut index = BTreeMap::new();
        for corpus in corpora {
            let entry = store.save_program(corpus).expect("save");
            index.insert(corpus.program.clone(), entry);
        }
        store.write_index(&index).expect("write index");
    }

    #[test]
    fn load_lists_every_indexed_program() {
        let dir = temp_data_dir();
        let store = ArtifactStore::new(&dir);
        let mut second = cost_corpus("ai_product");
        second.rows.clear();
        seed(&store, &[cost_corpus("ai"), second]);

        let knowledge = Knowledge::load(&config_for(&dir)).expect("load");
        let keys: Vec<&str> = knowledge.programs().iter().map(|p| p.as_str()).collect();
        assert_eq!(keys, ["ai", "ai_product"]);
        assert!(knowledge.contains(&ProgramKey::new("ai").expect("key")));
        assert!(!knowledge.contains(&ProgramKey::new("robotics").expect("key")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn answers_from_the_loaded_corpus() {
        let dir = temp_data_dir();
        seed(&ArtifactStore::new(&dir), &[cost_corpus("ai")]);

        let knowledge = Knowledge::load(&config_for(&dir)).expect("load");
        let key = ProgramKey::new("ai").expect("key");
        let AnswerOutcome::Answered { text, sources } =
            knowledge.answer(&key, "стоимость обучения в год").expect("known program")
        else {
            panic!("expected an answer");
        };
        assert!(text.contains("599"));
        assert_eq!(sources.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_program_is_a_validation_error() {
        let dir = temp_data_dir();
        seed(&ArtifactStore::new(&dir), &[cost_corpus("ai")]);

        let knowledge = Knowledge::load(&config_for(&dir)).expect("load");
        let key = ProgramKey::new("robotics").expect("key");
        let err = knowledge.answer(&key, "стоимость").expect_err("unknown program");
        assert!(matches!(err, ProgScoutError::Validation { .. }));
        assert!(err.to_string().contains("unknown program 'robotics'"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn plan_rows_and_csv_reflect_stored_artifacts() {
        let dir = temp_data_dir();
        let corpus = cost_corpus("ai");
        seed(&ArtifactStore::new(&dir), &[corpus.clone()]);

        let knowledge = Knowledge::load(&config_for(&dir)).expect("load");
        let key = ProgramKey::new("ai").expect("key");
        assert_eq!(knowledge.plan_rows(&key).expect("rows"), corpus.rows.as_slice());
        assert_eq!(
            knowledge.plan_csv(&key).expect("csv"),
            plan_csv_bytes(&corpus.rows)
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn program_without_fragments_answers_no_data() {
        let dir = temp_data_dir();
        let mut corpus = cost_corpus("ai");
        corpus.fragments.clear();
        seed(&ArtifactStore::new(&dir), &[corpus]);

        let knowledge = Knowledge::load(&config_for(&dir)).expect("load");
        let key = ProgramKey::new("ai").expect("key");
        let outcome = knowledge.answer(&key, "стоимость обучения").expect("known program");
        assert_eq!(outcome, AnswerOutcome::NoData);
        // Plan data is independent of page text.
        assert_eq!(knowledge.plan_rows(&key).expect("rows").len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn recommends_qualifying_electives_only() {
        let dir = temp_data_dir();
        seed(&ArtifactStore::new(&dir), &[cost_corpus("ai")]);

        let knowledge = Knowledge::load(&config_for(&dir)).expect("load");
        let key = ProgramKey::new("ai").expect("key");
        let profile = LearnerProfile::from_raw("ml_engineer", "basic", "medium");
        let picks = knowledge.recommend(&key, &profile).expect("known program");

        // "Машинное обучение" hits the ML goal group (+3) and the elective
        // type bonus (+1); "Философия техники" only reaches 1 and is dropped.
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].title, "Машинное обучение");
        assert_eq!(picks[0].score, 4);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
