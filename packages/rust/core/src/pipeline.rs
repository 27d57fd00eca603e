//! Ingestion pipeline: fetch → extract → parse → persist, per program.
//!
//! Programs are processed sequentially and independently: a fetch failure
//! in one program is recorded and the others continue. A missing or
//! undownloadable curriculum document is not a failure at all — the
//! program keeps its page text and simply has no rows.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};
use url::Url;

use progscout_fetcher::Fetcher;
use progscout_shared::{AppConfig, ProgramCorpus, ProgramKey, Result};
use progscout_store::{ArtifactStore, IndexEntry};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting ingestion status.
pub trait IngestProgress: Send + Sync {
    /// Called when a program enters a new phase.
    fn phase(&self, program: &ProgramKey, name: &str);
    /// Called when the whole run completes.
    fn done(&self, report: &IngestReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl IngestProgress for SilentProgress {
    fn phase(&self, _program: &ProgramKey, _name: &str) {}
    fn done(&self, _report: &IngestReport) {}
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Per-program outcome of one ingestion run.
#[derive(Debug, Clone)]
pub struct ProgramReport {
    pub program: ProgramKey,
    /// Text fragments extracted from the program page.
    pub fragments: usize,
    /// Curriculum rows parsed from the plan document.
    pub rows: usize,
    /// Whether a curriculum document link was found on the page.
    pub plan_found: bool,
}

/// Summary of one full ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    /// Successfully ingested programs, in configuration order.
    pub programs: Vec<ProgramReport>,
    /// Configured keys that failed, with the reason.
    pub failures: Vec<(String, String)>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Ingest every configured program and replace `index.json` with the
/// result. Returns the run summary; only a config-level or index-write
/// failure is an error, per-program failures land in the report.
#[instrument(skip_all, fields(programs = config.programs.len()))]
pub async fn ingest_all(config: &AppConfig, progress: &dyn IngestProgress) -> Result<IngestReport> {
    let start = Instant::now();
    let fetcher = Fetcher::new(&config.fetch)?;
    let store = ArtifactStore::new(&config.data_dir);

    let mut index = BTreeMap::new();
    let mut programs = Vec::new();
    let mut failures = Vec::new();

    for entry in &config.programs {
        let program = match ProgramKey::new(&entry.key) {
            Ok(key) => key,
            Err(e) => {
                warn!(key = %entry.key, error = %e, "skipping misconfigured program");
                failures.push((entry.key.clone(), e.to_string()));
                continue;
            }
        };
        let url = match Url::parse(&entry.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(program = %program, url = %entry.url, error = %e, "skipping program with invalid URL");
                failures.push((entry.key.clone(), format!("invalid URL {}: {e}", entry.url)));
                continue;
            }
        };

        match ingest_program(&fetcher, &store, config, program.clone(), &url, progress).await {
            Ok((report, index_entry)) => {
                index.insert(report.program.clone(), index_entry);
                programs.push(report);
            }
            Err(e) => {
                warn!(program = %program, error = %e, "program ingestion failed, others continue");
                failures.push((entry.key.clone(), e.to_string()));
            }
        }
    }

    store.write_index(&index)?;

    let report = IngestReport {
        programs,
        failures,
        elapsed: start.elapsed(),
    };
    progress.done(&report);

    info!(
        programs = report.programs.len(),
        failures = report.failures.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "ingestion complete"
    );
    Ok(report)
}

/// Run the full flow for one program and persist its artifacts.
#[instrument(skip_all, fields(program = %program, url = %url))]
async fn ingest_program(
    fetcher: &Fetcher,
    store: &ArtifactStore,
    config: &AppConfig,
    program: ProgramKey,
    url: &Url,
    progress: &dyn IngestProgress,
) -> Result<(ProgramReport, IndexEntry)> {
    progress.phase(&program, "Fetching program page");
    let html = fetcher.fetch_page(url).await?;

    progress.phase(&program, "Extracting page text");
    let fragments = progscout_extract::extract_text(&html);

    progress.phase(&program, "Locating curriculum document");
    let plan_link = progscout_extract::find_curriculum_link(&html, url, &config.keywords.link);

    let rows = match &plan_link {
        Some(link) => {
            progress.phase(&program, "Downloading curriculum");
            match fetcher.download_document(link).await {
                Ok(bytes) => progscout_curriculum::parse_pdf(&bytes, &config.keywords.columns),
                Err(e) => {
                    warn!(
                        program = %program,
                        url = %link,
                        error = %e,
                        "curriculum download failed, continuing with page text only"
                    );
                    Vec::new()
                }
            }
        }
        None => {
            info!(program = %program, "no curriculum link on page");
            Vec::new()
        }
    };

    let corpus = ProgramCorpus {
        program: program.clone(),
        fragments,
        rows,
    };
    progress.phase(&program, "Saving artifacts");
    let entry = store.save_program(&corpus)?;

    info!(
        program = %program,
        fragments = corpus.fragments.len(),
        rows = corpus.rows.len(),
        plan_found = plan_link.is_some(),
        "program ingested"
    );
    Ok((
        ProgramReport {
            program,
            fragments: corpus.fragments.len(),
            rows: corpus.rows.len(),
            plan_found: plan_link.is_some(),
        },
        entry,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::Knowledge;
    use progscout_index::AnswerOutcome;
    use progscout_shared::{FetchConfig, KeywordTables, ProgramEntry};

    const BARE_PAGE: &str = r#"<html><body><main>
        <p>Программа посвящена глубокому изучению статистики и анализа данных в индустрии.</p>
        <p>Занятия проходят по вечерам в главном кампусе университета на набережной.</p>
    </main></body></html>"#;

    const LINKED_PAGE: &str = r#"<html><body><main>
        <p>Магистратура по искусственному интеллекту для будущих инженеров и исследователей.</p>
        <p>Студенты совмещают работу и учебу благодаря вечернему расписанию занятий.</p>
        <a href="/files/broken.pdf">Скачать учебный план</a>
    </main></body></html>"#;

    fn fixture_page() -> String {
        std::fs::read_to_string(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/html/program_page.html"),
        )
        .expect("fixture page")
    }

    /// One-page PDF with a text line per table row, ASCII only so the
    /// simple Type1 font round-trips through text extraction.
    fn plan_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
            operations.push(Operation::new(
                "Td",
                vec![50.into(), (760 - 16 * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("save pdf");
        buffer
    }

    fn temp_data_dir() -> PathBuf {
        std::env::temp_dir().join(format!("progscout-pipeline-{}", uuid::Uuid::now_v7()))
    }

    fn test_config(server_uri: &str, data_dir: &Path, programs: &[(&str, &str)]) -> AppConfig {
        AppConfig {
            data_dir: data_dir.to_string_lossy().into_owned(),
            fetch: FetchConfig {
                user_agent: "progscout-test/1.0".into(),
                page_timeout_secs: 5,
                download_timeout_secs: 5,
            },
            programs: programs
                .iter()
                .map(|(key, page_path)| ProgramEntry {
                    key: (*key).to_owned(),
                    url: format!("{server_uri}{page_path}"),
                })
                .collect(),
            keywords: KeywordTables::default(),
        }
    }

    #[tokio::test]
    async fn ingest_persists_artifacts_and_isolates_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/program/master/ai"))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture_page()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/10033_plan.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                plan_pdf(&[
                    "Course   Semester   Credits   Type",
                    "Machine learning systems   1   4   Elective",
                    "Data engineering practice   2   3   Elective",
                ]),
                "application/pdf",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/program/master/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let data_dir = temp_data_dir();
        let config = test_config(
            &server.uri(),
            &data_dir,
            &[("ai", "/program/master/ai"), ("gone", "/program/master/gone")],
        );

        let report = ingest_all(&config, &SilentProgress).await.expect("ingest");

        assert_eq!(report.programs.len(), 1);
        let ai = &report.programs[0];
        assert_eq!(ai.program.as_str(), "ai");
        assert!(ai.fragments > 0);
        assert_eq!(ai.rows, 2);
        assert!(ai.plan_found);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "gone");

        // The successful program is queryable end to end.
        let store = ArtifactStore::new(&config.data_dir);
        let index = store.read_index().expect("index written");
        assert_eq!(index.len(), 1);

        let knowledge = Knowledge::load(&config).expect("load");
        let key = ProgramKey::new("ai").expect("key");
        let outcome = knowledge.answer(&key, "стоимость обучения").expect("answer");
        let AnswerOutcome::Answered { text, .. } = outcome else {
            panic!("expected an answer, got {outcome:?}");
        };
        assert!(text.contains("599"));
        assert_eq!(knowledge.plan_rows(&key).expect("rows").len(), 2);

        let _ = std::fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn page_without_curriculum_link_ingests_text_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/program/master/ai_product"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BARE_PAGE))
            .mount(&server)
            .await;

        let data_dir = temp_data_dir();
        let config = test_config(
            &server.uri(),
            &data_dir,
            &[("ai_product", "/program/master/ai_product")],
        );

        let report = ingest_all(&config, &SilentProgress).await.expect("ingest");

        assert_eq!(report.programs.len(), 1);
        let program = &report.programs[0];
        assert!(program.fragments > 0);
        assert_eq!(program.rows, 0);
        assert!(!program.plan_found);

        let store = ArtifactStore::new(&config.data_dir);
        let index = store.read_index().expect("index");
        let entry = index.values().next().expect("entry");
        assert_eq!(entry.plan_path, "");

        let _ = std::fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn failed_download_degrades_to_page_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/program/master/ai"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LINKED_PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/broken.pdf"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let data_dir = temp_data_dir();
        let config = test_config(&server.uri(), &data_dir, &[("ai", "/program/master/ai")]);

        let report = ingest_all(&config, &SilentProgress).await.expect("ingest");

        assert_eq!(report.programs.len(), 1);
        assert!(report.failures.is_empty());
        let program = &report.programs[0];
        assert!(program.plan_found);
        assert_eq!(program.rows, 0);
        assert!(program.fragments > 0);

        let _ = std::fs::remove_dir_all(&data_dir);
    }
}
