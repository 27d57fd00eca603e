//! Keyword tables driving the language-specific heuristics.
//!
//! Curriculum-link discovery, column classification, and elective scoring
//! all work by case-insensitive substring matching against these lists.
//! Defaults cover the source corpus's Russian vocabulary plus English
//! equivalents; every list can be overridden from the config file under
//! `[keywords.*]`.

use serde::{Deserialize, Serialize};

/// True if `text` contains any of the keywords, case-insensitively.
/// Keywords are expected to be stored lowercase.
pub fn matches_any(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// ---------------------------------------------------------------------------
// Link discovery
// ---------------------------------------------------------------------------

/// `[keywords.link]` section: finding the curriculum document link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkKeywords {
    /// Anchor text must contain one of these "download"-type words...
    #[serde(default = "default_link_download")]
    pub download: Vec<String>,

    /// ...and one of these "curriculum"-type words.
    #[serde(default = "default_link_curriculum")]
    pub curriculum: Vec<String>,

    /// Fallback: href substrings that indicate a curriculum document.
    #[serde(default = "default_link_href_hints")]
    pub href_hints: Vec<String>,
}

impl Default for LinkKeywords {
    fn default() -> Self {
        Self {
            download: default_link_download(),
            curriculum: default_link_curriculum(),
            href_hints: default_link_href_hints(),
        }
    }
}

fn default_link_download() -> Vec<String> {
    words(&["скачать", "download"])
}
fn default_link_curriculum() -> Vec<String> {
    words(&["учеб", "curricul"])
}
fn default_link_href_hints() -> Vec<String> {
    words(&["uchebn", "plan"])
}

// ---------------------------------------------------------------------------
// Column classification
// ---------------------------------------------------------------------------

/// `[keywords.columns]` section: classifying curriculum table headers into
/// the four semantic roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnKeywords {
    #[serde(default = "default_col_title")]
    pub title: Vec<String>,

    #[serde(default = "default_col_semester")]
    pub semester: Vec<String>,

    #[serde(default = "default_col_credits")]
    pub credits: Vec<String>,

    /// Course type/category column ("вид", "тип", "type"...).
    #[serde(default = "default_col_kind")]
    pub kind: Vec<String>,
}

impl Default for ColumnKeywords {
    fn default() -> Self {
        Self {
            title: default_col_title(),
            semester: default_col_semester(),
            credits: default_col_credits(),
            kind: default_col_kind(),
        }
    }
}

fn default_col_title() -> Vec<String> {
    words(&["дисцип", "модул", "наименование", "discipl", "module", "course"])
}
fn default_col_semester() -> Vec<String> {
    words(&["семестр", "sem"])
}
fn default_col_credits() -> Vec<String> {
    words(&["зе", "зачет", "кредит", "credit"])
}
fn default_col_kind() -> Vec<String> {
    words(&["вид", "тип", "type", "kind"])
}

// ---------------------------------------------------------------------------
// Elective scoring
// ---------------------------------------------------------------------------

/// `[keywords.scoring]` section: the keyword groups referenced by the
/// elective scorer's goal mapping and bonus rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringKeywords {
    #[serde(default = "default_ml")]
    pub ml: Vec<String>,

    #[serde(default = "default_data_eng")]
    pub data_eng: Vec<String>,

    #[serde(default = "default_analytics")]
    pub analytics: Vec<String>,

    #[serde(default = "default_product")]
    pub product: Vec<String>,

    #[serde(default = "default_mlops")]
    pub mlops: Vec<String>,

    #[serde(default = "default_prog")]
    pub prog: Vec<String>,

    #[serde(default = "default_ux")]
    pub ux: Vec<String>,

    /// Probability/mathematics stems for the weak-math bonus.
    #[serde(default = "default_math")]
    pub math: Vec<String>,

    /// Stems marking an elective/optional course type.
    #[serde(default = "default_elective")]
    pub elective: Vec<String>,
}

impl Default for ScoringKeywords {
    fn default() -> Self {
        Self {
            ml: default_ml(),
            data_eng: default_data_eng(),
            analytics: default_analytics(),
            product: default_product(),
            mlops: default_mlops(),
            prog: default_prog(),
            ux: default_ux(),
            math: default_math(),
            elective: default_elective(),
        }
    }
}

fn default_ml() -> Vec<String> {
    words(&["машинное обучение", "ml", "deep", "глубок", "нейрон", "cv", "nlp"])
}
fn default_data_eng() -> Vec<String> {
    words(&["данн", "хранилищ", "etl", "pipelin", "spark", "инженер", "big data", "базы"])
}
fn default_analytics() -> Vec<String> {
    words(&["аналит", "a/b", "метрик", "продуктов", "sql", "эксперимент", "визуал"])
}
fn default_product() -> Vec<String> {
    words(&["продукт", "product", "менеджмент", "управлен", "маркет", "go-to-market", "unit"])
}
fn default_mlops() -> Vec<String> {
    words(&["mlops", "деплой", "prod", "kubernetes", "docker"])
}
fn default_prog() -> Vec<String> {
    words(&["python", "программ", "алгоритм"])
}
fn default_ux() -> Vec<String> {
    words(&["ux", "ui", "дизайн", "исследован", "hypothesis"])
}
fn default_math() -> Vec<String> {
    words(&["вероятност", "математ", "probabil", "math"])
}
fn default_elective() -> Vec<String> {
    words(&["элек", "выбор", "electiv", "option"])
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// `[keywords]` section: all tables, one sub-section per concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordTables {
    #[serde(default)]
    pub link: LinkKeywords,

    #[serde(default)]
    pub columns: ColumnKeywords,

    #[serde(default)]
    pub scoring: ScoringKeywords,
}
