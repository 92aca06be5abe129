//! Keyword categorizer and textual duplicate finder.
//!
//! A bag-of-words stand-in for a real classifier: an immutable table of
//! category keywords plus a synonym map, loaded from `categories.yaml` or
//! taken from the built-in defaults.

use crate::schema::IdeaCategory;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

const TABLE_FILE: &str = "categories.yaml";
const SYNONYM_WEIGHT: f64 = 0.8;
const DUPLICATE_SIMILARITY: f64 = 0.3;
const MIN_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Categorization {
    pub main_category: IdeaCategory,
    pub confidence: f64,
    pub all_scores: BTreeMap<IdeaCategory, f64>,
    pub tokens_analyzed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatch {
    pub idea_id: String,
    pub title: String,
    pub similarity: f64,
    pub reason: String,
}

/// Text of an already stored idea, as seen by the duplicate finder.
#[derive(Debug, Clone, Copy)]
pub struct ExistingIdea<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct TableFile {
    categories: Vec<CategoryEntry>,
    #[serde(default)]
    synonyms: HashMap<String, String>,
    #[serde(default)]
    stop_words: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryEntry {
    category: IdeaCategory,
    keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Categorizer {
    // table order decides ties
    keywords: Vec<(IdeaCategory, HashSet<String>)>,
    synonyms: HashMap<String, String>,
    stop_words: HashSet<String>,
}

impl Default for Categorizer {
    fn default() -> Self {
        let keywords = DEFAULT_KEYWORDS
            .iter()
            .map(|(category, words)| {
                (*category, words.iter().map(|w| w.to_string()).collect())
            })
            .collect();
        let synonyms = DEFAULT_SYNONYMS
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        let stop_words = DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect();
        Self {
            keywords,
            synonyms,
            stop_words,
        }
    }
}

impl Categorizer {
    /// Reads `categories.yaml` from `path`, or the built-in table when absent.
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let table_path = path.join(TABLE_FILE);
        if !table_path.exists() {
            debug!(path = %table_path.display(), "no category table, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&table_path)?;
        let file: TableFile = serde_yaml::from_str(&raw)?;
        Ok(Self::from_table(file))
    }

    fn from_table(file: TableFile) -> Self {
        let keywords = file
            .categories
            .into_iter()
            .map(|entry| {
                let words = entry.keywords.iter().map(|w| w.to_lowercase()).collect();
                (entry.category, words)
            })
            .collect();
        let synonyms = file
            .synonyms
            .into_iter()
            .map(|(from, to)| (from.to_lowercase(), to.to_lowercase()))
            .collect();
        let stop_words = file.stop_words.iter().map(|w| w.to_lowercase()).collect();
        Self {
            keywords,
            synonyms,
            stop_words,
        }
    }

    pub fn categorize(&self, title: &str, text: &str) -> Categorization {
        let tokens = self.tokenize(&format!("{title} {text}"));

        let mut all_scores = BTreeMap::new();
        let mut total_matches = 0.0;
        for (category, keywords) in &self.keywords {
            let matches: f64 = tokens
                .iter()
                .map(|token| {
                    if keywords.contains(token) {
                        1.0
                    } else if self
                        .synonyms
                        .get(token)
                        .is_some_and(|canonical| keywords.contains(canonical))
                    {
                        SYNONYM_WEIGHT
                    } else {
                        0.0
                    }
                })
                .sum();
            all_scores.insert(*category, matches);
            total_matches += matches;
        }

        if total_matches == 0.0 {
            let uniform = if self.keywords.is_empty() {
                0.0
            } else {
                1.0 / self.keywords.len() as f64
            };
            for score in all_scores.values_mut() {
                *score = uniform;
            }
            return Categorization {
                main_category: IdeaCategory::Other,
                confidence: 0.0,
                all_scores,
                tokens_analyzed: tokens.len(),
            };
        }

        for score in all_scores.values_mut() {
            *score /= total_matches;
        }

        let mut main_category = IdeaCategory::Other;
        let mut confidence = 0.0;
        for (category, _) in &self.keywords {
            let score = all_scores[category];
            if score > confidence {
                main_category = *category;
                confidence = score;
            }
        }

        debug!(%main_category, confidence, tokens = tokens.len(), "categorized text");
        Categorization {
            main_category,
            confidence,
            all_scores,
            tokens_analyzed: tokens.len(),
        }
    }

    /// Existing ideas whose descriptions share enough vocabulary with `text`
    /// (Jaccard similarity above 0.3), most similar first.
    pub fn find_duplicates(&self, text: &str, existing: &[ExistingIdea<'_>]) -> Vec<DuplicateMatch> {
        let text_tokens: BTreeSet<String> = self.tokenize(text).into_iter().collect();

        let mut duplicates: Vec<DuplicateMatch> = existing
            .iter()
            .filter_map(|idea| {
                let idea_tokens: BTreeSet<String> =
                    self.tokenize(idea.description).into_iter().collect();
                let union = text_tokens.union(&idea_tokens).count();
                if union == 0 {
                    return None;
                }
                let common: Vec<&String> = text_tokens.intersection(&idea_tokens).collect();
                let similarity = common.len() as f64 / union as f64;
                if similarity <= DUPLICATE_SIMILARITY {
                    return None;
                }
                Some(DuplicateMatch {
                    idea_id: idea.id.to_string(),
                    title: idea.title.to_string(),
                    similarity,
                    reason: explain_similarity(&common),
                })
            })
            .collect();

        duplicates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        duplicates
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
            .collect();
        cleaned
            .split_whitespace()
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }
}

fn explain_similarity(common: &[&String]) -> String {
    if common.len() > 3 {
        let shown: Vec<&str> = common.iter().take(3).map(|w| w.as_str()).collect();
        return format!("Shared keywords: {}", shown.join(", "));
    }
    "Contextual similarity".to_string()
}

const DEFAULT_KEYWORDS: &[(IdeaCategory, &[&str])] = &[
    (
        IdeaCategory::Sport,
        &[
            "football", "sport", "pitch", "stadium", "gym", "running", "hall", "pool",
            "bar", "ball", "workout",
        ],
    ),
    (
        IdeaCategory::Art,
        &[
            "mural", "painting", "art", "beautiful", "wall", "drawing", "artist", "graffiti",
            "sculpture",
        ],
    ),
    (
        IdeaCategory::Ecology,
        &[
            "tree", "green", "trash", "ecology", "clean", "landscaping", "flowers", "dump",
            "waste", "air",
        ],
    ),
    (
        IdeaCategory::Infrastructure,
        &[
            "road", "sidewalk", "lighting", "repair", "bench", "parking", "stop", "bridge",
            "fountain",
        ],
    ),
    (
        IdeaCategory::Culture,
        &[
            "library", "museum", "theater", "concert", "festival", "exhibition", "holiday",
            "tradition",
        ],
    ),
    (
        IdeaCategory::Education,
        &[
            "school", "kids", "education", "club", "laboratory", "classes", "student",
            "teacher",
        ],
    ),
];

const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("soccer", "football"),
    ("sports", "sport"),
    ("ecological", "ecology"),
    ("trees", "tree"),
    ("roads", "road"),
    ("benches", "bench"),
    ("murals", "mural"),
    ("schools", "school"),
    ("garbage", "trash"),
    ("streetlights", "lighting"),
];

const DEFAULT_STOP_WORDS: &[&str] = &[
    "and", "the", "for", "with", "that", "this", "are", "was", "not", "but", "our", "from",
    "near",
];
