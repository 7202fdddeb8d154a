//! Concept extraction.
//!
//! Three parsers produce the same [`Extraction`] shape:
//! 1. [`parse_structured`] reads the JSON a model was asked for,
//! 2. [`parse_heuristic`] scans a free-form model reply for questions and quoted terms,
//! 3. [`extract_frequency`] works on the fragment itself and needs no model.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ResearchMemory;
use crate::error::{AppError, AppResult};
use crate::llm::extract_json_from_completion;
use crate::prompts;
use crate::storage::{Fragment, FragmentTag, Storage, TagKind};

static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[「『]([^」』]+)[」』]").expect("valid quoted-term regex"));
static TERM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ァ-ヶー]{2,}|[一-龠々]{2,}").expect("valid term regex"));

const TOP_CONCEPTS: usize = 5;
const MAX_QUESTION_CHARS: usize = 100;

/// Concepts, questions and key phrases found in a text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub key_phrases: Vec<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty() && self.questions.is_empty() && self.key_phrases.is_empty()
    }
}

/// Parse the JSON object a model returned; `None` if there is none.
pub fn parse_structured(response: &str) -> Option<Extraction> {
    let json = extract_json_from_completion(response).ok()?;
    serde_json::from_str(json).ok()
}

fn question_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['。', '．', '\n'])
        .filter(|s| s.contains('?') || s.contains('？'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Questions are sentences with a question mark; concepts are 「」/『』 quoted spans.
pub fn parse_heuristic(text: &str) -> Extraction {
    Extraction {
        concepts: QUOTED_RE
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect(),
        questions: question_sentences(text).map(str::to_string).collect(),
        key_phrases: Vec::new(),
    }
}

/// Katakana or kanji runs, counted in order of first appearance.
fn term_counts(content: &str) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for term in TERM_RE.find_iter(content).map(|m| m.as_str()) {
        match counts.iter_mut().find(|(t, _)| t == term) {
            Some((_, n)) => *n += 1,
            None => counts.push((term.to_string(), 1)),
        }
    }
    counts
}

/// Top five terms by count plus short question sentences.
pub fn extract_frequency(content: &str) -> Extraction {
    let mut counts = term_counts(content);
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    Extraction {
        concepts: counts
            .into_iter()
            .take(TOP_CONCEPTS)
            .map(|(term, _)| term)
            .collect(),
        questions: question_sentences(content)
            .filter(|s| s.chars().count() < MAX_QUESTION_CHARS)
            .map(str::to_string)
            .collect(),
        key_phrases: Vec::new(),
    }
}

/// A concept shared by several fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonConcept {
    pub concept: String,
    /// Number of fragments whose top concepts include it.
    pub count: usize,
}

/// Concepts in the frequency top five of at least two fragments, most shared first.
pub fn find_common_concepts(fragments: &[Fragment]) -> Vec<CommonConcept> {
    let mut counts: Vec<CommonConcept> = Vec::new();

    for fragment in fragments {
        for concept in extract_frequency(&fragment.content).concepts {
            match counts.iter_mut().find(|c| c.concept == concept) {
                Some(existing) => existing.count += 1,
                None => counts.push(CommonConcept { concept, count: 1 }),
            }
        }
    }

    counts.retain(|c| c.count >= 2);
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

impl ResearchMemory {
    /// Extract concepts from a fragment and store them as tags.
    ///
    /// A model reply is parsed as JSON, then heuristically. Without a model
    /// reply the frequency parser runs on the fragment itself. An `analyzed`
    /// tag is always written.
    pub async fn extract_concepts(&self, fragment: &Fragment) -> AppResult<Extraction> {
        let request = self
            .core
            .pipeline()
            .request(prompts::CONCEPT_EXTRACTION_PROMPT, prompts::concept_user(fragment));

        let extraction = match self.core.pipeline().attempt_chain(&request).await {
            Ok(generation) => match parse_structured(&generation.text) {
                Some(parsed) => parsed,
                None => {
                    debug!(fragment_id = %fragment.id, "Model reply was not JSON, parsing heuristically");
                    parse_heuristic(&generation.text)
                }
            },
            Err(e) => {
                warn!(error = %e, fragment_id = %fragment.id, "Extracting concepts by frequency");
                extract_frequency(&fragment.content)
            }
        };

        self.store_tags(&fragment.id, &extraction).await?;
        Ok(extraction)
    }

    /// Extract concepts for a stored fragment by id.
    pub async fn extract_fragment(&self, fragment_id: &str) -> AppResult<Extraction> {
        let fragment = self
            .core
            .storage()
            .get_fragment(fragment_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "fragment",
                id: fragment_id.to_string(),
            })?;
        self.extract_concepts(&fragment).await
    }

    /// Run extraction over fragments that have not been analyzed yet.
    pub async fn extract_pending(&self, limit: u32) -> AppResult<usize> {
        let pending = self.core.storage().list_unanalyzed_fragments(limit).await?;
        for fragment in &pending {
            self.extract_concepts(fragment).await?;
        }
        Ok(pending.len())
    }

    /// Tags stored for a fragment.
    pub async fn fragment_tags(&self, fragment_id: &str) -> AppResult<Vec<FragmentTag>> {
        Ok(self.core.storage().get_fragment_tags(fragment_id).await?)
    }

    async fn store_tags(&self, fragment_id: &str, extraction: &Extraction) -> AppResult<()> {
        let tags = extraction
            .concepts
            .iter()
            .map(|v| (TagKind::Concept, v))
            .chain(extraction.questions.iter().map(|v| (TagKind::Question, v)))
            .chain(extraction.key_phrases.iter().map(|v| (TagKind::KeyPhrase, v)));

        for (kind, value) in tags {
            let tag = FragmentTag::new(fragment_id, kind, value.as_str());
            self.core.storage().add_fragment_tag(&tag).await?;
        }

        let marker = FragmentTag::new(fragment_id, TagKind::Analyzed, "true");
        self.core.storage().add_fragment_tag(&marker).await?;
        Ok(())
    }
}
