use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::extraction::find_common_concepts;
use super::{ResearchMemory, RECENT_WINDOW};
use crate::error::AppResult;
use crate::llm::extract_json_from_completion;
use crate::prompts;
use crate::storage::{CoreTheme, Fragment, Storage};

const MIN_FRAGMENTS: usize = 3;
const FALLBACK_THEMES: usize = 3;
const MERGE_SIMILARITY: f64 = 0.7;

/// A theme proposed by identification, before merging with stored themes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateTheme {
    pub name: String,
    pub description: String,
    pub fragment_ids: Vec<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThemesPayload {
    #[serde(default)]
    themes: Vec<RawTheme>,
}

#[derive(Debug, Deserialize)]
struct RawTheme {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    related_fragment_ids: Vec<serde_json::Value>,
    #[serde(default)]
    reason: Option<String>,
}

/// Resolve a 1-based fragment number from the prompt listing.
fn resolve_reference(value: &serde_json::Value, fragments: &[Fragment]) -> Option<String> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_u64()?,
        serde_json::Value::String(s) => s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .ok()?,
        _ => return None,
    };
    let index = usize::try_from(number).ok()?.checked_sub(1)?;
    fragments.get(index).map(|f| f.id.clone())
}

/// Parse model output into candidates; `None` when it is not the expected JSON.
pub(crate) fn parse_themes(response: &str, fragments: &[Fragment]) -> Option<Vec<CandidateTheme>> {
    let json = extract_json_from_completion(response).ok()?;
    let payload: ThemesPayload = serde_json::from_str(json).ok()?;

    Some(
        payload
            .themes
            .into_iter()
            .filter(|t| !t.name.trim().is_empty())
            .map(|t| {
                let mut fragment_ids = Vec::new();
                for id in t
                    .related_fragment_ids
                    .iter()
                    .filter_map(|v| resolve_reference(v, fragments))
                {
                    if !fragment_ids.contains(&id) {
                        fragment_ids.push(id);
                    }
                }
                CandidateTheme {
                    name: t.name.trim().to_string(),
                    description: t.description,
                    fragment_ids,
                    reason: t.reason,
                }
            })
            .collect(),
    )
}

/// Up to three themes from the concepts shared by several fragments.
pub(crate) fn themes_from_concepts(fragments: &[Fragment]) -> Vec<CandidateTheme> {
    find_common_concepts(fragments)
        .into_iter()
        .take(FALLBACK_THEMES)
        .map(|common| CandidateTheme {
            description: format!(
                "「{}」に関する一連の思考（{}回出現）",
                common.concept, common.count
            ),
            fragment_ids: fragments
                .iter()
                .filter(|f| f.content.contains(&common.concept))
                .map(|f| f.id.clone())
                .collect(),
            reason: Some(format!("{}回繰り返し出現している概念", common.count)),
            name: common.concept,
        })
        .collect()
}

/// Jaccard similarity of the character sets of two names.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left: HashSet<char> = a.chars().collect();
    let right: HashSet<char> = b.chars().collect();
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// 0.5 base, up to +0.3 for related fragments, +0.2 if any of them carries a strong emotion.
pub fn theme_importance(fragment_ids: &[String], fragments: &[Fragment]) -> f64 {
    let mut score = 0.5 + f64::min(fragment_ids.len() as f64 * 0.05, 0.3);

    let strong = fragments
        .iter()
        .filter(|f| fragment_ids.contains(&f.id))
        .any(|f| f.emotion_tag.is_some_and(|e| e.is_strong()));
    if strong {
        score += 0.2;
    }

    f64::min(score, 1.0)
}

/// What one identification run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThemeOutcome {
    pub fragments_considered: usize,
    pub used_fallback: bool,
    pub created: Vec<CoreTheme>,
    pub updated: Vec<CoreTheme>,
}

impl ThemeOutcome {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty()
    }
}

impl ResearchMemory {
    /// Identify core themes from the latest fragments and merge them into the store.
    ///
    /// Skipped when fewer than three fragments exist.
    pub async fn identify_themes(&self, now: DateTime<Utc>) -> AppResult<ThemeOutcome> {
        let fragments = self.core.storage().list_recent_fragments(RECENT_WINDOW).await?;
        let mut outcome = ThemeOutcome {
            fragments_considered: fragments.len(),
            ..Default::default()
        };

        if fragments.len() < MIN_FRAGMENTS {
            info!(count = fragments.len(), "Too few fragments for theme identification");
            return Ok(outcome);
        }

        let request = self.core.pipeline().request(
            prompts::THEME_IDENTIFICATION_PROMPT,
            prompts::themes_user(&fragments),
        );

        let structured = match self.core.pipeline().attempt_chain(&request).await {
            Ok(generation) => parse_themes(&generation.text, &fragments),
            Err(e) => {
                warn!(error = %e, "Identifying themes from common concepts");
                None
            }
        };
        let candidates = structured.unwrap_or_else(|| {
            outcome.used_fallback = true;
            themes_from_concepts(&fragments)
        });

        let mut existing = self.core.storage().list_active_themes().await?;

        for candidate in candidates {
            let importance = theme_importance(&candidate.fragment_ids, &fragments);

            let similar = existing
                .iter()
                .position(|t| similarity(&candidate.name, &t.name) > MERGE_SIMILARITY);

            match similar {
                Some(idx) => {
                    let theme = &mut existing[idx];
                    theme.description = candidate.description;
                    theme.fragment_ids = candidate.fragment_ids;
                    theme.frequency += 1;
                    theme.importance_score = importance;
                    theme.last_updated = now;
                    self.core.storage().update_theme(theme).await?;
                    outcome.updated.push(theme.clone());
                }
                None => {
                    let mut theme = CoreTheme::new(candidate.name, candidate.description)
                        .with_fragments(candidate.fragment_ids)
                        .with_importance(importance);
                    theme.first_appeared = now;
                    theme.last_updated = now;
                    self.core.storage().create_theme(&theme).await?;
                    outcome.created.push(theme.clone());
                    existing.push(theme);
                }
            }
        }

        info!(
            created = outcome.created.len(),
            updated = outcome.updated.len(),
            fallback = outcome.used_fallback,
            "Theme identification finished"
        );
        Ok(outcome)
    }

    /// Active themes, most important first.
    pub async fn active_themes(&self) -> AppResult<Vec<CoreTheme>> {
        Ok(self.core.storage().list_active_themes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EmotionTag;

    fn fragments() -> Vec<Fragment> {
        vec![
            Fragment::new("支援制度は誰のためか").with_emotion(EmotionTag::Anger),
            Fragment::new("支援制度の申請が複雑"),
            Fragment::new("ケアの倫理について"),
        ]
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("支援制度", "支援制度"), 1.0);
        assert_eq!(similarity("", ""), 0.0);
        assert!((similarity("ケア", "ケアの倫理") - 0.4).abs() < 1e-9);
        assert!(similarity("支援制度の限界", "支援制度の壁") < 0.7);
    }

    #[test]
    fn test_parse_themes_maps_one_based_indexes() {
        let frags = fragments();
        let reply = r#"{"themes": [{"name": "制度と排除", "description": "説明", "related_fragment_ids": [1, 2, 2, 9, 0]}]}"#;
        let themes = parse_themes(reply, &frags).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].fragment_ids, vec![frags[0].id.clone(), frags[1].id.clone()]);
    }

    #[test]
    fn test_parse_themes_rejects_prose() {
        assert!(parse_themes("テーマは見つかりませんでした", &fragments()).is_none());
    }

    #[test]
    fn test_fallback_themes_from_concepts() {
        let frags = fragments();
        let themes = themes_from_concepts(&frags);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "支援制度");
        assert_eq!(themes[0].description, "「支援制度」に関する一連の思考（2回出現）");
        assert_eq!(themes[0].fragment_ids.len(), 2);
    }

    #[test]
    fn test_importance() {
        let frags = fragments();
        let ids = vec![frags[0].id.clone(), frags[1].id.clone()];
        assert!((theme_importance(&ids, &frags) - 0.8).abs() < 1e-9);

        let calm = vec![frags[1].id.clone()];
        assert!((theme_importance(&calm, &frags) - 0.55).abs() < 1e-9);

        let many: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert!((theme_importance(&many, &frags) - 0.8).abs() < 1e-9);
    }
}
