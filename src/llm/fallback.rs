//! Canned supportive replies used when no model is reachable.

use rand::seq::SliceRandom;

/// Keyword category of a canned reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedCategory {
    Tired,
    Sleep,
    Food,
    Research,
}

/// Categories in match order; the first category with a hit wins.
const KEYWORDS: [(CannedCategory, &[&str]); 4] = [
    (
        CannedCategory::Tired,
        &["疲れ", "つらい", "しんどい", "大変", "tired", "hard"],
    ),
    (CannedCategory::Sleep, &["眠", "寝", "睡眠", "sleep"]),
    (
        CannedCategory::Food,
        &["食", "ご飯", "ごはん", "お腹", "food", "eat"],
    ),
    (
        CannedCategory::Research,
        &["研究", "論文", "実験", "research", "paper"],
    ),
];

const TIRED_REPLY: &str =
    "今日は本当によく頑張りました。しんどいときは、休むことも大事な仕事です。今日はもう十分です。";
const SLEEP_REPLY: &str =
    "眠れていないと、何もかも重く感じますよね。目を閉じて横になるだけでも、体は少し休まります。";
const FOOD_REPLY: &str =
    "何か一口でも口にできたら、それで十分です。温かい飲み物を一杯だけでも大丈夫。";
const RESEARCH_REPLY: &str =
    "研究が進まない日があっても、考え続けていること自体に価値があります。今日はメモを一つ残せたら合格です。";

const DEFAULT_POOL: [&str; 4] = [
    "話してくれてありがとう。あなたがここにいること、それだけで十分です。",
    "今日はここまでで大丈夫。次は、水を一口飲むことだけを考えてみてください。",
    "無理に前へ進まなくていい日もあります。深呼吸を一回、それで今日はクリアです。",
    "あなたのペースで大丈夫です。小さな一歩も、ちゃんと一歩です。",
];

/// Deterministic terminal strategy of the message pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedReplies;

impl CannedReplies {
    pub fn new() -> Self {
        Self
    }

    /// Category whose keywords appear in the prompt, if any.
    pub fn category_for(&self, prompt: &str) -> Option<CannedCategory> {
        let lowered = prompt.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
            .map(|(category, _)| *category)
    }

    /// Reply for a known category.
    pub fn category_reply(category: CannedCategory) -> &'static str {
        match category {
            CannedCategory::Tired => TIRED_REPLY,
            CannedCategory::Sleep => SLEEP_REPLY,
            CannedCategory::Food => FOOD_REPLY,
            CannedCategory::Research => RESEARCH_REPLY,
        }
    }

    /// Generic replies used when no keyword matches.
    pub fn default_pool() -> &'static [&'static str] {
        &DEFAULT_POOL
    }

    /// Pick a reply for the prompt. Never empty.
    pub fn reply_for(&self, prompt: &str) -> String {
        match self.category_for(prompt) {
            Some(category) => Self::category_reply(category).to_string(),
            None => DEFAULT_POOL
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(DEFAULT_POOL[0])
                .to_string(),
        }
    }
}
