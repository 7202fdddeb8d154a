//! Research memory: fragments, concept extraction, core themes, daily
//! re-presentation and theme snapshots.

mod extraction;
mod fragments;
mod representation;
mod snapshots;
mod themes;

pub use extraction::{
    extract_frequency, find_common_concepts, parse_heuristic, parse_structured, CommonConcept,
    Extraction,
};
pub use fragments::{initial_importance, validate_fragment, FragmentInput, Inactivity};
pub use representation::{
    question_message, rank_for_today, ThemeFeedback, TodaysQuestion, WeeklyReview,
};
pub use snapshots::export_markdown;
pub use themes::{similarity, theme_importance, CandidateTheme, ThemeOutcome};

use crate::core::ServiceCore;

/// Number of recent fragments considered by theme identification and reviews.
pub const RECENT_WINDOW: u32 = 50;

/// Research memory service.
#[derive(Clone)]
pub struct ResearchMemory {
    core: ServiceCore,
}

impl ResearchMemory {
    /// Create a new research memory service.
    pub fn new(core: ServiceCore) -> Self {
        Self { core }
    }
}
