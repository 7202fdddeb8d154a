//! Storage layer for companion data.
//!
//! This module provides SQLite-based storage for life logs, interventions,
//! deadlines, documents, contacts, research fragments, core themes and
//! theme snapshots.

mod sqlite;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;

/// Canonical timestamp encoding used in every table.
///
/// Fixed-width UTC so that lexical ordering in SQL matches time ordering.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Life support
// ============================================================================

/// One wellbeing check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeLogEntry {
    /// Persisted identity; `None` until the entry has been stored.
    pub id: Option<String>,
    /// Calendar day the entry belongs to.
    pub log_date: NaiveDate,
    /// Hours slept.
    pub sleep_hours: Option<f64>,
    /// Meals eaten.
    pub meal_count: Option<u32>,
    /// Self-reported strain, 0 (fine) to 10 (at the limit).
    pub stress_score: Option<u8>,
    /// Free-form note.
    pub free_text: Option<String>,
    /// Set once a crisis was detected for this entry.
    pub crisis_flag: bool,
    /// Set once an intervention message was produced for this entry.
    pub intervention_given: bool,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LifeLogEntry {
    /// Create an empty, unsaved entry for the given day.
    pub fn new(log_date: NaiveDate) -> Self {
        Self {
            id: None,
            log_date,
            sleep_hours: None,
            meal_count: None,
            stress_score: None,
            free_text: None,
            crisis_flag: false,
            intervention_given: false,
            created_at: Utc::now(),
        }
    }

    /// Set hours slept.
    pub fn with_sleep_hours(mut self, hours: f64) -> Self {
        self.sleep_hours = Some(hours);
        self
    }

    /// Set meal count.
    pub fn with_meal_count(mut self, meals: u32) -> Self {
        self.meal_count = Some(meals);
        self
    }

    /// Set stress score.
    pub fn with_stress_score(mut self, score: u8) -> Self {
        self.stress_score = Some(score);
        self
    }

    /// Set the free-text note.
    pub fn with_free_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }
}

/// Per-user crisis cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Stress at or above this fires the stress rule.
    pub stress_score: f64,
    /// Meals at or below this fire the meal rule.
    pub meal_count: f64,
    /// Sleep at or below this fires the sleep rule.
    pub sleep_hours: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stress_score: 8.0,
            meal_count: 0.0,
            sleep_hours: 3.0,
        }
    }
}

/// Adjustable threshold parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdParam {
    /// Stress score cutoff.
    StressScore,
    /// Meal count cutoff.
    MealCount,
    /// Sleep hours cutoff.
    SleepHours,
}

impl ThresholdParam {
    /// Column value used in `user_thresholds.param_name`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdParam::StressScore => "stress_score",
            ThresholdParam::MealCount => "meal_count",
            ThresholdParam::SleepHours => "sleep_hours",
        }
    }
}

impl std::fmt::Display for ThresholdParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ThresholdParam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "stress_score" | "stress" => Ok(ThresholdParam::StressScore),
            "meal_count" | "meal" | "meals" => Ok(ThresholdParam::MealCount),
            "sleep_hours" | "sleep" => Ok(ThresholdParam::SleepHours),
            _ => Err(format!("Unknown threshold parameter: {}", s)),
        }
    }
}

/// A generated intervention shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intervention {
    /// Unique identifier.
    pub id: String,
    /// Life log that triggered it.
    pub log_id: Option<String>,
    /// Crisis level at the time (0-3).
    pub crisis_level: u8,
    /// Message text.
    pub message: String,
    /// What happened with the message (e.g. "shown").
    pub action_taken: String,
    /// Which strategy produced the text.
    pub source: String,
    /// When it was created.
    pub created_at: DateTime<Utc>,
}

impl Intervention {
    /// Create a new intervention record.
    pub fn new(
        log_id: Option<String>,
        crisis_level: u8,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            log_id,
            crisis_level,
            message: message.into(),
            action_taken: "shown".to_string(),
            source: source.into(),
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Deadlines, documents, contacts
// ============================================================================

/// Deadline category. Determines the category weight in priority scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineCategory {
    /// Scholarship applications.
    Scholarship,
    /// Research grants.
    Grant,
    /// Paper or assignment submissions.
    Submission,
    /// Reports.
    Report,
    /// Meetings.
    Meeting,
    /// Everything else.
    #[default]
    Other,
}

impl DeadlineCategory {
    /// Every category, in weight order.
    pub const ALL: [DeadlineCategory; 6] = [
        DeadlineCategory::Scholarship,
        DeadlineCategory::Grant,
        DeadlineCategory::Submission,
        DeadlineCategory::Report,
        DeadlineCategory::Meeting,
        DeadlineCategory::Other,
    ];

    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlineCategory::Scholarship => "scholarship",
            DeadlineCategory::Grant => "grant",
            DeadlineCategory::Submission => "submission",
            DeadlineCategory::Report => "report",
            DeadlineCategory::Meeting => "meeting",
            DeadlineCategory::Other => "other",
        }
    }

    /// Japanese display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            DeadlineCategory::Scholarship => "奨学金",
            DeadlineCategory::Grant => "助成金",
            DeadlineCategory::Submission => "提出物",
            DeadlineCategory::Report => "報告書",
            DeadlineCategory::Meeting => "打ち合わせ",
            DeadlineCategory::Other => "その他",
        }
    }

    /// Lenient parse for stored rows and CLI input: unknown values become `Other`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for DeadlineCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeadlineCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scholarship" => Ok(DeadlineCategory::Scholarship),
            "grant" => Ok(DeadlineCategory::Grant),
            "submission" => Ok(DeadlineCategory::Submission),
            "report" => Ok(DeadlineCategory::Report),
            "meeting" => Ok(DeadlineCategory::Meeting),
            "other" => Ok(DeadlineCategory::Other),
            _ => Err(format!("Unknown deadline category: {}", s)),
        }
    }
}

/// Lifecycle state of a deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Work has started.
    InProgress,
    /// Done.
    Completed,
    /// Dropped.
    Cancelled,
}

impl DeadlineStatus {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlineStatus::Pending => "pending",
            DeadlineStatus::InProgress => "in_progress",
            DeadlineStatus::Completed => "completed",
            DeadlineStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and in-progress deadlines still compete for attention.
    pub fn is_open(&self) -> bool {
        matches!(self, DeadlineStatus::Pending | DeadlineStatus::InProgress)
    }
}

impl std::fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeadlineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DeadlineStatus::Pending),
            "in_progress" => Ok(DeadlineStatus::InProgress),
            "completed" => Ok(DeadlineStatus::Completed),
            "cancelled" => Ok(DeadlineStatus::Cancelled),
            _ => Err(format!("Unknown deadline status: {}", s)),
        }
    }
}

/// An external deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    /// Unique identifier.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Optional longer description.
    pub description: String,
    /// When it is due.
    pub due_date: DateTime<Utc>,
    /// Category.
    pub category: DeadlineCategory,
    /// Derived ranking score; see [`crate::deadlines::priority`].
    pub priority_score: f64,
    /// Lifecycle state.
    pub status: DeadlineStatus,
    /// When it was added.
    pub created_at: DateTime<Utc>,
    /// When it was completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Deadline {
    /// Create a new pending deadline with a zero score.
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: String::new(),
            due_date,
            category: DeadlineCategory::Other,
            priority_score: 0.0,
            status: DeadlineStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Set category.
    pub fn with_category(mut self, category: DeadlineCategory) -> Self {
        self.category = category;
        self
    }

    /// Set status.
    pub fn with_status(mut self, status: DeadlineStatus) -> Self {
        self.status = status;
        self
    }

    /// Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Kind of drafted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Application form draft.
    Application,
    /// Email skeleton.
    Email,
    /// Report.
    Report,
    /// Proposal.
    Proposal,
    /// Anything else.
    Other,
}

impl DocumentType {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Application => "application",
            DocumentType::Email => "email",
            DocumentType::Report => "report",
            DocumentType::Proposal => "proposal",
            DocumentType::Other => "other",
        }
    }

    /// Japanese display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentType::Application => "申請書",
            DocumentType::Email => "メール",
            DocumentType::Report => "報告書",
            DocumentType::Proposal => "計画書",
            DocumentType::Other => "その他",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "application" => Ok(DocumentType::Application),
            "email" => Ok(DocumentType::Email),
            "report" => Ok(DocumentType::Report),
            "proposal" => Ok(DocumentType::Proposal),
            "other" => Ok(DocumentType::Other),
            _ => Err(format!("Unknown document type: {}", s)),
        }
    }
}

/// Review state of a drafted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Fresh draft.
    #[default]
    Draft,
    /// Being reviewed.
    Review,
    /// Sent off.
    Submitted,
}

impl DocumentStatus {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Review => "review",
            DocumentStatus::Submitted => "submitted",
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(DocumentStatus::Draft),
            "review" => Ok(DocumentStatus::Review),
            "submitted" => Ok(DocumentStatus::Submitted),
            _ => Err(format!("Unknown document status: {}", s)),
        }
    }
}

/// A drafted application or email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: String,
    /// Deadline this draft belongs to, if any.
    pub deadline_id: Option<String>,
    /// Title.
    pub title: String,
    /// Kind of document.
    pub doc_type: DocumentType,
    /// Body text.
    pub content: String,
    /// Review state.
    pub status: DocumentStatus,
    /// When it was drafted.
    pub created_at: DateTime<Utc>,
    /// When it was submitted.
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a new draft.
    pub fn new(
        deadline_id: Option<String>,
        title: impl Into<String>,
        doc_type: DocumentType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            deadline_id,
            title: title.into(),
            doc_type,
            content: content.into(),
            status: DocumentStatus::Draft,
            created_at: Utc::now(),
            submitted_at: None,
        }
    }
}

/// Someone the user deals with (supervisor, office, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier.
    pub id: String,
    /// Name.
    pub name: String,
    /// Role, e.g. "指導教員".
    pub role: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Organisation.
    pub organization: String,
    /// Notes.
    pub notes: String,
    /// Day of last interaction.
    pub last_contact: Option<NaiveDate>,
    /// When it was added.
    pub created_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// Create a contact with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            created_at: Some(Utc::now()),
            ..Default::default()
        }
    }
}

/// Person to reach out to when things get dangerous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Unique identifier.
    pub id: String,
    /// Name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Relationship to the user.
    pub relationship: String,
    /// Notes.
    pub notes: String,
    /// Inactive contacts are kept but not shown.
    pub is_active: bool,
    /// When it was added.
    pub created_at: DateTime<Utc>,
}

impl EmergencyContact {
    /// Create an active emergency contact.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            phone: phone.into(),
            relationship: String::new(),
            notes: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Research memory
// ============================================================================

/// Emotion attached to a research fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionTag {
    /// 怒り
    Anger,
    /// 違和感
    Discomfort,
    /// 驚き
    Surprise,
    /// 喜び
    Joy,
    /// 中立
    Neutral,
}

impl EmotionTag {
    /// All tags with their Japanese names, the single lookup table for both directions.
    const NAMES: [(EmotionTag, &'static str, &'static str); 5] = [
        (EmotionTag::Anger, "anger", "怒り"),
        (EmotionTag::Discomfort, "discomfort", "違和感"),
        (EmotionTag::Surprise, "surprise", "驚き"),
        (EmotionTag::Joy, "joy", "喜び"),
        (EmotionTag::Neutral, "neutral", "中立"),
    ];

    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(tag, _, _)| tag == self)
            .map(|(_, key, _)| *key)
            .unwrap_or("neutral")
    }

    /// Japanese display name.
    pub fn display_name(&self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(tag, _, _)| tag == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("未分類")
    }

    /// Anger and discomfort are where research questions tend to come from.
    pub fn is_strong(&self) -> bool {
        matches!(self, EmotionTag::Anger | EmotionTag::Discomfort)
    }
}

impl std::fmt::Display for EmotionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EmotionTag {
    type Err = String;

    /// Accepts either the stored key or the Japanese name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::NAMES
            .iter()
            .find(|(_, key, name)| *key == needle || *name == needle)
            .map(|(tag, _, _)| *tag)
            .ok_or_else(|| format!("Unknown emotion tag: {}", s))
    }
}

/// A fragment of research thinking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Unique identifier.
    pub id: String,
    /// The note itself.
    pub content: String,
    /// Emotion felt while writing it.
    pub emotion_tag: Option<EmotionTag>,
    /// Where the thought came from.
    pub context: Option<String>,
    /// How it was captured (`manual`, `chat`, ...).
    pub source_type: String,
    /// Initial importance (0.0-1.0).
    pub importance_score: f64,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

impl Fragment {
    /// Create a manual fragment with the base importance.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            content: content.into(),
            emotion_tag: None,
            context: None,
            source_type: "manual".to_string(),
            importance_score: 0.5,
            created_at: Utc::now(),
        }
    }

    /// Set emotion tag.
    pub fn with_emotion(mut self, emotion: EmotionTag) -> Self {
        self.emotion_tag = Some(emotion);
        self
    }

    /// Set context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Kind of tag attached to a fragment by concept extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    /// Extracted concept.
    Concept,
    /// Extracted question.
    Question,
    /// Extracted key phrase.
    KeyPhrase,
    /// Marker that extraction has run.
    Analyzed,
}

impl TagKind {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Concept => "concept",
            TagKind::Question => "question",
            TagKind::KeyPhrase => "key_phrase",
            TagKind::Analyzed => "analyzed",
        }
    }
}

impl std::str::FromStr for TagKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concept" => Ok(TagKind::Concept),
            "question" => Ok(TagKind::Question),
            "key_phrase" => Ok(TagKind::KeyPhrase),
            "analyzed" => Ok(TagKind::Analyzed),
            _ => Err(format!("Unknown tag kind: {}", s)),
        }
    }
}

/// Tag attached to a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentTag {
    /// Unique identifier.
    pub id: String,
    /// Tagged fragment.
    pub fragment_id: String,
    /// Tag kind.
    pub kind: TagKind,
    /// Tag value.
    pub value: String,
}

impl FragmentTag {
    /// Create a new tag.
    pub fn new(fragment_id: impl Into<String>, kind: TagKind, value: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            fragment_id: fragment_id.into(),
            kind,
            value: value.into(),
        }
    }
}

/// A recurring research question inferred from fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreTheme {
    /// Unique identifier.
    pub id: String,
    /// Short name.
    pub name: String,
    /// One-paragraph description.
    pub description: String,
    /// Fragments the theme was inferred from.
    pub fragment_ids: Vec<String>,
    /// How many identification runs have confirmed it.
    pub frequency: u32,
    /// Importance (0.0-1.0).
    pub importance_score: f64,
    /// First identification.
    pub first_appeared: DateTime<Utc>,
    /// Last update.
    pub last_updated: DateTime<Utc>,
    /// Last time it was shown as the question of the day.
    pub last_shown: Option<DateTime<Utc>>,
    /// Archived themes are inactive.
    pub is_active: bool,
}

impl CoreTheme {
    /// Create a new active theme.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            description: description.into(),
            fragment_ids: Vec::new(),
            frequency: 1,
            importance_score: 0.5,
            first_appeared: now,
            last_updated: now,
            last_shown: None,
            is_active: true,
        }
    }

    /// Set fragment references.
    pub fn with_fragments(mut self, fragment_ids: Vec<String>) -> Self {
        self.fragment_ids = fragment_ids;
        self
    }

    /// Set importance.
    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance_score = importance;
        self
    }
}

/// Kind of generated theme snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotType {
    /// Plain summary of the theme.
    Summary,
    /// Background-and-purpose section of a paper.
    PaperBackground,
    /// Research plan for a grant application.
    GrantProposal,
}

impl SnapshotType {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotType::Summary => "summary",
            SnapshotType::PaperBackground => "paper_background",
            SnapshotType::GrantProposal => "grant_proposal",
        }
    }

    /// Japanese display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SnapshotType::Summary => "要約",
            SnapshotType::PaperBackground => "論文背景",
            SnapshotType::GrantProposal => "研究計画書",
        }
    }
}

impl std::str::FromStr for SnapshotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "summary" => Ok(SnapshotType::Summary),
            "paper_background" | "paper" => Ok(SnapshotType::PaperBackground),
            "grant_proposal" | "grant" => Ok(SnapshotType::GrantProposal),
            _ => Err(format!("Unknown snapshot type: {}", s)),
        }
    }
}

/// Generated draft text for a theme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unique identifier.
    pub id: String,
    /// Theme it was generated for.
    pub theme_id: String,
    /// Kind of draft.
    pub snapshot_type: SnapshotType,
    /// Generated text.
    pub generated_text: String,
    /// Fragments used as input.
    pub fragment_refs: Vec<String>,
    /// When it was generated.
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create a new snapshot.
    pub fn new(
        theme_id: impl Into<String>,
        snapshot_type: SnapshotType,
        generated_text: impl Into<String>,
        fragment_refs: Vec<String>,
    ) -> Self {
        Self {
            id: new_id(),
            theme_id: theme_id.into(),
            snapshot_type,
            generated_text: generated_text.into(),
            fragment_refs,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Storage trait
// ============================================================================

/// Storage trait for database operations.
///
/// Every write is a single statement; callers never need a transaction.
#[async_trait]
pub trait Storage: Send + Sync {
    // Life logs

    /// Insert an entry and return it with its assigned id.
    async fn create_life_log(&self, entry: &LifeLogEntry) -> StorageResult<LifeLogEntry>;
    /// Fetch an entry by id.
    async fn get_life_log(&self, id: &str) -> StorageResult<Option<LifeLogEntry>>;
    /// Most recent entry for a day.
    async fn get_latest_life_log(&self, date: NaiveDate) -> StorageResult<Option<LifeLogEntry>>;
    /// All entries on or after `since`, newest first.
    async fn get_life_logs_since(&self, since: NaiveDate) -> StorageResult<Vec<LifeLogEntry>>;
    /// Set the crisis flag.
    async fn set_crisis_flag(&self, id: &str, flag: bool) -> StorageResult<()>;
    /// Mark that an intervention was produced.
    async fn set_intervention_given(&self, id: &str) -> StorageResult<()>;

    // Thresholds and interventions

    /// Current thresholds (defaults for any parameter not stored).
    async fn get_thresholds(&self) -> StorageResult<Thresholds>;
    /// Override one threshold.
    async fn set_threshold(&self, param: ThresholdParam, value: f64) -> StorageResult<()>;
    /// Record an intervention.
    async fn create_intervention(&self, intervention: &Intervention) -> StorageResult<()>;
    /// Interventions produced for one log.
    async fn get_log_interventions(&self, log_id: &str) -> StorageResult<Vec<Intervention>>;

    // Deadlines

    /// Insert a deadline.
    async fn create_deadline(&self, deadline: &Deadline) -> StorageResult<()>;
    /// Fetch a deadline by id.
    async fn get_deadline(&self, id: &str) -> StorageResult<Option<Deadline>>;
    /// Pending and in-progress deadlines by score, due date, then insertion order.
    async fn get_open_deadlines(&self) -> StorageResult<Vec<Deadline>>;
    /// Persist a recomputed score.
    async fn update_deadline_priority(&self, id: &str, score: f64) -> StorageResult<()>;
    /// Change status; `completed` also stamps `completed_at`.
    async fn update_deadline_status(
        &self,
        id: &str,
        status: DeadlineStatus,
        at: DateTime<Utc>,
    ) -> StorageResult<()>;
    /// Remove a deadline.
    async fn delete_deadline(&self, id: &str) -> StorageResult<()>;

    // Documents

    /// Insert a document.
    async fn create_document(&self, document: &Document) -> StorageResult<()>;
    /// Documents drafted for a deadline, newest first.
    async fn get_deadline_documents(&self, deadline_id: &str) -> StorageResult<Vec<Document>>;
    /// Change review state; `submitted` also stamps `submitted_at`.
    async fn update_document_status(
        &self,
        id: &str,
        status: DocumentStatus,
        at: DateTime<Utc>,
    ) -> StorageResult<()>;
    /// Replace the body text.
    async fn update_document_content(&self, id: &str, content: &str) -> StorageResult<()>;

    // Contacts

    /// Insert a contact.
    async fn create_contact(&self, contact: &Contact) -> StorageResult<()>;
    /// All contacts by name.
    async fn list_contacts(&self) -> StorageResult<Vec<Contact>>;
    /// Stamp the last interaction day.
    async fn touch_contact(&self, id: &str, day: NaiveDate) -> StorageResult<()>;
    /// Insert an emergency contact.
    async fn create_emergency_contact(&self, contact: &EmergencyContact) -> StorageResult<()>;
    /// Active emergency contacts, oldest first.
    async fn list_active_emergency_contacts(&self) -> StorageResult<Vec<EmergencyContact>>;

    // Fragments

    /// Insert a fragment.
    async fn create_fragment(&self, fragment: &Fragment) -> StorageResult<()>;
    /// Fetch a fragment by id.
    async fn get_fragment(&self, id: &str) -> StorageResult<Option<Fragment>>;
    /// Newest fragments first.
    async fn list_recent_fragments(&self, limit: u32) -> StorageResult<Vec<Fragment>>;
    /// Substring search, most important first.
    async fn search_fragments(&self, keyword: &str) -> StorageResult<Vec<Fragment>>;
    /// Fragments carrying an emotion, newest first.
    async fn list_fragments_by_emotion(&self, emotion: EmotionTag) -> StorageResult<Vec<Fragment>>;
    /// Fragments without an `analyzed` tag, newest first.
    async fn list_unanalyzed_fragments(&self, limit: u32) -> StorageResult<Vec<Fragment>>;
    /// Attach a tag.
    async fn add_fragment_tag(&self, tag: &FragmentTag) -> StorageResult<()>;
    /// Tags for a fragment.
    async fn get_fragment_tags(&self, fragment_id: &str) -> StorageResult<Vec<FragmentTag>>;

    // Themes and snapshots

    /// Insert a theme.
    async fn create_theme(&self, theme: &CoreTheme) -> StorageResult<()>;
    /// Overwrite a theme's mutable fields.
    async fn update_theme(&self, theme: &CoreTheme) -> StorageResult<()>;
    /// Fetch a theme by id.
    async fn get_theme(&self, id: &str) -> StorageResult<Option<CoreTheme>>;
    /// Active themes by importance, then recency.
    async fn list_active_themes(&self) -> StorageResult<Vec<CoreTheme>>;
    /// Stamp `last_shown`.
    async fn mark_theme_shown(&self, id: &str, at: DateTime<Utc>) -> StorageResult<()>;
    /// Archive a theme.
    async fn deactivate_theme(&self, id: &str) -> StorageResult<()>;
    /// Insert a snapshot.
    async fn create_snapshot(&self, snapshot: &Snapshot) -> StorageResult<()>;
    /// Snapshots filtered by theme and/or type, newest first.
    async fn list_snapshots(
        &self,
        theme_id: Option<&str>,
        snapshot_type: Option<SnapshotType>,
    ) -> StorageResult<Vec<Snapshot>>;
}
