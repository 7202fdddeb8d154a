//! Command-line surface for the `arc` binary.
//!
//! Each subcommand maps onto one service operation; output is plain text
//! meant for a terminal.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};

use crate::app::AppState;
use crate::deadlines::{Draft, PUBLIC_SUPPORT_RESOURCES};
use crate::error::{AppError, AppResult, ValidationError};
use crate::life::{CheckIn, CrisisLevel, LifeLogInput};
use crate::research::{export_markdown, FragmentInput, ThemeFeedback, RECENT_WINDOW};
use crate::scheduler::{Scheduler, Trigger, TracingNotifier};
use crate::storage::{
    Contact, Deadline, DeadlineCategory, DocumentStatus, EmergencyContact, EmotionTag, Fragment,
    SnapshotType, ThresholdParam,
};

const RULE: &str = "────────────────────────────────────────";

/// ARC: wellbeing log, deadline tracker and research memory.
#[derive(Parser, Debug)]
#[command(name = "arc", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Record today's condition
    Log {
        /// Hours slept (0-24)
        #[arg(long)]
        sleep: Option<f64>,

        /// Meals eaten (0-10)
        #[arg(long)]
        meals: Option<i64>,

        /// Stress, 0 (fine) to 10 (at the limit)
        #[arg(long)]
        stress: Option<i64>,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },

    /// Record a free-text note about how you feel
    Note {
        /// What's on your mind
        text: String,
    },

    /// Today's summary
    Summary {
        /// Ask the model for a short encouraging comment
        #[arg(long)]
        llm: bool,
    },

    /// Last seven days
    Weekly,

    /// Talk to ARC
    Chat {
        /// Message
        message: String,
    },

    /// Show or change crisis thresholds
    Thresholds {
        #[command(subcommand)]
        action: Option<ThresholdCommands>,
    },

    /// Record a research fragment
    Fragment {
        /// The thought itself
        content: String,

        /// Emotion: anger, discomfort, surprise, joy, neutral (or 怒り, 違和感, ...)
        #[arg(long)]
        emotion: Option<String>,

        /// Where it came from
        #[arg(long)]
        context: Option<String>,
    },

    /// List recorded fragments
    Fragments {
        /// Keyword to search for
        #[arg(long)]
        search: Option<String>,

        /// Only fragments with this emotion
        #[arg(long)]
        emotion: Option<EmotionTag>,

        /// Maximum number of fragments to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Extract concepts from fragments
    Extract {
        /// A single fragment; otherwise every unanalyzed one
        #[arg(long)]
        id: Option<String>,

        /// Maximum number of unanalyzed fragments to process
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Show core themes
    Themes {
        /// Re-identify themes from recent fragments first
        #[arg(long)]
        refresh: bool,
    },

    /// Today's question
    Question,

    /// React to a theme
    Feedback {
        /// Theme id
        theme_id: String,

        /// still-important, not-anymore or want-to-write
        feedback: ThemeFeedback,
    },

    /// Review of the top themes
    Review,

    /// Generate or list theme drafts
    Snapshot {
        /// summary, paper-background or grant-proposal
        #[arg(long = "type", default_value = "summary")]
        snapshot_type: SnapshotType,

        /// Theme id (default: the top active theme)
        #[arg(long)]
        theme: Option<String>,

        /// Write the draft as Markdown to this path
        #[arg(long)]
        export: Option<PathBuf>,

        /// List stored drafts instead of generating one
        #[arg(long)]
        list: bool,
    },

    /// Manage deadlines
    Deadline {
        #[command(subcommand)]
        action: DeadlineCommands,
    },

    /// Draft documents
    Draft {
        #[command(subcommand)]
        action: DraftCommands,
    },

    /// Manage contacts
    Contact {
        #[command(subcommand)]
        action: ContactCommands,
    },

    /// Overview of today
    Status,

    /// Background triggers
    Scheduler {
        #[command(subcommand)]
        action: SchedulerCommands,
    },
}

/// Threshold subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ThresholdCommands {
    /// Show current values
    Show,

    /// Change one value
    Set {
        /// stress, meals or sleep
        param: ThresholdParam,

        /// New cutoff
        value: f64,
    },
}

/// Deadline subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DeadlineCommands {
    /// Add a deadline
    Add {
        /// Title
        title: String,

        /// Due date, YYYY-MM-DD or RFC 3339
        #[arg(long)]
        due: String,

        /// scholarship, grant, submission, report, meeting or other (unknown values count as other)
        #[arg(long, default_value = "other", value_parser = parse_category)]
        category: DeadlineCategory,

        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },

    /// Mark as in progress
    Start {
        /// Deadline id
        id: String,
    },

    /// Mark as completed
    Complete {
        /// Deadline id
        id: String,
    },

    /// Mark as cancelled
    Cancel {
        /// Deadline id
        id: String,
    },

    /// Delete permanently
    Delete {
        /// Deadline id
        id: String,
    },

    /// List open deadlines by priority
    List,

    /// The one thing to do today
    Focus,

    /// Counts by urgency
    Stats,

    /// Drafts attached to a deadline
    Docs {
        /// Deadline id
        id: String,
    },
}

/// Document drafting subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DraftCommands {
    /// Application draft from your core themes
    Application {
        /// Deadline id
        deadline_id: String,

        /// Sections the form asks for
        #[arg(long)]
        sections: Option<String>,
    },

    /// Short email
    Email {
        /// Who it is for
        #[arg(long, default_value = "")]
        to: String,

        /// What you need
        #[arg(long)]
        purpose: String,

        /// Background
        #[arg(long, default_value = "")]
        context: String,

        /// Attach to a deadline
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Move a draft through review
    Status {
        /// Document id
        document_id: String,

        /// draft, review or submitted
        status: DocumentStatus,
    },

    /// Replace a draft's text with the contents of a file
    Revise {
        /// Document id
        document_id: String,

        /// File holding the new text
        #[arg(long)]
        file: PathBuf,
    },
}

/// Contact subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ContactCommands {
    /// Add a contact
    Add {
        /// Name
        name: String,

        #[arg(long, default_value = "")]
        role: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        organization: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// List contacts
    List,

    /// Record that you were in touch today
    Touch {
        /// Contact id
        id: String,
    },

    /// Show emergency contacts
    Emergency,

    /// Add an emergency contact
    EmergencyAdd {
        /// Name
        name: String,

        /// Phone number
        phone: String,

        #[arg(long, default_value = "")]
        relationship: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Public support lines
    Resources,
}

/// Scheduler subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SchedulerCommands {
    /// Run every trigger until Ctrl-C
    Run,

    /// Run one trigger now
    Once {
        /// morning, evening, themes or inactivity
        trigger: Trigger,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

impl From<AppResult<String>> for CliResult {
    fn from(result: AppResult<String>) -> Self {
        match result {
            Ok(message) => CliResult::success(message),
            Err(AppError::Validation(e)) => CliResult::error(format!(
                "入力内容を確認してください:\n{}",
                e.messages()
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n")
            )),
            Err(e) => CliResult::error(format!("Error: {}", e)),
        }
    }
}

fn parse_category(raw: &str) -> Result<DeadlineCategory, String> {
    Ok(DeadlineCategory::parse_lenient(raw))
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands, state: Arc<AppState>) -> CliResult {
    let result = match command {
        Commands::Log {
            sleep,
            meals,
            stress,
            note,
        } => {
            let input = LifeLogInput {
                sleep_hours: sleep,
                meal_count: meals,
                stress_score: stress,
                free_text: note,
            };
            execute_log(&state, input).await
        }
        Commands::Note { text } => execute_note(&state, &text).await,
        Commands::Summary { llm } => execute_summary(&state, llm).await,
        Commands::Weekly => state.life.weekly_summary(today()).await,
        Commands::Chat { message } => Ok(state.life.chat(&message).await.text),
        Commands::Thresholds { action } => execute_thresholds(&state, action).await,
        Commands::Fragment {
            content,
            emotion,
            context,
        } => execute_fragment(&state, content, emotion, context).await,
        Commands::Fragments {
            search,
            emotion,
            limit,
        } => execute_fragments(&state, search, emotion, limit).await,
        Commands::Extract { id, limit } => execute_extract(&state, id, limit).await,
        Commands::Themes { refresh } => execute_themes(&state, refresh).await,
        Commands::Question => state
            .research
            .todays_question(Utc::now())
            .await
            .map(|q| q.message),
        Commands::Feedback { theme_id, feedback } => {
            state.research.record_feedback(&theme_id, feedback).await
        }
        Commands::Review => state.research.weekly_review().await.map(|r| r.summary),
        Commands::Snapshot {
            snapshot_type,
            theme,
            export,
            list,
        } => execute_snapshot(&state, snapshot_type, theme, export, list).await,
        Commands::Deadline { action } => execute_deadline(&state, action).await,
        Commands::Draft { action } => execute_draft(&state, action).await,
        Commands::Contact { action } => execute_contact(&state, action).await,
        Commands::Status => execute_status(&state).await,
        Commands::Scheduler { action } => execute_scheduler(state, action).await,
    };

    result.into()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse `YYYY-MM-DD` (local midnight) or a full RFC 3339 timestamp.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| {
            Local
                .from_local_datetime(&day.and_time(NaiveTime::MIN))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::field("due", "expected YYYY-MM-DD or RFC 3339"))
}

fn format_check_in(check_in: &CheckIn) -> String {
    let mut output = String::from("✅ 記録しました\n");

    if let Some(intervention) = &check_in.intervention {
        output.push_str(&format!(
            "\n{}\n[{}]\n{}\n",
            RULE,
            check_in.verdict.level.description(),
            intervention.message
        ));
        for reason in &check_in.verdict.reasons {
            output.push_str(&format!("  - {}\n", reason.message));
        }
        output.push_str(RULE);
        output.push('\n');
    }
    output
}

async fn execute_log(state: &AppState, input: LifeLogInput) -> AppResult<String> {
    let check_in = state.life.check_in(input, today()).await?;
    with_emergency_contacts(state, &check_in).await
}

async fn execute_note(state: &AppState, text: &str) -> AppResult<String> {
    let check_in = state.life.check_in_note(text, today()).await?;
    with_emergency_contacts(state, &check_in).await
}

async fn with_emergency_contacts(state: &AppState, check_in: &CheckIn) -> AppResult<String> {
    let mut output = format_check_in(check_in);
    if check_in.verdict.level == CrisisLevel::High {
        let contacts = state.deadlines.emergency_contacts().await?;
        output.push('\n');
        output.push_str(&contacts.message);
    }
    Ok(output)
}

async fn execute_summary(state: &AppState, llm: bool) -> AppResult<String> {
    if llm {
        state.life.daily_summary_with_llm(today()).await
    } else {
        state.life.daily_summary(today()).await
    }
}

async fn execute_thresholds(
    state: &AppState,
    action: Option<ThresholdCommands>,
) -> AppResult<String> {
    let thresholds = match action.unwrap_or(ThresholdCommands::Show) {
        ThresholdCommands::Show => state.life.thresholds().await?,
        ThresholdCommands::Set { param, value } => state.life.set_threshold(param, value).await?,
    };

    Ok(format!(
        "ストレス: {} 以上\n食事: {} 回以下\n睡眠: {} 時間以下",
        thresholds.stress_score, thresholds.meal_count, thresholds.sleep_hours
    ))
}

fn format_fragment(fragment: &Fragment) -> String {
    let emotion = fragment
        .emotion_tag
        .map(|e| format!(" [{}]", e.display_name()))
        .unwrap_or_default();
    format!(
        "{} {}{}\n  {}",
        fragment.created_at.with_timezone(&Local).format("%m/%d %H:%M"),
        fragment.id,
        emotion,
        fragment.content
    )
}

async fn execute_fragment(
    state: &AppState,
    content: String,
    emotion: Option<String>,
    context: Option<String>,
) -> AppResult<String> {
    let mut input = FragmentInput::new(content);
    if let Some(emotion) = emotion {
        input = input.with_emotion(emotion);
    }
    if let Some(context) = context {
        input = input.with_context(context);
    }

    let fragment = state.research.record_fragment(input).await?;
    Ok(format!("✅ 思考の断片を記録しました\n{}", format_fragment(&fragment)))
}

async fn execute_fragments(
    state: &AppState,
    search: Option<String>,
    emotion: Option<EmotionTag>,
    limit: u32,
) -> AppResult<String> {
    let mut fragments = match (search, emotion) {
        (Some(keyword), _) => state.research.search_fragments(&keyword).await?,
        (None, Some(emotion)) => state.research.fragments_by_emotion(emotion).await?,
        (None, None) => state.research.recent_fragments(limit).await?,
    };
    fragments.truncate(limit as usize);

    if fragments.is_empty() {
        return Ok("断片が見つかりませんでした。".to_string());
    }
    Ok(fragments
        .iter()
        .map(format_fragment)
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn execute_extract(state: &AppState, id: Option<String>, limit: u32) -> AppResult<String> {
    match id {
        Some(id) => {
            let extraction = state.research.extract_fragment(&id).await?;
            Ok(format!(
                "概念: {}\n問い: {}\nキーフレーズ: {}",
                extraction.concepts.join(", "),
                extraction.questions.join(" / "),
                extraction.key_phrases.join(", ")
            ))
        }
        None => {
            let processed = state.research.extract_pending(limit).await?;
            Ok(format!("{} 件の断片を分析しました。", processed))
        }
    }
}

async fn execute_themes(state: &AppState, refresh: bool) -> AppResult<String> {
    let mut output = String::new();

    if refresh {
        let outcome = state.research.identify_themes(Utc::now()).await?;
        output.push_str(&format!(
            "{} 件の断片から テーマ新規 {} 件 / 更新 {} 件{}\n\n",
            outcome.fragments_considered,
            outcome.created.len(),
            outcome.updated.len(),
            if outcome.used_fallback { "（頻度分析）" } else { "" }
        ));
    }

    let themes = state.research.active_themes().await?;
    if themes.is_empty() {
        output.push_str("まだテーマが特定されていません。");
        return Ok(output);
    }

    for theme in &themes {
        output.push_str(&format!(
            "{} {} ({:.2})\n  {}\n",
            theme.id, theme.name, theme.importance_score, theme.description
        ));
    }
    Ok(output)
}

async fn execute_snapshot(
    state: &AppState,
    snapshot_type: SnapshotType,
    theme: Option<String>,
    export: Option<PathBuf>,
    list: bool,
) -> AppResult<String> {
    if list {
        let snapshots = state
            .research
            .list_snapshots(theme.as_deref(), Some(snapshot_type))
            .await?;
        if snapshots.is_empty() {
            return Ok("ドラフトはまだありません。".to_string());
        }
        return Ok(snapshots
            .iter()
            .map(|s| {
                format!(
                    "{} {} {}",
                    s.created_at.with_timezone(&Local).format("%Y/%m/%d %H:%M"),
                    s.id,
                    s.snapshot_type.display_name()
                )
            })
            .collect::<Vec<_>>()
            .join("\n"));
    }

    let (theme, snapshot) = state
        .research
        .generate_snapshot(snapshot_type, theme.as_deref())
        .await?;

    let mut output = format!(
        "📝 {}（{}）\n{}\n{}\n{}",
        theme.name,
        snapshot.snapshot_type.display_name(),
        RULE,
        snapshot.generated_text,
        RULE
    );

    if let Some(path) = export {
        let markdown = export_markdown(&snapshot, &theme.name);
        tokio::fs::write(&path, markdown)
            .await
            .map_err(|e| AppError::Internal {
                message: format!("failed to write {}: {}", path.display(), e),
            })?;
        output.push_str(&format!("\n\n📄 {} に保存しました", path.display()));
    }
    Ok(output)
}

fn format_deadline(deadline: &Deadline) -> String {
    format!(
        "{} [{}] {} ({}) 締切 {} / 優先度 {:.0}",
        deadline.id,
        deadline.status,
        deadline.title,
        deadline.category.display_name(),
        deadline.due_date.with_timezone(&Local).format("%Y/%m/%d"),
        deadline.priority_score
    )
}

async fn execute_deadline(state: &AppState, action: DeadlineCommands) -> AppResult<String> {
    let service = &state.deadlines;
    let now = Utc::now();

    match action {
        DeadlineCommands::Add {
            title,
            due,
            category,
            description,
        } => {
            let mut deadline = Deadline::new(title, parse_due_date(&due)?).with_category(category);
            if let Some(description) = description {
                deadline = deadline.with_description(description);
            }
            let stored = service.add_deadline(deadline, now).await?;
            Ok(format!("✅ 締め切りを追加しました\n{}", format_deadline(&stored)))
        }
        DeadlineCommands::Start { id } => service
            .start_deadline(&id, now)
            .await
            .map(|d| format!("▶️ 着手しました\n{}", format_deadline(&d))),
        DeadlineCommands::Complete { id } => service
            .complete_deadline(&id, now)
            .await
            .map(|d| format!("🎉 完了しました！\n{}", format_deadline(&d))),
        DeadlineCommands::Cancel { id } => service
            .cancel_deadline(&id, now)
            .await
            .map(|d| format!("取り消しました\n{}", format_deadline(&d))),
        DeadlineCommands::Delete { id } => service
            .delete_deadline(&id)
            .await
            .map(|_| "削除しました".to_string()),
        DeadlineCommands::List => {
            service.recompute_priorities(now).await?;
            let deadlines = service.list_deadlines().await?;
            if deadlines.is_empty() {
                return Ok("締め切りは登録されていません。".to_string());
            }
            Ok(deadlines
                .iter()
                .map(format_deadline)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        DeadlineCommands::Focus => service.today_focus(now).await.map(|f| f.message),
        DeadlineCommands::Stats => service.deadline_stats(now).await.map(|s| {
            format!(
                "全体: {}件\n期限切れ: {}件\n今週: {}件\n進行中: {}件",
                s.total, s.overdue, s.this_week, s.in_progress
            )
        }),
        DeadlineCommands::Docs { id } => {
            let documents = service.deadline_documents(&id).await?;
            if documents.is_empty() {
                return Ok("書類はまだありません。".to_string());
            }
            Ok(documents
                .iter()
                .map(|d| format!("{} [{}] {}", d.id, d.status.as_str(), d.title))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

fn format_draft(draft: &Draft) -> String {
    let note = if draft.is_template() {
        "\n\n※ 生成できなかったためテンプレートを表示しています"
    } else {
        ""
    };
    format!(
        "📝 {} ({})\n{}\n{}\n{}{}",
        draft.document.title, draft.document.id, RULE, draft.document.content, RULE, note
    )
}

async fn execute_draft(state: &AppState, action: DraftCommands) -> AppResult<String> {
    let service = &state.deadlines;

    match action {
        DraftCommands::Application {
            deadline_id,
            sections,
        } => service
            .draft_application(&deadline_id, sections.as_deref())
            .await
            .map(|d| format_draft(&d)),
        DraftCommands::Email {
            to,
            purpose,
            context,
            deadline,
        } => service
            .draft_email(&to, &purpose, &context, deadline.as_deref())
            .await
            .map(|d| format_draft(&d)),
        DraftCommands::Status {
            document_id,
            status,
        } => service
            .set_document_status(&document_id, status, Utc::now())
            .await
            .map(|_| format!("ステータスを {} に変更しました", status.as_str())),
        DraftCommands::Revise { document_id, file } => {
            let content =
                tokio::fs::read_to_string(&file)
                    .await
                    .map_err(|e| AppError::Internal {
                        message: format!("failed to read {}: {}", file.display(), e),
                    })?;
            service.revise_document(&document_id, &content).await?;
            Ok("ドラフトを更新しました".to_string())
        }
    }
}

async fn execute_contact(state: &AppState, action: ContactCommands) -> AppResult<String> {
    let service = &state.deadlines;

    match action {
        ContactCommands::Add {
            name,
            role,
            email,
            phone,
            organization,
            notes,
        } => {
            let contact = Contact {
                role,
                email,
                phone,
                organization,
                notes,
                ..Contact::new(name)
            };
            let stored = service.add_contact(contact).await?;
            Ok(format!("✅ 連絡先を追加しました ({})", stored.id))
        }
        ContactCommands::List => {
            let contacts = service.list_contacts().await?;
            if contacts.is_empty() {
                return Ok("連絡先は登録されていません。".to_string());
            }
            Ok(contacts
                .iter()
                .map(|c| {
                    let last = c
                        .last_contact
                        .map(|d| d.format("%Y/%m/%d").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    format!("{} {} {} 最終連絡: {}", c.id, c.name, c.role, last)
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        ContactCommands::Touch { id } => service
            .record_interaction(&id, today())
            .await
            .map(|_| "連絡日を記録しました".to_string()),
        ContactCommands::Emergency => service.emergency_contacts().await.map(|c| c.message),
        ContactCommands::EmergencyAdd {
            name,
            phone,
            relationship,
            notes,
        } => {
            let contact = EmergencyContact {
                relationship,
                notes,
                ..EmergencyContact::new(name, phone)
            };
            let stored = service.add_emergency_contact(contact).await?;
            Ok(format!("✅ 緊急連絡先を追加しました ({})", stored.id))
        }
        ContactCommands::Resources => Ok(PUBLIC_SUPPORT_RESOURCES.to_string()),
    }
}

async fn execute_status(state: &AppState) -> AppResult<String> {
    let now = Utc::now();
    let mut output = String::new();

    output.push_str("\nARC Status\n");
    output.push_str(RULE);
    output.push_str("\n\n");

    output.push_str(&state.life.daily_summary(today()).await?);
    output.push_str("\n\n");

    output.push_str(&state.deadlines.today_focus(now).await?.message);
    output.push_str("\n\n");

    let themes = state.research.active_themes().await?;
    let fragments = state.research.recent_fragments(RECENT_WINDOW).await?;
    output.push_str(&format!(
        "🧠 テーマ: {}件 / 直近の断片: {}件\n",
        themes.len(),
        fragments.len()
    ));
    if let Some(message) = state.research.check_inactivity(now).await?.message {
        output.push_str(&message);
        output.push('\n');
    }

    output.push_str(&format!(
        "\n生成: {}\n",
        state.pipeline.strategy_names().join(" → ")
    ));
    Ok(output)
}

async fn execute_scheduler(state: Arc<AppState>, action: SchedulerCommands) -> AppResult<String> {
    let scheduler = Scheduler::new(state, Arc::new(TracingNotifier));

    match action {
        SchedulerCommands::Run => {
            scheduler.run().await?;
            Ok("スケジューラーを停止しました".to_string())
        }
        SchedulerCommands::Once { trigger } => {
            let report = scheduler.run_once(trigger).await?;
            Ok(match report.notification {
                Some(n) => format!("{}: {}\n{}", trigger, report.detail, n.body),
                None => format!("{}: {}", trigger, report.detail),
            })
        }
    }
}
