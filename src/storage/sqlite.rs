use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{
    decode_timestamp, encode_timestamp, Contact, CoreTheme, Deadline, DeadlineCategory,
    DeadlineStatus, Document, DocumentStatus, DocumentType, EmergencyContact, EmotionTag,
    Fragment, FragmentTag, Intervention, LifeLogEntry, Snapshot, SnapshotType, Storage, TagKind,
    ThresholdParam, Thresholds,
};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                    message: format!("Failed to create database directory: {}", e),
                })?;
            }
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create a private in-memory database, used by tests and dry runs.
    ///
    /// The pool holds exactly one connection that never expires, since each
    /// SQLite memory connection is its own database.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn require_row(affected: u64, table: &'static str, id: &str) -> StorageResult<()> {
    if affected == 0 {
        return Err(StorageError::RecordNotFound {
            table,
            id: id.to_string(),
        });
    }
    Ok(())
}

fn encode_ids(ids: &[String]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

fn decode_ids(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[async_trait]
impl Storage for SqliteStorage {
    // ------------------------------------------------------------------
    // Life logs
    // ------------------------------------------------------------------

    async fn create_life_log(&self, entry: &LifeLogEntry) -> StorageResult<LifeLogEntry> {
        let mut stored = entry.clone();
        let id = stored
            .id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();

        sqlx::query(
            r#"
            INSERT INTO life_logs (id, log_date, sleep_hours, meal_count, stress_score, free_text,
                                   crisis_flag, intervention_given, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(stored.log_date.format(DATE_FORMAT).to_string())
        .bind(stored.sleep_hours)
        .bind(stored.meal_count.map(i64::from))
        .bind(stored.stress_score.map(i64::from))
        .bind(&stored.free_text)
        .bind(stored.crisis_flag)
        .bind(stored.intervention_given)
        .bind(encode_timestamp(&stored.created_at))
        .execute(&self.pool)
        .await?;

        debug!(log_id = %id, "Life log stored");
        Ok(stored)
    }

    async fn get_life_log(&self, id: &str) -> StorageResult<Option<LifeLogEntry>> {
        let row: Option<LifeLogRow> = sqlx::query_as(
            r#"
            SELECT id, log_date, sleep_hours, meal_count, stress_score, free_text,
                   crisis_flag, intervention_given, created_at
            FROM life_logs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_latest_life_log(&self, date: NaiveDate) -> StorageResult<Option<LifeLogEntry>> {
        let row: Option<LifeLogRow> = sqlx::query_as(
            r#"
            SELECT id, log_date, sleep_hours, meal_count, stress_score, free_text,
                   crisis_flag, intervention_given, created_at
            FROM life_logs
            WHERE log_date = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_life_logs_since(&self, since: NaiveDate) -> StorageResult<Vec<LifeLogEntry>> {
        let rows: Vec<LifeLogRow> = sqlx::query_as(
            r#"
            SELECT id, log_date, sleep_hours, meal_count, stress_score, free_text,
                   crisis_flag, intervention_given, created_at
            FROM life_logs
            WHERE log_date >= ?
            ORDER BY log_date DESC, created_at DESC, rowid DESC
            "#,
        )
        .bind(since.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn set_crisis_flag(&self, id: &str, flag: bool) -> StorageResult<()> {
        let result = sqlx::query("UPDATE life_logs SET crisis_flag = ? WHERE id = ?")
            .bind(flag)
            .bind(id)
            .execute(&self.pool)
            .await?;

        require_row(result.rows_affected(), "life_logs", id)
    }

    async fn set_intervention_given(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE life_logs SET intervention_given = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        require_row(result.rows_affected(), "life_logs", id)
    }

    // ------------------------------------------------------------------
    // Thresholds and interventions
    // ------------------------------------------------------------------

    async fn get_thresholds(&self) -> StorageResult<Thresholds> {
        let rows: Vec<(String, f64)> =
            sqlx::query_as("SELECT param_name, threshold_value FROM user_thresholds")
                .fetch_all(&self.pool)
                .await?;

        let mut thresholds = Thresholds::default();
        for (name, value) in rows {
            match name.parse::<ThresholdParam>() {
                Ok(ThresholdParam::StressScore) => thresholds.stress_score = value,
                Ok(ThresholdParam::MealCount) => thresholds.meal_count = value,
                Ok(ThresholdParam::SleepHours) => thresholds.sleep_hours = value,
                Err(_) => debug!(param = %name, "Ignoring unknown threshold row"),
            }
        }

        Ok(thresholds)
    }

    async fn set_threshold(&self, param: ThresholdParam, value: f64) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_thresholds (param_name, threshold_value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(param_name) DO UPDATE SET
                threshold_value = excluded.threshold_value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(param.as_str())
        .bind(value)
        .bind(encode_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_intervention(&self, intervention: &Intervention) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO interventions (id, log_id, crisis_level, message, action_taken, source, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&intervention.id)
        .bind(&intervention.log_id)
        .bind(i64::from(intervention.crisis_level))
        .bind(&intervention.message)
        .bind(&intervention.action_taken)
        .bind(&intervention.source)
        .bind(encode_timestamp(&intervention.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_log_interventions(&self, log_id: &str) -> StorageResult<Vec<Intervention>> {
        let rows: Vec<InterventionRow> = sqlx::query_as(
            r#"
            SELECT id, log_id, crisis_level, message, action_taken, source, created_at
            FROM interventions
            WHERE log_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(log_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    // ------------------------------------------------------------------
    // Deadlines
    // ------------------------------------------------------------------

    async fn create_deadline(&self, deadline: &Deadline) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO deadlines (id, title, description, due_date, category, priority_score,
                                   status, created_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&deadline.id)
        .bind(&deadline.title)
        .bind(&deadline.description)
        .bind(encode_timestamp(&deadline.due_date))
        .bind(deadline.category.as_str())
        .bind(deadline.priority_score)
        .bind(deadline.status.as_str())
        .bind(encode_timestamp(&deadline.created_at))
        .bind(deadline.completed_at.as_ref().map(encode_timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_deadline(&self, id: &str) -> StorageResult<Option<Deadline>> {
        let row: Option<DeadlineRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, due_date, category, priority_score, status,
                   created_at, completed_at
            FROM deadlines
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_open_deadlines(&self) -> StorageResult<Vec<Deadline>> {
        let rows: Vec<DeadlineRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, due_date, category, priority_score, status,
                   created_at, completed_at
            FROM deadlines
            WHERE status IN ('pending', 'in_progress')
            ORDER BY priority_score DESC, due_date ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_deadline_priority(&self, id: &str, score: f64) -> StorageResult<()> {
        let result = sqlx::query("UPDATE deadlines SET priority_score = ? WHERE id = ?")
            .bind(score)
            .bind(id)
            .execute(&self.pool)
            .await?;

        require_row(result.rows_affected(), "deadlines", id)
    }

    async fn update_deadline_status(
        &self,
        id: &str,
        status: DeadlineStatus,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let completed_at = (status == DeadlineStatus::Completed).then(|| encode_timestamp(&at));

        let result = sqlx::query(
            r#"
            UPDATE deadlines
            SET status = ?, completed_at = COALESCE(?, completed_at)
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(completed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        require_row(result.rows_affected(), "deadlines", id)
    }

    async fn delete_deadline(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM deadlines WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        require_row(result.rows_affected(), "deadlines", id)
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    async fn create_document(&self, document: &Document) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, deadline_id, title, doc_type, content, status, created_at, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.id)
        .bind(&document.deadline_id)
        .bind(&document.title)
        .bind(document.doc_type.as_str())
        .bind(&document.content)
        .bind(document.status.as_str())
        .bind(encode_timestamp(&document.created_at))
        .bind(document.submitted_at.as_ref().map(encode_timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_deadline_documents(&self, deadline_id: &str) -> StorageResult<Vec<Document>> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, deadline_id, title, doc_type, content, status, created_at, submitted_at
            FROM documents
            WHERE deadline_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(deadline_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_document_status(
        &self,
        id: &str,
        status: DocumentStatus,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let submitted_at = (status == DocumentStatus::Submitted).then(|| encode_timestamp(&at));

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = ?, submitted_at = COALESCE(?, submitted_at)
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(submitted_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        require_row(result.rows_affected(), "documents", id)
    }

    async fn update_document_content(&self, id: &str, content: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE documents SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;

        require_row(result.rows_affected(), "documents", id)
    }

    // ------------------------------------------------------------------
    // Contacts
    // ------------------------------------------------------------------

    async fn create_contact(&self, contact: &Contact) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contacts (id, name, role, email, phone, organization, notes, last_contact, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contact.id)
        .bind(&contact.name)
        .bind(&contact.role)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.organization)
        .bind(&contact.notes)
        .bind(contact.last_contact.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(contact.created_at.as_ref().map(encode_timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_contacts(&self) -> StorageResult<Vec<Contact>> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, name, role, email, phone, organization, notes, last_contact, created_at
            FROM contacts
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn touch_contact(&self, id: &str, day: NaiveDate) -> StorageResult<()> {
        let result = sqlx::query("UPDATE contacts SET last_contact = ? WHERE id = ?")
            .bind(day.format(DATE_FORMAT).to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;

        require_row(result.rows_affected(), "contacts", id)
    }

    async fn create_emergency_contact(&self, contact: &EmergencyContact) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO emergency_contacts (id, name, phone, relationship, notes, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contact.id)
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.relationship)
        .bind(&contact.notes)
        .bind(contact.is_active)
        .bind(encode_timestamp(&contact.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_active_emergency_contacts(&self) -> StorageResult<Vec<EmergencyContact>> {
        let rows: Vec<EmergencyContactRow> = sqlx::query_as(
            r#"
            SELECT id, name, phone, relationship, notes, is_active, created_at
            FROM emergency_contacts
            WHERE is_active = 1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    // ------------------------------------------------------------------
    // Fragments
    // ------------------------------------------------------------------

    async fn create_fragment(&self, fragment: &Fragment) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO research_fragments (id, content, emotion_tag, context, source_type,
                                            importance_score, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&fragment.id)
        .bind(&fragment.content)
        .bind(fragment.emotion_tag.map(|t| t.as_str()))
        .bind(&fragment.context)
        .bind(&fragment.source_type)
        .bind(fragment.importance_score)
        .bind(encode_timestamp(&fragment.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_fragment(&self, id: &str) -> StorageResult<Option<Fragment>> {
        let row: Option<FragmentRow> = sqlx::query_as(
            r#"
            SELECT id, content, emotion_tag, context, source_type, importance_score, created_at
            FROM research_fragments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_recent_fragments(&self, limit: u32) -> StorageResult<Vec<Fragment>> {
        let rows: Vec<FragmentRow> = sqlx::query_as(
            r#"
            SELECT id, content, emotion_tag, context, source_type, importance_score, created_at
            FROM research_fragments
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn search_fragments(&self, keyword: &str) -> StorageResult<Vec<Fragment>> {
        let rows: Vec<FragmentRow> = sqlx::query_as(
            r#"
            SELECT id, content, emotion_tag, context, source_type, importance_score, created_at
            FROM research_fragments
            WHERE instr(content, ?) > 0
            ORDER BY importance_score DESC, created_at DESC
            "#,
        )
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_fragments_by_emotion(&self, emotion: EmotionTag) -> StorageResult<Vec<Fragment>> {
        let rows: Vec<FragmentRow> = sqlx::query_as(
            r#"
            SELECT id, content, emotion_tag, context, source_type, importance_score, created_at
            FROM research_fragments
            WHERE emotion_tag = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(emotion.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_unanalyzed_fragments(&self, limit: u32) -> StorageResult<Vec<Fragment>> {
        let rows: Vec<FragmentRow> = sqlx::query_as(
            r#"
            SELECT f.id, f.content, f.emotion_tag, f.context, f.source_type, f.importance_score, f.created_at
            FROM research_fragments f
            WHERE NOT EXISTS (
                SELECT 1 FROM fragment_tags t
                WHERE t.fragment_id = f.id AND t.kind = 'analyzed'
            )
            ORDER BY f.created_at DESC, f.rowid DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn add_fragment_tag(&self, tag: &FragmentTag) -> StorageResult<()> {
        sqlx::query("INSERT INTO fragment_tags (id, fragment_id, kind, value) VALUES (?, ?, ?, ?)")
            .bind(&tag.id)
            .bind(&tag.fragment_id)
            .bind(tag.kind.as_str())
            .bind(&tag.value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_fragment_tags(&self, fragment_id: &str) -> StorageResult<Vec<FragmentTag>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, fragment_id, kind, value
            FROM fragment_tags
            WHERE fragment_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(fragment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, fragment_id, kind, value)| {
                let kind = kind.parse::<TagKind>().ok()?;
                Some(FragmentTag {
                    id,
                    fragment_id,
                    kind,
                    value,
                })
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Themes and snapshots
    // ------------------------------------------------------------------

    async fn create_theme(&self, theme: &CoreTheme) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO core_themes (id, name, description, fragment_ids, frequency, importance_score,
                                     first_appeared, last_updated, last_shown, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&theme.id)
        .bind(&theme.name)
        .bind(&theme.description)
        .bind(encode_ids(&theme.fragment_ids))
        .bind(i64::from(theme.frequency))
        .bind(theme.importance_score)
        .bind(encode_timestamp(&theme.first_appeared))
        .bind(encode_timestamp(&theme.last_updated))
        .bind(theme.last_shown.as_ref().map(encode_timestamp))
        .bind(theme.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_theme(&self, theme: &CoreTheme) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE core_themes
            SET name = ?, description = ?, fragment_ids = ?, frequency = ?, importance_score = ?,
                last_updated = ?, last_shown = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&theme.name)
        .bind(&theme.description)
        .bind(encode_ids(&theme.fragment_ids))
        .bind(i64::from(theme.frequency))
        .bind(theme.importance_score)
        .bind(encode_timestamp(&theme.last_updated))
        .bind(theme.last_shown.as_ref().map(encode_timestamp))
        .bind(theme.is_active)
        .bind(&theme.id)
        .execute(&self.pool)
        .await?;

        require_row(result.rows_affected(), "core_themes", &theme.id)
    }

    async fn get_theme(&self, id: &str) -> StorageResult<Option<CoreTheme>> {
        let row: Option<ThemeRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, fragment_ids, frequency, importance_score,
                   first_appeared, last_updated, last_shown, is_active
            FROM core_themes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_active_themes(&self) -> StorageResult<Vec<CoreTheme>> {
        let rows: Vec<ThemeRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, fragment_ids, frequency, importance_score,
                   first_appeared, last_updated, last_shown, is_active
            FROM core_themes
            WHERE is_active = 1
            ORDER BY importance_score DESC, last_updated DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn mark_theme_shown(&self, id: &str, at: DateTime<Utc>) -> StorageResult<()> {
        let result = sqlx::query("UPDATE core_themes SET last_shown = ? WHERE id = ?")
            .bind(encode_timestamp(&at))
            .bind(id)
            .execute(&self.pool)
            .await?;

        require_row(result.rows_affected(), "core_themes", id)
    }

    async fn deactivate_theme(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE core_themes SET is_active = 0, last_updated = ? WHERE id = ?")
            .bind(encode_timestamp(&Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        require_row(result.rows_affected(), "core_themes", id)
    }

    async fn create_snapshot(&self, snapshot: &Snapshot) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO theme_snapshots (id, theme_id, snapshot_type, generated_text, fragment_refs, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.theme_id)
        .bind(snapshot.snapshot_type.as_str())
        .bind(&snapshot.generated_text)
        .bind(encode_ids(&snapshot.fragment_refs))
        .bind(encode_timestamp(&snapshot.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_snapshots(
        &self,
        theme_id: Option<&str>,
        snapshot_type: Option<SnapshotType>,
    ) -> StorageResult<Vec<Snapshot>> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT id, theme_id, snapshot_type, generated_text, fragment_refs, created_at
            FROM theme_snapshots
            WHERE (?1 IS NULL OR theme_id = ?1)
              AND (?2 IS NULL OR snapshot_type = ?2)
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(theme_id)
        .bind(snapshot_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(|r| r.try_into().ok()).collect())
    }
}

// Internal row types for SQLx mapping

#[derive(sqlx::FromRow)]
struct LifeLogRow {
    id: String,
    log_date: String,
    sleep_hours: Option<f64>,
    meal_count: Option<i64>,
    stress_score: Option<i64>,
    free_text: Option<String>,
    crisis_flag: bool,
    intervention_given: bool,
    created_at: String,
}

impl From<LifeLogRow> for LifeLogEntry {
    fn from(row: LifeLogRow) -> Self {
        let created_at = decode_timestamp(&row.created_at);
        Self {
            id: Some(row.id),
            log_date: NaiveDate::parse_from_str(&row.log_date, DATE_FORMAT)
                .unwrap_or_else(|_| created_at.date_naive()),
            sleep_hours: row.sleep_hours,
            meal_count: row.meal_count.and_then(|m| u32::try_from(m).ok()),
            stress_score: row.stress_score.and_then(|s| u8::try_from(s).ok()),
            free_text: row.free_text,
            crisis_flag: row.crisis_flag,
            intervention_given: row.intervention_given,
            created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InterventionRow {
    id: String,
    log_id: Option<String>,
    crisis_level: i64,
    message: String,
    action_taken: String,
    source: String,
    created_at: String,
}

impl From<InterventionRow> for Intervention {
    fn from(row: InterventionRow) -> Self {
        Self {
            id: row.id,
            log_id: row.log_id,
            crisis_level: u8::try_from(row.crisis_level).unwrap_or(0),
            message: row.message,
            action_taken: row.action_taken,
            source: row.source,
            created_at: decode_timestamp(&row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct DeadlineRow {
    id: String,
    title: String,
    description: String,
    due_date: String,
    category: String,
    priority_score: f64,
    status: String,
    created_at: String,
    completed_at: Option<String>,
}

impl From<DeadlineRow> for Deadline {
    fn from(row: DeadlineRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: decode_timestamp(&row.due_date),
            category: DeadlineCategory::parse_lenient(&row.category),
            priority_score: row.priority_score,
            status: row.status.parse().unwrap_or_default(),
            created_at: decode_timestamp(&row.created_at),
            completed_at: row.completed_at.as_deref().map(decode_timestamp),
        }
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    deadline_id: Option<String>,
    title: String,
    doc_type: String,
    content: String,
    status: String,
    created_at: String,
    submitted_at: Option<String>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            deadline_id: row.deadline_id,
            title: row.title,
            doc_type: row.doc_type.parse().unwrap_or(DocumentType::Other),
            content: row.content,
            status: row.status.parse().unwrap_or_default(),
            created_at: decode_timestamp(&row.created_at),
            submitted_at: row.submitted_at.as_deref().map(decode_timestamp),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: String,
    name: String,
    role: String,
    email: String,
    phone: String,
    organization: String,
    notes: String,
    last_contact: Option<String>,
    created_at: Option<String>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            role: row.role,
            email: row.email,
            phone: row.phone,
            organization: row.organization,
            notes: row.notes,
            last_contact: row
                .last_contact
                .and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
            created_at: row.created_at.as_deref().map(decode_timestamp),
        }
    }
}

#[derive(sqlx::FromRow)]
struct EmergencyContactRow {
    id: String,
    name: String,
    phone: String,
    relationship: String,
    notes: String,
    is_active: bool,
    created_at: String,
}

impl From<EmergencyContactRow> for EmergencyContact {
    fn from(row: EmergencyContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
            relationship: row.relationship,
            notes: row.notes,
            is_active: row.is_active,
            created_at: decode_timestamp(&row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct FragmentRow {
    id: String,
    content: String,
    emotion_tag: Option<String>,
    context: Option<String>,
    source_type: String,
    importance_score: f64,
    created_at: String,
}

impl From<FragmentRow> for Fragment {
    fn from(row: FragmentRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            emotion_tag: row.emotion_tag.and_then(|t| t.parse().ok()),
            context: row.context,
            source_type: row.source_type,
            importance_score: row.importance_score,
            created_at: decode_timestamp(&row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ThemeRow {
    id: String,
    name: String,
    description: String,
    fragment_ids: String,
    frequency: i64,
    importance_score: f64,
    first_appeared: String,
    last_updated: String,
    last_shown: Option<String>,
    is_active: bool,
}

impl From<ThemeRow> for CoreTheme {
    fn from(row: ThemeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            fragment_ids: decode_ids(&row.fragment_ids),
            frequency: u32::try_from(row.frequency).unwrap_or(1),
            importance_score: row.importance_score,
            first_appeared: decode_timestamp(&row.first_appeared),
            last_updated: decode_timestamp(&row.last_updated),
            last_shown: row.last_shown.as_deref().map(decode_timestamp),
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: String,
    theme_id: String,
    snapshot_type: String,
    generated_text: String,
    fragment_refs: String,
    created_at: String,
}

impl TryFrom<SnapshotRow> for Snapshot {
    type Error = String;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            theme_id: row.theme_id,
            snapshot_type: row.snapshot_type.parse()?,
            generated_text: row.generated_text,
            fragment_refs: decode_ids(&row.fragment_refs),
            created_at: decode_timestamp(&row.created_at),
        })
    }
}
