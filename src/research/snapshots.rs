use chrono::Local;
use tracing::info;

use super::ResearchMemory;
use crate::error::{AppError, AppResult};
use crate::prompts;
use crate::storage::{CoreTheme, Fragment, Snapshot, SnapshotType, Storage};

fn max_tokens(snapshot_type: SnapshotType) -> u32 {
    match snapshot_type {
        SnapshotType::Summary => 600,
        SnapshotType::PaperBackground => 1000,
        SnapshotType::GrantProposal => 1500,
    }
}

/// Render a snapshot as a standalone Markdown document.
pub fn export_markdown(snapshot: &Snapshot, theme_name: &str) -> String {
    let generated_at = snapshot
        .created_at
        .with_timezone(&Local)
        .format("%Y/%m/%d %H:%M:%S");

    format!(
        "# {}\n\n## 生成日時\n{}\n\n## タイプ\n{}\n\n---\n\n{}\n\n---\n\n*このドラフトはARCによって自動生成されました*\n",
        theme_name,
        generated_at,
        snapshot.snapshot_type.display_name(),
        snapshot.generated_text
    )
}

impl ResearchMemory {
    /// Generate and store a draft for a theme (default: the top active theme).
    ///
    /// Unlike other generated text there is no template here: if no model
    /// answers, the error is returned.
    pub async fn generate_snapshot(
        &self,
        snapshot_type: SnapshotType,
        theme_id: Option<&str>,
    ) -> AppResult<(CoreTheme, Snapshot)> {
        let theme = self.resolve_theme(theme_id).await?;
        let related = self.related_fragments(&theme).await?;

        let request = self
            .core
            .pipeline()
            .request(
                prompts::get_snapshot_prompt(snapshot_type),
                prompts::snapshot_user(snapshot_type, &theme, &related),
            )
            .with_max_tokens(max_tokens(snapshot_type));

        let generation = self.core.pipeline().attempt_chain(&request).await?;

        let snapshot = Snapshot::new(
            theme.id.clone(),
            snapshot_type,
            generation.text,
            theme.fragment_ids.clone(),
        );
        self.core.storage().create_snapshot(&snapshot).await?;

        info!(
            snapshot_id = %snapshot.id,
            theme_id = %theme.id,
            snapshot_type = snapshot_type.as_str(),
            source = %generation.source,
            "Snapshot generated"
        );
        Ok((theme, snapshot))
    }

    /// Stored snapshots, newest first.
    pub async fn list_snapshots(
        &self,
        theme_id: Option<&str>,
        snapshot_type: Option<SnapshotType>,
    ) -> AppResult<Vec<Snapshot>> {
        Ok(self
            .core
            .storage()
            .list_snapshots(theme_id, snapshot_type)
            .await?)
    }

    async fn resolve_theme(&self, theme_id: Option<&str>) -> AppResult<CoreTheme> {
        let found = match theme_id {
            Some(id) => self
                .core
                .storage()
                .get_theme(id)
                .await?
                .filter(|t| t.is_active),
            None => self
                .core
                .storage()
                .list_active_themes()
                .await?
                .into_iter()
                .next(),
        };

        found.ok_or_else(|| AppError::NotFound {
            entity: "active theme",
            id: theme_id.unwrap_or("top").to_string(),
        })
    }

    async fn related_fragments(&self, theme: &CoreTheme) -> AppResult<Vec<Fragment>> {
        let mut related = Vec::with_capacity(theme.fragment_ids.len());
        for id in &theme.fragment_ids {
            if let Some(fragment) = self.core.storage().get_fragment(id).await? {
                related.push(fragment);
            }
        }
        Ok(related)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_export() {
        let snapshot = Snapshot::new("t-1", SnapshotType::PaperBackground, "本文です", Vec::new());
        let md = export_markdown(&snapshot, "ケアの倫理");

        assert!(md.starts_with("# ケアの倫理\n\n## 生成日時\n"));
        assert!(md.contains("## タイプ\n論文背景\n\n---\n\n本文です\n\n---\n\n"));
        assert!(md.ends_with("*このドラフトはARCによって自動生成されました*\n"));
    }

    #[test]
    fn test_longer_drafts_get_more_tokens() {
        assert!(max_tokens(SnapshotType::GrantProposal) > max_tokens(SnapshotType::Summary));
    }
}
