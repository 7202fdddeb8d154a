use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::{not_found, DeadlineService};
use crate::error::{AppResult, ValidationError};
use crate::llm::GenerationSource;
use crate::prompts;
use crate::storage::{CoreTheme, Deadline, Document, DocumentStatus, DocumentType, Storage};

const APPLICATION_MAX_TOKENS: u32 = 800;
const EMAIL_MAX_TOKENS: u32 = 400;
const APPLICATION_THEME_LIMIT: usize = 5;

/// A stored draft and how its text was produced.
#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub document: Document,
    pub source: GenerationSource,
}

impl Draft {
    /// True when the built-in template was used instead of a model.
    pub fn is_template(&self) -> bool {
        self.source == GenerationSource::Canned
    }
}

/// Application skeleton listing the given themes.
pub fn application_template(themes: &[CoreTheme]) -> String {
    let themes_list = if themes.is_empty() {
        "・（研究テーマを記録してください）".to_string()
    } else {
        themes
            .iter()
            .map(|t| format!("・{}", t.name))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "## 研究目的

本研究は、以下のテーマに関する探究を目的としています:

{}

これらの問いは、現代社会における重要な課題と深く関連しており、学術的・社会的な意義を持つと考えられます。

## 研究の重要性

本研究は、従来の枠組みでは十分に扱われてこなかった領域に光を当てるものです。この研究を通じて、新たな視点や理解の可能性が開かれることが期待されます。

## 期待される成果

本研究により、以下の成果が期待されます:
1. 対象領域の理論的整理と新たな概念枠組みの提示
2. 実証的なデータに基づく知見の蓄積
3. 研究成果の学会発表および論文化

---
※ このドラフトは自動生成されたテンプレートです。必ず内容を確認・修正してください。
",
        themes_list
    )
}

/// Plain request email used when no model is available.
pub fn email_template(recipient: &str, purpose: &str, context: &str) -> String {
    format!(
        "件名: {purpose}について\n\n{recipient}様\n\nお世話になっております。\n\n{context}\n\nつきましては、{purpose}についてご相談させていただきたく、ご連絡いたしました。\n\nお忙しいところ恐縮ですが、ご検討のほどよろしくお願いいたします。\n"
    )
}

impl DeadlineService {
    /// Draft an application for a deadline from the top research themes.
    ///
    /// Falls back to [`application_template`] when no model answers.
    pub async fn draft_application(
        &self,
        deadline_id: &str,
        sections: Option<&str>,
    ) -> AppResult<Draft> {
        let deadline = self.get_deadline(deadline_id).await?;
        let themes: Vec<CoreTheme> = self
            .core
            .storage()
            .list_active_themes()
            .await?
            .into_iter()
            .take(APPLICATION_THEME_LIMIT)
            .collect();

        let request = self
            .core
            .pipeline()
            .request(
                prompts::APPLICATION_DRAFT_PROMPT,
                prompts::application_user(&deadline, &themes, sections),
            )
            .with_max_tokens(APPLICATION_MAX_TOKENS);

        let (title, content, source) = match self.core.pipeline().attempt_chain(&request).await {
            Ok(generation) => (
                format!("{} - 申請書ドラフト", deadline.title),
                generation.text,
                generation.source,
            ),
            Err(e) => {
                warn!(error = %e, deadline_id = %deadline.id, "Using application template");
                (
                    format!("{} - 申請書ドラフト（テンプレート）", deadline.title),
                    application_template(&themes),
                    GenerationSource::Canned,
                )
            }
        };

        self.store_draft(Some(&deadline), title, DocumentType::Application, content, source)
            .await
    }

    /// Draft a short email to a supervisor or support office.
    pub async fn draft_email(
        &self,
        recipient: &str,
        purpose: &str,
        context: &str,
        deadline_id: Option<&str>,
    ) -> AppResult<Draft> {
        if purpose.trim().is_empty() {
            return Err(ValidationError::field("purpose", "cannot be empty").into());
        }

        let deadline = match deadline_id {
            Some(id) => Some(self.get_deadline(id).await?),
            None => None,
        };
        let recipient = if recipient.trim().is_empty() {
            "関係者"
        } else {
            recipient.trim()
        };

        let request = self
            .core
            .pipeline()
            .request(
                prompts::EMAIL_DRAFT_PROMPT,
                prompts::email_user(recipient, purpose, context),
            )
            .with_max_tokens(EMAIL_MAX_TOKENS);

        let (title, content, source) = match self.core.pipeline().attempt_chain(&request).await {
            Ok(generation) => (
                format!("{}へのメール", recipient),
                generation.text,
                generation.source,
            ),
            Err(e) => {
                warn!(error = %e, "Using email template");
                (
                    format!("{}へのメール（テンプレート）", recipient),
                    email_template(recipient, purpose, context),
                    GenerationSource::Canned,
                )
            }
        };

        self.store_draft(deadline.as_ref(), title, DocumentType::Email, content, source)
            .await
    }

    async fn store_draft(
        &self,
        deadline: Option<&Deadline>,
        title: String,
        doc_type: DocumentType,
        content: String,
        source: GenerationSource,
    ) -> AppResult<Draft> {
        let document = Document::new(deadline.map(|d| d.id.clone()), title, doc_type, content);
        self.core.storage().create_document(&document).await?;

        info!(
            document_id = %document.id,
            doc_type = doc_type.as_str(),
            source = %source,
            "Draft stored"
        );
        Ok(Draft { document, source })
    }

    /// Documents drafted for a deadline, newest first.
    pub async fn deadline_documents(&self, deadline_id: &str) -> AppResult<Vec<Document>> {
        self.get_deadline(deadline_id).await?;
        Ok(self.core.storage().get_deadline_documents(deadline_id).await?)
    }

    /// Move a document through review.
    pub async fn set_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        self.core
            .storage()
            .update_document_status(document_id, status, now)
            .await
            .map_err(not_found("document"))
    }

    /// Replace a document's text after manual editing.
    pub async fn revise_document(&self, document_id: &str, content: &str) -> AppResult<()> {
        if content.trim().is_empty() {
            return Err(ValidationError::field("content", "cannot be empty").into());
        }
        self.core
            .storage()
            .update_document_content(document_id, content)
            .await
            .map_err(not_found("document"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_application_template_lists_themes() {
        let themes = vec![
            CoreTheme::new("ケアの倫理", "説明"),
            CoreTheme::new("制度の隙間", "説明"),
        ];
        let text = application_template(&themes);
        assert!(text.contains("・ケアの倫理\n・制度の隙間"));
        assert!(text.starts_with("## 研究目的"));
        assert!(text.contains("## 研究の重要性"));
        assert!(text.contains("## 期待される成果"));
    }

    #[test]
    fn test_application_template_without_themes() {
        assert!(application_template(&[]).contains("・（研究テーマを記録してください）"));
    }

    #[test]
    fn test_email_template() {
        let text = email_template("田中先生", "提出期限の延長", "体調を崩しております。");
        let expected = "件名: 提出期限の延長について\n\n田中先生様\n\nお世話になっております。\n\n体調を崩しております。\n\nつきましては、提出期限の延長についてご相談させていただきたく、ご連絡いたしました。\n\nお忙しいところ恐縮ですが、ご検討のほどよろしくお願いいたします。\n";
        assert_eq!(text, expected);
    }
}
