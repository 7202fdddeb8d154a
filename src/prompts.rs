//! Centralized prompt definitions for message generation
//!
//! System prompts are constants; user prompts are built from domain records.

use crate::life::crisis::CrisisVerdict;
use crate::storage::{CoreTheme, Deadline, DeadlineCategory, Fragment, LifeLogEntry, SnapshotType};

/// System prompt for crisis interventions. The crisis level is appended.
pub const INTERVENTION_PROMPT: &str = r#"あなたはARCというAIエージェントです。
ユーザーが限界に達したとき、温かく・責めず・最小の行動を提示することが役割です。

重要な原則:
- 決してユーザーを叱らない
- 「もう少し頑張れ」は禁止
- 今日はこれで十分だと許可を与える
- 次の一歩は極限まで小さくする（例: 水を一口飲む、深呼吸を1回する）
- 尊厳を守る言葉遣い
- 短く、シンプルに（200文字以内）"#;

/// System prompt for the LLM daily summary.
pub const DAILY_SUMMARY_PROMPT: &str = r#"あなたはARCというAIエージェントです。
ユーザーの1日を振り返り、ポジティブで温かいサマリーを生成してください。

重要な原則:
- 責めない、評価しない
- 小さな行動も大きく肯定する
- 「生き延びた」ことを祝福する
- 150文字以内で簡潔に"#;

/// System prompt for one-shot chat replies.
pub const CHAT_PROMPT: &str = r#"あなたはARCというAIエージェントです。
研究と生活の両方に疲れている大学院生の伴走者として、短く温かく返答してください。

重要な原則:
- 否定しない、急かさない
- アドバイスは一つだけ、極限まで小さく
- 200文字以内、日本語で"#;

/// System prompt for concept extraction. Output must be JSON.
pub const CONCEPT_EXTRACTION_PROMPT: &str = r#"あなたは研究者の思考を分析するAIです。

以下のテキストから、重要な概念・キーワード・問いを抽出してください。

特に注目すべき点:
- 繰り返し出る単語・フレーズ
- 疑問形の文章（問いの種）
- 感情が強く表れている部分
- 否定や違和感を示す表現

出力形式（JSON）:
{
  "concepts": ["概念1", "概念2"],
  "questions": ["問い1", "問い2"],
  "key_phrases": ["重要フレーズ1", "重要フレーズ2"]
}

必ずJSON形式で出力してください。"#;

/// System prompt for core-theme identification. Output must be JSON.
pub const THEME_IDENTIFICATION_PROMPT: &str = r#"あなたは研究者の思考パターンを分析するAIです。

以下は研究者が記録した断片的なメモです。
これらから「この人の核心的な問い」を1〜3個特定してください。

重要:
- テーマ名は20文字以内
- 説明は100文字以内
- 繰り返し出現する概念に注目
- 感情（特に怒り・違和感）は問いの源
- 複数の断片に共通する問題意識を見つける

出力形式（JSON）:
{
  "themes": [
    {
      "name": "テーマ名",
      "description": "このテーマについての説明",
      "related_fragment_ids": [1, 3, 5],
      "reason": "なぜこれが核心と判断したか"
    }
  ]
}

related_fragment_ids には断片の番号（[1] なら 1）を入れてください。"#;

/// System prompt for a theme summary snapshot.
pub const THEME_SUMMARY_PROMPT: &str = r#"あなたは研究者の思考を整理するAIです。

以下の断片的なメモを、わかりやすく整理して要約してください。

要件:
- 300字程度
- 何がこの人の核心的な問いか
- これまでどんな思考を積み重ねてきたか
- これからどこに向かおうとしているか"#;

/// System prompt for a paper background snapshot.
pub const PAPER_BACKGROUND_PROMPT: &str = r#"あなたは学術論文の執筆を支援するAIです。

以下の断片的なメモから、論文の「背景と目的」セクションを生成してください。

要件:
- 学術的な文体
- 400〜600字程度
- 社会的意義を含める
- 研究の必要性を明確にする
- 日本語で出力"#;

/// System prompt for a grant proposal snapshot.
pub const GRANT_PROPOSAL_PROMPT: &str = r#"あなたは研究助成金申請書の作成を支援するAIです。

以下の断片的なメモから、助成金申請用の研究計画書を生成してください。

要件:
- 研究の目的（何を明らかにするか）
- 研究の意義（なぜ重要か）
- 研究計画（どのように進めるか）
- 800〜1000字程度
- 審査員に伝わる明確な文章
- 日本語で出力"#;

/// System prompt for application drafts.
pub const APPLICATION_DRAFT_PROMPT: &str = r#"あなたは研究者の申請書作成を支援するアシスタントです。

【文体要件】
- 謙虚だが自信のある語調
- 学術的・客観的な表現
- 「〜と考えられる」「〜が期待される」などの婉曲表現
- 自己否定的な表現（「すみません」「未熟ですが」）は使わない

400-600文字で、以下のフォーマットで出力してください:

## 研究目的
（ここに記述）

## 研究の重要性
（ここに記述）

## 期待される成果
（ここに記述）"#;

/// System prompt for email skeletons.
pub const EMAIL_DRAFT_PROMPT: &str = r#"教員・支援窓口への連絡メールの骨子を作成してください。

【要件】
- 簡潔（200文字以内）
- 尊厳を保つ（「申し訳ございません」を連発しない）
- 具体的な「お願い」を1つだけ明記
- 次のステップ（いつまでに何をするか）を明示

以下のフォーマットで出力:

件名: （ここに記述）

本文:
（ここに記述）"#;

/// Get the snapshot system prompt for a snapshot type.
pub fn get_snapshot_prompt(snapshot_type: SnapshotType) -> &'static str {
    match snapshot_type {
        SnapshotType::Summary => THEME_SUMMARY_PROMPT,
        SnapshotType::PaperBackground => PAPER_BACKGROUND_PROMPT,
        SnapshotType::GrantProposal => GRANT_PROPOSAL_PROMPT,
    }
}

/// Intervention system prompt with the crisis level legend appended.
pub fn intervention_system(level: u8) -> String {
    format!(
        "{}\n\n危機レベル: {}\n- 1: 軽度の注意\n- 2: 中度の警戒\n- 3: 高度な警戒（緊急連絡先の提示も検討）",
        INTERVENTION_PROMPT, level
    )
}

fn or_unrecorded<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "未記録".to_string())
}

/// Bullet list describing a life log.
pub fn life_status_block(entry: &LifeLogEntry) -> String {
    let mut lines = vec![
        format!("- しんどさスコア: {}/10", or_unrecorded(entry.stress_score)),
        format!("- 睡眠時間: {}時間", or_unrecorded(entry.sleep_hours)),
        format!("- 食事回数: {}回", or_unrecorded(entry.meal_count)),
    ];
    if let Some(text) = entry.free_text.as_deref().filter(|t| !t.trim().is_empty()) {
        lines.push(format!("- メモ: {}", text));
    }
    lines.join("\n")
}

/// User prompt for an intervention.
pub fn intervention_user(entry: &LifeLogEntry, verdict: &CrisisVerdict) -> String {
    let reasons = verdict
        .reasons
        .iter()
        .map(|r| format!("- {}", r.message))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "ユーザーの状態:\n{}\n\n検出された危機の理由:\n{}\n\n上記を踏まえて、今このユーザーに必要な短いメッセージを日本語で生成してください。",
        life_status_block(entry),
        reasons
    )
}

/// User prompt for the LLM daily summary.
pub fn daily_summary_user(entry: &LifeLogEntry) -> String {
    format!(
        "今日のユーザーの記録:\n{}\n\nこの記録に対して、温かく肯定的な1日のサマリーメッセージを日本語で生成してください。",
        life_status_block(entry)
    )
}

/// User prompt for concept extraction.
pub fn concept_user(fragment: &Fragment) -> String {
    let mut prompt = format!("テキスト: {}\n", fragment.content);
    if let Some(emotion) = fragment.emotion_tag {
        prompt.push_str(&format!("\n感情: {}", emotion.display_name()));
    }
    if let Some(context) = &fragment.context {
        prompt.push_str(&format!("\nコンテキスト: {}", context));
    }
    prompt.push_str("\n\n上記のテキストから概念を抽出してください。");
    prompt
}

/// Numbered fragment list; numbers are 1-based and referenced by the model.
pub fn themes_user(fragments: &[Fragment]) -> String {
    let listing = fragments
        .iter()
        .enumerate()
        .map(|(idx, f)| match f.emotion_tag {
            Some(emotion) => format!("[{}] {} (感情: {})", idx + 1, f.content, emotion.display_name()),
            None => format!("[{}] {}", idx + 1, f.content),
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "断片（最近の{}件）:\n\n{}\n\n上記から核テーマを特定してください。",
        fragments.len(),
        listing
    )
}

/// User prompt for a snapshot draft.
pub fn snapshot_user(snapshot_type: SnapshotType, theme: &CoreTheme, related: &[Fragment]) -> String {
    let notes = related
        .iter()
        .map(|f| format!("- {}", f.content))
        .collect::<Vec<_>>()
        .join("\n");

    match snapshot_type {
        SnapshotType::Summary => format!(
            "テーマ: {}\n\nメモ:\n{}\n\n上記を整理して要約してください。",
            theme.name, notes
        ),
        SnapshotType::PaperBackground => format!(
            "研究テーマ: {}\n\nテーマ説明: {}\n\n関連するメモ:\n{}\n\n上記から論文の「背景と目的」を生成してください。",
            theme.name, theme.description, notes
        ),
        SnapshotType::GrantProposal => format!(
            "研究テーマ: {}\n\nテーマ説明: {}\n\n関連するメモ:\n{}\n\n上記から研究計画書を生成してください。",
            theme.name, theme.description, notes
        ),
    }
}

/// Wording for the kind of application a category implies.
pub fn application_kind(category: DeadlineCategory) -> &'static str {
    match category {
        DeadlineCategory::Scholarship => "奨学金",
        DeadlineCategory::Grant => "助成金",
        _ => "研究",
    }
}

/// User prompt for an application draft.
pub fn application_user(deadline: &Deadline, themes: &[CoreTheme], sections: Option<&str>) -> String {
    let summary = if themes.is_empty() {
        "（まだテーマが記録されていません）".to_string()
    } else {
        themes
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "以下の研究テーマから、{}申請書の初稿を作成してください。\n\n【申請対象】\n{}\n\n【研究者の核テーマ】\n{}\n\n【要求セクション】\n{}",
        application_kind(deadline.category),
        deadline.title,
        summary,
        sections.unwrap_or("研究目的、研究の重要性、期待される成果")
    )
}

/// User prompt for an email skeleton.
pub fn email_user(recipient: &str, purpose: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        "（特記事項なし）"
    } else {
        context
    };
    format!(
        "【宛先】\n{}様\n\n【目的】\n{}\n\n【状況・背景】\n{}",
        recipient, purpose, context
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EmotionTag;
    use chrono::NaiveDate;

    #[test]
    fn test_prompts_are_not_empty() {
        assert!(!INTERVENTION_PROMPT.is_empty());
        assert!(!DAILY_SUMMARY_PROMPT.is_empty());
        assert!(!CHAT_PROMPT.is_empty());
        assert!(!APPLICATION_DRAFT_PROMPT.is_empty());
        assert!(!EMAIL_DRAFT_PROMPT.is_empty());
    }

    #[test]
    fn test_structured_prompts_contain_json_format() {
        assert!(CONCEPT_EXTRACTION_PROMPT.contains("JSON"));
        assert!(THEME_IDENTIFICATION_PROMPT.contains("JSON"));
        assert!(THEME_IDENTIFICATION_PROMPT.contains("related_fragment_ids"));
    }

    #[test]
    fn test_get_snapshot_prompt() {
        assert_eq!(get_snapshot_prompt(SnapshotType::Summary), THEME_SUMMARY_PROMPT);
        assert_eq!(get_snapshot_prompt(SnapshotType::PaperBackground), PAPER_BACKGROUND_PROMPT);
        assert_eq!(get_snapshot_prompt(SnapshotType::GrantProposal), GRANT_PROPOSAL_PROMPT);
    }

    #[test]
    fn test_life_status_block_marks_missing() {
        let entry = LifeLogEntry::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).with_stress_score(7);
        let block = life_status_block(&entry);
        assert!(block.contains("しんどさスコア: 7/10"));
        assert!(block.contains("睡眠時間: 未記録時間"));
        assert!(!block.contains("メモ"));
    }

    #[test]
    fn test_themes_user_numbers_from_one() {
        let fragments = vec![
            Fragment::new("一つ目"),
            Fragment::new("二つ目").with_emotion(EmotionTag::Anger),
        ];
        let prompt = themes_user(&fragments);
        assert!(prompt.contains("[1] 一つ目"));
        assert!(prompt.contains("[2] 二つ目 (感情: 怒り)"));
        assert!(prompt.contains("最近の2件"));
    }

    #[test]
    fn test_application_kind() {
        assert_eq!(application_kind(DeadlineCategory::Scholarship), "奨学金");
        assert_eq!(application_kind(DeadlineCategory::Grant), "助成金");
        assert_eq!(application_kind(DeadlineCategory::Report), "研究");
    }

    #[test]
    fn test_intervention_system_includes_level() {
        assert!(intervention_system(3).contains("危機レベル: 3"));
    }
}
