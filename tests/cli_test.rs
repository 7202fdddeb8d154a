//! End-to-end CLI tests
//!
//! Command lines are parsed with clap and executed against an in-memory
//! store with no model configured.

use std::sync::Arc;

use clap::Parser;

use arc_companion::cli::{execute_command, Cli, CliResult};
use arc_companion::config::Config;
use arc_companion::llm::MessagePipeline;
use arc_companion::storage::SqliteStorage;
use arc_companion::AppState;

async fn create_state() -> Arc<AppState> {
    let storage = SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage");
    Arc::new(AppState::new(
        Config::default(),
        storage,
        MessagePipeline::new(Vec::new()),
    ))
}

async fn run(state: &Arc<AppState>, args: &[&str]) -> CliResult {
    let cli = Cli::try_parse_from(args).expect("command line should parse");
    execute_command(cli.command, Arc::clone(state)).await
}

#[tokio::test]
async fn test_log_and_summary() {
    let state = create_state().await;

    let logged = run(&state, &["arc", "log", "--sleep", "7", "--meals", "3", "--stress", "2"]).await;
    assert_eq!(logged.exit_code, 0);

    let summary = run(&state, &["arc", "summary"]).await;
    assert_eq!(summary.exit_code, 0);
    assert!(summary.message.contains("😴 睡眠: 7時間"));
}

#[tokio::test]
async fn test_invalid_log_lists_problems() {
    let state = create_state().await;

    let result = run(&state, &["arc", "log", "--sleep", "25", "--stress", "12"]).await;
    assert_eq!(result.exit_code, 1);
    assert!(result.message.starts_with("入力内容を確認してください:"));
    assert_eq!(result.message.matches("  - ").count(), 2);
}

#[tokio::test]
async fn test_deadline_add_and_list() {
    let state = create_state().await;

    let empty = run(&state, &["arc", "deadline", "list"]).await;
    assert_eq!(empty.message, "締め切りは登録されていません。");

    let added = run(
        &state,
        &["arc", "deadline", "add", "奨学金申請", "--due", "2099-01-31", "--category", "scholarship"],
    )
    .await;
    assert_eq!(added.exit_code, 0);
    assert!(added.message.starts_with("✅ 締め切りを追加しました"));

    let listed = run(&state, &["arc", "deadline", "list"]).await;
    assert!(listed.message.contains("奨学金申請"));

    let missing = run(&state, &["arc", "deadline", "complete", "no-such-id"]).await;
    assert_eq!(missing.exit_code, 1);
    assert!(missing.message.starts_with("Error:"));
}

#[tokio::test]
async fn test_fragment_then_search() {
    let state = create_state().await;

    let recorded = run(&state, &["arc", "fragment", "ケアは誰の仕事なのか？", "--emotion", "違和感"]).await;
    assert_eq!(recorded.exit_code, 0);

    let found = run(&state, &["arc", "fragments", "--search", "ケア"]).await;
    assert!(found.message.contains("ケアは誰の仕事なのか？"));

    let rejected = run(&state, &["arc", "fragment", "メモ", "--emotion", "boredom"]).await;
    assert_eq!(rejected.exit_code, 1);
}

#[tokio::test]
async fn test_support_resources_and_evening_trigger() {
    let state = create_state().await;

    let resources = run(&state, &["arc", "contact", "resources"]).await;
    assert!(resources.message.contains("0120-279-338"));

    let evening = run(&state, &["arc", "scheduler", "once", "evening"]).await;
    assert_eq!(evening.exit_code, 0);
    assert!(evening.message.contains("今日の体調を記録しませんか？"));
}

#[tokio::test]
async fn test_unknown_category_scores_as_other() {
    let state = create_state().await;

    let added = run(
        &state,
        &["arc", "deadline", "add", "博士論文", "--due", "2099-01-31", "--category", "thesis"],
    )
    .await;
    assert_eq!(added.exit_code, 0);
    // 100 - 30 for a far-off due date, plus the weight of 40 for other
    assert!(added.message.contains("(その他)"));
    assert!(added.message.contains("優先度 110"));
}
