//! # ARC Companion
//!
//! A personal companion for graduate researchers: a wellbeing log with
//! crisis detection, a deadline tracker with document drafting, and a
//! research memory that turns scattered notes into recurring themes.
//!
//! ## Features
//!
//! - **Life support**: daily check-ins, threshold and keyword crisis
//!   evaluation, supportive interventions and summaries
//! - **Deadlines**: priority scoring, today's focus, application and email
//!   drafts, contacts and emergency contacts
//! - **Research memory**: fragments, concept extraction, core themes,
//!   daily re-presentation and theme drafts
//! - **Scheduler**: fixed wall-clock triggers surfaced as notifications
//!
//! ## Architecture
//!
//! ```text
//! CLI / Scheduler → Services → MessagePipeline (local → cloud → canned)
//!                      ↓
//!                SQLite (State)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use arc_companion::{AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::from_config(config).await?;
//!     let focus = state.deadlines.today_focus(chrono::Utc::now()).await?;
//!     println!("{}", focus.message);
//!     Ok(())
//! }
//! ```

/// Shared application state.
pub mod app;
/// Command-line interface.
pub mod cli;
/// Configuration loaded from the environment.
pub mod config;
/// Storage and pipeline handles shared by the services.
pub mod core;
/// Deadlines, document drafts and contacts.
pub mod deadlines;
/// Error types and result aliases for the application.
pub mod error;
/// Wellbeing logging, crisis detection and interventions.
pub mod life;
/// Local and cloud generation strategies and the fallback chain.
pub mod llm;
/// System prompts and prompt builders.
pub mod prompts;
/// Fragments, themes and snapshots.
pub mod research;
/// Background triggers and notifications.
pub mod scheduler;
/// SQLite persistence.
pub mod storage;

pub use app::AppState;
pub use config::Config;
pub use error::{AppError, AppResult};
