//! PipeQuest - Gamified Sales Pipeline Tracker
//!
//! A single-user CRM with a gamification layer: outreach, leads, clients and
//! tasks feed an XP/level system, a daily outreach streak, goals, daily
//! missions, a monthly boss battle, and a token economy with redeemable
//! rewards. Everything persists to a local SQLite database.

pub mod activity;
pub mod cache;
pub mod clock;
pub mod config;
pub mod crm;
pub mod gamification;
pub mod review;
pub mod settings;
pub mod storage;

// Re-export commonly used types
pub use cache::TtlCache;
pub use clock::{Clock, FixedClock};
pub use config::AppConfig;
pub use gamification::{Engine, EngineError};
pub use storage::{CrmStore, Database};
