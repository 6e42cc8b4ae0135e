//! # Bunk Smart Core Library
//!
//! This library provides the core logic of the Bunk Smart attendance tracker.
//! All operations are available through the standalone `bunksmart` CLI, which
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Attendance**: date-keyed records, one per day, `present` or `bunked`
//! - **Calendar**: fixed 42-cell month grids
//! - **Statistics**: month summary, best streak, trend and year-end projection
//! - **Challenges**: gamified goals advanced by daily check-ins
//! - **Store**: pluggable per-user document persistence (memory, SQLite, HTTP)
//! - **Storage**: TOML configuration, data directory and the local session
//!
//! ## Key Components
//!
//! - [`AttendanceEngine`]: owns the signed-in user's document and persists changes
//! - [`RecordStore`]: trait for document store backends
//! - [`Config`]: application configuration management

pub mod attendance;
pub mod calendar;
pub mod challenge;
pub mod engine;
pub mod error;
pub mod export;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod store;
pub mod view;

pub use attendance::{AttendanceMap, AttendanceRecord, AttendanceStatus, DateKey, MarkDetails};
pub use calendar::{month_grid, CalendarCell, CalendarGrid, CellStatus, WeekStart, YearMonth};
pub use challenge::{
    ChallengeId, ChallengeMap, ChallengePhase, ChallengeState, CheckInOutcome, CheckInReport,
    StartOutcome,
};
pub use engine::AttendanceEngine;
pub use error::{
    CheckInError, ConfigError, CoreError, ExportError, ImportError, StoreError, ValidationError,
};
pub use export::{ExportFormat, ImportSummary};
pub use settings::{SettingKey, SettingsMap, UserPreferences};
pub use stats::{AttendanceStats, BunkEntry, MonthlyBreakdown};
pub use storage::{Config, Database, StoreBackend};
pub use store::{HttpStore, MemoryStore, RecordStore, SqliteStore, UserDocument, UserId};
pub use view::{CardAction, ChallengeCard, LoadingOverlay, MarkDialog, MarkSelection, Notification};
