//! govwatch - 治理提案通知流水线：静音规则过滤 + 多渠道并行分发

pub mod config;
pub mod mute;
pub mod notification;
pub mod report;

pub use config::AppConfig;
pub use mute::{
    FileMuteStorage, MemoryMuteStorage, MuteCommandHandler, MuteCommandParser, MuteRule,
    MuteScope, MuteStorage, MuteStore, RequesterContext,
};
pub use notification::{
    BatchOutcome, NotificationBuilder, NotificationDispatcher, Reporter, ReporterOutcome,
    ReporterRegistry, SendResult,
};
pub use report::{ItemKind, NotificationItem, Report};
