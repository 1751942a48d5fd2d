//! 静音规则 - 解析、存储与匹配
//!
//! 流程：命令文本 -> `MuteCommandParser` -> `MuteStore::add_mute`；
//! 分发时 `MuteStore::active_mutes` -> `filter`。

pub mod command;
pub mod filter;
pub mod parser;
pub mod rule;
pub mod storage;
pub mod store;

pub use command::{render_mute_added, render_mutes_list, MuteCommandHandler};
pub use filter::{filter, find_matching_mute, is_muted, FilterOutcome};
pub use parser::{MuteCommandParser, MuteDuration, MuteKey, RequesterContext};
pub use rule::{MuteRule, MuteScope};
pub use storage::{FileMuteStorage, MemoryMuteStorage, MuteStorage};
pub use store::MuteStore;
