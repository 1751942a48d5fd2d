//! 通知层 - 把一个周期的报告过滤静音后分发到所有渠道
//!
//! # 流程
//! 1. `NotificationBuilder` 根据配置创建渠道，`ReporterRegistry` 逐个初始化，失败的渠道被排除
//! 2. `NotificationDispatcher::dispatch` 每个周期重新读取静音规则，过滤条目
//! 3. 剩余条目并行发送到每个渠道，结果汇总为 `BatchOutcome`
//!
//! # 使用示例
//! ```ignore
//! use govwatch::config::AppConfig;
//! use govwatch::notification::NotificationBuilder;
//! use govwatch::report::Report;
//!
//! let dispatcher = NotificationBuilder::new(AppConfig::load(None)?).build()?;
//! let outcome = dispatcher.dispatch(Report::load(path)?)?;
//! ```

pub mod builder;
pub mod channels;
pub mod dispatcher;
pub mod formatter;
pub mod registry;
pub mod reporter;
pub mod store;

pub use builder::NotificationBuilder;
pub use dispatcher::{BatchOutcome, DeliveryFailure, NotificationDispatcher, ReporterOutcome};
pub use formatter::{format_item, format_title, msg};
pub use registry::ReporterRegistry;
pub use reporter::{Reporter, SendResult};
pub use store::{DeliveryLog, DeliveryRecord};
