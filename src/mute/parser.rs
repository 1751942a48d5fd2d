//! 静音命令解析 - 将自由文本命令转换为 `MuteRule`
//!
//! 解析是纯函数：不依赖任何聊天 SDK，也不触碰存储。
//! 失败时返回可直接回复给请求者的文本。
//!
//! ## 语法
//! ```text
//! /mute chain=cosmoshub proposal=55 duration=1h reason="spam proposal"
//! /mute duration=permanent confirm
//! ```

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::str::FromStr;

use super::rule::{normalize_identifier, MuteRule, MuteScope};

/// 确认全局静音的关键字
pub const CONFIRM_KEYWORD: &str = "confirm";
/// 永久静音的 duration 取值
pub const PERMANENT_DURATION: &str = "permanent";
/// proposal 通配符
pub const WILDCARD: &str = "*";

/// 发起命令的用户信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterContext {
    /// 用户唯一标识
    pub id: String,
    /// 展示名（如 Telegram username）
    pub display_name: Option<String>,
}

impl RequesterContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// 记录到规则里的 creator
    pub fn creator(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// 支持的参数名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuteKey {
    Chain,
    Proposal,
    Author,
    Duration,
    Reason,
}

impl MuteKey {
    pub const ALL: [MuteKey; 5] = [
        MuteKey::Chain,
        MuteKey::Proposal,
        MuteKey::Author,
        MuteKey::Duration,
        MuteKey::Reason,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MuteKey::Chain => "chain",
            MuteKey::Proposal => "proposal",
            MuteKey::Author => "author",
            MuteKey::Duration => "duration",
            MuteKey::Reason => "reason",
        }
    }

    fn expected_list() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for MuteKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chain" => Ok(MuteKey::Chain),
            "proposal" => Ok(MuteKey::Proposal),
            "author" => Ok(MuteKey::Author),
            "duration" => Ok(MuteKey::Duration),
            "reason" => Ok(MuteKey::Reason),
            _ => Err(format!(
                "Unknown option '{}'. Supported options: {}",
                s,
                MuteKey::expected_list()
            )),
        }
    }
}

/// duration 解析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteDuration {
    Permanent,
    Span(Duration),
}

/// 静音命令解析器
pub struct MuteCommandParser {
    /// 单个 token：`key="quoted value"` 或任意非空白串
    token_pattern: Regex,
    /// 相对时长：1w2d3h4m5s 的任意非空子集
    duration_pattern: Regex,
}

impl MuteCommandParser {
    pub fn new() -> Self {
        Self {
            token_pattern: Regex::new(r#"([A-Za-z_]+)="([^"]*)"|(\S+)"#).unwrap(),
            duration_pattern: Regex::new(
                r"^(?:(\d+)w)?(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$",
            )
            .unwrap(),
        }
    }

    /// 解析命令文本
    ///
    /// 成功返回尚未持久化的规则（`id` 为空，由存储层分配）；
    /// 失败返回面向用户的错误描述。
    pub fn parse(
        &self,
        raw_text: &str,
        requester: &RequesterContext,
        now: DateTime<Utc>,
    ) -> Result<MuteRule, String> {
        let mut scope = MuteScope::default();
        let mut reason: Option<String> = None;
        let mut duration: Option<MuteDuration> = None;
        let mut confirmed = false;
        let mut seen: HashSet<MuteKey> = HashSet::new();

        for (index, captures) in self.token_pattern.captures_iter(raw_text.trim()).enumerate() {
            let (key, value) = match (captures.get(1), captures.get(2), captures.get(3)) {
                (Some(key), Some(value), _) => (key.as_str(), value.as_str()),
                (_, _, Some(token)) => {
                    let token = token.as_str();
                    // 第一个 token 是命令本身（/mute 或 /mute@bot）
                    if index == 0 && token.starts_with('/') {
                        continue;
                    }
                    match token.split_once('=') {
                        Some((key, value)) => (key, value),
                        None => {
                            if token.eq_ignore_ascii_case(CONFIRM_KEYWORD) {
                                confirmed = true;
                                continue;
                            }
                            return Err(format!(
                                "Unknown keyword '{}'. Expected key=value pairs ({}) or '{}'",
                                token,
                                MuteKey::expected_list(),
                                CONFIRM_KEYWORD
                            ));
                        }
                    }
                }
                _ => continue,
            };

            let key = MuteKey::from_str(key)?;
            if !seen.insert(key) {
                return Err(format!("Option '{}' is specified more than once", key.as_str()));
            }
            if value.starts_with('"') {
                return Err(format!("Unterminated quote in option '{}'", key.as_str()));
            }
            if value.trim().is_empty() {
                return Err(format!("Option '{}' must not be empty", key.as_str()));
            }

            match key {
                MuteKey::Chain => scope.chain = Some(normalize_identifier(value)),
                MuteKey::Proposal => {
                    let proposal = normalize_identifier(value);
                    scope.proposal = (proposal != WILDCARD).then_some(proposal);
                }
                MuteKey::Author => scope.author = Some(normalize_identifier(value)),
                MuteKey::Duration => duration = Some(self.parse_duration(value)?),
                MuteKey::Reason => reason = Some(value.to_string()),
            }
        }

        let duration = duration.ok_or_else(|| {
            format!(
                "Missing duration, e.g. duration=1h or duration={}",
                PERMANENT_DURATION
            )
        })?;

        if scope.is_global() && !confirmed {
            return Err(format!(
                "ambiguous: did you mean to mute everything? \
                 Specify chain, proposal or author, or add '{}' to mute all notifications",
                CONFIRM_KEYWORD
            ));
        }

        let mut rule = MuteRule::new(scope, requester.creator(), now);
        if let MuteDuration::Span(span) = duration {
            let expires_at = now
                .checked_add_signed(span)
                .ok_or_else(|| "Duration is too long".to_string())?;
            rule = rule.with_expires_at(expires_at);
        }
        if let Some(reason) = reason {
            rule = rule.with_reason(reason);
        }

        Ok(rule)
    }

    /// 解析 duration 取值：`permanent` 或 `1w2d3h4m5s` 形式的正时长
    pub fn parse_duration(&self, value: &str) -> Result<MuteDuration, String> {
        let value = value.trim().to_lowercase();
        if value == PERMANENT_DURATION {
            return Ok(MuteDuration::Permanent);
        }

        let invalid = || {
            format!(
                "Invalid duration '{}'. Use a positive span like 30m, 1h, 2d, 1w, 1h30m or '{}'",
                value, PERMANENT_DURATION
            )
        };

        if value.is_empty() {
            return Err(invalid());
        }
        let captures = self.duration_pattern.captures(&value).ok_or_else(invalid)?;

        const UNITS: [u64; 5] = [7 * 24 * 3600, 24 * 3600, 3600, 60, 1];
        let mut total_secs: u64 = 0;
        for (group, unit) in UNITS.iter().enumerate() {
            if let Some(m) = captures.get(group + 1) {
                let amount: u64 = m.as_str().parse().map_err(|_| invalid())?;
                total_secs = amount
                    .checked_mul(*unit)
                    .and_then(|secs| total_secs.checked_add(secs))
                    .ok_or_else(|| "Duration is too long".to_string())?;
            }
        }

        if total_secs == 0 {
            return Err(format!("Duration must be positive, got '{}'", value));
        }

        let secs = i64::try_from(total_secs).map_err(|_| "Duration is too long".to_string())?;
        let span = Duration::try_seconds(secs).ok_or_else(|| "Duration is too long".to_string())?;
        Ok(MuteDuration::Span(span))
    }
}

impl Default for MuteCommandParser {
    fn default() -> Self {
        Self::new()
    }
}
