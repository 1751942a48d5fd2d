//! 静音命令处理 - 聊天命令入口（/mute、/mutes、/unmute）
//!
//! 解析错误原样回复给请求者；存储错误只回复通用失败信息，细节写日志。

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use super::parser::{MuteCommandParser, RequesterContext};
use super::rule::MuteRule;
use super::store::MuteStore;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// 静音命令处理器
pub struct MuteCommandHandler {
    parser: MuteCommandParser,
    store: MuteStore,
}

impl MuteCommandHandler {
    pub fn new(store: MuteStore) -> Self {
        Self {
            parser: MuteCommandParser::new(),
            store,
        }
    }

    /// 解析并保存静音规则
    ///
    /// - 解析失败：`Ok("Error muting notification: ...")`
    /// - 保存失败：`Err`，由调用方决定如何回复
    /// - 成功：`Ok(确认文本)`
    pub fn add_mute_from_command(
        &self,
        raw_text: &str,
        requester: &RequesterContext,
    ) -> Result<String> {
        info!(sender = %requester.creator(), text = raw_text, "Got add mute query");

        let rule = match self.parser.parse(raw_text, requester, Utc::now()) {
            Ok(rule) => rule,
            Err(message) => return Ok(format!("Error muting notification: {}", message)),
        };

        let stored = self.store.add_mute(rule)?;
        Ok(render_mute_added(&stored))
    }

    /// 列出当前有效的静音
    pub fn list_mutes(&self, now: DateTime<Utc>) -> Result<String> {
        let mutes = self.store.active_mutes(now)?;
        Ok(render_mutes_list(&mutes))
    }

    /// `/unmute <id>`
    pub fn remove_mute_from_command(
        &self,
        raw_text: &str,
        requester: &RequesterContext,
    ) -> Result<String> {
        info!(sender = %requester.creator(), text = raw_text, "Got remove mute query");

        let args: Vec<&str> = raw_text
            .split_whitespace()
            .filter(|t| !t.starts_with('/'))
            .collect();
        let id = match args.as_slice() {
            [id] => *id,
            _ => return Ok("Usage: /unmute <mute id>".to_string()),
        };

        if self.store.remove_mute(id)? {
            Ok(format!("Mute {} removed", id))
        } else {
            Ok(format!("Mute {} not found", id))
        }
    }

    /// 命令路由，始终返回可回复的文本
    pub fn handle(&self, raw_text: &str, requester: &RequesterContext) -> String {
        let command = raw_text
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("")
            .to_lowercase();

        match command.as_str() {
            "/mute" => self
                .add_mute_from_command(raw_text, requester)
                .unwrap_or_else(|e| {
                    error!(error = %e, "Error adding mute");
                    "Error adding mute".to_string()
                }),
            "/mutes" => self.list_mutes(Utc::now()).unwrap_or_else(|e| {
                error!(error = %e, "Error listing mutes");
                "Error listing mutes".to_string()
            }),
            "/unmute" => self
                .remove_mute_from_command(raw_text, requester)
                .unwrap_or_else(|e| {
                    error!(error = %e, "Error removing mute");
                    "Error removing mute".to_string()
                }),
            _ => format!(
                "Unknown command '{}'. Available commands: /mute, /mutes, /unmute",
                command
            ),
        }
    }
}

fn describe_field(value: Option<&str>, unset: &str) -> String {
    value.map(str::to_string).unwrap_or_else(|| unset.to_string())
}

fn describe_expiry(rule: &MuteRule) -> String {
    match rule.expires_at {
        Some(expires_at) => format!("until {}", expires_at.format(TIME_FORMAT)),
        None => "permanently".to_string(),
    }
}

/// 静音成功后的确认文本
pub fn render_mute_added(rule: &MuteRule) -> String {
    let mut lines = vec![
        format!("Notifications muted {}", describe_expiry(rule)),
        format!("Chain: {}", describe_field(rule.scope.chain.as_deref(), "all chains")),
        format!("Proposal: {}", describe_field(rule.scope.proposal.as_deref(), "all proposals")),
    ];
    if let Some(author) = &rule.scope.author {
        lines.push(format!("Author: {}", author));
    }
    if let Some(reason) = &rule.reason {
        lines.push(format!("Reason: {}", reason));
    }
    lines.push(format!("ID: {}", rule.id));
    lines.join("\n")
}

/// 静音列表文本
pub fn render_mutes_list(mutes: &[MuteRule]) -> String {
    if mutes.is_empty() {
        return "No active mutes.".to_string();
    }

    let mut sorted: Vec<&MuteRule> = mutes.iter().collect();
    sorted.sort_by_key(|m| m.created_at);

    let mut lines = vec![format!("Active mutes ({}):", sorted.len())];
    for mute in sorted {
        let mut line = format!(
            "- {} | chain: {} | proposal: {}",
            mute.id,
            describe_field(mute.scope.chain.as_deref(), "*"),
            describe_field(mute.scope.proposal.as_deref(), "*"),
        );
        if let Some(author) = &mute.scope.author {
            line.push_str(&format!(" | author: {}", author));
        }
        line.push_str(&format!(" | {} | by {}", describe_expiry(mute), mute.creator));
        if let Some(reason) = &mute.reason {
            line.push_str(&format!(" | {}", reason));
        }
        lines.push(line);
    }
    lines.join("\n")
}
