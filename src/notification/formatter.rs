//! 消息格式化 - 将通知条目渲染为聊天消息文本

use crate::report::{ItemKind, NotificationItem};

/// 各类条目的标题
pub mod msg {
    pub const NOT_VOTED: &str = "Not voted yet";
    pub const VOTED: &str = "Voted";
    pub const REVOTED: &str = "Vote changed";
    pub const QUERY_ERROR: &str = "Error querying proposals";
}

pub fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::NotVoted => msg::NOT_VOTED,
        ItemKind::Voted => msg::VOTED,
        ItemKind::Revoted => msg::REVOTED,
        ItemKind::QueryError => msg::QUERY_ERROR,
    }
}

fn kind_icon(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::NotVoted => "🔴",
        ItemKind::Voted => "✅",
        ItemKind::Revoted => "↩️",
        ItemKind::QueryError => "⚠️",
    }
}

/// 单行标题: `🔴 Not voted yet: cosmoshub #55`
pub fn format_title(item: &NotificationItem) -> String {
    format!(
        "{} {}: {} #{}",
        kind_icon(item.kind),
        kind_label(item.kind),
        item.domain_key,
        item.subject_id
    )
}

/// 完整消息：标题 + 作者 + 上游渲染内容
pub fn format_item(item: &NotificationItem) -> String {
    let mut lines = vec![format_title(item)];
    if let Some(author) = &item.author {
        lines.push(format!("Proposer: {}", author));
    }
    let payload = item.payload.trim();
    if !payload.is_empty() {
        lines.push(String::new());
        lines.push(payload.to_string());
    }
    lines.join("\n")
}

/// 按字符截断（不会切断 UTF-8 字符）
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
