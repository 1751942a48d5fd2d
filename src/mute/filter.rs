//! 静音过滤 - 将一批通知划分为待发送 / 已抑制
//!
//! 任意一条规则匹配即抑制（规则内各字段为"与"，规则之间为"或"）。
//! O(items × rules) 线性扫描。

use crate::report::NotificationItem;

use super::rule::MuteRule;

/// 过滤结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub to_send: Vec<NotificationItem>,
    pub suppressed: Vec<NotificationItem>,
}

impl FilterOutcome {
    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }
}

/// 返回第一条匹配该条目的规则
pub fn find_matching_mute<'a>(
    item: &NotificationItem,
    active_mutes: &'a [MuteRule],
) -> Option<&'a MuteRule> {
    active_mutes.iter().find(|mute| mute.matches(item))
}

pub fn is_muted(item: &NotificationItem, active_mutes: &[MuteRule]) -> bool {
    find_matching_mute(item, active_mutes).is_some()
}

/// 按规则划分条目，保持原有顺序
pub fn filter(items: Vec<NotificationItem>, active_mutes: &[MuteRule]) -> FilterOutcome {
    if active_mutes.is_empty() {
        return FilterOutcome {
            to_send: items,
            suppressed: Vec::new(),
        };
    }

    let mut outcome = FilterOutcome::default();
    for item in items {
        match find_matching_mute(&item, active_mutes) {
            Some(mute) => {
                tracing::debug!(item = %item.key(), mute_id = %mute.id, "Notification muted");
                outcome.suppressed.push(item);
            }
            None => outcome.to_send.push(item),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mute::rule::MuteScope;
    use chrono::Utc;

    fn rule(chain: Option<&str>, proposal: Option<&str>) -> MuteRule {
        MuteRule::new(
            MuteScope {
                chain: chain.map(str::to_string),
                proposal: proposal.map(str::to_string),
                author: None,
            },
            "alice",
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_ruleset_passes_everything() {
        let items = vec![NotificationItem::new("x", "1"), NotificationItem::new("y", "2")];
        let outcome = filter(items.clone(), &[]);

        assert_eq!(outcome.to_send, items);
        assert_eq!(outcome.suppressed_count(), 0);
    }

    #[test]
    fn test_cosmoshub_scenario() {
        let mutes = vec![rule(Some("cosmoshub"), None)];
        let items = vec![
            NotificationItem::new("cosmoshub", "55"),
            NotificationItem::new("osmosis", "10"),
        ];

        let outcome = filter(items, &mutes);
        assert_eq!(outcome.to_send, vec![NotificationItem::new("osmosis", "10")]);
        assert_eq!(outcome.suppressed_count(), 1);
    }

    #[test]
    fn test_any_rule_suppresses() {
        let mutes = vec![rule(Some("a"), Some("1")), rule(Some("b"), None)];
        let items = vec![
            NotificationItem::new("a", "1"),
            NotificationItem::new("a", "2"),
            NotificationItem::new("b", "7"),
        ];

        let outcome = filter(items, &mutes);
        assert_eq!(outcome.to_send, vec![NotificationItem::new("a", "2")]);
        assert_eq!(outcome.suppressed.len(), 2);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mutes = vec![rule(Some("a"), None), rule(None, Some("3"))];
        let items = vec![
            NotificationItem::new("a", "1"),
            NotificationItem::new("b", "2"),
            NotificationItem::new("c", "3"),
            NotificationItem::new("d", "4"),
        ];

        let first = filter(items, &mutes);
        let second = filter(first.to_send.clone(), &mutes);
        assert_eq!(second.to_send, first.to_send);
        assert!(second.suppressed.is_empty());
    }

    #[test]
    fn test_find_matching_mute_returns_rule() {
        let mut mute = rule(Some("juno"), None);
        mute.id = "mute-1".to_string();
        let mutes = vec![mute];

        let found = find_matching_mute(&NotificationItem::new("juno", "9"), &mutes);
        assert_eq!(found.map(|m| m.id.as_str()), Some("mute-1"));
        assert!(!is_muted(&NotificationItem::new("osmosis", "9"), &mutes));
    }
}
