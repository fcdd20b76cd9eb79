//! Grouped projection of the display list for the panel.
//! 按置顶、今天、昨天、更早分组。

use chrono::{DateTime, Datelike, TimeZone};
use pt_core::{ClipSummary, DisplayKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupKind {
    Pinned,
    Today,
    Yesterday,
    Earlier,
}

impl GroupKind {
    pub fn title(&self) -> &'static str {
        match self {
            GroupKind::Pinned => "Pinned",
            GroupKind::Today => "Today",
            GroupKind::Yesterday => "Yesterday",
            GroupKind::Earlier => "Earlier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedClip {
    #[serde(flatten)]
    pub clip: ClipSummary,
    pub age_label: String,
    pub display_kind: DisplayKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipGroup {
    pub kind: GroupKind,
    pub title: &'static str,
    pub items: Vec<GroupedClip>,
}

/// Group items in the order received; empty groups are omitted.
pub fn group_clips<Tz: TimeZone>(items: &[ClipSummary], now: DateTime<Tz>) -> Vec<ClipGroup> {
    let today = now.date_naive();
    let yesterday = today.pred_opt();
    let now_secs = now.timestamp();

    let mut groups: Vec<ClipGroup> = [GroupKind::Pinned, GroupKind::Today, GroupKind::Yesterday, GroupKind::Earlier]
        .into_iter()
        .map(|kind| ClipGroup {
            kind,
            title: kind.title(),
            items: Vec::new(),
        })
        .collect();

    for clip in items {
        let kind = if clip.is_pinned {
            GroupKind::Pinned
        } else {
            match now.timezone().timestamp_opt(clip.created_at, 0).single() {
                Some(at) if at.date_naive() == today => GroupKind::Today,
                Some(at) if Some(at.date_naive()) == yesterday => GroupKind::Yesterday,
                _ => GroupKind::Earlier,
            }
        };
        groups[kind as usize].items.push(GroupedClip {
            age_label: relative_age(now_secs, clip.created_at),
            display_kind: clip.display_kind(),
            clip: clip.clone(),
        });
    }

    groups.retain(|group| !group.items.is_empty());
    groups
}

/// Compact age label: `now`, `5m`, `2h`, `3d`, `2w`, or `Mar 4` past a year.
pub fn relative_age(now_secs: i64, created_at: i64) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const WEEK: i64 = 7 * DAY;

    let elapsed = now_secs - created_at;
    if elapsed < MINUTE {
        return "now".to_string();
    }
    if elapsed < HOUR {
        return format!("{}m", elapsed / MINUTE);
    }
    if elapsed < DAY {
        return format!("{}h", elapsed / HOUR);
    }
    if elapsed < WEEK {
        return format!("{}d", elapsed / DAY);
    }
    if elapsed < 52 * WEEK {
        return format!("{}w", elapsed / WEEK);
    }
    match DateTime::from_timestamp(created_at, 0) {
        Some(at) => format!("{} {}", month_abbrev(at.month()), at.day()),
        None => format!("{}w", elapsed / WEEK),
    }
}

fn month_abbrev(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
    MONTHS.get(month.saturating_sub(1) as usize).copied().unwrap_or("")
}
