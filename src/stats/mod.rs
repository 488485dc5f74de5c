/// Aggregate statistics over store snapshots
///
/// Every aggregate is a pure function of a record slice and, for time
/// windows, a caller-supplied clock. Extremal queries keep the first
/// record in insertion order among ties.
use crate::store::{Blog, Comment, Notification, Priority, Role, User};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Arithmetic mean, or 0 for an empty input
pub fn average(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// The first item holding the maximum key. Later items must be strictly
/// greater to replace it.
pub fn first_max_by_key<T, K, F>(items: &[T], key: F) -> Option<&T>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    let mut best: Option<(&T, K)> = None;
    for item in items {
        let k = key(item);
        let replace = match &best {
            Some((_, current)) => k > *current,
            None => true,
        };
        if replace {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}

/// Count items per key
pub fn count_by<T, K, F>(items: &[T], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

/// Count items whose timestamp is strictly newer than `now - window`
pub fn count_since<T, F>(items: &[T], now: DateTime<Utc>, window: Duration, at: F) -> usize
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let cutoff = now - window;
    items.iter().filter(|item| at(item) > cutoff).count()
}

/// Hour/day/week counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindows {
    pub last_hour: usize,
    pub last_day: usize,
    pub last_week: usize,
}

impl TimeWindows {
    pub fn of<T, F>(items: &[T], now: DateTime<Utc>, at: F) -> Self
    where
        F: Fn(&T) -> DateTime<Utc>,
    {
        Self {
            last_hour: count_since(items, now, Duration::hours(1), &at),
            last_day: count_since(items, now, Duration::days(1), &at),
            last_week: count_since(items, now, Duration::weeks(1), &at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogStats {
    pub total_blogs: usize,
    pub total_likes: u64,
    pub average_likes: f64,
    pub most_liked_blog: Option<Blog>,
}

impl BlogStats {
    pub fn from_records(blogs: &[Blog]) -> Self {
        let total_likes = blogs.iter().map(|b| b.likes).sum();
        Self {
            total_blogs: blogs.len(),
            total_likes,
            average_likes: average(total_likes, blogs.len()),
            most_liked_blog: first_max_by_key(blogs, |b| b.likes).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentStats {
    pub total_comments: usize,
    pub total_likes: u64,
    pub average_likes: f64,
    pub comments_by_blog: BTreeMap<u64, usize>,
}

impl CommentStats {
    pub fn from_records(comments: &[Comment]) -> Self {
        let total_likes = comments.iter().map(|c| c.likes).sum();
        Self {
            total_comments: comments.len(),
            total_likes,
            average_likes: average(total_likes, comments.len()),
            comments_by_blog: count_by(comments, |c| c.blog_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: usize,
    pub active_users_last_hour: usize,
    pub active_users_last_day: usize,
    pub active_users_last_week: usize,
    pub users_by_role: BTreeMap<Role, usize>,
    pub recent_registrations: usize,
}

impl UserStats {
    pub fn from_records(users: &[User], now: DateTime<Utc>) -> Self {
        let active = TimeWindows::of(users, now, |u| u.last_active);
        Self {
            total_users: users.len(),
            active_users_last_hour: active.last_hour,
            active_users_last_day: active.last_day,
            active_users_last_week: active.last_week,
            users_by_role: count_by(users, |u| u.role),
            recent_registrations: count_since(users, now, Duration::weeks(1), |u| u.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total_notifications: usize,
    pub unread_notifications: usize,
    pub notifications_last_hour: usize,
    pub notifications_last_day: usize,
    pub notifications_last_week: usize,
    pub notifications_by_type: BTreeMap<String, usize>,
    pub notifications_by_priority: BTreeMap<Priority, usize>,
}

impl NotificationStats {
    pub fn from_records(notifications: &[Notification], now: DateTime<Utc>) -> Self {
        let recent = TimeWindows::of(notifications, now, |n| n.timestamp);
        Self {
            total_notifications: notifications.len(),
            unread_notifications: notifications.iter().filter(|n| !n.read).count(),
            notifications_last_hour: recent.last_hour,
            notifications_last_day: recent.last_day,
            notifications_last_week: recent.last_week,
            notifications_by_type: count_by(notifications, |n| n.kind.clone()),
            notifications_by_priority: count_by(notifications, |n| n.priority),
        }
    }
}
