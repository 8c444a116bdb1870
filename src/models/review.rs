use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub walk_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Review {
    /// Creation time in epoch milliseconds. Missing, blank or unparsable
    /// timestamps count as epoch 0.
    pub fn created_at_millis(&self) -> i64 {
        self.created_at
            .as_deref()
            .map(str::trim)
            .filter(|ts| !ts.is_empty())
            .and_then(parse_timestamp)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }
}

/// RFC 3339, or ISO-8601 with an offset but no seconds ("2024-01-01T10:00Z").
fn parse_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt);
    }
    let ts = match ts.strip_suffix(['Z', 'z']) {
        Some(local) => format!("{}+00:00", local),
        None => ts.to_string(),
    };
    DateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M%#z").ok()
}

/// Most recent first. Stable, so reviews with equal timestamps keep the
/// server order.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by_key(|review| std::cmp::Reverse(review.created_at_millis()));
}
