use serde::{Deserialize, Serialize};

/// Statuses the service uses for a walk that is over.
pub const FINISHED_STATUSES: [&str; 3] = ["ended", "finished", "completed"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walk {
    pub id: i64,
    #[serde(default)]
    pub pet_id: Option<i64>,
    #[serde(default)]
    pub walker_id: Option<i64>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Walk {
    pub fn is_finished(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| FINISHED_STATUSES.contains(&status))
    }
}

/// History view: keeps only walks whose status marks them as over,
/// preserving the server order.
pub fn finished_walks(walks: Vec<Walk>) -> Vec<Walk> {
    walks.into_iter().filter(Walk::is_finished).collect()
}
