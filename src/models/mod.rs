pub mod review;
pub mod user;
pub mod walk;

pub use review::{Review, sort_newest_first};
pub use user::UserInfo;
pub use walk::{FINISHED_STATUSES, Walk, finished_walks};
