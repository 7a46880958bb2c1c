pub mod bookmarks;
pub mod filter;
pub mod progress;
pub mod review;
pub mod stats;

pub use bookmarks::BookmarkSet;
pub use filter::{FilterOptions, SortKey, SortOrder};
pub use progress::StudyProgress;
pub use stats::StudyStats;
