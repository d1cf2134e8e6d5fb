//! SQLite storage implementation for customer segments, memberships and
//! segmentation runs.

mod model;
mod repository;

pub use model::{CustomerSegmentDB, MembershipDB, SegmentationRunDB};
pub use repository::SegmentationRepository;
