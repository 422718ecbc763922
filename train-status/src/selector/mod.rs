//! Candidate selection.
//!
//! Given one poll's worth of timetable records, pick the single service
//! that best answers "which train should I catch next?":
//!
//! 1. Keep records departing within `[now + min_after, now + min_after + window]`,
//!    treating clock times earlier than now as tomorrow
//! 2. Keep records that actually call at the destination
//! 3. Rank by earliest arrival, then earliest departure

mod options;
mod rank;
mod select;
mod window;

pub use options::SelectionOptions;
pub use rank::{compare_candidates, rank_candidates};
pub use select::{
    Candidate, Exclusion, Selection, departure_time, select_service, select_with_report,
};
pub use window::{SearchWindow, merge_rollover};
