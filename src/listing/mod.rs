//! Client-side result paging, batch-list editing, and the session that owns both.

pub mod batch_list;
pub mod pages;
pub mod session;

pub use batch_list::{BatchList, DedupeOrder, SubmissionBody};
pub use pages::{
    FILES_PER_PAGE, Navigation, PageItem, PageSet, PaginationControls, PaginationCursor,
};
pub use session::{RequestStatus, SearchState, Session, SessionView};
