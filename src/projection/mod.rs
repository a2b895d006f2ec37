//! Reshapes raw rows into what clients are allowed to see.
//!
//! Every post and comment goes through [`merge_identity`], which drops the
//! author's real identity unless the viewer is the author or a friend.
//! Anything built here must still pass [`assert_no_leakage`] before it is
//! written to a response.
pub mod boards;
pub mod identity;
pub mod leakage;
pub mod post;
pub mod search;

pub use boards::{process_boards_notifications, process_boards_summary};
pub use boards::{BoardNotifications, BoardSummary};
pub use identity::{merge_identity, resolve_image_url};
pub use identity::{ProjectedIdentity, SecretIdentity, UserIdentity};
pub use leakage::{assert_no_leakage, LeakageError};
pub use post::{make_comment, make_post, make_thread};
pub use post::{PostTags, ServerComment, ServerPost, ServerThread};
pub use search::{make_search_result, make_tagged_post};
pub use search::{SearchTags, ServerPostWithTags, ServerTaggedPost};
