//! Raw rows as they come out of the data-fetch layer in [`crate::schema`].
//!
//! Nothing in here is safe to send to a client as-is: posts and comments
//! still carry their author's real identity. Use [`crate::projection`]
//! before serializing any of them.
pub mod board;
pub mod identity;
pub mod post;
pub mod realm;
pub mod search;
pub mod user;

pub use board::{BoardRestriction, BoardSettings, DbBoardActivity, DbBoardSummary};
pub use identity::AuthorIdentity;
pub use post::{AnonymityType, DbComment, DbPost, DbThread, PostOptions};
pub use realm::{DbRealmInvite, InviteDetails, RealmIds};
pub use search::{DbPostWithTags, DbTaggedPost};
pub use user::{DbUser, UserSetting};
