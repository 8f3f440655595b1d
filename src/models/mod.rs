pub mod comment;
pub mod post;
pub mod profile;
pub mod role;
pub mod subreddit;

pub use comment::{Comment, CommentVote};
pub use post::{Post, PostType, PostVote};
pub use profile::Profile;
pub use role::{Role, RoleName, UserRoleAssignment};
pub use subreddit::{Membership, SubRole, Subreddit};
