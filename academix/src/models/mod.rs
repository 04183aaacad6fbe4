pub mod blog;
pub mod comment;
pub mod requests;
pub mod timestamp;
pub mod user;

pub use blog::*;
pub use comment::*;
pub use requests::*;
pub use user::*;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Documents that carry a like set plus its denormalized size
pub trait Likeable {
    fn likes(&self) -> &[String];
    fn likes_mut(&mut self) -> &mut Vec<String>;
    fn likes_count(&self) -> u64;
    fn set_likes_count(&mut self, count: u64);

    /// Flip `user_id`'s membership in the like set, keeping the counter in
    /// step. Returns true when the user now likes the document.
    fn toggle_like(&mut self, user_id: &str) -> bool {
        let likes = self.likes_mut();
        let liked = match likes.iter().position(|id| id == user_id) {
            Some(index) => {
                likes.remove(index);
                false
            }
            None => {
                likes.push(user_id.to_string());
                true
            }
        };
        let count = self.likes().len() as u64;
        self.set_likes_count(count);
        liked
    }
}

/// Which collection a like toggle applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Blog,
    Comment,
}

impl LikeTarget {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Comment => "comment",
        }
    }

    pub fn not_found_message(&self) -> String {
        format!("No {} found with that ID", self.label())
    }
}

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub likes_count: u64,
    /// True if the call added the like, false if it removed it
    pub user_liked: bool,
}
