use serde::{Deserialize, Serialize};

/// Stored in `users.profile_pic` until a picture is uploaded.
pub const DEFAULT_PROFILE_PIC: &str = "default.png";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub age: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_pic: String,
    /// Ids of posts owned by this user, oldest first.
    pub posts: Vec<String>,
    pub created_at: String,
}

impl User {
    pub fn has_profile_pic(&self) -> bool {
        self.profile_pic != DEFAULT_PROFILE_PIC
    }

    /// URL the profile picture is served from.
    pub fn avatar_url(&self) -> String {
        if self.has_profile_pic() {
            format!("/uploads/{}", self.profile_pic)
        } else {
            "/assets/images/default-avatar.svg".to_string()
        }
    }
}

/// Fields supplied at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub age: i64,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub content: String,
    /// Ids of users who liked the post, in the order they liked it.
    pub likes: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Post {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// A post together with its author's username, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    pub post: Post,
    pub author: String,
}
