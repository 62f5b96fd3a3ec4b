use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::db::models::{FeedPost, Post};
use crate::db::StoreError;
use crate::state::DbPool;

/// Posts and their like sets.
///
/// Every mutation that reads before it writes runs inside one immediate
/// transaction, so concurrent requests against the same post or owner
/// serialize instead of overwriting each other.
#[derive(Clone)]
pub struct PostStore {
    pool: DbPool,
}

impl PostStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn get(&self, post_id: &str) -> Result<Option<Post>, StoreError> {
        let conn = self.pool.get()?;
        load_post(&conn, post_id)
    }

    /// Create a post owned by `owner_id` with an empty like set. The post
    /// shows up in the owner's post list as soon as the call returns.
    pub fn create(&self, owner_id: &str, content: &str) -> Result<Post, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let owner_exists: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM users WHERE id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        if !owner_exists {
            return Err(StoreError::NotFound("user"));
        }

        let id = uuid::Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO posts (id, user_id, content) VALUES (?1, ?2, ?3)",
            params![id, owner_id, content],
        )?;

        let post = load_post(&tx, &id)?.ok_or(StoreError::NotFound("post"))?;
        tx.commit()?;
        Ok(post)
    }

    /// Replace a post's content in place.
    pub fn update_content(&self, post_id: &str, content: &str) -> Result<Post, StoreError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE posts SET content = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![content, post_id],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound("post"));
        }
        load_post(&conn, post_id)?.ok_or(StoreError::NotFound("post"))
    }

    /// Add `user_id` to the post's likes if absent, remove it if present.
    /// Applying it twice leaves the like set as it was.
    pub fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<Post, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StoreError::NotFound("post"));
        }

        let removed = tx.execute(
            "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        if removed == 0 {
            tx.execute(
                "INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?1, ?2)",
                params![post_id, user_id],
            )?;
        }

        let post = load_post(&tx, post_id)?.ok_or(StoreError::NotFound("post"))?;
        tx.commit()?;
        Ok(post)
    }

    /// Posts owned by `user_id`, oldest first.
    pub fn list_by_owner(&self, user_id: &str) -> Result<Vec<Post>, StoreError> {
        let conn = self.pool.get()?;
        let ids = {
            let mut stmt =
                conn.prepare("SELECT id FROM posts WHERE user_id = ?1 ORDER BY rowid")?;
            let ids = stmt
                .query_map(params![user_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(post) = load_post(&conn, &id)? {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    /// Everyone else's posts, newest first, with the author's username.
    pub fn list_others(&self, user_id: &str) -> Result<Vec<FeedPost>, StoreError> {
        let conn = self.pool.get()?;
        let rows = {
            let mut stmt = conn.prepare(
                "SELECT p.id, u.username FROM posts p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.user_id != ?1
                 ORDER BY p.rowid DESC",
            )?;
            let rows = stmt
                .query_map(params![user_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut feed = Vec::with_capacity(rows.len());
        for (id, author) in rows {
            if let Some(post) = load_post(&conn, &id)? {
                feed.push(FeedPost { post, author });
            }
        }
        Ok(feed)
    }
}

fn load_post(conn: &Connection, post_id: &str) -> Result<Option<Post>, StoreError> {
    let post = conn
        .query_row(
            "SELECT id, user_id, content, created_at, updated_at FROM posts WHERE id = ?1",
            params![post_id],
            |row| {
                Ok(Post {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    content: row.get(2)?,
                    likes: Vec::new(),
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )
        .optional()?;

    let Some(mut post) = post else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT user_id FROM post_likes WHERE post_id = ?1 ORDER BY seq")?;
    post.likes = stmt
        .query_map(params![post.id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(Some(post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewUser;
    use crate::db::tests::test_pool;
    use crate::db::UserDirectory;

    struct Fixture {
        users: UserDirectory,
        posts: PostStore,
    }

    fn fixture() -> Fixture {
        let pool = test_pool();
        Fixture {
            users: UserDirectory::new(pool.clone()),
            posts: PostStore::new(pool),
        }
    }

    fn register(users: &UserDirectory, name: &str) -> String {
        users
            .insert(NewUser {
                username: name.to_lowercase(),
                name: name.into(),
                age: 25,
                email: format!("{}@x.com", name.to_lowercase()),
                password_hash: "hash".into(),
            })
            .unwrap()
            .id
    }

    #[test]
    fn create_appends_to_owner_posts_with_empty_likes() {
        let f = fixture();
        let alice = register(&f.users, "Alice");

        let post = f.posts.create(&alice, "hello").unwrap();
        assert_eq!(post.content, "hello");
        assert_eq!(post.user_id, alice);
        assert!(post.likes.is_empty());

        let owner = f.users.find_by_id(&alice).unwrap().unwrap();
        assert_eq!(owner.posts, vec![post.id.clone()]);
    }

    #[test]
    fn owner_posts_keep_creation_order() {
        let f = fixture();
        let alice = register(&f.users, "Alice");

        let first = f.posts.create(&alice, "one").unwrap();
        let second = f.posts.create(&alice, "two").unwrap();
        let third = f.posts.create(&alice, "three").unwrap();

        let owner = f.users.find_by_id(&alice).unwrap().unwrap();
        assert_eq!(owner.posts, vec![first.id, second.id, third.id]);

        let listed: Vec<String> = f
            .posts
            .list_by_owner(&alice)
            .unwrap()
            .into_iter()
            .map(|p| p.content)
            .collect();
        assert_eq!(listed, vec!["one", "two", "three"]);
    }

    #[test]
    fn create_for_missing_owner_is_not_found() {
        let f = fixture();
        let err = f.posts.create("ghost", "hello").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("user")));
    }

    #[test]
    fn update_content_replaces_in_place() {
        let f = fixture();
        let alice = register(&f.users, "Alice");
        let post = f.posts.create(&alice, "draft").unwrap();

        let updated = f.posts.update_content(&post.id, "final").unwrap();
        assert_eq!(updated.id, post.id);
        assert_eq!(updated.content, "final");
        assert_eq!(f.posts.get(&post.id).unwrap().unwrap().content, "final");
    }

    #[test]
    fn update_missing_post_is_not_found() {
        let f = fixture();
        let err = f.posts.update_content("nope", "x").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("post")));
    }

    #[test]
    fn toggle_like_adds_then_removes() {
        let f = fixture();
        let alice = register(&f.users, "Alice");
        let bob = register(&f.users, "Bob");
        let post = f.posts.create(&alice, "hello").unwrap();

        let liked = f.posts.toggle_like(&post.id, &bob).unwrap();
        assert_eq!(liked.likes, vec![bob.clone()]);
        assert!(liked.is_liked_by(&bob));

        let unliked = f.posts.toggle_like(&post.id, &bob).unwrap();
        assert!(unliked.likes.is_empty());
    }

    #[test]
    fn toggle_like_twice_restores_original_set() {
        let f = fixture();
        let alice = register(&f.users, "Alice");
        let bob = register(&f.users, "Bob");
        let carol = register(&f.users, "Carol");
        let post = f.posts.create(&alice, "hello").unwrap();

        f.posts.toggle_like(&post.id, &alice).unwrap();
        let before = f.posts.toggle_like(&post.id, &carol).unwrap().likes;

        f.posts.toggle_like(&post.id, &bob).unwrap();
        let after = f.posts.toggle_like(&post.id, &bob).unwrap().likes;
        assert_eq!(after, before);

        // Removing a middle entry keeps the others in order.
        f.posts.toggle_like(&post.id, &alice).unwrap();
        let after = f.posts.get(&post.id).unwrap().unwrap().likes;
        assert_eq!(after, vec![carol]);
    }

    #[test]
    fn like_set_never_holds_duplicates() {
        let f = fixture();
        let alice = register(&f.users, "Alice");
        let bob = register(&f.users, "Bob");
        let post = f.posts.create(&alice, "hello").unwrap();

        for _ in 0..5 {
            let post = f.posts.toggle_like(&post.id, &bob).unwrap();
            let count = post.likes.iter().filter(|id| **id == bob).count();
            assert!(count <= 1);
        }
    }

    #[test]
    fn toggle_like_on_missing_post_is_not_found() {
        let f = fixture();
        let err = f.posts.toggle_like("nope", "someone").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("post")));
    }

    #[test]
    fn list_others_excludes_viewer_and_names_authors() {
        let f = fixture();
        let alice = register(&f.users, "Alice");
        let bob = register(&f.users, "Bob");
        f.posts.create(&alice, "mine").unwrap();
        f.posts.create(&bob, "bob's first").unwrap();
        f.posts.create(&bob, "bob's second").unwrap();

        let feed = f.posts.list_others(&alice).unwrap();
        let entries: Vec<(&str, &str)> = feed
            .iter()
            .map(|f| (f.author.as_str(), f.post.content.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![("bob", "bob's second"), ("bob", "bob's first")]
        );
    }
}
