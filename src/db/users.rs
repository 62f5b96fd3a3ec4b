use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{NewUser, User};
use crate::db::{is_constraint_violation, StoreError};
use crate::state::DbPool;

const USER_COLUMNS: &str =
    "id, username, name, age, email, password_hash, profile_pic, created_at";

/// Registered identities, keyed by id and looked up by email.
#[derive(Clone)]
pub struct UserDirectory {
    pool: DbPool,
}

impl UserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get()?;
        load_user(&conn, "email", email)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get()?;
        load_user(&conn, "id", id)
    }

    /// Insert a new identity. A second registration for the same email fails
    /// with [`StoreError::AlreadyRegistered`], even when two requests race.
    pub fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();

        conn.execute(
            "INSERT INTO users (id, username, name, age, email, password_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                new_user.username,
                new_user.name,
                new_user.age,
                new_user.email,
                new_user.password_hash
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::AlreadyRegistered
            } else {
                StoreError::Sql(e)
            }
        })?;

        load_user(&conn, "id", &id)?.ok_or(StoreError::NotFound("user"))
    }

    pub fn set_profile_pic(&self, user_id: &str, filename: &str) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE users SET profile_pic = ?1 WHERE id = ?2",
            params![filename, user_id],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }
}

fn load_user(conn: &Connection, key: &str, value: &str) -> Result<Option<User>, StoreError> {
    // `key` is always one of our own column names, never caller input.
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {key} = ?1");
    let user = conn
        .query_row(&sql, params![value], user_from_row)
        .optional()?;

    let Some(mut user) = user else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT id FROM posts WHERE user_id = ?1 ORDER BY rowid")?;
    user.posts = stmt
        .query_map(params![user.id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(Some(user))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        age: row.get(3)?,
        email: row.get(4)?,
        password_hash: row.get(5)?,
        profile_pic: row.get(6)?,
        posts: Vec::new(),
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DEFAULT_PROFILE_PIC;
    use crate::db::tests::test_pool;

    fn alice() -> NewUser {
        NewUser {
            username: "alice".into(),
            name: "Alice".into(),
            age: 30,
            email: "a@x.com".into(),
            password_hash: "$2b$04$notarealhash".into(),
        }
    }

    #[test]
    fn insert_then_find_by_email_and_id() {
        let users = UserDirectory::new(test_pool());
        let created = users.insert(alice()).unwrap();

        assert_eq!(created.email, "a@x.com");
        assert_eq!(created.profile_pic, DEFAULT_PROFILE_PIC);
        assert!(created.posts.is_empty());

        let by_email = users.find_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = users.find_by_id(&created.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
    }

    #[test]
    fn unknown_email_is_none() {
        let users = UserDirectory::new(test_pool());
        assert!(users.find_by_email("nobody@x.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_already_registered() {
        let users = UserDirectory::new(test_pool());
        users.insert(alice()).unwrap();

        let err = users.insert(alice()).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyRegistered));
    }

    #[test]
    fn set_profile_pic_updates_user() {
        let users = UserDirectory::new(test_pool());
        let created = users.insert(alice()).unwrap();

        users.set_profile_pic(&created.id, "0a1b2c.png").unwrap();

        let reloaded = users.find_by_id(&created.id).unwrap().unwrap();
        assert_eq!(reloaded.profile_pic, "0a1b2c.png");
        assert!(reloaded.has_profile_pic());
    }

    #[test]
    fn set_profile_pic_for_missing_user_is_not_found() {
        let users = UserDirectory::new(test_pool());
        let err = users.set_profile_pic("ghost", "x.png").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("user")));
    }
}
