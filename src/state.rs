use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::{PasswordHasher, SessionCodec};
use crate::config::Config;
use crate::db::{PostStore, UserDirectory};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: UserDirectory,
    pub posts: PostStore,
    pub tokens: Arc<SessionCodec>,
    pub hasher: PasswordHasher,
}

impl AppState {
    /// Wire every component to the given pool. Fails when no signing secret
    /// is configured or the session lifetime is out of range.
    pub fn new(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let tokens = SessionCodec::new(config.token_secret()?, config.session_ttl()?);
        let hasher = PasswordHasher::new(config.auth.bcrypt_cost);

        Ok(Self {
            users: UserDirectory::new(db.clone()),
            posts: PostStore::new(db),
            tokens: Arc::new(tokens),
            hasher,
            config,
        })
    }
}
