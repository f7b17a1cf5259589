use super::auth::{
    AuthToken, AuthTokenValue, PromptifyHasher, UserAuthCredentials, UsernamePasswordCredentials,
};
use super::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY,
    handle TEXT NOT NULL UNIQUE,
    created INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_user_handle ON user(handle);

CREATE TABLE IF NOT EXISTS user_password_credentials (
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    salt TEXT NOT NULL,
    hash TEXT NOT NULL,
    hasher TEXT NOT NULL,
    created INTEGER NOT NULL,
    last_used INTEGER
);

CREATE TABLE IF NOT EXISTS auth_token (
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    value TEXT NOT NULL UNIQUE,
    created INTEGER NOT NULL,
    last_used INTEGER
);
CREATE INDEX IF NOT EXISTS idx_auth_token_value ON auth_token(value);
";

fn to_secs(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

fn from_secs(secs: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64)
}

/// SQLite-backed store for users, password credentials and session tokens.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open user database at {:?}", path))?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize user database schema")?;
        debug!("User database schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user (handle, created) VALUES (?1, ?2)",
            params![user_handle, to_secs(SystemTime::now())],
        )
        .with_context(|| format!("Failed to create user {}", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM user WHERE handle = ?1",
                params![user_handle],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| id as usize))
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT handle FROM user WHERE id = ?1",
                params![user_id as i64],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut statement = conn.prepare("SELECT handle FROM user ORDER BY id")?;
        let handles = statement
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(handles)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        let user_id = match self.get_user_id(user_handle)? {
            Some(id) => id,
            None => return Ok(None),
        };

        let conn = self.conn.lock().unwrap();
        let username_password = conn
            .query_row(
                "SELECT salt, hash, hasher, created, last_used
                 FROM user_password_credentials WHERE user_id = ?1",
                params![user_id as i64],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )
            .optional()?
            .map(|(salt, hash, hasher, created, last_used)| {
                let hasher = PromptifyHasher::from_str(&hasher)?;
                Ok::<_, anyhow::Error>(UsernamePasswordCredentials {
                    user_id,
                    salt,
                    hash,
                    hasher,
                    created: from_secs(created),
                    last_used: last_used.map(from_secs),
                })
            })
            .transpose()?;

        Ok(Some(UserAuthCredentials {
            user_id,
            username_password,
        }))
    }

    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM user_password_credentials WHERE user_id = ?1",
            params![credentials.user_id as i64],
        )?;
        if let Some(password) = &credentials.username_password {
            tx.execute(
                "INSERT INTO user_password_credentials (user_id, salt, hash, hasher, created, last_used)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    credentials.user_id as i64,
                    password.salt,
                    password.hash,
                    password.hasher.to_string(),
                    to_secs(password.created),
                    password.last_used.map(to_secs),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![token.0],
                |row| {
                    Ok(AuthToken {
                        user_id: row.get::<_, i64>(0)? as usize,
                        value: AuthTokenValue(row.get(1)?),
                        created: from_secs(row.get(2)?),
                        last_used: row.get::<_, Option<i64>>(3)?.map(from_secs),
                    })
                },
            )
            .optional()?)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let existing = self.get_user_auth_token(token)?;
        if existing.is_some() {
            let conn = self.conn.lock().unwrap();
            conn.execute("DELETE FROM auth_token WHERE value = ?1", params![token.0])?;
        }
        Ok(existing)
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![to_secs(SystemTime::now()), token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (user_id, value, created, last_used) VALUES (?1, ?2, ?3, ?4)",
            params![
                token.user_id as i64,
                token.value.0,
                to_secs(token.created),
                token.last_used.map(to_secs),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteUserStore {
        SqliteUserStore::in_memory().unwrap()
    }

    #[test]
    fn creates_and_looks_up_users() {
        let store = store();
        let id = store.create_user("alice").unwrap();

        assert_eq!(store.get_user_id("alice").unwrap(), Some(id));
        assert_eq!(store.get_user_handle(id).unwrap(), Some("alice".to_string()));
        assert_eq!(store.get_user_id("bob").unwrap(), None);
    }

    #[test]
    fn rejects_duplicate_handles() {
        let store = store();
        store.create_user("alice").unwrap();
        assert!(store.create_user("alice").is_err());
    }

    #[test]
    fn lists_all_handles_in_creation_order() {
        let store = store();
        store.create_user("alice").unwrap();
        store.create_user("bob").unwrap();
        assert_eq!(
            store.get_all_user_handles().unwrap(),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[test]
    fn credentials_roundtrip() {
        let store = store();
        let user_id = store.create_user("alice").unwrap();

        assert!(store
            .get_user_auth_credentials("alice")
            .unwrap()
            .unwrap()
            .username_password
            .is_none());
        assert!(store.get_user_auth_credentials("bob").unwrap().is_none());

        let credentials = UserAuthCredentials {
            user_id,
            username_password: Some(UsernamePasswordCredentials {
                user_id,
                salt: "salt".to_string(),
                hash: "hash".to_string(),
                hasher: PromptifyHasher::Argon2,
                created: SystemTime::now(),
                last_used: None,
            }),
        };
        store.update_user_auth_credentials(credentials).unwrap();

        let loaded = store
            .get_user_auth_credentials("alice")
            .unwrap()
            .unwrap()
            .username_password
            .unwrap();
        assert_eq!(loaded.salt, "salt");
        assert_eq!(loaded.hash, "hash");
    }

    #[test]
    fn auth_token_lifecycle() {
        let store = store();
        let user_id = store.create_user("alice").unwrap();

        let token = AuthToken {
            user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        store.add_user_auth_token(token.clone()).unwrap();

        let loaded = store.get_user_auth_token(&token.value).unwrap().unwrap();
        assert_eq!(loaded.user_id, user_id);
        assert!(loaded.last_used.is_none());

        store
            .update_user_auth_token_last_used_timestamp(&token.value)
            .unwrap();
        let loaded = store.get_user_auth_token(&token.value).unwrap().unwrap();
        assert!(loaded.last_used.is_some());

        let deleted = store.delete_user_auth_token(&token.value).unwrap();
        assert!(deleted.is_some());
        assert!(store.get_user_auth_token(&token.value).unwrap().is_none());
        assert!(store.delete_user_auth_token(&token.value).unwrap().is_none());
    }
}
