use crate::core::document::{self, ID_FIELD};
use crate::core::{CmsError, Document, Result};
use crate::storage::DocumentStore;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Collection holding editor accounts.
pub const ACCOUNTS_COLLECTION: &str = "logins";

const USERNAME_FIELD: &str = "username";
const PASSWORD_FIELD: &str = "password";

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Editor account as stored.
#[derive(Debug, Clone)]
pub struct Account {
    id: String,
    username: String,
    password_hash: String,
}

impl Account {
    /// Returns the account id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password hash (internal use only)
    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let field = |name: &str| {
            doc.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| CmsError::store(format!("account record is missing '{name}'")))
        };
        Ok(Self {
            id: field(ID_FIELD)?,
            username: field(USERNAME_FIELD)?,
            password_hash: field(PASSWORD_FIELD)?,
        })
    }
}

/// Registration and credential checks over the `logins` collection.
///
/// Any registered account may edit every page; there are no roles.
pub struct AccountStore {
    store: Arc<dyn DocumentStore>,
    bcrypt_cost: u32,
    /// Serializes registrations so two requests cannot claim the same name.
    registration: Mutex<()>,
}

impl AccountStore {
    pub fn new(store: Arc<dyn DocumentStore>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            bcrypt_cost,
            registration: Mutex::new(()),
        }
    }

    /// Hashes a password using bcrypt
    ///
    /// Hashing is CPU bound, so it runs on the blocking pool.
    async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// Verifies password against bcrypt hash
    ///
    /// Returns false for malformed hashes instead of failing the request.
    async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
                .await?;
        Ok(matches)
    }

    /// Looks an account up by username
    pub async fn find(&self, username: &str) -> Result<Option<Account>> {
        let username = Value::String(username.to_string());
        self.store
            .find_by_field(ACCOUNTS_COLLECTION, USERNAME_FIELD, &username)
            .await?
            .as_ref()
            .map(Account::from_document)
            .transpose()
    }

    /// Creates a new account
    pub async fn register(&self, username: &str, password: &str) -> Result<Account> {
        self.validate_username(username)?;
        self.validate_password(password)?; // Validate BEFORE hashing

        let _guard = self.registration.lock().await;
        if self.find(username).await?.is_some() {
            return Err(CmsError::validation("Username already exists"));
        }

        let mut doc = Document::new();
        doc.insert(ID_FIELD.to_string(), Value::String(document::new_id()));
        doc.insert(USERNAME_FIELD.to_string(), Value::String(username.to_string()));
        doc.insert(
            PASSWORD_FIELD.to_string(),
            Value::String(self.hash_password(password).await?),
        );

        let stored = self.store.insert(ACCOUNTS_COLLECTION, doc).await?;
        info!(username, "account registered");
        Account::from_document(&stored)
    }

    /// Authenticates an account
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account> {
        let Some(account) = self.find(username).await? else {
            warn!(username, "login for unknown account");
            return Err(CmsError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !Self::verify_password(password, account.password_hash()).await? {
            warn!(username, "login with wrong password");
            return Err(CmsError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        Ok(account)
    }

    /// Returns the number of accounts
    pub async fn count(&self) -> Result<usize> {
        self.store.count(ACCOUNTS_COLLECTION).await
    }

    /// Validates username
    fn validate_username(&self, username: &str) -> Result<()> {
        if username.trim().is_empty() {
            return Err(CmsError::validation("Username cannot be empty"));
        }

        if username.chars().count() > 50 {
            return Err(CmsError::validation("Username too long (max 50 characters)"));
        }

        Ok(())
    }

    /// Validates password length
    fn validate_password(&self, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(CmsError::validation("Password cannot be empty"));
        }

        if password.chars().count() < 8 {
            return Err(CmsError::validation(
                "Password must be at least 8 characters long",
            ));
        }

        Ok(())
    }
}
