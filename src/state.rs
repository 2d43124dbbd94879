use std::sync::Arc;

use crate::auth::{AccountStore, TokenSigner};
use crate::config::AppConfig;
use crate::content::{FieldPolicy, PageService};
use crate::storage::DocumentStore;
use crate::upload::UploadReceiver;

#[derive(Clone)]
pub struct AppState {
    pub pages: PageService,
    pub accounts: Arc<AccountStore>,
    pub tokens: Arc<TokenSigner>,
    pub uploads: Arc<UploadReceiver>,
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        policy: FieldPolicy,
        accounts: AccountStore,
        tokens: TokenSigner,
        uploads: UploadReceiver,
    ) -> Self {
        Self {
            pages: PageService::new(store, policy),
            accounts: Arc::new(accounts),
            tokens: Arc::new(tokens),
            uploads: Arc::new(uploads),
            cors_origins: Vec::new(),
        }
    }

    /// Wires every component from configuration around an opened store.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        let accounts = AccountStore::new(Arc::clone(&store), config.bcrypt_cost);
        let tokens = TokenSigner::new(&config.jwt_secret, config.token_ttl_secs);
        let uploads = UploadReceiver::new(
            config.upload_dir.clone(),
            config.max_upload_bytes,
            config.base_url.clone(),
        );
        let mut state = Self::new(store, config.field_policy, accounts, tokens, uploads);
        state.cors_origins = config.cors_allowed_origins.clone();
        state
    }
}
