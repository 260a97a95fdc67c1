use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{error, management::TokenManager, spotify, success, types::PkceToken};

pub async fn auth(shared_state: Arc<Mutex<Option<PkceToken>>>) {
    spotify::auth::auth(shared_state).await;
}

pub async fn logout() {
    match TokenManager::clear().await {
        Ok(()) => success!("Cached token removed"),
        Err(e) => error!("Failed to remove cached token: {}", e),
    }
}
