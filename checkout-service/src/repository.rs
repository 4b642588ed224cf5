//! Checkout repository
//!
//! Persistence contract for checkout progress.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::models::CheckoutState;

/// Checkout repository trait for the external session/order store
#[allow(async_fn_in_trait)]
pub trait CheckoutRepository: Send + Sync {
    /// Load stored progress for a cart
    async fn load(&self, cart_token: &str) -> Result<Option<CheckoutState>>;

    /// Persist progress, replacing whatever was stored for the same cart
    async fn save(&self, state: &CheckoutState) -> Result<()>;
}

/// In-memory repository for testing and development
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    states: RwLock<HashMap<String, CheckoutState>>,
    saves: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CheckoutRepository for InMemoryRepository {
    async fn load(&self, cart_token: &str) -> Result<Option<CheckoutState>> {
        let states = self
            .states
            .read()
            .map_err(|_| anyhow!("checkout store lock poisoned"))?;
        Ok(states.get(cart_token).cloned())
    }

    async fn save(&self, state: &CheckoutState) -> Result<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| anyhow!("checkout store lock poisoned"))?;
        states.insert(state.cart_token.clone(), state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
