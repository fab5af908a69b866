//! Observable cart store with write-through persistence.
//!
//! [`CartStore`] owns the authoritative cart. Mutations run synchronously on
//! the caller's task: they update the in-memory cart, notify subscribers, and
//! queue the exact published snapshot for a background persister. The
//! persister applies writes one at a time in mutation order and never feeds
//! anything back into memory, so a failed write only costs durability.
//! [`CartStore::flush`] reports whether the latest write reached storage.
//!
//! Restore only fills a store that has not been changed yet. Once a mutation
//! has been published, the snapshot on disk is already being replaced by it.
//!
//! ```rust,ignore
//! let store = CartStore::new(Arc::new(FileStore::new(dir)), storage_key(DEFAULT_NAMESPACE));
//! store.spawn_restore();
//!
//! store.add_to_cart(product)?;
//! store.increment(&id)?;
//! store.flush().await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use go_marketplace_core::{Product, ProductId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cart::Cart;
use crate::error::Result;
use crate::snapshot::{self, DEFAULT_NAMESPACE};
use crate::storage::{KeyValueStore, MemoryStore, StorageError};

/// What [`CartStore::restore`] found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A snapshot was loaded and replaced the in-memory cart.
    Restored { items: usize },
    /// Nothing was stored under the cart key.
    Empty,
    /// A snapshot was stored but could not be decoded; it was ignored.
    Malformed,
    /// Storage could not be read.
    Unavailable,
    /// The cart was changed before the snapshot was loaded; the snapshot was
    /// ignored.
    Superseded,
    /// Restore had already run for this store.
    AlreadyRestored,
}

/// Work for the background persister.
enum PersistCommand {
    Write(Cart),
    /// Replies with the error of the most recent write, if it failed.
    Flush(oneshot::Sender<Option<String>>),
}

/// Single source of truth for the cart.
///
/// Cheap to clone; clones share the same cart, subscribers, and persister.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: watch::Sender<Cart>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    persist: mpsc::UnboundedSender<PersistCommand>,
    restored: AtomicBool,
    mutated: AtomicBool,
}

impl CartStore {
    /// Create an empty store persisting under `key`.
    ///
    /// Spawns the persister task, so this must be called from within a
    /// Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (state, _) = watch::channel(Cart::new());
        let (persist, commands) = mpsc::unbounded_channel();

        tokio::spawn(run_persister(Arc::clone(&storage), key.clone(), commands));

        Self {
            inner: Arc::new(CartStoreInner {
                state,
                storage,
                key,
                persist,
                restored: AtomicBool::new(false),
                mutated: AtomicBool::new(false),
            }),
        }
    }

    /// Create a store backed by a fresh [`MemoryStore`] under the default key.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            snapshot::storage_key(DEFAULT_NAMESPACE),
        )
    }

    /// Storage key the cart is persisted under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Current cart.
    #[must_use]
    pub fn read(&self) -> Cart {
        self.inner.state.borrow().clone()
    }

    /// Receive every cart published from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.state.subscribe()
    }

    /// Add a product, or increment it if it is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NegativePrice`](crate::CartError::NegativePrice)
    /// if the product's price is below zero, or
    /// [`CartError::TotalOutOfRange`](crate::CartError::TotalOutOfRange) if
    /// the cart total would overflow.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_to_cart(&self, product: Product) -> Result<()> {
        self.mutate(|cart| cart.add(product))
    }

    /// Raise a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`](crate::CartError::NotFound) if the id
    /// is not in the cart, or
    /// [`CartError::TotalOutOfRange`](crate::CartError::TotalOutOfRange) if
    /// the cart total would overflow.
    #[instrument(skip_all, fields(product_id = %id))]
    pub fn increment(&self, id: &ProductId) -> Result<()> {
        self.mutate(|cart| cart.increment(id))
    }

    /// Lower a line's quantity by one, removing it at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`](crate::CartError::NotFound) if the id
    /// is not in the cart.
    #[instrument(skip_all, fields(product_id = %id))]
    pub fn decrement(&self, id: &ProductId) -> Result<()> {
        self.mutate(|cart| cart.decrement(id))
    }

    /// Load the last persisted snapshot into memory.
    ///
    /// Only the first call reads storage. A missing, unreadable, or malformed
    /// snapshot leaves the in-memory cart as it is, and so does any snapshot
    /// once the cart has been changed.
    #[instrument(skip(self), fields(key = %self.inner.key))]
    pub async fn restore(&self) -> RestoreOutcome {
        if self.inner.restored.swap(true, Ordering::SeqCst) {
            return RestoreOutcome::AlreadyRestored;
        }

        let raw = match self.inner.storage.get(&self.inner.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No cart snapshot stored");
                return RestoreOutcome::Empty;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot");
                return RestoreOutcome::Unavailable;
            }
        };

        match snapshot::decode(&raw) {
            Ok(cart) => {
                let items = cart.len();
                let replaced = self.inner.state.send_if_modified(|current| {
                    if self.inner.mutated.load(Ordering::SeqCst) {
                        return false;
                    }
                    *current = cart;
                    true
                });
                if replaced {
                    info!(items, "Cart restored");
                    RestoreOutcome::Restored { items }
                } else {
                    info!(items, "Cart changed before restore, snapshot ignored");
                    RestoreOutcome::Superseded
                }
            }
            Err(e) => {
                warn!(error = %e, "Ignoring malformed cart snapshot");
                RestoreOutcome::Malformed
            }
        }
    }

    /// Run [`restore`](Self::restore) on a background task.
    #[must_use = "the handle reports the restore outcome"]
    pub fn spawn_restore(&self) -> JoinHandle<RestoreOutcome> {
        let store = self.clone();
        tokio::spawn(async move { store.restore().await })
    }

    /// Wait until every snapshot queued so far has been handed to storage.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the most recent snapshot write
    /// failed, so storage is behind the in-memory cart, or if the persister
    /// has stopped.
    pub async fn flush(&self) -> std::result::Result<(), StorageError> {
        let stopped = || StorageError::Backend("cart persister is not running".to_string());

        let (done, wait) = oneshot::channel();
        self.inner
            .persist
            .send(PersistCommand::Flush(done))
            .map_err(|_| stopped())?;

        match wait.await.map_err(|_| stopped())? {
            None => Ok(()),
            Some(message) => Err(StorageError::Backend(message)),
        }
    }

    /// Apply `op` to the cart, then publish and persist the result.
    ///
    /// Cart operations either fully apply or return an error without
    /// touching the cart, so a failed `op` publishes and persists nothing.
    fn mutate<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut Cart) -> Result<()>,
    {
        let mut outcome = Ok(());
        let mut published = None;

        self.inner.state.send_if_modified(|cart| match op(cart) {
            Ok(()) => {
                self.inner.mutated.store(true, Ordering::SeqCst);
                published = Some(cart.clone());
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome?;

        if let Some(cart) = published {
            debug!(
                items = cart.len(),
                quantity = cart.total_quantity(),
                "Cart updated"
            );
            if self.inner.persist.send(PersistCommand::Write(cart)).is_err() {
                warn!("Cart persister is not running, snapshot dropped");
            }
        }
        Ok(())
    }
}

/// Apply queued snapshot writes in order until every store handle is dropped.
async fn run_persister(
    storage: Arc<dyn KeyValueStore>,
    key: String,
    mut commands: mpsc::UnboundedReceiver<PersistCommand>,
) {
    let mut last_error = None;
    while let Some(command) = commands.recv().await {
        match command {
            PersistCommand::Write(cart) => {
                last_error = persist(storage.as_ref(), &key, &cart).await.err();
            }
            PersistCommand::Flush(done) => {
                let _ = done.send(last_error.clone());
            }
        }
    }
    debug!(key = %key, "Cart persister stopped");
}

async fn persist(
    storage: &dyn KeyValueStore,
    key: &str,
    cart: &Cart,
) -> std::result::Result<(), String> {
    let raw = snapshot::encode(cart).map_err(|e| {
        warn!(error = %e, key, "Failed to encode cart snapshot");
        e.to_string()
    })?;

    storage.set(key, &raw).await.map_err(|e| {
        warn!(error = %e, key, "Failed to persist cart snapshot");
        e.to_string()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::error::CartError;

    const KEY: &str = "@GoMarketplace:products";

    /// Backend whose every call fails.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Err(StorageError::Backend("device storage unavailable".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Backend("device storage full".to_string()))
        }
    }

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn product(s: &str, price: i64) -> Product {
        Product::new(id(s), format!("Product {s}"), format!("{s}.png"), Decimal::new(price, 0))
    }

    fn store_with_memory() -> (CartStore, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::new(storage.clone(), KEY);
        (store, storage)
    }

    async fn stored_cart(storage: &MemoryStore) -> Option<Cart> {
        storage
            .get(KEY)
            .await
            .unwrap()
            .map(|raw| snapshot::decode(&raw).unwrap())
    }

    #[tokio::test]
    async fn test_add_publishes_to_subscribers() {
        let store = CartStore::in_memory();
        let mut rx = store.subscribe();

        store.add_to_cart(product("a", 10)).unwrap();

        assert!(rx.has_changed().unwrap());
        let cart = rx.borrow_and_update().clone();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_price(), Decimal::new(10, 0));
    }

    #[tokio::test]
    async fn test_persists_post_mutation_snapshot() {
        // Storage must hold the list just published, not the one before it.
        let (store, storage) = store_with_memory();

        store.add_to_cart(product("a", 10)).unwrap();
        store.flush().await.unwrap();
        assert_eq!(stored_cart(&storage).await.unwrap(), store.read());

        store.increment(&id("a")).unwrap();
        store.flush().await.unwrap();
        let stored = stored_cart(&storage).await.unwrap();
        assert_eq!(stored, store.read());
        assert_eq!(stored.get(&id("a")).unwrap().quantity.get(), 2);

        store.decrement(&id("a")).unwrap();
        store.decrement(&id("a")).unwrap();
        store.flush().await.unwrap();
        assert!(stored_cart(&storage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_writes_apply_in_mutation_order() {
        let (store, storage) = store_with_memory();

        for s in ["a", "b", "c", "a", "b", "a"] {
            store.add_to_cart(product(s, 1)).unwrap();
        }
        store.decrement(&id("c")).unwrap();
        store.flush().await.unwrap();

        let stored = stored_cart(&storage).await.unwrap();
        assert_eq!(stored, store.read());
        assert_eq!(stored.total_quantity(), 5);
    }

    #[tokio::test]
    async fn test_not_found_changes_nothing() {
        let (store, storage) = store_with_memory();
        let rx = store.subscribe();

        assert_eq!(
            store.increment(&id("ghost")),
            Err(CartError::NotFound(id("ghost")))
        );
        assert_eq!(
            store.decrement(&id("ghost")),
            Err(CartError::NotFound(id("ghost")))
        );

        store.flush().await.unwrap();
        assert!(!rx.has_changed().unwrap());
        assert!(store.read().is_empty());
        assert!(stored_cart(&storage).await.is_none());
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let storage = Arc::new(MemoryStore::new());

        let first = CartStore::new(storage.clone(), KEY);
        first.add_to_cart(product("a", 10)).unwrap();
        first.add_to_cart(product("b", 25)).unwrap();
        first.add_to_cart(product("a", 10)).unwrap();
        first.flush().await.unwrap();

        let second = CartStore::new(storage.clone(), KEY);
        assert_eq!(second.restore().await, RestoreOutcome::Restored { items: 2 });
        assert_eq!(second.read(), first.read());
        assert_eq!(second.read().total_price(), Decimal::new(45, 0));
    }

    #[tokio::test]
    async fn test_restore_notifies_subscribers() {
        let storage = Arc::new(MemoryStore::with_entry(
            KEY,
            r#"[{"id":"a","title":"A","image_url":"a.png","price":10,"quantity":2}]"#,
        ));
        let store = CartStore::new(storage, KEY);
        let mut rx = store.subscribe();

        assert_eq!(
            store.spawn_restore().await.unwrap(),
            RestoreOutcome::Restored { items: 1 }
        );

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_restore_without_snapshot() {
        let store = CartStore::in_memory();
        assert_eq!(store.restore().await, RestoreOutcome::Empty);
        assert!(store.read().is_empty());
    }

    #[tokio::test]
    async fn test_restore_malformed_snapshot_is_empty_cart() {
        let storage = Arc::new(MemoryStore::with_entry(KEY, "{\"products\": oops"));
        let store = CartStore::new(storage, KEY);

        assert_eq!(store.restore().await, RestoreOutcome::Malformed);
        assert!(store.read().is_empty());
    }

    #[tokio::test]
    async fn test_restore_runs_once() {
        let storage = Arc::new(MemoryStore::with_entry(
            KEY,
            r#"[{"id":"a","title":"A","image_url":"a.png","price":10,"quantity":1}]"#,
        ));
        let store = CartStore::new(storage, KEY);

        assert_eq!(store.restore().await, RestoreOutcome::Restored { items: 1 });
        store.increment(&id("a")).unwrap();

        assert_eq!(store.restore().await, RestoreOutcome::AlreadyRestored);
        assert_eq!(store.read().total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_broken_storage_keeps_memory_authoritative() {
        let store = CartStore::new(Arc::new(BrokenStore), KEY);

        assert_eq!(store.restore().await, RestoreOutcome::Unavailable);

        store.add_to_cart(product("a", 10)).unwrap();
        store.add_to_cart(product("a", 10)).unwrap();

        assert!(matches!(
            store.flush().await,
            Err(StorageError::Backend(message)) if message.contains("device storage full")
        ));
        assert_eq!(store.read().total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_flush_without_writes() {
        let store = CartStore::new(Arc::new(BrokenStore), KEY);
        assert!(store.flush().await.is_ok());
    }

    #[tokio::test]
    async fn test_repeated_flush_after_write() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::new(storage.clone(), KEY);

        store.add_to_cart(product("a", 1)).unwrap();
        store.flush().await.unwrap();
        store.flush().await.unwrap();
        assert_eq!(stored_cart(&storage).await.unwrap(), store.read());
    }

    #[tokio::test]
    async fn test_mutation_before_restore_wins() {
        let storage = Arc::new(MemoryStore::with_entry(
            KEY,
            r#"[{"id":"old","title":"Old","image_url":"old.png","price":10,"quantity":1}]"#,
        ));
        let store = CartStore::new(storage.clone(), KEY);

        store.add_to_cart(product("new", 5)).unwrap();
        assert_eq!(store.restore().await, RestoreOutcome::Superseded);
        store.flush().await.unwrap();

        let memory = store.read();
        assert!(memory.contains(&id("new")));
        assert!(!memory.contains(&id("old")));
        assert_eq!(stored_cart(&storage).await.unwrap(), memory);
    }

    #[tokio::test]
    async fn test_failed_mutation_does_not_supersede_restore() {
        let storage = Arc::new(MemoryStore::with_entry(
            KEY,
            r#"[{"id":"old","title":"Old","image_url":"old.png","price":10,"quantity":1}]"#,
        ));
        let store = CartStore::new(storage, KEY);

        assert!(store.increment(&id("ghost")).is_err());
        assert_eq!(store.restore().await, RestoreOutcome::Restored { items: 1 });
        assert!(store.read().contains(&id("old")));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = CartStore::in_memory();
        let other = store.clone();

        other.add_to_cart(product("a", 3)).unwrap();

        assert_eq!(store.read(), other.read());
        assert_eq!(store.key(), KEY);
    }
}
