//! Saved-items synchronization.
//!
//! `SavedItems` tracks which events and places the signed-in user has
//! bookmarked. Membership is read from the cached saved lists; mutations go
//! to the server and, once confirmed, invalidate and refetch only the list
//! of the affected kind so every reader converges on server state.
//!
//! Per item the state moves `Unsaved -> SavePending -> Saved` and
//! `Saved -> UnsavePending -> Unsaved`. A failed request falls back to the
//! previous settled state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::{routes, ApiClient};
use crate::auth::SessionHandle;
use crate::cache::QueryCache;
use crate::error::{Error, Result};
use crate::models::item::ItemRef;
use crate::models::{Event, ItemKind, Place, SavableItem};
use crate::notify::{Notice, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Unsaved,
    SavePending,
    Saved,
    UnsavePending,
}

impl SaveState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SaveState::SavePending | SaveState::UnsavePending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Save,
    Unsave,
}

type InFlight = Arc<Mutex<HashMap<SavableItem, Direction>>>;

/// Releases the item's in-flight slot when the mutation finishes or its
/// future is dropped.
struct InFlightGuard {
    table: InFlight,
    item: SavableItem,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.remove(&self.item);
    }
}

#[derive(Clone)]
pub struct SavedItems {
    api: ApiClient,
    cache: Arc<QueryCache>,
    session: SessionHandle,
    notifier: Notifier,
    in_flight: InFlight,
}

impl SavedItems {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>, notifier: Notifier) -> Self {
        let session = api.session().clone();
        Self {
            api,
            cache,
            session,
            notifier,
            in_flight: Arc::default(),
        }
    }

    /// True iff `id` is in the cached saved list for `kind`. Never fetches.
    pub fn is_item_saved(&self, id: i64, kind: ItemKind) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }
        self.cache
            .get::<Vec<ItemRef>>(&routes::saved_list_key(kind))
            .map(|items| items.iter().any(|item| item.id == id))
            .unwrap_or(false)
    }

    pub fn state(&self, id: i64, kind: ItemKind) -> SaveState {
        let pending = {
            let table = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            table.get(&SavableItem::new(id, kind)).copied()
        };
        match pending {
            Some(Direction::Save) => SaveState::SavePending,
            Some(Direction::Unsave) => SaveState::UnsavePending,
            None if self.is_item_saved(id, kind) => SaveState::Saved,
            None => SaveState::Unsaved,
        }
    }

    /// Unsave if saved, else save. Returns the state after the server answered.
    ///
    /// While a change to the same item is in flight the toggle is disabled
    /// and the pending state is returned without sending anything.
    pub async fn toggle_save(&self, id: i64, kind: ItemKind) -> Result<SaveState> {
        let result = match self.state(id, kind) {
            state if state.is_pending() => {
                debug!(kind = %kind, id = id, "Toggle ignored while a change is in flight");
                return Ok(state);
            }
            SaveState::Saved => self.unsave(id, kind).await,
            _ => self.save(id, kind).await,
        };

        match result {
            Ok(()) | Err(Error::MutationInFlight { .. }) => Ok(self.state(id, kind)),
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, id: i64, kind: ItemKind) -> Result<()> {
        self.mutate(id, kind, Direction::Save).await
    }

    pub async fn unsave(&self, id: i64, kind: ItemKind) -> Result<()> {
        self.mutate(id, kind, Direction::Unsave).await
    }

    async fn mutate(&self, id: i64, kind: ItemKind, direction: Direction) -> Result<()> {
        if !self.session.is_authenticated() {
            info!(kind = %kind, id = id, "Sign-in required to change saved items");
            self.notifier.notify(Notice::LoginRequired);
            return Err(Error::AuthenticationRequired);
        }

        let _guard = self
            .begin(SavableItem::new(id, kind), direction)
            .ok_or(Error::MutationInFlight { id, kind })?;

        let sent = match direction {
            Direction::Save => self.api.save_item(kind, id).await,
            Direction::Unsave => self.api.unsave_item(kind, id).await,
        };

        if let Err(source) = sent {
            let err = match direction {
                Direction::Save => Error::SaveFailed { id, kind, source },
                Direction::Unsave => Error::UnsaveFailed { id, kind, source },
            };
            error!(error = %err, "Saved item change failed");
            self.notifier.failure(err.user_message());
            return Err(err);
        }

        info!(kind = %kind, id = id, ?direction, "Saved item change confirmed");
        self.cache.invalidate(&routes::saved_list_key(kind));
        self.notifier.success(match direction {
            Direction::Save => format!("Saved {}", kind),
            Direction::Unsave => format!("Removed {} from saved", kind),
        });

        // Keep the pending state until the list reflects the server
        if let Err(e) = self.refresh(kind).await {
            warn!(kind = %kind, error = %e, "Refetch after saved item change failed");
        }
        Ok(())
    }

    fn begin(&self, item: SavableItem, direction: Direction) -> Option<InFlightGuard> {
        let mut table = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if table.contains_key(&item) {
            return None;
        }
        table.insert(item, direction);
        Some(InFlightGuard {
            table: Arc::clone(&self.in_flight),
            item,
        })
    }

    async fn list(&self, kind: ItemKind) -> Result<Value> {
        if !self.session.is_authenticated() {
            return Ok(Value::Array(Vec::new()));
        }
        let key = routes::saved_list_key(kind);
        let value = self.cache.fetch(&key, || self.api.fetch_saved(kind)).await?;
        Ok(value)
    }

    /// Force a refetch of the saved list for `kind`.
    pub async fn refresh(&self, kind: ItemKind) -> Result<()> {
        self.cache.invalidate(&routes::saved_list_key(kind));
        self.list(kind).await.map(|_| ())
    }

    /// Refetch both saved lists concurrently.
    pub async fn refresh_all(&self) -> Result<()> {
        let (events, places) = futures::join!(
            self.refresh(ItemKind::Event),
            self.refresh(ItemKind::Place)
        );
        events.and(places)
    }

    pub async fn saved_events(&self) -> Result<Vec<Event>> {
        let value = self.list(ItemKind::Event).await?;
        serde_json::from_value(value).map_err(|e| Error::Api(e.into()))
    }

    pub async fn saved_places(&self) -> Result<Vec<Place>> {
        let value = self.list(ItemKind::Place).await?;
        serde_json::from_value(value).map_err(|e| Error::Api(e.into()))
    }
}
