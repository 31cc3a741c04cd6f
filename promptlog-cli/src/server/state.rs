use promptlog_lib::Store;

/// Shared application state for the HTTP server.
///
/// The store serializes its own operations, so handlers share it through a
/// plain `Arc<AppState>` without an outer lock.
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}
