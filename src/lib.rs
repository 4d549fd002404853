use std::sync::Arc;

use axum::{
    routing::{any, get, put},
    Router,
};

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod store;

use clock::{Clock, SystemClock};
use ids::{IdGenerator, UuidGenerator};
use store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub store: UserStore,
    pub ids: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: UserStore) -> Self {
        Self::with_collaborators(store, Arc::new(UuidGenerator), Arc::new(SystemClock))
    }

    pub fn with_collaborators(
        store: UserStore,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, ids, clock }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", any(handlers::health))
        .route(
            "/users",
            get(handlers::list_users)
                .post(handlers::add_user)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/users/*id",
            put(handlers::update_user)
                .delete(handlers::delete_user)
                .fallback(handlers::user_method_not_allowed),
        )
        .fallback(handlers::fallback)
        .with_state(state)
}
