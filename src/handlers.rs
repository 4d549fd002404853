use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{error::ApiError, store::User, AppState};

const DEFAULT_PAGE: usize = 1;
const DEFAULT_PAGE_SIZE: usize = 10;

/// Client-writable user fields. Absent fields become empty strings and
/// server-owned fields (`id`, `createdAt`, `updatedAt`) are ignored.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPayload {
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub password: String,
    pub email: String,
    pub country: String,
}

impl UserPayload {
    /// Reads the first JSON value of the body; anything after it is ignored.
    /// A `null` value decodes to an all-empty payload.
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Option<Self>>();
        match values.next() {
            Some(Ok(payload)) => Ok(payload.unwrap_or_default()),
            Some(Err(e)) => {
                warn!("Error decoding user: {}", e);
                Err(ApiError::InvalidInput)
            }
            None => {
                warn!("Error decoding user: empty body");
                Err(ApiError::InvalidInput)
            }
        }
    }

    pub fn into_user(
        self,
        id: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            nickname: self.nickname,
            password: self.password,
            email: self.email,
            country: self.country,
            created_at,
            updated_at,
        }
    }
}

/// Listing parameters after coercion: `page` and `page_size` are always >= 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: usize,
    pub page_size: usize,
    pub country: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            country: None,
        }
    }
}

impl ListQuery {
    /// When a key repeats, its first occurrence wins.
    pub fn from_params(params: &[(String, String)]) -> Self {
        Self {
            page: positive_or(first(params, "page"), DEFAULT_PAGE),
            page_size: positive_or(first(params, "pageSize"), DEFAULT_PAGE_SIZE),
            country: first(params, "country").filter(|c| !c.is_empty()).cloned(),
        }
    }

    /// Filters by exact country, then cuts out the requested page.
    pub fn apply(&self, users: Vec<User>) -> Vec<User> {
        let filtered: Vec<User> = match &self.country {
            Some(country) => users.into_iter().filter(|u| &u.country == country).collect(),
            None => users,
        };
        paginate(filtered, self.page, self.page_size)
    }
}

fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a String> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn positive_or(raw: Option<&String>, default: usize) -> usize {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(default)
}

/// Page numbers start at 1. Pages past the end are empty.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Vec<T> {
    let len = items.len();
    let start = page.saturating_sub(1).saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    items.into_iter().skip(start).take(end - start).collect()
}

fn require_id(id: String) -> Result<String, ApiError> {
    if id.is_empty() || id == "/" {
        warn!("User ID missing from path");
        return Err(ApiError::MissingId);
    }
    Ok(id)
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<User>> {
    let query = ListQuery::from_params(&params);
    debug!(?query, "Listing users");
    Json(query.apply(state.store.list()))
}

pub async fn add_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let payload = UserPayload::decode(&body)?;

    let now = state.clock.now();
    let user = payload.into_user(state.ids.generate(), now, now);

    state.store.add(user.clone());
    info!(id = %user.id, "User added");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<User>, ApiError> {
    let id = require_id(id)?;
    let payload = UserPayload::decode(&body)?;

    let existing = state.store.get(&id).ok_or_else(|| {
        warn!(%id, "User not found");
        ApiError::NotFound
    })?;

    let user = payload.into_user(existing.id, existing.created_at, state.clock.now());
    state.store.update(user.clone());
    info!(id = %user.id, "User updated");
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = require_id(id)?;

    if state.store.get(&id).is_none() {
        warn!(%id, "User not found");
        return Err(ApiError::NotFound);
    }

    state.store.delete(&id);
    info!(%id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// The id check wins over the method check on `/users/{id}`.
pub async fn user_method_not_allowed(Path(id): Path<String>) -> ApiError {
    match require_id(id) {
        Ok(_) => ApiError::MethodNotAllowed,
        Err(e) => e,
    }
}

/// Catches `/users/` and `/users//`, which the id route never matches.
pub async fn fallback(uri: Uri) -> Result<StatusCode, ApiError> {
    match uri.path().strip_prefix("/users/") {
        Some(rest) => require_id(rest.to_string()).map(|_| StatusCode::NOT_FOUND),
        None => Ok(StatusCode::NOT_FOUND),
    }
}
