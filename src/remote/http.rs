//! REST client for the vehicle-service backend.

use super::RemoteCollection;
use crate::config::SyncConfig;
use crate::core::{RemoteError, RemoteResult, Result, SyncError};
use crate::model::{
    Entity, Invoice, MECHANIC_ROLE, Mechanic, NewMechanic, NewVehicle, ServiceRequest,
    ServiceRequestPatch, ServiceStatus, Vehicle,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Level, event};

/// One backend call: verb, path, query parameters and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Endpoint layout for one entity kind.
pub trait HttpResource: Entity {
    const COLLECTION_PATH: &'static str;

    fn list_path() -> String {
        Self::COLLECTION_PATH.to_string()
    }

    fn create_path(_draft: &Self::Draft) -> String {
        Self::COLLECTION_PATH.to_string()
    }

    fn create_body(draft: &Self::Draft) -> serde_json::Result<Value> {
        serde_json::to_value(draft)
    }

    fn item_path(id: i64) -> String {
        format!("{}/{}", Self::COLLECTION_PATH, id)
    }

    /// Where a partial update is sent. Defaults to `PUT` on the item.
    fn update_route(id: i64, patch: &Self::Patch) -> serde_json::Result<Route> {
        Ok(Route::new(Method::PUT, Self::item_path(id)).json(serde_json::to_value(patch)?))
    }

    /// Locates the created record inside the create response.
    fn created_record(body: Value) -> Value {
        body
    }
}

// The backend exposes dedicated endpoints for status changes and assignment,
// both taking their arguments as query parameters.
impl HttpResource for ServiceRequest {
    const COLLECTION_PATH: &'static str = "/service-requests";

    fn update_route(id: i64, patch: &ServiceRequestPatch) -> serde_json::Result<Route> {
        let item = Self::item_path(id);
        let route = match patch {
            ServiceRequestPatch {
                mechanic_id: Some(mechanic_id),
                mechanic_name: _,
                status: None | Some(ServiceStatus::Assigned),
                mechanic_notes,
                description: None,
                service_type: None,
                priority: None,
                preferred_date: None,
                service_items: None,
            } => with_notes(
                Route::new(Method::POST, format!("{}/assign-mechanic", item))
                    .param("mechanicId", mechanic_id.to_string()),
                mechanic_notes,
            ),
            ServiceRequestPatch {
                mechanic_id: None,
                mechanic_name: None,
                status: Some(status),
                mechanic_notes,
                description: None,
                service_type: None,
                priority: None,
                preferred_date: None,
                service_items: None,
            } => with_notes(
                Route::new(Method::PUT, format!("{}/status", item))
                    .param("status", status.as_str()),
                mechanic_notes,
            ),
            _ => Route::new(Method::PUT, item).json(serde_json::to_value(patch)?),
        };
        Ok(route)
    }
}

fn with_notes(route: Route, notes: &Option<String>) -> Route {
    match notes.as_deref().map(str::trim) {
        Some(notes) if !notes.is_empty() => route.param("notes", notes),
        _ => route,
    }
}

impl HttpResource for Invoice {
    const COLLECTION_PATH: &'static str = "/invoices";
}

// Mechanics are users with the MECHANIC role; creating one goes through registration.
impl HttpResource for Mechanic {
    const COLLECTION_PATH: &'static str = "/users";

    fn list_path() -> String {
        format!("/users?role={}", MECHANIC_ROLE)
    }

    fn create_path(_draft: &NewMechanic) -> String {
        "/auth/register".to_string()
    }

    fn create_body(draft: &NewMechanic) -> serde_json::Result<Value> {
        let mut body = serde_json::to_value(draft)?;
        if let Value::Object(map) = &mut body {
            map.insert("role".to_string(), Value::String(MECHANIC_ROLE.to_string()));
        }
        Ok(body)
    }

    // registration answers with `{ user, token }`
    fn created_record(body: Value) -> Value {
        match body {
            Value::Object(mut map) if map.contains_key("user") => {
                map.remove("user").unwrap_or(Value::Null)
            }
            other => other,
        }
    }
}

impl HttpResource for Vehicle {
    const COLLECTION_PATH: &'static str = "/vehicles";

    fn list_path() -> String {
        "/vehicles/all".to_string()
    }

    fn create_path(draft: &NewVehicle) -> String {
        match draft.owner_id {
            Some(owner_id) => format!("/vehicles/user/{}", owner_id),
            None => Self::COLLECTION_PATH.to_string(),
        }
    }
}

/// [`RemoteCollection`] over HTTP for all four entity kinds.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> RemoteResult<Value> {
        let route = Route {
            method,
            path: path.to_string(),
            query: Vec::new(),
            body,
        };
        self.execute(route).await
    }

    async fn execute(&self, route: Route) -> RemoteResult<Value> {
        let Route {
            method,
            path,
            query,
            body,
        } = route;
        let path = path.as_str();
        let mut builder = self.request(method.clone(), path);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;
        event!(
            Level::DEBUG,
            method = %method,
            path,
            status = status.as_u16(),
            "backend responded"
        );

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => value,
                Err(err) if status.is_success() => {
                    return Err(RemoteError::Malformed(format!(
                        "{} {}: {}",
                        method, path, err
                    )));
                }
                Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        classify_response(status, body)
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::unreachable(format!("request timed out: {}", err))
    } else if err.is_decode() {
        RemoteError::Malformed(err.to_string())
    } else {
        RemoteError::unreachable(err.to_string())
    }
}

/// Maps a decoded response onto the success value or a [`RemoteError`].
///
/// Bodies may be bare JSON or a `{ success, message, data, error }` envelope.
pub(crate) fn classify_response(status: StatusCode, body: Value) -> RemoteResult<Value> {
    let explicit_failure = body.get("success").and_then(Value::as_bool) == Some(false);

    if status.is_success() && !explicit_failure {
        return Ok(unwrap_envelope(body));
    }

    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    if status.is_server_error() {
        Err(RemoteError::Unavailable {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(RemoteError::rejected(status.as_u16(), message))
    }
}

fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(|data| !data.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn error_message(body: &Value) -> Option<String> {
    match body {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Object(map) => ["message", "error"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .find(|text| !text.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn decode<T: DeserializeOwned>(body: Value, context: &str) -> RemoteResult<T> {
    serde_json::from_value(body)
        .map_err(|err| RemoteError::Malformed(format!("{}: {}", context, err)))
}

#[async_trait]
impl<E: HttpResource> RemoteCollection<E> for HttpBackend {
    async fn get_all(&self) -> RemoteResult<Vec<E>> {
        let path = E::list_path();
        let body = self.send(Method::GET, &path, None).await?;
        let items: Vec<E> = match body {
            Value::Null => Vec::new(),
            other => decode(other, &path)?,
        };
        Ok(items.into_iter().map(Entity::into_canonical).collect())
    }

    async fn create(&self, draft: &E::Draft) -> RemoteResult<E> {
        let path = E::create_path(draft);
        let payload = E::create_body(draft)
            .map_err(|err| RemoteError::Malformed(format!("encode {}: {}", path, err)))?;
        let body = self.send(Method::POST, &path, Some(payload)).await?;
        let record: E = decode(E::created_record(body), &path)?;
        Ok(record.into_canonical())
    }

    async fn update(&self, id: i64, patch: &E::Patch) -> RemoteResult<E> {
        let route = E::update_route(id, patch).map_err(|err| {
            RemoteError::Malformed(format!("encode {}: {}", E::item_path(id), err))
        })?;
        let path = route.path.clone();
        let body = self.execute(route).await?;
        let record: E = decode(body, &path)?;
        Ok(record.into_canonical())
    }

    async fn delete(&self, id: i64) -> RemoteResult<()> {
        let path = E::item_path(id);
        self.send(Method::DELETE, &path, None).await.map(|_| ())
    }
}
