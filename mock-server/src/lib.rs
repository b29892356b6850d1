use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// A request as the server saw it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub id: Uuid,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub type Db = Arc<RwLock<Vec<Echo>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/status/{code}", any(status))
        .route("/redirect/{code}", any(redirect))
        .route("/slow/{ms}", any(slow))
        .route("/requests", get(list_requests))
        .route("/requests/{id}", get(get_request))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    State(db): State<Db>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    let echo = Echo {
        id: Uuid::new_v4(),
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect(),
        body,
    };
    tracing::debug!(id = %echo.id, method = %echo.method, path = %echo.path, "echo");
    db.write().await.push(echo.clone());
    Json(echo)
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    tracing::debug!(%status, "fixed status");
    (status, format!("status {}", status.as_u16()))
}

/// Answers with the 3xx `code` and `Location: /echo`.
async fn redirect(
    Path(code): Path<u16>,
) -> Result<(StatusCode, [(header::HeaderName, &'static str); 1]), StatusCode> {
    let status = StatusCode::from_u16(code)
        .ok()
        .filter(StatusCode::is_redirection)
        .ok_or(StatusCode::BAD_REQUEST)?;
    tracing::debug!(%status, "redirect");
    Ok((status, [(header::LOCATION, "/echo")]))
}

async fn slow(Path(ms): Path<u64>) -> String {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    format!("slept {ms}ms")
}

async fn list_requests(State(db): State<Db>) -> Json<Vec<Echo>> {
    Json(db.read().await.clone())
}

async fn get_request(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Echo>, StatusCode> {
    let echoes = db.read().await;
    echoes
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo() -> Echo {
        Echo {
            id: Uuid::nil(),
            method: "POST".to_string(),
            path: "/echo".to_string(),
            query: None,
            headers: BTreeMap::from([("content-type".to_string(), "text/plain".to_string())]),
            body: "hi".to_string(),
        }
    }

    #[test]
    fn echo_serializes_to_json() {
        let json = serde_json::to_value(echo()).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["query"], serde_json::Value::Null);
        assert_eq!(json["headers"]["content-type"], "text/plain");
    }

    #[test]
    fn echo_deserializes_from_json() {
        let raw = r#"{"id":"00000000-0000-0000-0000-000000000000","method":"POST","path":"/echo","query":null,"headers":{"content-type":"text/plain"},"body":"hi"}"#;
        let back: Echo = serde_json::from_str(raw).unwrap();
        assert_eq!(back, echo());
    }
}
