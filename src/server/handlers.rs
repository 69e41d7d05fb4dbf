//! Handlers for `/api/sessions`. Each request is one stateless execution;
//! everything that must survive it lives in the session store.

use crate::{
    encoding,
    models::TriggerPayload,
    server::{
        error::{ApiError, ApiResult},
        AppState,
    },
};
use actix_web::{http::header::CONTENT_TYPE, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_FILENAME: &str = "upload";

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// POST /api/sessions
pub async fn create_session(state: web::Data<AppState>) -> HttpResponse {
    let id = state.bridge.sessions().create();
    HttpResponse::Created().json(json!({ "sessionId": id }))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let summary = state
        .bridge
        .sessions()
        .summary(&id)
        .ok_or(ApiError::SessionNotFound(id))?;
    Ok(HttpResponse::Ok().json(summary))
}

/// DELETE /api/sessions/{id}
pub async fn end_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    if state.bridge.sessions().remove(&id) {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

/// JSON alternative to a raw upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    pub filename: Option<String>,
    pub image_data: String,
    pub mime_type: Option<String>,
}

/// PUT /api/sessions/{id}/image?filename=..
///
/// Raw image bytes with the image Content-Type, or a JSON [`UploadPayload`].
pub async fn upload_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<UploadQuery>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let sessions = state.bridge.sessions();
    if !sessions.exists(&id) {
        return Err(ApiError::SessionNotFound(id));
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let (bytes, filename, mime_type) = if content_type.starts_with("application/json") {
        let payload: UploadPayload = serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid upload payload: {}", e)))?;
        let bytes = encoding::decode(&payload.image_data)?;
        (bytes, payload.filename, payload.mime_type)
    } else {
        let mime_type = Some(content_type).filter(|m| m.starts_with("image/"));
        (body.to_vec(), None, mime_type)
    };

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("empty upload".into()));
    }

    let filename = query
        .into_inner()
        .filename
        .or(filename)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    sessions.put(&id, bytes, filename, mime_type);
    let summary = sessions.summary(&id).ok_or(ApiError::SessionNotFound(id))?;
    Ok(HttpResponse::Ok().json(summary))
}

/// DELETE /api/sessions/{id}/image
pub async fn clear_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let sessions = state.bridge.sessions();
    sessions.clear(&id);
    let summary = sessions.summary(&id).ok_or(ApiError::SessionNotFound(id))?;
    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct RelayFormat {
    pub format: Option<String>,
}

impl RelayFormat {
    fn is_text(&self) -> bool {
        self.format.as_deref() == Some("text")
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecuteQuery {
    #[serde(flatten)]
    pub trigger: TriggerPayload,
    pub format: Option<String>,
}

/// POST /api/sessions/{id}/execute with an optional JSON trigger body.
pub async fn execute(
    state: web::Data<AppState>,
    path: web::Path<String>,
    format: web::Query<RelayFormat>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let trigger = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let payload: TriggerPayload = serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid trigger payload: {}", e)))?;
        Some(payload)
    };
    run_execution(&state, &path.into_inner(), trigger, format.is_text()).await
}

/// GET /api/sessions/{id}/execute?action=generate&prompt=..
///
/// `imageData` should be percent-encoded; an unescaped `+` and the URL-safe
/// base64 alphabet are accepted as well.
pub async fn execute_query(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ExecuteQuery>,
) -> ApiResult<HttpResponse> {
    let ExecuteQuery {
        mut trigger,
        format,
    } = query.into_inner();
    trigger.image_data = trigger
        .image_data
        .as_deref()
        .map(encoding::from_query_value);
    let trigger = Some(trigger).filter(|t| t.action.is_some());
    let text = RelayFormat { format }.is_text();
    run_execution(&state, &path.into_inner(), trigger, text).await
}

async fn run_execution(
    state: &AppState,
    session_id: &str,
    trigger: Option<TriggerPayload>,
    text: bool,
) -> ApiResult<HttpResponse> {
    let relay = state.bridge.execute(session_id, trigger).await;
    if text {
        Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(relay.to_tagged_line()))
    } else {
        Ok(HttpResponse::Ok().json(relay))
    }
}
