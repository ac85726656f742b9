//! HTTP surface of the dashboard.
//!
//! Each browser gets a session (cookie `ca_session`) owning its preview,
//! shell state and clipboard. Requests for one session are serialized by
//! the session's lock; the lock is never held across a processing delay.

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::clipboard::MemoryClipboard;
use crate::config::AppConfig;
use crate::downloader::{XLSX_MIME, modified_file_name};
use crate::editor::{GridEditor, KeyOutcome};
use crate::gst;
use crate::keys::KeyEvent;
use crate::preview::{PreviewState, PreviewView, UploadedFile};
use crate::process::{self, Tool};
use crate::shell::{SPLASH_DURATION, ShellState};

pub const SESSION_COOKIE: &str = "ca_session";

/// Everything one browser session owns.
#[derive(Debug, Default)]
pub struct Session {
    pub preview: Option<PreviewState>,
    pub shell: ShellState,
    pub clipboard: MemoryClipboard,
}

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_seen: DateTime<Utc>,
}

pub struct AppState {
    config: AppConfig,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        AppState {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The session named by the cookie, or a fresh one with a new cookie.
    /// Sessions idle for longer than the configured TTL are dropped first.
    async fn session(&self, jar: CookieJar) -> (CookieJar, Arc<Mutex<Session>>) {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        self.drop_idle(&mut sessions, now);

        if let Some(id) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (jar, Arc::clone(&entry.session));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::default()));
        sessions.insert(
            id.clone(),
            SessionEntry {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        info!("new session {} ({} open)", id, sessions.len());

        let cookie = Cookie::build((SESSION_COOKIE, id)).path("/").http_only(true);
        (jar.add(cookie), session)
    }

    fn drop_idle(&self, sessions: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) {
        let ttl = TimeDelta::seconds(self.config.session_ttl_secs.min(u32::MAX as u64) as i64);
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= ttl);
        if sessions.len() < before {
            debug!("dropped {} idle sessions", before - sessions.len());
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    message: Option<String>,
}

/// Errors from the session API, rendered as `{"status":"error","message":..}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        let body = StatusResponse {
            status: "error",
            message: Some(message),
        };
        (code, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn no_preview() -> ApiError {
    ApiError::NotFound("No file uploaded".to_string())
}

fn no_grid() -> ApiError {
    ApiError::Conflict("Preview has no editable grid".to_string())
}

fn preview_of(session: &Session) -> ApiResult<&PreviewState> {
    session.preview.as_ref().ok_or_else(no_preview)
}

fn editor_of(session: &mut Session) -> ApiResult<&mut GridEditor> {
    session
        .preview
        .as_mut()
        .ok_or_else(no_preview)?
        .editor_mut()
        .ok_or_else(no_grid)
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/gst/check", post(gst_check))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:tool/upload", post(upload))
        .route("/api/preview", get(get_preview).delete(dismiss_preview))
        .route("/api/preview/click", post(click))
        .route("/api/preview/input", post(input))
        .route("/api/preview/blur", post(blur))
        .route("/api/preview/key", post(key))
        .route("/api/preview/undo", post(undo))
        .route("/api/preview/redo", post(redo))
        .route("/api/preview/download", get(download))
        .route("/api/preview/process", post(process_preview))
        .route("/api/preview/result", get(result_file))
        .route("/api/shell", get(get_shell))
        .route("/api/shell/theme", post(toggle_theme))
        .route("/api/shell/splash", post(finish_splash))
        .route("/api/shell/menu", post(toggle_menu))
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let address = config.address();
    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}

/// A download response with both a plain and an RFC 5987 file name.
fn attachment(name: &str, mime_type: &str, bytes: Vec<u8>) -> Response {
    let fallback: String = name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    );

    (
        [
            (header::CONTENT_TYPE, mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    )
        .into_response()
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, String> {
    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("").to_string();
        let mime_type = field.content_type().unwrap_or("").to_string();
        let bytes = field.bytes().await.map_err(|e| e.body_text())?;
        return Ok(Some(UploadedFile::new(name, mime_type, bytes.to_vec())));
    }
    Ok(None)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Stateless GSTIN match check. Errors are `400 {"error": ...}`.
async fn gst_check(mut multipart: Multipart) -> Response {
    let bad_request = |message: String| {
        (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": message }))).into_response()
    };

    let file = match read_file_field(&mut multipart).await {
        Ok(Some(file)) if !file.name.is_empty() => file,
        Ok(_) => return bad_request("No file uploaded".to_string()),
        Err(e) => return bad_request(e),
    };

    match gst::check_gstin_matching(&file.bytes, &file.name) {
        Ok(checked) => {
            info!("checked {} -> {}", file.name, checked.file_name);
            attachment(&checked.file_name, XLSX_MIME, checked.bytes)
        }
        Err(e) => {
            warn!("GST check failed for {}: {}", file.name, e);
            bad_request(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct ToolInfo {
    id: &'static str,
    title: &'static str,
    accept: &'static str,
}

async fn list_tools() -> Json<Vec<ToolInfo>> {
    Json(
        Tool::all()
            .into_iter()
            .map(|tool| ToolInfo {
                id: tool.id(),
                title: tool.title(),
                accept: tool.accept(),
            })
            .collect(),
    )
}

async fn upload(
    State(state): State<Arc<AppState>>,
    Path(tool): Path<String>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> (CookieJar, ApiResult<Json<PreviewView>>) {
    let (jar, session) = state.session(jar).await;
    let result = accept_upload(&state, &session, &tool, &mut multipart).await;
    (jar, result)
}

async fn accept_upload(
    state: &AppState,
    session: &Mutex<Session>,
    tool: &str,
    multipart: &mut Multipart,
) -> ApiResult<Json<PreviewView>> {
    let tool = Tool::from_id(tool).ok_or_else(|| ApiError::NotFound(format!("Unknown tool: {}", tool)))?;
    let file = read_file_field(multipart)
        .await
        .map_err(ApiError::BadRequest)?
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let preview = process::on_file_selected(file, tool, state.config.redo_policy);
    let view = preview.view();
    session.lock().await.preview = Some(preview);
    Ok(Json(view))
}

async fn get_preview(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, ApiResult<Json<PreviewView>>) {
    let (jar, session) = state.session(jar).await;
    let session = session.lock().await;
    let result = preview_of(&session).map(|p| Json(p.view()));
    (jar, result)
}

async fn dismiss_preview(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let (jar, session) = state.session(jar).await;
    session.lock().await.preview = None;
    (jar, StatusCode::NO_CONTENT)
}

/// Run `edit` against the session's editor and answer with the new view.
async fn with_editor<F>(state: &AppState, jar: CookieJar, edit: F) -> (CookieJar, ApiResult<Json<PreviewView>>)
where
    F: FnOnce(&mut GridEditor),
{
    let (jar, session) = state.session(jar).await;
    let mut session = session.lock().await;
    let result = editor_of(&mut session)
        .map(edit)
        .and_then(|_| preview_of(&session).map(|p| Json(p.view())));
    (jar, result)
}

#[derive(Deserialize)]
struct ClickRequest {
    row: usize,
    col: usize,
}

async fn click(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<ClickRequest>,
) -> (CookieJar, ApiResult<Json<PreviewView>>) {
    with_editor(&state, jar, |editor| {
        editor.click(req.row, req.col);
    })
    .await
}

#[derive(Deserialize)]
struct InputRequest {
    value: String,
}

async fn input(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<InputRequest>,
) -> (CookieJar, ApiResult<Json<PreviewView>>) {
    with_editor(&state, jar, |editor| {
        editor.input(req.value);
    })
    .await
}

#[derive(Deserialize)]
struct CommitRequest {
    /// The cell input's value at the moment it lost focus.
    value: Option<String>,
}

async fn blur(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<CommitRequest>>,
) -> (CookieJar, ApiResult<Json<PreviewView>>) {
    let value = body.and_then(|Json(req)| req.value);
    with_editor(&state, jar, |editor| {
        if let Some(value) = value {
            editor.input(value);
        }
        editor.commit();
    })
    .await
}

async fn undo(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, ApiResult<Json<PreviewView>>) {
    with_editor(&state, jar, |editor| {
        editor.undo();
    })
    .await
}

async fn redo(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, ApiResult<Json<PreviewView>>) {
    with_editor(&state, jar, |editor| {
        editor.redo();
    })
    .await
}

#[derive(Deserialize)]
struct KeyRequest {
    #[serde(flatten)]
    event: KeyEvent,
    /// The browser's clipboard text, sent along with a paste.
    clipboard: Option<String>,
    /// The cell input's value, staged before the key is handled so a
    /// commit never sees a stale value.
    value: Option<String>,
}

#[derive(Serialize)]
struct KeyResponse {
    outcome: &'static str,
    /// Session clipboard after the key, for the browser to mirror on copy.
    clipboard: String,
    preview: PreviewView,
}

async fn key(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<KeyRequest>,
) -> (CookieJar, ApiResult<Json<KeyResponse>>) {
    let (jar, session) = state.session(jar).await;
    let mut guard = session.lock().await;
    let session = &mut *guard;

    if let Some(text) = req.clipboard {
        session.clipboard.set_text(text);
    }

    let result: ApiResult<Json<KeyResponse>> = (|| {
        let preview = session.preview.as_mut().ok_or_else(no_preview)?;
        let editor = preview.editor_mut().ok_or_else(no_grid)?;
        if let Some(value) = req.value {
            editor.input(value);
        }
        let outcome = match editor.handle_key(req.event, &mut session.clipboard) {
            KeyOutcome::Handled => "handled",
            KeyOutcome::Ignored => "ignored",
            KeyOutcome::ClipboardFailed(e) => {
                warn!("clipboard unavailable: {}", e);
                "clipboard_failed"
            }
        };
        Ok(Json(KeyResponse {
            outcome,
            clipboard: session.clipboard.text().to_string(),
            preview: preview.view(),
        }))
    })();

    (jar, result)
}

async fn download(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, ApiResult<Response>) {
    let (jar, session) = state.session(jar).await;
    let session = session.lock().await;

    let result: ApiResult<Response> = (|| {
        let preview = preview_of(&session)?;
        let editor = preview.editor().ok_or_else(no_grid)?;
        let bytes = editor
            .export_current_grid()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(attachment(&modified_file_name(&preview.meta.name), XLSX_MIME, bytes))
    })();

    (jar, result)
}

async fn process_preview(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, ApiResult<Json<PreviewView>>) {
    let (jar, session) = state.session(jar).await;
    let result = run_processor(&state, &session).await;
    (jar, result)
}

async fn run_processor(state: &AppState, session: &Mutex<Session>) -> ApiResult<Json<PreviewView>> {
    let (id, processor, input) = {
        let session = session.lock().await;
        let preview = preview_of(&session)?;
        let input = process::prepare_input(preview).map_err(|e| ApiError::Internal(e.to_string()))?;
        (preview.id(), preview.tool.processor(), input)
    };

    if state.config.simulate_delays {
        tokio::time::sleep(processor.delay(&input)).await;
    }
    let output = processor
        .process(&input)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut session = session.lock().await;
    match session.preview.as_mut() {
        Some(preview) if preview.id() == id => {
            process::apply_output(preview, output);
            info!("processed {} ({})", input.file_name, preview.tool.id());
            Ok(Json(preview.view()))
        }
        _ => Err(ApiError::Conflict("The upload was replaced while processing".to_string())),
    }
}

async fn result_file(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, ApiResult<Response>) {
    let (jar, session) = state.session(jar).await;
    let session = session.lock().await;

    let result = preview_of(&session).and_then(|preview| {
        let file = preview
            .result
            .as_ref()
            .and_then(|r| r.download.as_ref())
            .ok_or_else(|| ApiError::NotFound("No processed file to download".to_string()))?;
        Ok(attachment(&file.name, &file.mime_type, file.bytes.clone()))
    });

    (jar, result)
}

/// Shell state plus how long the page should keep the splash up.
#[derive(Serialize)]
struct ShellView {
    #[serde(flatten)]
    shell: ShellState,
    splash_ms: u64,
}

async fn with_shell<F>(state: &AppState, jar: CookieJar, change: F) -> (CookieJar, Json<ShellView>)
where
    F: FnOnce(&mut ShellState),
{
    let (jar, session) = state.session(jar).await;
    let mut session = session.lock().await;
    change(&mut session.shell);
    let view = ShellView {
        shell: session.shell.clone(),
        splash_ms: SPLASH_DURATION.as_millis() as u64,
    };
    (jar, Json(view))
}

async fn get_shell(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Json<ShellView>) {
    with_shell(&state, jar, |_| {}).await
}

async fn toggle_theme(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Json<ShellView>) {
    with_shell(&state, jar, |shell| {
        shell.toggle_theme();
    })
    .await
}

async fn finish_splash(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Json<ShellView>) {
    with_shell(&state, jar, ShellState::finish_splash).await
}

async fn toggle_menu(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Json<ShellView>) {
    with_shell(&state, jar, |shell| {
        shell.toggle_menu();
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_ttl(secs: u64) -> AppState {
        AppState::new(AppConfig {
            session_ttl_secs: secs,
            ..AppConfig::default()
        })
    }

    async fn age_sessions(state: &AppState, secs: i64) {
        for entry in state.sessions.lock().await.values_mut() {
            entry.last_seen = entry.last_seen - TimeDelta::seconds(secs);
        }
    }

    #[tokio::test]
    async fn cookieless_requests_get_their_own_sessions() {
        let state = state_with_ttl(60);
        for _ in 0..10 {
            state.session(CookieJar::new()).await;
        }
        assert_eq!(state.sessions.lock().await.len(), 10);
    }

    #[tokio::test]
    async fn idle_sessions_are_dropped() {
        let state = state_with_ttl(60);
        let (jar, _) = state.session(CookieJar::new()).await;
        state.session(CookieJar::new()).await;
        let old_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()).unwrap();

        age_sessions(&state, 61).await;
        let (jar, _) = state.session(jar).await;

        let sessions = state.sessions.lock().await;
        assert_eq!(sessions.len(), 1);
        assert!(!sessions.contains_key(&old_id));
        let new_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()).unwrap();
        assert_ne!(new_id, old_id);
    }

    #[tokio::test]
    async fn active_sessions_are_kept_and_refreshed() {
        let state = state_with_ttl(60);
        let (jar, first) = state.session(CookieJar::new()).await;
        first.lock().await.shell.toggle_theme();

        age_sessions(&state, 59).await;
        let (jar, again) = state.session(jar).await;
        assert!(Arc::ptr_eq(&first, &again));

        // The visit above reset the idle clock.
        age_sessions(&state, 59).await;
        let (_, still) = state.session(jar).await;
        assert!(Arc::ptr_eq(&first, &still));
        assert_eq!(state.sessions.lock().await.len(), 1);
    }
}
