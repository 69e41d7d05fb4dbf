//! HTTP surface for the front-end shell.

pub mod error;
pub mod handlers;

use crate::{bridge::BridgeController, config::Config};
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub bridge: BridgeController,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(bridge: BridgeController, config: Config) -> Self {
        Self {
            bridge,
            config: Arc::new(config),
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health)).service(
        web::scope("/api/sessions")
            .route("", web::post().to(handlers::create_session))
            .route("/{id}", web::get().to(handlers::get_session))
            .route("/{id}", web::delete().to(handlers::end_session))
            .route("/{id}/image", web::put().to(handlers::upload_image))
            .route("/{id}/image", web::delete().to(handlers::clear_image))
            .route("/{id}/execute", web::post().to(handlers::execute))
            .route("/{id}/execute", web::get().to(handlers::execute_query)),
    );
}

pub async fn run(state: AppState) -> std::io::Result<()> {
    let bind = (state.config.host().to_string(), state.config.port());
    let max_payload = state.config.max_upload_bytes();
    let data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(web::PayloadConfig::new(max_payload))
            .wrap(Logger::default())
            .configure(routes)
    })
    .bind(bind)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GeminiConfig,
        encoding,
        gemini::{ImageClient, ScriptedTransport},
        session::SessionStore,
    };
    use actix_web::{http::header::CONTENT_TYPE, http::StatusCode, test};
    use serde_json::{json, Value};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x01";

    fn state(transport: Arc<ScriptedTransport>) -> AppState {
        let gemini = GeminiConfig::new().with_api_key("test-key");
        let client = ImageClient::new(&gemini, transport).unwrap();
        let bridge = BridgeController::new(Arc::new(SessionStore::new()), client);
        AppState::new(bridge, Config::new().with_gemini(gemini))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health() {
        let app = app!(state(Arc::new(ScriptedTransport::new())));
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_upload_and_summary() {
        let app = app!(state(Arc::new(ScriptedTransport::new())));

        let resp = test::call_service(&app, test::TestRequest::post().uri("/api/sessions").to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["sessionId"].as_str().unwrap().to_string();

        let upload = test::TestRequest::put()
            .uri(&format!("/api/sessions/{}/image?filename=cat.png", id))
            .insert_header((CONTENT_TYPE, "image/png"))
            .set_payload(PNG.to_vec())
            .to_request();
        let summary: Value = test::call_and_read_body_json(&app, upload).await;
        assert_eq!(summary["filename"], "cat.png");
        assert_eq!(summary["hasImage"], true);
        assert_eq!(summary["sizeBytes"], 10);
        assert_eq!(summary["mimeType"], "image/png");

        let cleared = test::TestRequest::delete()
            .uri(&format!("/api/sessions/{}/image", id))
            .to_request();
        let summary: Value = test::call_and_read_body_json(&app, cleared).await;
        assert_eq!(summary["hasImage"], false);
        assert_eq!(summary["filename"], crate::session::NO_IMAGE);
    }

    #[actix_web::test]
    async fn test_json_upload_with_bad_base64_is_rejected() {
        let app = app!(state(Arc::new(ScriptedTransport::new())));
        let created: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/api/sessions").to_request(),
        )
        .await;
        let id = created["sessionId"].as_str().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/sessions/{}/image", id))
            .set_json(json!({ "filename": "cat.png", "imageData": "%%%" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "DECODE_ERROR");
    }

    #[actix_web::test]
    async fn test_unknown_session_is_not_found() {
        let app = app!(state(Arc::new(ScriptedTransport::new())));
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/sessions/missing").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_execute_with_attached_image_relays_once() {
        let reply = json!({ "image_data_base64": encoding::encode(PNG), "description": "ok" });
        let transport = Arc::new(ScriptedTransport::new().reply_with_text(&reply.to_string()));
        let app = app!(state(transport.clone()));

        let trigger = json!({
            "action": "generate",
            "prompt": "make it blue",
            "imageData": encoding::encode(PNG),
            "mimeType": "image/png",
            "triggerId": "click-1"
        });
        let req = test::TestRequest::post()
            .uri("/api/sessions/s1/execute")
            .set_json(&trigger)
            .to_request();
        let relay: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(relay["action"], "result");
        assert_eq!(relay["base64Data"], encoding::encode(PNG));
        assert!(relay["error"].is_null());

        let replay = test::TestRequest::post()
            .uri("/api/sessions/s1/execute")
            .set_json(&trigger)
            .to_request();
        let relay: Value = test::call_and_read_body_json(&app, replay).await;
        assert_eq!(relay, json!({ "action": "idle" }));
        assert_eq!(transport.calls(), 1);
    }

    #[actix_web::test]
    async fn test_query_string_trigger_with_text_relay() {
        let transport = Arc::new(ScriptedTransport::new());
        let app = app!(state(transport.clone()));

        let req = test::TestRequest::get()
            .uri("/api/sessions/s2/execute?action=generate&prompt=make%20it%20blue&format=text")
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let line = std::str::from_utf8(&body).unwrap();

        let relay = crate::bridge::RelayMessage::from_tagged_line(line).unwrap();
        assert_eq!(
            relay,
            crate::bridge::RelayMessage::error(crate::models::MISSING_INPUT)
        );
        assert_eq!(transport.calls(), 0);
    }

    #[actix_web::test]
    async fn test_query_string_image_with_unescaped_plus() {
        let reply = json!({ "image_data_base64": "QQ==", "description": "ok" });
        let transport = Arc::new(ScriptedTransport::new().reply_with_text(&reply.to_string()));
        let app = app!(state(transport.clone()));

        let req = test::TestRequest::get()
            .uri("/api/sessions/s4/execute?action=generate&prompt=p&imageData=+/+/&mimeType=image/png")
            .to_request();
        let relay: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(relay["action"], "result");
        assert!(relay["error"].is_null());

        let sent = transport.last_request().unwrap();
        assert_eq!(sent["contents"][0]["parts"][1]["inline_data"]["data"], "+/+/");
    }

    #[actix_web::test]
    async fn test_execute_without_trigger_is_idle() {
        let transport = Arc::new(ScriptedTransport::new());
        let app = app!(state(transport.clone()));

        let req = test::TestRequest::post()
            .uri("/api/sessions/s3/execute")
            .to_request();
        let relay: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(relay["action"], "idle");
        assert_eq!(transport.calls(), 0);

        let missing = test::TestRequest::get()
            .uri("/api/sessions/s3")
            .to_request();
        let resp = test::call_service(&app, missing).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
