use actix_web::{get, post, web, HttpResponse};
use chunked_store::{TemplatePath, TemplateReader};
use crate::errors::TemplateServerErr;
use crate::services::custom_message::{message_id_for, CustomMessageEvent, EmailTemplate};

pub const APP_TYPE_JSON: &str = "application/json";

pub struct AppState {
    pub(crate) reader: TemplateReader,
    pub(crate) prefix: String,
    pub(crate) brand: String,
}

impl AppState {
    pub fn new(reader: TemplateReader, prefix: String, brand: String) -> Self {
        Self { reader, prefix, brand }
    }

    fn manifest_key(&self, message_id: &str) -> String {
        TemplatePath::new(&self.prefix, message_id).manifest_key()
    }
}

#[get("/templates/{message_id}")]
async fn get_template(
    message_id: web::Path<String>,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, TemplateServerErr> {
    let key = shared_state.manifest_key(&message_id);
    let template = shared_state.reader.load(&key).await?;
    Ok(HttpResponse::Ok()
        .content_type(APP_TYPE_JSON)
        .json(&*template))
}

#[post("/custom-message")]
async fn custom_message(
    request_json_bytes: web::Bytes,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, TemplateServerErr> {
    let event: CustomMessageEvent = serde_json::from_slice(&request_json_bytes)?;
    let message_id = message_id_for(&event.trigger_source)
        .ok_or_else(|| TemplateServerErr::UnsupportedTrigger(event.trigger_source.clone()))?;

    let key = shared_state.manifest_key(message_id);
    let template = match shared_state.reader.load_as::<EmailTemplate>(&key).await {
        Ok(template) => Some(template),
        Err(e) => {
            tracing::warn!("no usable template at {}, using the default: {}", key, e);
            None
        }
    };
    tracing::info!("rendering {} for {}", message_id, event.trigger_source);

    let event = event.render(template.as_ref(), &shared_state.brand);
    Ok(HttpResponse::Ok()
        .content_type(APP_TYPE_JSON)
        .json(event))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_template)
        .service(custom_message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use actix_web::{test, App};
    use actix_web::http::StatusCode;
    use serde_json::{json, Value};
    use chunked_store::{PublishOptions, RetryPolicy, StoreConfig, TemplateCache, TemplateWriter};
    use param_store::MemoryParameterStore;

    const PREFIX: &str = "cognito-email-guard/dev/message";

    fn config() -> StoreConfig {
        StoreConfig::default().with_chunk_size(200).with_retry(RetryPolicy::none())
    }

    fn state(store: &Arc<MemoryParameterStore>) -> web::Data<AppState> {
        let reader = TemplateReader::new(store.clone(), Arc::new(TemplateCache::new()), config()).unwrap();
        web::Data::new(AppState::new(reader, PREFIX.to_string(), "Acme".to_string()))
    }

    async fn publish(store: &Arc<MemoryParameterStore>, message_id: &str, template: Value) {
        TemplateWriter::new(store.clone(), config()).unwrap()
            .publish(&TemplatePath::new(PREFIX, message_id), &template, &PublishOptions::default())
            .await
            .unwrap();
    }

    fn sign_up_event() -> Value {
        json!({
            "triggerSource": "CustomMessage_SignUp",
            "userName": "jdupont",
            "request": {
                "userAttributes": { "email": "j.dupont@example.fr" },
                "codeParameter": "{####}",
                "linkParameter": null
            },
            "response": {}
        })
    }

    #[actix_web::test]
    async fn test_get_template() {
        let store = Arc::new(MemoryParameterStore::new());
        let template = json!({ "html": "<p>Bonjour {{USERNAME}}</p>".repeat(50), "subject": "Hello" });
        publish(&store, "cognito-sign-up", template.clone()).await;
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get().uri("/templates/cognito-sign-up").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, template);

        let req = test::TestRequest::get().uri("/templates/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_get_corrupted_template_is_server_error() {
        let store = Arc::new(MemoryParameterStore::new());
        publish(&store, "cognito-sign-up", json!({ "html": "x" })).await;
        let chunk = TemplatePath::new(PREFIX, "cognito-sign-up").chunk_key(1);
        store.insert_raw(&chunk, "AAAA");
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::get().uri("/templates/cognito-sign-up").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_custom_message_uses_stored_template() {
        let store = Arc::new(MemoryParameterStore::new());
        publish(&store, "cognito-sign-up", json!({
            "html": "<p>{{BRAND}}: {{CODE}} for {{EMAIL}}</p>",
            "subject": "Welcome to {{BRAND}}",
        })).await;
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::post().uri("/custom-message").set_json(sign_up_event()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["response"]["emailSubject"], "Welcome to Acme");
        assert_eq!(body["response"]["emailMessage"], "<p>Acme: {####} for j.dupont@example.fr</p>");
        assert_eq!(body["response"]["smsMessage"], "Code Acme: {####}");
        assert_eq!(body["userName"], "jdupont");
    }

    #[actix_web::test]
    async fn test_custom_message_reuses_cache() {
        let store = Arc::new(MemoryParameterStore::new());
        publish(&store, "cognito-sign-up", json!({ "html": "<p>{{CODE}}</p>" })).await;
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        for _ in 0..3 {
            let req = test::TestRequest::post().uri("/custom-message").set_json(sign_up_event()).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        assert_eq!(store.call_counts().get_many, 1);
    }

    #[actix_web::test]
    async fn test_custom_message_without_template_uses_default() {
        let store = Arc::new(MemoryParameterStore::new());
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let req = test::TestRequest::post().uri("/custom-message").set_json(sign_up_event()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["response"]["emailSubject"], "Acme – Votre code");
        let html = body["response"]["emailMessage"].as_str().unwrap();
        assert!(html.contains("{####}"));
        assert!(html.contains("Ou cliquez ici&nbsp;: </p>"));
    }

    #[actix_web::test]
    async fn test_custom_message_rejects_bad_input() {
        let store = Arc::new(MemoryParameterStore::new());
        let app = test::init_service(App::new().app_data(state(&store)).configure(configure)).await;

        let mut event = sign_up_event();
        event["triggerSource"] = json!("PreSignUp_SignUp");
        let req = test::TestRequest::post().uri("/custom-message").set_json(event).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post().uri("/custom-message").set_payload("{ nope").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
