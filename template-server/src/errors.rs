use actix_web::{HttpResponse, ResponseError};
use serde_json::error::Error as SerdeError;
use thiserror::Error;
use chunked_store::{SourceError, StoreError};


#[derive(Debug, Error)]
pub enum TemplateServerErr {
    #[error("Failed to parse JSON")]
    Json(#[from] SerdeError),

    #[error("Unsupported trigger source: {0}")]
    UnsupportedTrigger(String),

    #[error("Template store error: {0}")]
    Store(#[from] StoreError),

    #[error("Template source error: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to bind or run the HTTP server")]
    Io(#[from] std::io::Error),
}

impl ResponseError for TemplateServerErr {
    fn error_response(&self) -> HttpResponse {
        match self {
            TemplateServerErr::Json(_) => HttpResponse::BadRequest().body(self.to_string()),
            TemplateServerErr::UnsupportedTrigger(_) => HttpResponse::BadRequest().body(self.to_string()),
            TemplateServerErr::Store(e) if e.is_not_found() => HttpResponse::NotFound().body(self.to_string()),
            TemplateServerErr::Store(_) => HttpResponse::InternalServerError().body(self.to_string()),
            TemplateServerErr::Source(_) => HttpResponse::BadGateway().body(self.to_string()),
            TemplateServerErr::Io(_) => HttpResponse::InternalServerError().body(self.to_string()),
        }
    }
}
