//! Stores JSON documents larger than a single parameter value by splitting
//! their compressed encoding over several parameters, with a manifest that
//! names the current version and its checksum.

pub mod cache;
pub mod codec;
pub mod config;
pub mod errors;
pub mod integrity;
pub mod manifest;
pub mod reader;
pub mod retry;
pub mod source;
pub mod writer;

pub use cache::{CachedTemplate, TemplateCache};
pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use manifest::{Encoding, Manifest, TemplatePath};
pub use reader::TemplateReader;
pub use retry::RetryPolicy;
pub use source::{ContentSource, HttpContentSource, SourceError, StaticSource};
pub use writer::{PublishOptions, PublishStage, TemplateWriter};
