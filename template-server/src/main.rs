mod errors;
mod params;
mod services;

use std::sync::Arc;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use chunked_store::{
    HttpContentSource, PublishOptions, StoreConfig, TemplateCache, TemplatePath, TemplateReader, TemplateWriter,
};
use param_store::{LocalParameterStore, ParameterStore, SsmConfig, SsmParameterStore};
use crate::errors::TemplateServerErr;
use crate::params::{Args, BackendKind, Command};
use crate::services::template_service::{configure, AppState};

#[actix_web::main]
async fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), TemplateServerErr> {
    let store = open_store(&args).await;
    let config = StoreConfig::default().with_chunk_size(args.chunk_size);

    match args.command {
        Command::Publish { prefix, message_id, url, stage, auth_env, version, secure, kms_id } => {
            let bearer = std::env::var(&auth_env).ok().filter(|token| !token.is_empty());
            let source = HttpContentSource::new(&url, &stage, &message_id, bearer)?;

            let mut options = PublishOptions { version, ..PublishOptions::default() };
            if secure {
                options = options.secure(kms_id);
            } else if kms_id.is_some() {
                tracing::warn!("--kms-id is ignored without --secure");
            }

            let writer = TemplateWriter::new(store, config)?;
            let manifest = writer
                .publish_from(&TemplatePath::new(&prefix, &message_id), &source, &options)
                .await?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        Command::Show { prefix, message_id } => {
            let reader = TemplateReader::new(store, Arc::new(TemplateCache::new()), config)?;
            let template = reader.load_template(&TemplatePath::new(&prefix, &message_id)).await?;
            println!("{}", serde_json::to_string_pretty(&*template)?);
        }
        Command::Serve { http_addr, prefix, brand } => {
            let reader = TemplateReader::new(store, Arc::new(TemplateCache::new()), config)?;
            let state = web::Data::new(AppState::new(reader, prefix, brand));
            tracing::info!("serving templates on {}", http_addr);

            HttpServer::new(move || {
                App::new()
                    .app_data(state.clone())
                    .configure(configure)
            })
                .bind(&http_addr)?
                .run()
                .await?;
        }
    }
    Ok(())
}

async fn open_store(args: &Args) -> Arc<dyn ParameterStore> {
    match args.backend {
        BackendKind::Ssm => {
            let config = SsmConfig { region: args.region.clone(), endpoint: args.endpoint_url.clone() };
            Arc::new(SsmParameterStore::connect(config).await)
        }
        BackendKind::Local => {
            tracing::info!("using parameters under {}", args.local_dir.display());
            Arc::new(LocalParameterStore::new(args.local_dir.clone()))
        }
    }
}
