use std::path::PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[clap(about = "Publish, inspect and serve chunked email templates")]
pub struct Args {
    #[clap(long, value_enum, env = "TEMPLATE_BACKEND", default_value = "ssm")]
    pub(crate) backend: BackendKind,
    #[clap(long, env = "AWS_REGION", default_value = "eu-west-3")]
    pub(crate) region: String,
    #[clap(long)]
    pub(crate) endpoint_url: Option<String>,
    #[clap(long, default_value = "./parameters")]
    pub(crate) local_dir: PathBuf,
    #[clap(long, default_value_t = 3500)]
    pub(crate) chunk_size: usize,
    #[clap(subcommand)]
    pub(crate) command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Ssm,
    Local,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch a template from the formatter API and publish it.
    Publish {
        #[clap(long)]
        prefix: String,
        #[clap(long)]
        message_id: String,
        #[clap(long, default_value = "https://email-formatter.heustach.fr")]
        url: String,
        #[clap(long, default_value = "dev")]
        stage: String,
        /// Name of the environment variable holding the bearer token.
        #[clap(long, default_value = "HEUSTACH_API_KEY")]
        auth_env: String,
        #[clap(long)]
        version: Option<String>,
        #[clap(long)]
        secure: bool,
        #[clap(long)]
        kms_id: Option<String>,
    },
    /// Print a published template.
    Show {
        #[clap(long)]
        prefix: String,
        #[clap(long)]
        message_id: String,
    },
    /// Serve templates and the Cognito custom message hook over HTTP.
    Serve {
        #[clap(long, default_value = "127.0.0.1:8080")]
        http_addr: String,
        #[clap(long)]
        prefix: String,
        #[clap(long, env = "DEFAULT_BRAND", default_value = "Heustach")]
        brand: String,
    },
}
