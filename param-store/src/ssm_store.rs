use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::types::ParameterType as SsmParameterType;
use aws_sdk_ssm::Client as SsmClient;
use std::error::Error;
use crate::store::{Parameter, ParameterStore, ParamResult, ParameterType, PutOptions};

/// AWS Systems Manager Parameter Store backend.
#[derive(Clone, Debug)]
pub struct SsmParameterStore {
    client: SsmClient,
}

/// Where to reach SSM.
#[derive(Debug, Clone)]
pub struct SsmConfig {
    pub region: String,
    /// Optional endpoint override (LocalStack, VPC endpoints)
    pub endpoint: Option<String>,
}

impl Default for SsmConfig {
    fn default() -> Self {
        Self {
            region: "eu-west-3".to_string(),
            endpoint: None,
        }
    }
}

impl SsmParameterStore {
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }

    /// Loads credentials from the environment, overriding region and endpoint.
    pub async fn connect(config: SsmConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region));
        if let Some(endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;
        Self::new(SsmClient::new(&shared_config))
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameter(&self, name: &str, decrypt: bool) -> ParamResult<Option<String>> {
        let resp = self.client.get_parameter()
            .name(name)
            .with_decryption(decrypt)
            .send()
            .await;
        match resp {
            Ok(out) => Ok(out.parameter().and_then(|p| p.value()).map(str::to_string)),
            Err(e) if e.as_service_error().map_or(false, |se| se.is_parameter_not_found()) => Ok(None),
            Err(e) => Err(Box::new(e) as Box<dyn Error + Send + Sync>),
        }
    }

    async fn get_parameters(&self, names: &[String], decrypt: bool) -> ParamResult<Vec<Parameter>> {
        let out = self.client.get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(decrypt)
            .send()
            .await
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
        if !out.invalid_parameters().is_empty() {
            tracing::debug!("ssm reported missing parameters: {:?}", out.invalid_parameters());
        }
        Ok(out.parameters()
            .iter()
            .filter_map(|p| match (p.name(), p.value()) {
                (Some(name), Some(value)) => Some(Parameter::new(name, value)),
                _ => None,
            })
            .collect())
    }

    async fn put_parameter(&self, name: &str, value: &str, options: &PutOptions) -> ParamResult<()> {
        let parameter_type = match options.parameter_type {
            ParameterType::Plain => SsmParameterType::String,
            ParameterType::Secure => SsmParameterType::SecureString,
        };
        self.client.put_parameter()
            .name(name)
            .value(value)
            .r#type(parameter_type)
            .overwrite(true)
            .set_key_id(options.key_id.clone())
            .send()
            .await
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
        Ok(())
    }
}
