use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use crate::store::{Parameter, ParameterStore, ParamResult, ParameterType, PutOptions};

const VALUE_FILE: &str = "@value";

/// A `ParameterStore` that keeps every parameter in a local directory.
///
/// `/a/b` is written to `<root>/a/b/@value`, so a name can be both a value and
/// the parent of other names (a manifest and its `parts/` live side by side).
#[derive(Clone, Debug)]
pub struct LocalParameterStore {
    directory: PathBuf,
}

impl LocalParameterStore {
    /// Creates a new `LocalParameterStore` rooted at the specified directory.
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn value_path(&self, name: &str) -> ParamResult<PathBuf> {
        let mut path = self.directory.clone();
        for segment in name.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment == VALUE_FILE {
                return Err(format!("invalid parameter name: {}", name).into());
            }
            path.push(segment);
        }
        if path == self.directory {
            return Err(format!("invalid parameter name: {:?}", name).into());
        }
        path.push(VALUE_FILE);
        Ok(path)
    }

    async fn read_value(&self, name: &str) -> ParamResult<Option<String>> {
        let path = self.value_path(name)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ParameterStore for LocalParameterStore {
    async fn get_parameter(&self, name: &str, _decrypt: bool) -> ParamResult<Option<String>> {
        self.read_value(name).await
    }

    async fn get_parameters(&self, names: &[String], _decrypt: bool) -> ParamResult<Vec<Parameter>> {
        let mut found = Vec::with_capacity(names.len());
        for name in names {
            if let Some(value) = self.read_value(name).await? {
                found.push(Parameter::new(name.clone(), value));
            }
        }
        Ok(found)
    }

    async fn put_parameter(&self, name: &str, value: &str, options: &PutOptions) -> ParamResult<()> {
        let path = self.value_path(name)?;
        if options.parameter_type == ParameterType::Secure {
            tracing::warn!("local store keeps {} unencrypted", name);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, value).await?;
        Ok(())
    }
}
