use genesis_core::{Guid, GenesisError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no function registered with id {0}")]
    UnknownFunctionId(Guid),
    #[error("no function registered with name '{0}'")]
    UnknownFunctionName(String),
    #[error("function '{name}' has no backing service to invoke remotely")]
    NoRemoteService { name: String },
    #[error("remote invocation of '{name}' failed: {message}")]
    RemoteCallFailed { name: String, message: String },
    #[error("local invocation of '{name}' failed: {message}")]
    LocalCallFailed { name: String, message: String },
}

impl From<RegistryError> for GenesisError {
    fn from(e: RegistryError) -> Self {
        let tool_name = match &e {
            RegistryError::UnknownFunctionId(id) => id.to_string(),
            RegistryError::UnknownFunctionName(n)
            | RegistryError::NoRemoteService { name: n }
            | RegistryError::RemoteCallFailed { name: n, .. }
            | RegistryError::LocalCallFailed { name: n, .. } => n.clone(),
        };
        GenesisError::ToolError {
            tool_name,
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
