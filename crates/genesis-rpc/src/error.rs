use genesis_core::{Guid, GenesisError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("no reply for conversation {conversation_id} within deadline")]
    Timeout { conversation_id: Guid },
    #[error("request cancelled before a reply arrived")]
    Cancelled,
    #[error("no agent is currently alive offering service '{service_name}'")]
    NoCandidates { service_name: String },
}

impl From<RpcError> for GenesisError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Timeout { conversation_id } => GenesisError::RpcTimeout {
                service_name: String::new(),
                conversation_id,
            },
            RpcError::Cancelled => GenesisError::Cancelled,
            RpcError::NoCandidates { service_name } => GenesisError::BindTimeout { service_name },
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
