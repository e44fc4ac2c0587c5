//! Request/response boundary to the device registry
//!
//! The reconcilers only ever see the [`Registry`] trait. The production implementation
//! is [`HttpRegistry`]; tests use an in-memory fake.

mod http;
pub mod requests;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::correlation::Scope;

pub use http::HttpRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegistryRequest {
    pub method: Method,
    /// Percent-encoded path relative to the registry base URL, without a leading slash
    pub path: String,
    pub body: Option<Value>,
}

impl RegistryRequest {
    pub fn get(path: impl Into<String>) -> Self {
        RegistryRequest {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body<T: Serialize + ?Sized>(
        method: Method,
        path: impl Into<String>,
        body: &T,
    ) -> Result<Self, RegistryError> {
        Ok(RegistryRequest {
            method,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("not found (404): {body}")]
    NotFound { body: String },
    #[error("registry returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("registry unreachable: {0}")]
    Transport(String),
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    /// 404 whose body says the addressed resource's owner is unknown
    pub fn is_missing_owner(&self) -> bool {
        match self {
            RegistryError::NotFound { body } => body.to_lowercase().contains("not found"),
            _ => false,
        }
    }
}

/// Maps a raw status and body onto the registry's success/failure contract
///
/// 404 is the only status with its own meaning; every other non-2xx is a generic failure.
pub fn check_status(status: u16, body: String) -> Result<RegistryResponse, RegistryError> {
    match status {
        200..=299 => Ok(RegistryResponse { status, body }),
        404 => Err(RegistryError::NotFound { body }),
        _ => Err(RegistryError::Status { status, body }),
    }
}

pub trait Registry: Send + Sync {
    fn send(
        &self,
        scope: &Scope,
        request: &RegistryRequest,
    ) -> Result<RegistryResponse, RegistryError>;
}

impl<T: Registry + ?Sized> Registry for Arc<T> {
    fn send(
        &self,
        scope: &Scope,
        request: &RegistryRequest,
    ) -> Result<RegistryResponse, RegistryError> {
        (**self).send(scope, request)
    }
}
