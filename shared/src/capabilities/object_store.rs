use std::fmt;

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind};

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum ObjectStoreOperation {
    Upload {
        bucket: String,
        path: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
        content_type: String,
    },
    PublicUrl {
        bucket: String,
        path: String,
    },
}

// Payload bytes are summarized so uploads never flood logs.
impl fmt::Debug for ObjectStoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectStoreOperation::Upload {
                bucket,
                path,
                bytes,
                content_type,
            } => f
                .debug_struct("Upload")
                .field("bucket", bucket)
                .field("path", path)
                .field("bytes_len", &bytes.len())
                .field("content_type", content_type)
                .finish(),
            ObjectStoreOperation::PublicUrl { bucket, path } => f
                .debug_struct("PublicUrl")
                .field("bucket", bucket)
                .field("path", path)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ObjectStoreOutput {
    Uploaded { path: String },
    PublicUrl { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
pub enum ObjectStoreError {
    #[error("not authorized: {message}")]
    Unauthorized { message: String },

    #[error("payload too large: {size} bytes")]
    PayloadTooLarge { size: usize },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("storage backend error: {message}")]
    Backend { message: String },

    #[error("unexpected response to {operation}")]
    UnexpectedResponse { operation: String },
}

impl ObjectStoreError {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ObjectStoreError::Unauthorized { message }
            | ObjectStoreError::Network { message }
            | ObjectStoreError::Backend { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<ObjectStoreError> for AppError {
    fn from(e: ObjectStoreError) -> Self {
        let kind = match &e {
            ObjectStoreError::Unauthorized { .. } => ErrorKind::Authorization,
            ObjectStoreError::PayloadTooLarge { .. } => ErrorKind::ImageTooLarge,
            ObjectStoreError::Network { .. } => ErrorKind::Network,
            ObjectStoreError::Backend { .. } | ObjectStoreError::UnexpectedResponse { .. } => {
                ErrorKind::Internal
            }
        };
        AppError::new(kind, e.message()).with_internal(e.to_string())
    }
}

pub type ObjectStoreResult = Result<ObjectStoreOutput, ObjectStoreError>;

impl Operation for ObjectStoreOperation {
    type Output = ObjectStoreResult;
}

/// File storage of the hosted backend.
#[derive(Capability)]
pub struct ObjectStore<Ev> {
    context: CapabilityContext<ObjectStoreOperation, Ev>,
}

impl<Ev> ObjectStore<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<ObjectStoreOperation, Ev>) -> Self {
        Self { context }
    }

    /// Uploads `bytes`; the callback receives the stored object path.
    pub fn upload<F>(&self, bucket: &str, path: String, bytes: Vec<u8>, content_type: &str, make_event: F)
    where
        F: FnOnce(Result<String, ObjectStoreError>) -> Ev + Send + 'static,
    {
        let op = ObjectStoreOperation::Upload {
            bucket: bucket.to_string(),
            path,
            bytes,
            content_type: content_type.to_string(),
        };
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(op).await {
                Ok(ObjectStoreOutput::Uploaded { path }) => Ok(path),
                Ok(ObjectStoreOutput::PublicUrl { .. }) => {
                    Err(ObjectStoreError::UnexpectedResponse {
                        operation: "upload".into(),
                    })
                }
                Err(e) => Err(e),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn public_url<F>(&self, bucket: &str, path: String, make_event: F)
    where
        F: FnOnce(Result<String, ObjectStoreError>) -> Ev + Send + 'static,
    {
        let op = ObjectStoreOperation::PublicUrl {
            bucket: bucket.to_string(),
            path,
        };
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(op).await {
                Ok(ObjectStoreOutput::PublicUrl { url }) => Ok(url),
                Ok(ObjectStoreOutput::Uploaded { .. }) => {
                    Err(ObjectStoreError::UnexpectedResponse {
                        operation: "public_url".into(),
                    })
                }
                Err(e) => Err(e),
            };
            ctx.update_app(make_event(result));
        });
    }
}
