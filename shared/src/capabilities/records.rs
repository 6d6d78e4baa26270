use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::UserId;
use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "data")]
pub enum RecordOperation {
    /// Single row of `table` whose `id` column equals `id`.
    Select {
        table: String,
        columns: Vec<String>,
        id: UserId,
    },
    /// Insert-or-replace keyed by the record's `id` field.
    Upsert {
        table: String,
        record: serde_json::Value,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum RecordOutput {
    Row(serde_json::Value),
    Written,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record not found")]
    NotFound,

    #[error("not authorized: {message}")]
    Unauthorized { message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("backend error {code:?}: {message}")]
    Backend {
        #[serde(default)]
        code: Option<String>,
        message: String,
    },

    #[error("unexpected response to {operation}")]
    UnexpectedResponse { operation: String },
}

impl From<RecordError> for AppError {
    fn from(e: RecordError) -> Self {
        let kind = match &e {
            RecordError::NotFound => ErrorKind::NotFound,
            RecordError::Unauthorized { .. } => ErrorKind::Authorization,
            RecordError::Network { .. } => ErrorKind::Network,
            RecordError::Backend { .. } => ErrorKind::Internal,
            RecordError::UnexpectedResponse { .. } => ErrorKind::Deserialization,
        };
        AppError::new(kind, "Could not reach your saved data").with_internal(e.to_string())
    }
}

pub type RecordResult = Result<RecordOutput, RecordError>;

impl Operation for RecordOperation {
    type Output = RecordResult;
}

/// Relational storage of the hosted backend.
#[derive(Capability)]
pub struct Records<Ev> {
    context: CapabilityContext<RecordOperation, Ev>,
}

impl<Ev> Records<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<RecordOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn select<F>(&self, table: &str, columns: &[&str], id: UserId, make_event: F)
    where
        F: FnOnce(Result<serde_json::Value, RecordError>) -> Ev + Send + 'static,
    {
        let op = RecordOperation::Select {
            table: table.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
            id,
        };
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(op).await {
                Ok(RecordOutput::Row(row)) => Ok(row),
                Ok(RecordOutput::Written) => Err(RecordError::UnexpectedResponse {
                    operation: "select".into(),
                }),
                Err(e) => Err(e),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn upsert<F>(&self, table: &str, record: serde_json::Value, make_event: F)
    where
        F: FnOnce(Result<(), RecordError>) -> Ev + Send + 'static,
    {
        let op = RecordOperation::Upsert {
            table: table.to_string(),
            record,
        };
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(op).await {
                Ok(RecordOutput::Written) => Ok(()),
                Ok(RecordOutput::Row(_)) => Err(RecordError::UnexpectedResponse {
                    operation: "upsert".into(),
                }),
                Err(e) => Err(e),
            };
            ctx.update_app(make_event(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_wire_format() {
        let op = RecordOperation::Select {
            table: "users".into(),
            columns: vec!["saved_meals".into()],
            id: UserId::new("u-1"),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "op": "Select",
                "data": { "table": "users", "columns": ["saved_meals"], "id": "u-1" }
            })
        );
    }

    #[test]
    fn errors_map_to_kinds() {
        let network: AppError = RecordError::Network {
            message: "offline".into(),
        }
        .into();
        assert_eq!(network.kind, ErrorKind::Network);
        assert!(network.is_retryable());

        let missing: AppError = RecordError::NotFound.into();
        assert_eq!(missing.kind, ErrorKind::NotFound);
        assert!(!missing.is_retryable());
    }
}
