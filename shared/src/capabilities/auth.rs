use std::fmt;

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::model::UserId;
use crate::subscription::SubscriptionId;
use crate::{AppError, ErrorKind};

/// Wiped from memory when dropped; `Debug` never prints it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: Password,
}

impl Credentials {
    /// Trims the email and rejects blank fields before anything reaches the provider.
    pub fn new(email: &str, password: Password) -> Result<Self, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidInput {
                reason: "email is required".into(),
            });
        }
        if password.expose().is_empty() {
            return Err(AuthError::InvalidInput {
                reason: "password is required".into(),
            });
        }
        Ok(Self {
            email: email.to_string(),
            password,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    #[serde(default)]
    pub expires_at: Option<u64>,
}

/// One delivery on an auth subscription. `seq` increases per subscription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthStateChange {
    pub seq: u64,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum AuthOperation {
    GetSession,
    Subscribe { subscription: SubscriptionId },
    Unsubscribe { subscription: SubscriptionId },
    SignInWithPassword(Credentials),
    SignUp(Credentials),
    SignOut,
}

impl AuthOperation {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            AuthOperation::GetSession => "get_session",
            AuthOperation::Subscribe { .. } => "subscribe",
            AuthOperation::Unsubscribe { .. } => "unsubscribe",
            AuthOperation::SignInWithPassword(_) => "sign_in_with_password",
            AuthOperation::SignUp(_) => "sign_up",
            AuthOperation::SignOut => "sign_out",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum AuthOutput {
    Session(Option<Session>),
    StateChanged(AuthStateChange),
    SignedUp,
    SignedOut,
    Unsubscribed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("auth provider error: {message}")]
    Provider {
        message: String,
        #[serde(default)]
        status: Option<u16>,
    },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("unexpected response to {operation}")]
    UnexpectedResponse { operation: String },
}

impl AuthError {
    /// Message suitable for showing to the person signing in.
    #[must_use]
    pub fn provider_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials { message }
            | AuthError::Provider { message, .. }
            | AuthError::Network { message } => message.clone(),
            AuthError::InvalidInput { reason } => reason.clone(),
            AuthError::UnexpectedResponse { .. } => "Something went wrong".into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        let kind = match &e {
            AuthError::InvalidInput { .. } => ErrorKind::Validation,
            AuthError::Network { .. } => ErrorKind::Network,
            AuthError::UnexpectedResponse { .. } => ErrorKind::Internal,
            AuthError::InvalidCredentials { .. } | AuthError::Provider { .. } => {
                ErrorKind::Authentication
            }
        };
        AppError::new(kind, e.provider_message()).with_internal(e.to_string())
    }
}

pub type AuthResult = Result<AuthOutput, AuthError>;

impl Operation for AuthOperation {
    type Output = AuthResult;
}

fn unexpected(operation: &AuthOperation) -> AuthError {
    AuthError::UnexpectedResponse {
        operation: operation.name().to_string(),
    }
}

/// Bridge to the platform auth SDK.
#[derive(Capability)]
pub struct Auth<Ev> {
    context: CapabilityContext<AuthOperation, Ev>,
}

impl<Ev> Auth<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<AuthOperation, Ev>) -> Self {
        Self { context }
    }

    /// One-shot read of the persisted session.
    pub fn get_session<F>(&self, make_event: F)
    where
        F: FnOnce(Result<Option<Session>, AuthError>) -> Ev + Send + 'static,
    {
        self.session_request(AuthOperation::GetSession, make_event);
    }

    pub fn sign_in<F>(&self, credentials: Credentials, make_event: F)
    where
        F: FnOnce(Result<Option<Session>, AuthError>) -> Ev + Send + 'static,
    {
        self.session_request(AuthOperation::SignInWithPassword(credentials), make_event);
    }

    pub fn sign_up<F>(&self, credentials: Credentials, make_event: F)
    where
        F: FnOnce(Result<(), AuthError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let op = AuthOperation::SignUp(credentials);
            let result = match ctx.request_from_shell(op.clone()).await {
                Ok(AuthOutput::SignedUp | AuthOutput::Session(_)) => Ok(()),
                Ok(_) => Err(unexpected(&op)),
                Err(e) => Err(e),
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn sign_out<F>(&self, make_event: F)
    where
        F: FnOnce(Result<(), AuthError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let op = AuthOperation::SignOut;
            let result = match ctx.request_from_shell(op.clone()).await {
                Ok(AuthOutput::SignedOut) => Ok(()),
                Ok(_) => Err(unexpected(&op)),
                Err(e) => Err(e),
            };
            ctx.update_app(make_event(result));
        });
    }

    /// Opens the auth-change stream. Every delivery the shell sends is
    /// forwarded; ordering and teardown are enforced by the session store.
    pub fn subscribe<F>(&self, subscription: SubscriptionId, make_event: F)
    where
        F: Fn(AuthStateChange) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let op = AuthOperation::Subscribe {
                subscription: subscription.clone(),
            };
            let mut stream = std::pin::pin!(ctx.stream_from_shell(op));
            while let Some(output) = stream.next().await {
                match output {
                    Ok(AuthOutput::StateChanged(change)) => ctx.update_app(make_event(change)),
                    Ok(other) => {
                        warn!(%subscription, output = ?other, "ignoring unexpected auth stream output");
                    }
                    Err(e) => warn!(%subscription, error = %e, "auth stream reported an error"),
                }
            }
        });
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(AuthOperation::Unsubscribe { subscription })
                .await;
        });
    }

    fn session_request<F>(&self, op: AuthOperation, make_event: F)
    where
        F: FnOnce(Result<Option<Session>, AuthError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(op.clone()).await {
                Ok(AuthOutput::Session(session)) => Ok(session),
                Ok(_) => Err(unexpected(&op)),
                Err(e) => Err(e),
            };
            ctx.update_app(make_event(result));
        });
    }
}
