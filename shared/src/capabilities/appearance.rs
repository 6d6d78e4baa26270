use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::subscription::SubscriptionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }

    /// Parses a stored value; anything but `light`/`dark` is no preference.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(ColorScheme::Light),
            "dark" => Some(ColorScheme::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            ColorScheme::Light => ColorScheme::Dark,
            ColorScheme::Dark => ColorScheme::Light,
        }
    }
}

/// Device preference as reported by the OS; `None` when it is unknown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorSchemeChange {
    pub seq: u64,
    pub scheme: Option<ColorScheme>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum AppearanceOperation {
    Watch { subscription: SubscriptionId },
    Unwatch { subscription: SubscriptionId },
}

impl Operation for AppearanceOperation {
    type Output = ColorSchemeChange;
}

#[derive(Capability)]
pub struct Appearance<Ev> {
    context: CapabilityContext<AppearanceOperation, Ev>,
}

impl<Ev> Appearance<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<AppearanceOperation, Ev>) -> Self {
        Self { context }
    }

    /// The shell sends the current preference first, then every change.
    pub fn watch<F>(&self, subscription: SubscriptionId, make_event: F)
    where
        F: Fn(ColorSchemeChange) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let mut stream =
                std::pin::pin!(ctx.stream_from_shell(AppearanceOperation::Watch { subscription }));
            while let Some(change) = stream.next().await {
                ctx.update_app(make_event(change));
            }
        });
    }

    pub fn unwatch(&self, subscription: SubscriptionId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(AppearanceOperation::Unwatch { subscription })
                .await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_only_known_values() {
        assert_eq!(ColorScheme::parse("light"), Some(ColorScheme::Light));
        assert_eq!(ColorScheme::parse("dark\n"), Some(ColorScheme::Dark));
        assert_eq!(ColorScheme::parse("system"), None);
        assert_eq!(ColorScheme::parse(""), None);
        assert_eq!(ColorScheme::parse("DARK"), None);
    }

    #[test]
    fn opposite_flips() {
        assert_eq!(ColorScheme::Light.opposite(), ColorScheme::Dark);
        assert_eq!(ColorScheme::Dark.opposite(), ColorScheme::Light);
    }
}
