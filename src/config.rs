//! Immutable environment-derived configuration.
//!
//! Everything is read exactly once at startup into [Config] and passed down
//! into the router, so the override-resolution policy is testable without
//! touching the environment. Missing values are never fatal here; an
//! unresolvable webhook target fails the affected request instead (see
//! [crate::router]).

use crate::heroku::auth::HerokuSecret;
use std::{env, fmt};
use tracing::warn;
use url::Url;

/// The services we accept webhooks from, keyed by route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    DockerHub,
    Heroku,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            Source::DockerHub => "DockerHub",
            Source::Heroku => "Heroku",
        };

        write!(f, "{}", x)
    }
}

/// Slack incoming-webhook targets: a global default plus optional per-source
/// overrides.
#[derive(Debug, Default)]
pub struct WebhookTargets {
    pub default: Option<Url>,
    pub docker_hub: Option<Url>,
    pub heroku: Option<Url>,
}

impl WebhookTargets {
    /// The target for a source is its own override if one is configured,
    /// otherwise the global default. An override never leaks across sources.
    pub fn resolve(&self, source: Source) -> Option<&Url> {
        let specific = match source {
            Source::DockerHub => self.docker_hub.as_ref(),
            Source::Heroku => self.heroku.as_ref(),
        };

        specific.or(self.default.as_ref())
    }
}

/// Everything the relay reads from the environment.
pub struct Config {
    pub targets: WebhookTargets,
    pub heroku_secret: Option<HerokuSecret>,
}

impl Config {
    /// Read configuration from the environment. Unset variables leave their
    /// field as `None`; a set but unparseable URL is dropped with a warning
    /// rather than taking the process down.
    pub fn from_env() -> Self {
        Config {
            targets: WebhookTargets {
                default: env_url("SLACK_WEBHOOK_URL"),
                docker_hub: env_url("SLACK_WEBHOOK_URL_FOR_DOCKER_HUB"),
                heroku: env_url("SLACK_WEBHOOK_URL_FOR_HEROKU"),
            },
            heroku_secret: env::var("HEROKU_WEBHOOK_SECRET").ok().map(HerokuSecret),
        }
    }
}

fn env_url(key: &str) -> Option<Url> {
    let raw = env::var(key).ok()?;

    match Url::parse(&raw) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Ignoring ${} as it failed to parse as a URL: {}", key, e);
            None
        }
    }
}
