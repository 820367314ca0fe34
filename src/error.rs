use crate::config::Source;
use std::fmt;

/// Sum type representing every possible unexceptional fail state.
pub enum Failure {
    /// Neither a per-source override nor the global default webhook URL is
    /// configured for this source.
    NoWebhookUrl(Source),
    /// The POST to Slack failed at the transport level.
    SlackRequestFailed(reqwest::Error),
}

impl From<reqwest::Error> for Failure {
    fn from(e: reqwest::Error) -> Self {
        Failure::SlackRequestFailed(e)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            Failure::NoWebhookUrl(s) => format!("No webhook URL configured for {}", s),
            Failure::SlackRequestFailed(e) => format!("Slack webhook request failed: {:?}", e),
        };

        write!(f, "{}", x)
    }
}
