//! Deliver notifications to a Slack [incoming webhook][webhooks].
//!
//! Incoming webhooks are the simplest of Slack's messaging APIs: a single
//! POST, no OAuth, the channel fixed on Slack's end when the webhook is
//! created.
//!
//! [webhooks]: https://api.slack.com/messaging/webhooks

use crate::error::Failure;
use serde::Serialize;
use url::Url;

/// A notification as Slack's incoming webhooks accept it.
///
/// `username` overrides the webhook's display name per message. A missing
/// `icon_emoji` is serialised as `null`, leaving the webhook's configured
/// icon untouched.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub text: String,
    pub username: String,
    pub icon_emoji: Option<String>,
}

/// What Slack answered to a delivery that reached it, mirrored back to our
/// own caller.
pub struct Delivery {
    pub status: u16,
    pub body: String,
}

/// Post a notification to the given webhook URL. No retries; whatever status
/// Slack answers is the caller's to deal with.
pub async fn deliver(
    client: &reqwest::Client,
    target: &Url,
    notif: &Notification,
) -> Result<Delivery, Failure> {
    let res = client
        .post(target.clone())
        // Set before `json` so the charset isn't dropped.
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/json; charset=utf-8",
        )
        .json(notif)
        .send()
        .await?;

    let status = res.status().as_u16();
    let body = res.text().await?;

    Ok(Delivery { status, body })
}
