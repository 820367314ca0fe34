//! Receive image push webhooks from Docker Hub.
//!
//! Webhooks must be created externally on the repository, supplying Iris's
//! `/from-docker-hub` endpoint as the target URL. Docker Hub fires one
//! request per push.
//!
//! <https://docs.docker.com/docker-hub/webhooks/>

use crate::slack::Notification;
use serde::Deserialize;
use url::Url;

/// The anticipated payload supplied by Docker Hub in webhook requests. Docker
/// Hub sends a lot more than this; anything we don't need for the
/// notification text is ignored.
#[derive(Debug, PartialEq, Deserialize)]
pub struct PushPayload {
    push_data: PushData,
    repository: Repository,
}

/// Details of the push that fired the webhook.
#[derive(Debug, PartialEq, Deserialize)]
struct PushData {
    pusher: String,
    tag: String,
}

/// Metadata about the repository that was pushed to.
#[derive(Debug, PartialEq, Deserialize)]
struct Repository {
    repo_name: String,
    repo_url: Url,
}

impl PushPayload {
    /// Build the notification announcing the push.
    pub fn notification(&self) -> Notification {
        let text = format!(
            "New image was pushed to {}:{} by {}\n{}",
            self.repository.repo_name,
            self.push_data.tag,
            self.push_data.pusher,
            self.repository.repo_url,
        );

        Notification {
            text,
            username: "DockerHub".into(),
            icon_emoji: None,
        }
    }
}
