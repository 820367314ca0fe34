//! Receive [app webhooks][webhooks] from Heroku.
//!
//! Webhooks must be created externally, supplying Iris's `/from-heroku`
//! endpoint as the target URL. Events can be filtered by specifying Heroku
//! entity types during webhook creation; whatever arrives is forwarded with
//! its action, resource, and release status formatted verbatim.
//!
//! Requests can optionally be validated by a shared secret. See [auth].
//!
//! [webhooks]: https://devcenter.heroku.com/articles/app-webhooks

use crate::slack::Notification;
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};
use url::Url;

pub mod auth;

/// The anticipated payload supplied by Heroku in webhook requests.
///
/// This isn't very well documented. An example request is provided here:
///
/// <https://devcenter.heroku.com/articles/app-webhooks#receiving-webhooks>
///
/// Real payloads from a given Heroku app's webhooks can be found here:
///
/// <https://dashboard.heroku.com/apps/HEROKU_APP/webhooks/>
#[derive(Debug, PartialEq, Deserialize)]
pub struct HookPayload {
    action: String,
    resource: String,
    data: HookData,
}

/// General information about the entity for which the webhook event fired.
#[serde_as]
#[derive(Debug, PartialEq, Deserialize)]
struct HookData {
    app: AppData,
    status: String,
    // Heroku omits this for some entity types and sends null or an empty
    // string for others; all three count as absent.
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    output_stream_url: Option<Url>,
}

/// Common metadata about the app for which a webhook event fired.
#[derive(Debug, PartialEq, Deserialize)]
struct AppData {
    name: String,
}

impl HookPayload {
    /// Build the notification describing the event, e.g. for an
    /// `api:release` update: `myapp updates release: succeeded`. The build
    /// output stream is linked on a second line when Heroku offers one.
    pub fn notification(&self) -> Notification {
        let mut text = format!(
            "{} {}s {}: {}",
            self.data.app.name, self.action, self.resource, self.data.status,
        );

        if let Some(url) = &self.data.output_stream_url {
            text.push('\n');
            text.push_str(url.as_str());
        }

        Notification {
            text,
            username: "Heroku".into(),
            icon_emoji: None,
        }
    }
}
