//! Client Platform Routing
//!
//! After a confirmed payment the user goes back to the consuming application:
//! a deep link on mobile, the local success page everywhere else.

use serde::{Deserialize, Serialize};
use url::Url;
use url::form_urlencoded;

/// Client platform, detected from the user agent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Desktop,
}

impl Platform {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if ["iphone", "ipad", "ipod"].iter().any(|m| ua.contains(m)) {
            Self::Ios
        } else if ua.contains("android") {
            Self::Android
        } else {
            Self::Desktop
        }
    }

    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Ios | Self::Android)
    }
}

/// App deep-link schemes and the web success page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppLinks {
    pub ios_scheme: String,
    pub android_scheme: String,
    pub android_package: String,
    /// Path of the web success page, relative to the site origin
    pub success_path: String,
}

impl Default for AppLinks {
    fn default() -> Self {
        Self {
            ios_scheme: "org.cloudrescuefoundation.ios".into(),
            android_scheme: "org.cloudrescuefoundation.app".into(),
            android_package: "org.cloudrescuefoundation.app".into(),
            success_path: "/sponsor-success.html".into(),
        }
    }
}

impl AppLinks {
    /// Deep link into the app; `None` on desktop
    pub fn deep_link(&self, platform: Platform, adoption_id: &str, renewal: bool) -> Option<String> {
        let query = success_query(adoption_id, renewal);
        match platform {
            Platform::Ios => Some(format!("{}://sponsor-success?{query}", self.ios_scheme)),
            Platform::Android => Some(format!(
                "intent://sponsor-success?{query}#Intent;scheme={};package={};end",
                self.android_scheme, self.android_package
            )),
            Platform::Desktop => None,
        }
    }

    /// Local success page carrying the adoption id and an explicit renewal flag
    pub fn success_page_url(&self, origin: &Url, adoption_id: &str, renewal: bool) -> String {
        let mut url = origin.clone();
        url.set_path(&self.success_path);
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair("adoptionId", adoption_id)
            .append_pair("renewal", if renewal { "true" } else { "false" });
        url.to_string()
    }
}

fn success_query(adoption_id: &str, renewal: bool) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("adoptionId", adoption_id);
    if renewal {
        query.append_pair("renewal", "true");
    }
    query.finish()
}

/// Parameters the hosted checkout sends the browser back with
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReturnParams {
    pub payment_intent_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub adoption_id: Option<String>,
    /// Renewal context was in play (`action=renew` or `renewal=true`)
    pub renewal: bool,
}

impl ReturnParams {
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "paymentIntentId" => params.payment_intent_id = Some(value.into_owned()),
                "session_id" => params.checkout_session_id = Some(value.into_owned()),
                "adoptionId" => params.adoption_id = Some(value.into_owned()),
                "action" => params.renewal |= value == "renew",
                "renewal" => params.renewal |= value == "true",
                _ => {}
            }
        }
        params
    }

    /// Renewal adoption to confirm against, when this is a renewal return
    pub fn renewal_adoption_id(&self) -> Option<&str> {
        if self.renewal {
            self.adoption_id.as_deref()
        } else {
            None
        }
    }

    /// Final landing on the success page: already confirmed, nothing to do
    pub const fn is_completed_landing(&self) -> bool {
        self.payment_intent_id.is_none() && self.adoption_id.is_some()
    }
}

/// Shown when the app does not take over after a deep link
pub fn return_instructions(renewal: bool) -> String {
    let headline = if renewal {
        "Your sponsorship has been renewed successfully!"
    } else {
        "Your sponsorship has been confirmed!"
    };
    format!(
        "Payment Successful!\n\n{headline}\n\n\
         Please return to the Cloud Rescue app to view your adoption.\n\n\
         You can close this browser tab and go back to the app."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
    const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/130.0";

    #[test]
    fn test_platform_detection() {
        assert_eq!(Platform::from_user_agent(IPHONE_UA), Platform::Ios);
        assert_eq!(Platform::from_user_agent(ANDROID_UA), Platform::Android);
        assert_eq!(Platform::from_user_agent(DESKTOP_UA), Platform::Desktop);
        assert!(!Platform::Desktop.is_mobile());
    }

    #[test]
    fn test_deep_links() {
        let links = AppLinks::default();
        assert_eq!(
            links.deep_link(Platform::Ios, "a1", true).unwrap(),
            "org.cloudrescuefoundation.ios://sponsor-success?adoptionId=a1&renewal=true"
        );
        assert_eq!(
            links.deep_link(Platform::Android, "a1", false).unwrap(),
            "intent://sponsor-success?adoptionId=a1#Intent;scheme=org.cloudrescuefoundation.app;package=org.cloudrescuefoundation.app;end"
        );
        assert_eq!(links.deep_link(Platform::Desktop, "a1", false), None);
    }

    #[test]
    fn test_success_page_url() {
        let origin = Url::parse("https://rescue.org/sponsor-success.html?paymentIntentId=pi_1").unwrap();
        let url = AppLinks::default().success_page_url(&origin, "a9", false);
        assert_eq!(url, "https://rescue.org/sponsor-success.html?adoptionId=a9&renewal=false");
    }

    #[test]
    fn test_return_params() {
        let url = Url::parse(
            "https://rescue.org/sponsor-success.html?paymentIntentId=pi_1&session_id=cs_1&adoptionId=a1&action=renew",
        )
        .unwrap();
        let params = ReturnParams::from_url(&url);
        assert_eq!(params.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(params.checkout_session_id.as_deref(), Some("cs_1"));
        assert_eq!(params.renewal_adoption_id(), Some("a1"));
        assert!(!params.is_completed_landing());

        let landing =
            Url::parse("https://rescue.org/sponsor-success.html?adoptionId=a1&renewal=false").unwrap();
        let params = ReturnParams::from_url(&landing);
        assert!(params.is_completed_landing());
        assert_eq!(params.renewal_adoption_id(), None);
    }

    #[test]
    fn test_return_instructions_differ_for_renewal() {
        assert!(return_instructions(true).contains("renewed"));
        assert!(return_instructions(false).contains("confirmed"));
    }
}
