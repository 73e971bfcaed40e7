//! Outbound share links.
//!
//! Every builder is pure: it returns what the shell should do (open a URL,
//! show the native share sheet, copy to the clipboard or show a notice) and
//! never checks whether the destination is reachable.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Characters `encodeURIComponent` leaves alone, removed from the escape set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const SHARE_TITLE: &str = "QR Code Generator";
pub const EMAIL_SUBJECT: &str = "Check out this QR code";
pub const COPIED_NOTICE: &str = "Share link copied to clipboard!";
pub const INSTAGRAM_NOTICE: &str = "Download the QR code and share it manually on Instagram!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareTarget {
    /// System share sheet, or a clipboard copy where there is none
    Native,
    WhatsApp,
    Facebook,
    Twitter,
    Instagram,
    Email,
}

impl ShareTarget {
    pub const ALL: [ShareTarget; 6] = [
        ShareTarget::Native,
        ShareTarget::WhatsApp,
        ShareTarget::Facebook,
        ShareTarget::Twitter,
        ShareTarget::Instagram,
        ShareTarget::Email,
    ];
}

impl FromStr for ShareTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" | "share" => Ok(ShareTarget::Native),
            "whatsapp" => Ok(ShareTarget::WhatsApp),
            "facebook" => Ok(ShareTarget::Facebook),
            "twitter" | "x" => Ok(ShareTarget::Twitter),
            "instagram" => Ok(ShareTarget::Instagram),
            "email" | "mail" => Ok(ShareTarget::Email),
            other => Err(format!("unknown share target '{}'", other)),
        }
    }
}

/// What the shell has to do to complete a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ShareAction {
    /// Navigate to (or open in a new tab) an outbound link
    Open { url: String },
    NativeSheet {
        title: String,
        text: String,
        url: String,
    },
    /// Copy `text` and tell the user with `notice`; the copy is assumed to succeed
    CopyToClipboard { text: String, notice: String },
    Notice { message: String },
}

/// Content and link being shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub text: String,
    pub url: String,
}

impl ShareRequest {
    /// Prefer the hosted link; fall back to the page the user is on.
    pub fn new(content: &str, hosted_url: Option<&str>, current_url: &str) -> Self {
        let url = hosted_url
            .filter(|u| !u.is_empty())
            .unwrap_or(current_url)
            .to_string();
        Self {
            text: format!("Check out this QR code I generated: {}", content),
            url,
        }
    }

    fn text_and_url(&self) -> String {
        format!("{} {}", self.text, self.url)
    }
}

pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

pub fn whatsapp_link(req: &ShareRequest) -> String {
    format!("https://wa.me/?text={}", encode_component(&req.text_and_url()))
}

pub fn facebook_link(req: &ShareRequest) -> String {
    format!(
        "https://www.facebook.com/sharer/sharer.php?u={}",
        encode_component(&req.url)
    )
}

pub fn twitter_link(req: &ShareRequest) -> String {
    format!(
        "https://twitter.com/intent/tweet?text={}&url={}",
        encode_component(&req.text),
        encode_component(&req.url)
    )
}

pub fn email_link(req: &ShareRequest) -> String {
    format!(
        "mailto:?subject={}&body={}",
        encode_component(EMAIL_SUBJECT),
        encode_component(&req.text_and_url())
    )
}

/// Resolve a share button press into an action.
///
/// `native_available` reports whether the platform has a share sheet.
pub fn share(target: ShareTarget, req: &ShareRequest, native_available: bool) -> ShareAction {
    match target {
        ShareTarget::Native if native_available => ShareAction::NativeSheet {
            title: SHARE_TITLE.to_string(),
            text: req.text.clone(),
            url: req.url.clone(),
        },
        ShareTarget::Native => ShareAction::CopyToClipboard {
            text: req.url.clone(),
            notice: COPIED_NOTICE.to_string(),
        },
        ShareTarget::WhatsApp => ShareAction::Open {
            url: whatsapp_link(req),
        },
        ShareTarget::Facebook => ShareAction::Open {
            url: facebook_link(req),
        },
        ShareTarget::Twitter => ShareAction::Open {
            url: twitter_link(req),
        },
        ShareTarget::Email => ShareAction::Open {
            url: email_link(req),
        },
        // No web share endpoint exists for Instagram
        ShareTarget::Instagram => ShareAction::Notice {
            message: INSTAGRAM_NOTICE.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ShareRequest {
        ShareRequest::new(
            "https://example.com",
            Some("https://qr.example/qr/AbC123"),
            "https://qr.example/",
        )
    }

    #[test]
    fn encodes_like_encode_uri_component() {
        assert_eq!(encode_component("a b&c=d/é"), "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn hosted_url_wins_over_current_page() {
        assert_eq!(request().url, "https://qr.example/qr/AbC123");
        let fallback = ShareRequest::new("hi", Some(""), "https://qr.example/");
        assert_eq!(fallback.url, "https://qr.example/");
        let none = ShareRequest::new("hi", None, "https://qr.example/");
        assert_eq!(none.url, "https://qr.example/");
    }

    #[test]
    fn whatsapp_carries_text_and_url() {
        assert_eq!(
            whatsapp_link(&request()),
            "https://wa.me/?text=Check%20out%20this%20QR%20code%20I%20generated%3A%20\
             https%3A%2F%2Fexample.com%20https%3A%2F%2Fqr.example%2Fqr%2FAbC123"
        );
    }

    #[test]
    fn facebook_only_carries_url() {
        assert_eq!(
            facebook_link(&request()),
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fqr.example%2Fqr%2FAbC123"
        );
    }

    #[test]
    fn twitter_splits_text_and_url() {
        let link = twitter_link(&request());
        assert!(link.starts_with("https://twitter.com/intent/tweet?text=Check%20out"));
        assert!(link.ends_with("&url=https%3A%2F%2Fqr.example%2Fqr%2FAbC123"));
    }

    #[test]
    fn email_has_fixed_subject() {
        let link = email_link(&request());
        assert!(link.starts_with("mailto:?subject=Check%20out%20this%20QR%20code&body="));
        assert!(link.ends_with("%20https%3A%2F%2Fqr.example%2Fqr%2FAbC123"));
    }

    #[test]
    fn native_falls_back_to_clipboard() {
        let req = request();
        assert_eq!(
            share(ShareTarget::Native, &req, false),
            ShareAction::CopyToClipboard {
                text: req.url.clone(),
                notice: COPIED_NOTICE.to_string(),
            }
        );
        assert!(matches!(
            share(ShareTarget::Native, &req, true),
            ShareAction::NativeSheet { .. }
        ));
    }

    #[test]
    fn instagram_only_gets_instructions() {
        assert_eq!(
            share(ShareTarget::Instagram, &request(), true),
            ShareAction::Notice {
                message: INSTAGRAM_NOTICE.to_string()
            }
        );
    }

    #[test]
    fn targets_parse_from_names() {
        assert_eq!("WhatsApp".parse::<ShareTarget>(), Ok(ShareTarget::WhatsApp));
        assert_eq!("x".parse::<ShareTarget>(), Ok(ShareTarget::Twitter));
        assert!("myspace".parse::<ShareTarget>().is_err());
    }
}
