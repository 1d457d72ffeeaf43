//! Reset link construction and extraction.
//!
//! Outbound links use the first-party shape: the raw recovery token and the
//! email ride as query parameters on the app's reset page. Inbound URLs may
//! also carry a fragment-style access token, the shape a provider-hosted
//! flow lands with after it has already established a session.

use url::{form_urlencoded, Url};

/// Token material recognized in an incoming reset URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResetLink {
    /// `?token=<opaque>&email=<addr>`: a recovery token still to be redeemed.
    Recovery { token: String, email: String },
    /// `#access_token=<opaque>&...`: a session was already established.
    Established { access_token: String },
}

impl ResetLink {
    /// Recognize the token shape carried by `url`, if any.
    ///
    /// Exactly one shape is expected; when both are somehow present the
    /// fragment wins, since it means a session already exists.
    #[must_use]
    pub fn parse(url: &Url) -> Option<Self> {
        if let Some(access_token) = fragment_access_token(url) {
            return Some(Self::Established { access_token });
        }

        let mut token = None;
        let mut email = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "token" if !value.is_empty() => token = Some(value.into_owned()),
                "email" if !value.is_empty() => email = Some(value.into_owned()),
                _ => {}
            }
        }

        match (token, email) {
            (Some(token), Some(email)) => Some(Self::Recovery { token, email }),
            _ => None,
        }
    }
}

fn fragment_access_token(url: &Url) -> Option<String> {
    let fragment = url.fragment()?;
    form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

/// Build the first-party link embedded in the reset mail.
///
/// `Url` query serialization takes care of percent-encoding the email.
#[must_use]
pub fn build_reset_url(reset_page_url: &Url, token: &str, email: &str) -> Url {
    let mut url = reset_page_url.clone();
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("email", email);
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn page() -> Result<Url> {
        Ok(Url::parse("https://app.example.com/reset-password")?)
    }

    #[test]
    fn build_url_encodes_email() -> Result<()> {
        let url = build_reset_url(&page()?, "abc123", "real.member@example.com");
        assert_eq!(
            url.as_str(),
            "https://app.example.com/reset-password?token=abc123&email=real.member%40example.com"
        );
        Ok(())
    }

    #[test]
    fn parse_recognizes_query_pair() -> Result<()> {
        let url = Url::parse(
            "https://app.example.com/reset-password?token=abc123&email=real.member%40example.com",
        )?;
        assert_eq!(
            ResetLink::parse(&url),
            Some(ResetLink::Recovery {
                token: "abc123".to_string(),
                email: "real.member@example.com".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn parse_recognizes_fragment_token() -> Result<()> {
        let url = Url::parse(
            "https://app.example.com/reset-password#access_token=tok&expires_in=3600&type=recovery",
        )?;
        assert_eq!(
            ResetLink::parse(&url),
            Some(ResetLink::Established {
                access_token: "tok".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn parse_prefers_fragment_over_query() -> Result<()> {
        let url = Url::parse(
            "https://app.example.com/reset-password?token=abc&email=a%40b.co#access_token=tok",
        )?;
        assert_eq!(
            ResetLink::parse(&url),
            Some(ResetLink::Established {
                access_token: "tok".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn parse_rejects_incomplete_shapes() -> Result<()> {
        for candidate in [
            "https://app.example.com/reset-password",
            "https://app.example.com/reset-password?token=abc",
            "https://app.example.com/reset-password?email=a%40b.co",
            "https://app.example.com/reset-password?token=&email=a%40b.co",
            "https://app.example.com/reset-password#access_token=",
            "https://app.example.com/reset-password#type=recovery",
        ] {
            assert_eq!(ResetLink::parse(&Url::parse(candidate)?), None, "{candidate}");
        }
        Ok(())
    }

    #[test]
    fn built_url_round_trips_through_parse() -> Result<()> {
        let url = build_reset_url(&page()?, "one-time", "member+tag@example.com");
        assert_eq!(
            ResetLink::parse(&url),
            Some(ResetLink::Recovery {
                token: "one-time".to_string(),
                email: "member+tag@example.com".to_string(),
            })
        );
        Ok(())
    }
}
