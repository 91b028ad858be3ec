//! OAuth token helpers for Twitch authentication.
//!
//! Tokens are obtained through the implicit grant: the user authorizes in a
//! browser and the token comes back in the fragment of the redirect URL.
//! Driving the browser is left to the caller.

use url::Url;

use crate::TwitchError;

const AUTHORIZE_URL: &str = "https://api.twitch.tv/kraken/oauth2/authorize";

/// Redirect URI registered for the notifier application.
pub const DEFAULT_REDIRECT_URI: &str = "notifier://main";

/// Prefix used by chat (TMI) style tokens.
const TMI_PREFIX: &str = "oauth:";

/// Strip surrounding whitespace and a TMI-style `oauth:` prefix.
pub fn normalize_oauth_token(token: &str) -> String {
    let token = token.trim();
    token.strip_prefix(TMI_PREFIX).unwrap_or(token).to_string()
}

/// Generate the implicit-grant authorization URL for the given scopes.
pub fn authorize_url(
    client_id: &str,
    redirect_uri: &str,
    scopes: &[&str],
) -> Result<String, TwitchError> {
    let mut url = Url::parse(AUTHORIZE_URL)?;
    url.query_pairs_mut()
        .append_pair("response_type", "token")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &scopes.join(" "));
    Ok(url.to_string())
}

/// Extract the `access_token` from the fragment of an implicit-grant redirect.
pub fn token_from_redirect(redirect: &str) -> Result<String, TwitchError> {
    let url = Url::parse(redirect)?;
    let fragment = url
        .fragment()
        .ok_or_else(|| TwitchError::Protocol(format!("no fragment in redirect '{redirect}'")))?;

    let mut tokens = url::form_urlencoded::parse(fragment.as_bytes())
        .filter(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned());

    match (tokens.next(), tokens.next()) {
        (Some(token), None) if !token.is_empty() => Ok(token),
        (None, _) => Err(TwitchError::MissingField("access_token".into())),
        _ => Err(TwitchError::Protocol(
            "expected exactly one access_token in redirect fragment".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SCOPES;

    #[test]
    fn test_authorize_url_generation() {
        let url = authorize_url("test_client_id", DEFAULT_REDIRECT_URI, SCOPES).unwrap();

        assert!(url.starts_with("https://api.twitch.tv/kraken/oauth2/authorize?"));
        assert!(url.contains("response_type=token"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("redirect_uri=notifier%3A%2F%2Fmain"));
        assert!(url.contains("scope=user_read"));
    }

    #[test]
    fn test_normalize_strips_tmi_prefix() {
        assert_eq!(normalize_oauth_token("  oauth:abc "), "abc");
        assert_eq!(normalize_oauth_token("abc"), "abc");
        assert_eq!(normalize_oauth_token("   "), "");
    }

    #[test]
    fn test_token_from_redirect_fragment() {
        let token =
            token_from_redirect("notifier://main#access_token=s3cr3t&scope=user_read").unwrap();
        assert_eq!(token, "s3cr3t");
    }

    #[test]
    fn test_token_from_redirect_errors() {
        assert!(matches!(
            token_from_redirect("notifier://main"),
            Err(TwitchError::Protocol(_))
        ));
        assert!(matches!(
            token_from_redirect("notifier://main#scope=user_read"),
            Err(TwitchError::MissingField(_))
        ));
        assert!(matches!(
            token_from_redirect("notifier://main#access_token=a&access_token=b"),
            Err(TwitchError::Protocol(_))
        ));
    }
}
