use oauth2::basic::{BasicErrorResponseType, BasicTokenType};
use oauth2::{
    AuthUrl, Client, ClientId, ClientSecret, EmptyExtraTokenFields, EndpointNotSet, EndpointSet,
    RedirectUrl, RevocationErrorResponseType, StandardErrorResponse, StandardRevocableToken,
    StandardTokenIntrospectionResponse, StandardTokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::config::Config;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Google client with auth, token and redirect URIs set.
pub type ConfiguredClient = Client<
    StandardErrorResponse<BasicErrorResponseType>,
    StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    StandardErrorResponse<RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// # Errors
///
/// Fails when `GOOGLE_REDIRECT_URI` is not a valid URL.
pub fn google_client(config: &Config) -> anyhow::Result<ConfiguredClient> {
    let redirect = RedirectUrl::new(config.google_redirect_uri.clone())
        .map_err(|e| anyhow::anyhow!("GOOGLE_REDIRECT_URI is invalid: {e}"))?;

    Ok(Client::new(ClientId::new(config.google_client_id.clone()))
        .set_client_secret(ClientSecret::new(config.google_client_secret.clone()))
        .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string())?)
        .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?)
        .set_redirect_uri(redirect))
}

/// Google profile returned from the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleProfile {
    /// Display name: given + family name when present, else the full name, else the
    /// e-mail local part.
    pub fn display_name(&self) -> String {
        let joined = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !joined.is_empty() {
            return joined;
        }
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or_default().to_string())
    }
}

/// # Errors
///
/// Fails on transport errors, a non-2xx status or an unexpected body.
pub async fn fetch_google_profile(
    http: &reqwest::Client,
    access_token: &str,
) -> anyhow::Result<GoogleProfile> {
    let resp = http
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Google userinfo request failed: {e}"))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Google userinfo returned {status}: {body}");
    }
    Ok(resp.json::<GoogleProfile>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(given: Option<&str>, family: Option<&str>, name: Option<&str>) -> GoogleProfile {
        GoogleProfile {
            sub: "1".to_string(),
            email: "jane.doe@example.com".to_string(),
            given_name: given.map(String::from),
            family_name: family.map(String::from),
            name: name.map(String::from),
            picture: None,
        }
    }

    #[test]
    fn display_name_prefers_given_and_family() {
        assert_eq!(
            profile(Some("Jane"), Some("Doe"), Some("JD")).display_name(),
            "Jane Doe"
        );
        assert_eq!(profile(Some("Jane"), None, None).display_name(), "Jane");
    }

    #[test]
    fn display_name_falls_back() {
        assert_eq!(profile(None, None, Some("JD")).display_name(), "JD");
        assert_eq!(profile(None, None, None).display_name(), "jane.doe");
    }
}
