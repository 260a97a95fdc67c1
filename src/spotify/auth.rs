use std::{fmt, sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    config::{self, OAuthSettings},
    error,
    management::TokenManager,
    server::start_callback_server,
    spotify::http_client,
    success,
    types::{PkceToken, Token, TokenResponse},
    utils, warning,
};

const DEFAULT_EXPIRES_IN: u64 = 3600;
const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug)]
pub enum AuthError {
    /// Transport failure or a body that is not a token response.
    Http(reqwest::Error),
    /// The accounts service answered with an OAuth error code such as `invalid_grant`.
    Rejected(String),
    MissingField(&'static str),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Http(e) => write!(f, "token request failed: {}", e),
            AuthError::Rejected(code) => write!(f, "token request rejected: {}", code),
            AuthError::MissingField(field) => write!(f, "token response without {}", field),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Http(err)
    }
}

/// Builds the URL of the accounts service consent page.
///
/// Passing a code challenge switches the request to the PKCE variant
/// (`code_challenge_method=S256`).
pub fn authorize_url(settings: &OAuthSettings, code_challenge: Option<&str>) -> String {
    let mut params: Vec<(&str, &str)> = vec![
        ("client_id", settings.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", settings.redirect_uri.as_str()),
        ("scope", settings.scope.as_str()),
    ];
    if let Some(challenge) = code_challenge {
        params.push(("code_challenge_method", "S256"));
        params.push(("code_challenge", challenge));
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", settings.auth_url, query)
}

/// Posts a grant to the token endpoint.
///
/// Confidential clients authenticate with HTTP Basic; public (PKCE) clients
/// send their `client_id` in the form instead.
async fn request_token(
    settings: &OAuthSettings,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let mut form = form.to_vec();
    let request = http_client().post(&settings.token_url);
    let request = match &settings.client_secret {
        Some(secret) => request.basic_auth(&settings.client_id, Some(secret)),
        None => {
            form.push(("client_id", settings.client_id.as_str()));
            request
        }
    };

    let response = request.form(&form).send().await?;
    Ok(response.json::<TokenResponse>().await?)
}

/// Turns a token endpoint body into a [`Token`].
///
/// `previous_refresh` is kept when the service does not rotate the refresh token.
pub fn into_token(
    response: TokenResponse,
    previous_refresh: Option<&str>,
) -> Result<Token, AuthError> {
    if let Some(code) = response.error {
        return Err(AuthError::Rejected(code));
    }

    let access_token = response
        .access_token
        .ok_or(AuthError::MissingField("access_token"))?;
    let refresh_token = response
        .refresh_token
        .or_else(|| previous_refresh.map(str::to_string))
        .ok_or(AuthError::MissingField("refresh_token"))?;

    Ok(Token {
        access_token,
        refresh_token,
        scope: response.scope.unwrap_or_default(),
        expires_in: response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
        obtained_at: Utc::now().timestamp() as u64,
    })
}

/// Exchanges an authorization code for tokens.
///
/// `verifier` must be the PKCE code verifier when the login used a code challenge.
pub async fn exchange_code(
    settings: &OAuthSettings,
    code: &str,
    verifier: Option<&str>,
) -> Result<Token, AuthError> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", settings.redirect_uri.as_str()),
    ];
    if let Some(verifier) = verifier {
        form.push(("code_verifier", verifier));
    }

    into_token(request_token(settings, &form).await?, None)
}

/// Exchanges a refresh token for a fresh access token.
///
/// The returned token carries the rotated refresh token when the service
/// issued one, and the old one otherwise.
pub async fn refresh_token(settings: &OAuthSettings, refresh_token: &str) -> Result<Token, AuthError> {
    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];

    into_token(request_token(settings, &form).await?, Some(refresh_token))
}

/// Runs the terminal login: PKCE with a temporary local callback server.
///
/// 1. Generates the code verifier and its S256 challenge
/// 2. Starts the callback server on `CLI_CALLBACK_ADDRESS`
/// 3. Opens the consent page in the default browser
/// 4. Waits for the callback handler to complete the exchange
/// 5. Persists the token with [`TokenManager`]
pub async fn auth(shared_state: Arc<Mutex<Option<PkceToken>>>) {
    let settings = match OAuthSettings::for_cli() {
        Ok(s) => s,
        Err(e) => error!("Cannot start login: {}", e),
    };

    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    // Store verifier in shared state before redirect
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let server_state = Arc::clone(&shared_state);
    let server_settings = settings.clone();
    tokio::spawn(async move {
        if let Err(e) =
            start_callback_server(&config::cli_callback_addr(), server_settings, server_state).await
        {
            error!("Failed to start callback server: {}", e);
        }
    });

    let auth_url = authorize_url(&settings, Some(&code_challenge));
    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    match wait_for_token(shared_state).await {
        Some(t) => {
            let token_manager = TokenManager::new(t, settings);
            if let Err(e) = token_manager.persist().await {
                error!("Failed to save token to cache: {}", e);
            }

            success!("Authentication successful!");
        }
        None => {
            error!("Authentication failed or timed out.");
        }
    }
}

/// Polls the shared state until the callback handler stored a token.
async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < LOGIN_TIMEOUT {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|p| p.token.as_ref()) {
            return Some(token.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

#[cfg(test)]
mod tests {
    use reqwest::Url;

    use super::*;

    fn settings(secret: Option<&str>) -> OAuthSettings {
        OAuthSettings {
            client_id: "client123".to_string(),
            client_secret: secret.map(str::to_string),
            redirect_uri: "http://127.0.0.1:3000/api/auth/callback".to_string(),
            scope: "streaming user-read-private".to_string(),
            auth_url: config::DEFAULT_AUTH_URL.to_string(),
            token_url: config::DEFAULT_TOKEN_URL.to_string(),
        }
    }

    #[test]
    fn authorize_url_carries_code_flow_params() {
        let url = Url::parse(&authorize_url(&settings(Some("s3cret")), None)).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert!(pairs.contains(&("client_id".into(), "client123".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("scope".into(), "streaming user-read-private".into())));
        assert!(pairs.iter().all(|(k, _)| k != "code_challenge"));
    }

    #[test]
    fn authorize_url_adds_pkce_challenge() {
        let url = Url::parse(&authorize_url(&settings(None), Some("abc-_123"))).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("code_challenge".into(), "abc-_123".into())));
        assert!(pairs.contains(&("code_challenge_method".into(), "S256".into())));
    }

    #[test]
    fn authorize_url_encodes_relative_auth_url() {
        let mut relative = settings(None);
        relative.auth_url = "/authorize".to_string();
        let url = authorize_url(&relative, Some("abc"));

        assert!(url.starts_with("/authorize?client_id=client123&"));
        assert!(!url.contains(' '));
        assert!(url.contains("scope=streaming%20user-read-private"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A3000%2Fapi%2Fauth%2Fcallback"));
    }

    #[test]
    fn into_token_reports_oauth_error_code() {
        let response = TokenResponse {
            error: Some("invalid_grant".to_string()),
            ..Default::default()
        };
        match into_token(response, None) {
            Err(AuthError::Rejected(code)) => assert_eq!(code, "invalid_grant"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn into_token_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: Some("new-access".to_string()),
            expires_in: Some(1800),
            ..Default::default()
        };
        let token = into_token(response, Some("old-refresh")).unwrap();
        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token, "old-refresh");
        assert_eq!(token.expires_in, 1800);
    }

    #[test]
    fn into_token_requires_refresh_token_on_first_exchange() {
        let response = TokenResponse {
            access_token: Some("access".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            into_token(response, None),
            Err(AuthError::MissingField("refresh_token"))
        ));
    }
}
