//! OAuth 2.0 for an installed application reading YouTube revenue data.
//!
//! The user authorizes in their browser and Google redirects to a one-shot HTTP server on the
//! loopback interface. The authorization code is exchanged using PKCE, so the client secret
//! shipped in `client_secrets.json` does not have to stay secret.

use crate::config::ClientSecrets;
use bytes::Bytes;
use eyre::Context;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    Scope, TokenUrl,
};
use oauth2::{TokenResponse, reqwest};
use std::future::Future;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth2 token endpoint URL used for both initial authentication and token refresh
const TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v3/token";

/// Read access to the channel, its content-owner data, and its (monetary) analytics.
pub const SCOPES: [&str; 4] = [
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtubepartner",
    "https://www.googleapis.com/auth/yt-analytics.readonly",
    "https://www.googleapis.com/auth/yt-analytics-monetary.readonly",
];

const OAUTH_DONE: &str = include_str!("../oauth_success.html");

/// Runs the OAuth flows against Google's endpoints with one set of client credentials.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    secrets: ClientSecrets,
}

impl OAuthManager {
    pub fn new(secrets: ClientSecrets) -> Self {
        Self { secrets }
    }

    /// Performs a complete authorization code flow to obtain a new token.
    ///
    /// Opens the user's browser on Google's consent page and waits for the redirect.
    pub async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(AUTH_URL.to_string()).context("authorization endpoint")?)
            .set_token_uri(TokenUrl::new(TOKEN_URL.to_string()).context("token endpoint")?)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf.clone())
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        if let Err(e) = webbrowser::open(auth_url.as_ref()) {
            tracing::warn!(error = %e, "could not open a browser, open the URL manually");
            eprintln!("Open this URL in your browser to authorize access:\n{auth_url}");
        }
        let authorization_code = eventually_authorization_code
            .await
            .context("await user authorization code")?;

        let token = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client()?)
            .await
            .context("exchange authorization code with access token")?;

        Ok(token)
    }

    /// Attempts to refresh an existing token using its refresh token.
    ///
    /// * `Ok(Some(new_token))` - refresh succeeded
    /// * `Ok(None)` - no refresh token, or Google no longer accepts it
    /// * `Err(_)` - network or other error
    pub async fn refresh_token(
        &self,
        token: BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_token_uri(TokenUrl::new(TOKEN_URL.to_string()).context("token endpoint")?);

        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&http_client()?)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }

    /// Starts a local HTTP server that receives the authorization redirect.
    ///
    /// Returns the redirect URL to register with the flow, and a future that resolves to the
    /// authorization code once Google redirects the user's browser back to us.
    async fn setup_redirect(
        &self,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>>,
    )> {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    async move {
                        let code = parse_redirect_query(req.uri().query().unwrap_or(""), &csrf)?;
                        got.send(code)
                            .await
                            .map_err(|_| "redirect server already shut down")?;
                        Ok::<_, &'static str>(Response::new(Full::new(Bytes::from_static(
                            OAUTH_DONE.as_bytes(),
                        ))))
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = &mut serve => {
                        if let Err(e) = exit {
                            Err(e).context("redirect server got bad request")
                        } else {
                            eyre::bail!("redirect server exit prematurely");
                        }
                    }
                    code = gotten.recv() => {
                        // let the connection finish sending the success page
                        serve.as_mut().graceful_shutdown();
                        if let Err(e) = serve.await {
                            tracing::debug!(error = %e, "redirect server shut down uncleanly");
                        }
                        code.ok_or_else(|| eyre::eyre!("redirect server dropped the authorization code"))
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

fn http_client() -> eyre::Result<reqwest::Client> {
    reqwest::ClientBuilder::new()
        // SSRF no thank you.
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("build OAuth HTTP client")
}

/// Extracts the authorization code from the query string Google redirects to.
fn parse_redirect_query(query: &str, csrf: &CsrfToken) -> Result<AuthorizationCode, &'static str> {
    let mut presented_state = None;
    let mut presented_code = None;
    // space-separated
    let mut presented_scope = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            "scope" => presented_scope = Some(v),
            _ => {}
        }
    }
    if presented_state.as_deref() != Some(csrf.secret().as_str()) {
        return Err("invalid csrf token");
    }
    let Some(code) = presented_code else {
        return Err("no authorization code found");
    };
    let missing = missing_scopes(presented_scope.as_deref().unwrap_or(""));
    if !missing.is_empty() {
        // the reports will fail later with a permission error
        tracing::warn!(?missing, "user did not grant every requested scope");
    }
    Ok(AuthorizationCode::new(code.into_owned()))
}

/// The entries of [`SCOPES`] that do not appear in a space-separated list of granted scopes.
fn missing_scopes(granted: &str) -> Vec<&'static str> {
    SCOPES
        .iter()
        .copied()
        .filter(|scope| !granted.split(' ').any(|g| g == *scope))
        .collect()
}
