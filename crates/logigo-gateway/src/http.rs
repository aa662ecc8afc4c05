//! HTTP gateway implementation using `reqwest`.

use logigo_protocol::{
    AuthResponse, Codec, Credentials, ErrorBody, ForgotPasswordRequest,
    GoogleCredential, JsonCodec, ProfileResponse, ProfileUpdate, Registration,
    ResetPasswordRequest, TokenGrant, User,
};
use reqwest::{Method, Url, header};
use serde::{Serialize, de::DeserializeOwned};

use crate::{AuthGateway, GatewayConfig, GatewayError};

/// An [`AuthGateway`] that talks to the LogiGo backend over HTTP.
///
/// Cheap to share behind an `Arc`; the inner `reqwest::Client` keeps a
/// connection pool.
pub struct HttpGateway<C: Codec = JsonCodec> {
    client: reqwest::Client,
    base_url: Url,
    codec: C,
}

impl HttpGateway<JsonCodec> {
    /// Creates a JSON gateway from the given config.
    ///
    /// # Errors
    /// - [`GatewayError::InvalidUrl`] if `base_url` doesn't parse
    /// - [`GatewayError::Network`] if the HTTP client can't be built
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: Codec> HttpGateway<C> {
    /// Creates a gateway that encodes bodies with `codec`.
    pub fn with_codec(
        config: &GatewayConfig,
        codec: C,
    ) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            GatewayError::InvalidUrl(format!("{}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        tracing::info!(%base_url, "HTTP gateway ready");
        Ok(Self {
            client,
            base_url,
            codec,
        })
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL. Segments are
    /// percent-encoded, so a reset token can't escape its position.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one request and returns the raw body of a 2xx reply.
    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        bearer: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, GatewayError> {
        let url = self.endpoint(segments)?;
        // Only the route name is logged; the full path may carry a reset token.
        let route = segments.get(1).copied().unwrap_or_default();

        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        tracing::debug!(%method, route, status = status.as_u16(), "backend replied");

        if !status.is_success() {
            let message = self
                .codec
                .decode::<ErrorBody>(&bytes)
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                });
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(bytes.to_vec())
    }

    /// Encodes `body`, sends it, and decodes the reply as `R`.
    async fn call<B, R>(
        &self,
        method: Method,
        segments: &[&str],
        bearer: Option<&str>,
        body: Option<&B>,
    ) -> Result<R, GatewayError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let body = body.map(|b| self.codec.encode(b)).transpose()?;
        let bytes = self.send(method, segments, bearer, body).await?;
        Ok(self.codec.decode(&bytes)?)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(err.to_string())
    }
}

impl<C: Codec> AuthGateway for HttpGateway<C> {
    async fn renew_token(&self, token: &str) -> Result<TokenGrant, GatewayError> {
        let grant: TokenGrant = self
            .call::<(), _>(Method::POST, &["api", "renew-token"], Some(token), None)
            .await?;
        grant.validate()?;
        Ok(grant)
    }

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthResponse, GatewayError> {
        self.call(Method::POST, &["api", "login"], None, Some(credentials))
            .await
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<AuthResponse, GatewayError> {
        self.call(Method::POST, &["api", "register"], None, Some(registration))
            .await
    }

    async fn verify_google_token(
        &self,
        credential: &GoogleCredential,
    ) -> Result<AuthResponse, GatewayError> {
        self.call(
            Method::POST,
            &["api", "verificar-token"],
            None,
            Some(credential),
        )
        .await
    }

    async fn profile(&self, token: &str) -> Result<User, GatewayError> {
        let response: ProfileResponse = self
            .call::<(), _>(Method::GET, &["api", "profile"], Some(token), None)
            .await?;
        Ok(response.user)
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<User, GatewayError> {
        let response: ProfileResponse = self
            .call(Method::PUT, &["api", "profile"], Some(token), Some(update))
            .await?;
        Ok(response.user)
    }

    async fn forgot_password(&self, email: &str) -> Result<(), GatewayError> {
        let body = self.codec.encode(&ForgotPasswordRequest {
            email: email.to_string(),
        })?;
        self.send(Method::POST, &["api", "forgot-password"], None, Some(body))
            .await
            .map(|_| ())
    }

    async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), GatewayError> {
        let body = self.codec.encode(&ResetPasswordRequest {
            new_password: new_password.to_string(),
        })?;
        self.send(
            Method::POST,
            &["api", "reset-password", reset_token],
            None,
            Some(body),
        )
        .await
        .map(|_| ())
    }
}
