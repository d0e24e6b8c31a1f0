//! Request gate middleware for Axum
//!
//! Runs once per inbound request and either attaches a request-scoped
//! identity or terminates the request with an authentication failure.
//!
//! Evaluation order:
//! 1. Public route prefix: forward untouched, no token inspection. The
//!    prefix is matched against the original request path, not the
//!    remainder a nested router leaves behind.
//! 2. No `Authorization: Bearer` header: forward with an anonymous identity.
//!    The gate never rejects an absent token; route-level policy decides
//!    whether anonymous access is acceptable.
//! 3. Present token that fails verification: terminate with 401. Expired
//!    tokens get a response distinct from tampered or unparseable ones.
//! 4. Verified token: resolve the subject against the patient store and
//!    attach the identity. A verified subject with no backing account is a
//!    hard failure. A prior gate's identity is kept untouched.

use axum::{
    body::Body,
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::ApiError;
use crate::auth::{AuthError, AuthenticatedUser, RequestIdentity, RequestMeta, TokenCodec};
use crate::infra::PatientStore;

/// Path prefixes exempt from token inspection.
///
/// This is the single source of truth for "public route": handlers and any
/// other policy layer consult the attached identity, never a second list.
/// Matching is per path segment, so `/api/v1/auth` covers
/// `/api/v1/auth/register` but not `/api/v1/authx`.
#[derive(Debug, Clone)]
pub struct PublicRoutes {
    prefixes: Vec<String>,
}

impl PublicRoutes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.trim().is_empty())
            .map(|p| normalize_prefix(&p))
            .collect();
        Self { prefixes }
    }

    /// Parse a comma-separated prefix list, as read from configuration.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|p| {
            if p == "/" {
                return true;
            }
            path == p
                || (path.len() > p.len()
                    && path.starts_with(p.as_str())
                    && path.as_bytes()[p.len()] == b'/')
        })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim();
    let with_slash = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    if with_slash == "/" {
        return with_slash;
    }
    with_slash.trim_end_matches('/').to_string()
}

/// Gate middleware configuration/state.
#[derive(Clone)]
pub struct AuthGateState {
    pub codec: Arc<TokenCodec>,
    pub store: Arc<dyn PatientStore>,
    pub public_routes: Arc<PublicRoutes>,
}

/// Request gate middleware
pub async fn auth_gate(
    State(state): State<AuthGateState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // Nested routers strip their mount prefix from the visible URI before
    // this layer runs; the allow-list is matched against the original path.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    if state.public_routes.matches(&path) {
        return next.run(request).await;
    }

    let meta = request_meta(&request);

    // Extract the bearer token. Absent headers and foreign schemes both
    // mean anonymous, not rejected.
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    let token = match token {
        Some(token) => token,
        None => {
            request
                .extensions_mut()
                .insert(RequestIdentity::anonymous(meta));
            return next.run(request).await;
        }
    };

    // A token that is present must verify. Expiry is reported separately
    // from tampering so clients know whether to re-login or give up.
    let claims = match state.codec.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "rejected bearer token");
            return ApiError::from(e).into_response();
        }
    };

    // First successful verification wins: if an earlier gate already
    // attached an identity, keep it and skip the store lookup.
    let already_authenticated = request
        .extensions()
        .get::<RequestIdentity>()
        .is_some_and(RequestIdentity::is_authenticated);
    if already_authenticated {
        return next.run(request).await;
    }

    let patient = match state.store.find_by_email(&claims.sub).await {
        Ok(Some(patient)) => patient,
        Ok(None) => {
            // A correctly signed token should always resolve; a missing
            // account means the store and the token issuer disagree.
            tracing::warn!(subject = %claims.sub, "verified token references no account");
            return ApiError::from(AuthError::PrincipalNotFound(claims.sub)).into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "principal lookup failed during request authentication");
            return ApiError::from(AuthError::Store(e)).into_response();
        }
    };

    let identity = RequestIdentity::authenticated(AuthenticatedUser::from(&patient), meta);
    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn request_meta(request: &Request<Body>) -> RequestMeta {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    RequestMeta { remote_addr }
}
