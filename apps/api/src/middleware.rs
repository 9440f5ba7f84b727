use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use rolegrid_core::{AppError, AppResult, UserIdentity};

use crate::error::ApiResult;
use crate::state::AppState;

const DISPLAY_NAME_HEADER: &str = "x-auth-name";
const EMAIL_HEADER: &str = "x-auth-email";

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers(), &state.auth_subject_header)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Reads the identity asserted by the upstream auth proxy.
pub fn identity_from_headers(
    headers: &HeaderMap,
    subject_header: &HeaderName,
) -> AppResult<UserIdentity> {
    let subject = header_text(headers, subject_header.as_str())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let display_name = header_text(headers, DISPLAY_NAME_HEADER).unwrap_or(subject);
    let email = header_text(headers, EMAIL_HEADER).map(str::to_owned);

    Ok(UserIdentity::new(subject, display_name, email))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site")
            && fetch_site == HeaderValue::from_static("cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let allowed_origin = state.frontend_url.as_str();
        if origin != allowed_origin && !referer.starts_with(allowed_origin) {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
