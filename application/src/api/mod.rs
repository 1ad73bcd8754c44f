//! HTTP API definitions.

pub mod joke;
pub mod login;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use http::{uri::PathAndQuery, HeaderValue};
use serde::Serialize;

use crate::{context::SessionCookie, define_error, Service};

/// Path the client lands on after logging in, unless asked otherwise.
pub const DEFAULT_REDIRECT: &str = "/jokes";

/// Creates a new [`Router`] serving the API with the provided [`Service`].
pub fn router(service: Service, cookie: SessionCookie) -> Router {
    Router::new()
        .route("/login", post(login::submit))
        .route("/logout", post(login::logout))
        .route("/jokes", get(joke::latest))
        .route("/jokes/new", get(joke::new).post(joke::create))
        .route("/jokes/:id", get(joke::show))
        .layer(Extension(service))
        .layer(Extension(cookie))
}

/// Data a form action answers with when the submission is rejected.
///
/// Lets the client re-render the form with the user's input preserved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData<F, E> {
    /// Error related to the whole form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_error: Option<String>,

    /// Errors related to particular fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<E>,

    /// Submitted values of the fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<F>,
}

impl<F, E> IntoResponse for ActionData<F, E>
where
    F: Serialize,
    E: Serialize,
{
    fn into_response(self) -> Response {
        (http::StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// Returns the provided `redirect_to` if it's a path on this site, or
/// [`DEFAULT_REDIRECT`] otherwise.
///
/// Browsers resolve `//host` and `/\host` to another origin, so both are
/// rejected. So is anything not usable as a `Location` header value.
#[must_use]
pub fn local_redirect(redirect_to: Option<&str>) -> &str {
    match redirect_to {
        Some(to) if is_local_path(to) => to,
        Some(_) | None => DEFAULT_REDIRECT,
    }
}

/// Checks whether the provided `path` is a same-origin path that is a valid
/// `Location` header value.
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && path.parse::<PathAndQuery>().is_ok()
        && HeaderValue::from_str(path).is_ok()
}

define_error! {
    enum FormError {
        #[code = "MALFORMED_FORM"]
        #[status = BAD_REQUEST]
        #[message = "Form not submitted correctly."]
        Malformed,
    }
}
