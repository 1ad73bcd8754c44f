//! [`Context`]-related definitions.

use axum::{
    async_trait,
    extract::FromRequestParts,
    response::{IntoResponse as _, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, Expiration, SameSite};
use service::{
    command::{self, create_user_session, Command as _},
    domain::user::{self, session},
};
use tokio::sync::OnceCell;
use tracing as log;

use crate::{define_error, AsError, Error, Service};

/// Settings of the cookie carrying a [`session::Token`].
#[derive(Clone, Debug)]
pub struct SessionCookie {
    /// Name of the cookie.
    pub name: String,

    /// Indicator whether the cookie is sent over HTTPS only.
    pub secure: bool,
}

/// Request context, passed explicitly to every handler.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// [`SessionCookie`] settings.
    cookie: SessionCookie,

    /// Cookies sent with the request.
    jar: CookieJar,

    /// ID of the `User` whose session has been presented, if any.
    current_session: OnceCell<Option<user::Id>>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns ID of the `User` whose valid session cookie was sent with the
    /// request.
    ///
    /// A missing, malformed, tampered or expired cookie, as well as a cookie
    /// of a `User` who no longer exists, yields [`None`].
    ///
    /// # Errors
    ///
    /// If the session cannot be checked due to an infrastructure failure.
    pub async fn current_session(&self) -> Result<Option<user::Id>, Error> {
        self.current_session
            .get_or_try_init(|| self.authenticate())
            .await
            .copied()
    }

    /// Returns ID of the `User` whose valid session cookie was sent with the
    /// request.
    ///
    /// # Errors
    ///
    /// With [`AuthError::AuthorizationRequired`] if there is no valid
    /// session, or if the session cannot be checked.
    pub async fn require_session(&self) -> Result<user::Id, Error> {
        self.current_session()
            .await?
            .ok_or_else(|| AuthError::AuthorizationRequired.into())
    }

    /// Answers with a redirect to `redirect_to`, setting the cookie carrying
    /// the created session.
    #[must_use]
    pub fn issue_session(
        &self,
        session: create_user_session::Output,
        redirect_to: &str,
    ) -> Response {
        let create_user_session::Output {
            token,
            user,
            expires_at,
        } = session;

        log::debug!(user.id = %user.id, "issuing session");

        let cookie = Cookie::build((self.cookie.name.clone(), token.to_string()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.cookie.secure)
            .expires(Expiration::DateTime(expires_at.into()));

        (self.jar.clone().add(cookie), Redirect::to(redirect_to)).into_response()
    }

    /// Answers with a redirect to `redirect_to`, removing the session cookie.
    #[must_use]
    pub fn destroy_session(&self, redirect_to: &str) -> Response {
        let cookie = Cookie::build(self.cookie.name.clone()).path("/");

        (self.jar.clone().remove(cookie), Redirect::to(redirect_to))
            .into_response()
    }

    /// Verifies the session cookie sent with the request, if any.
    ///
    /// # Errors
    ///
    /// If the session cannot be checked due to an infrastructure failure.
    async fn authenticate(&self) -> Result<Option<user::Id>, Error> {
        let Some(cookie) = self.jar.get(&self.cookie.name) else {
            return Ok(None);
        };

        let token = session::Token::unverified(cookie.value());
        match self
            .service
            .execute(command::AuthorizeUserSession { token })
            .await
        {
            Ok(s) => Ok(Some(s.user_id)),
            Err(e) => {
                let err = e.as_error();
                if err.code == Error::from(AuthError::AuthorizationRequired).code
                {
                    log::debug!("ignoring invalid session: {e}");
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;
        let cookie = parts
            .extensions
            .get::<SessionCookie>()
            .cloned()
            .ok_or_else(|| {
                Error::internal(&"missing `SessionCookie` extension")
            })?;

        Ok(Self {
            service,
            cookie,
            jar: CookieJar::from_headers(&parts.headers),
            current_session: OnceCell::new(),
        })
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) | Self::UserNotExists(_) => {
                Some(AuthError::AuthorizationRequired.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Unauthorized"]
        AuthorizationRequired,
    }
}
