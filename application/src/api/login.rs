//! Login, registration and logout handlers.

use axum::{
    extract::rejection::FormRejection,
    response::{IntoResponse as _, Response},
    Form,
};
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, create_user, create_user_session, Command as _},
    domain::user,
};
use strum::EnumString;
use tracing as log;

use crate::{
    api::{self, ActionData, FormError},
    define_error, AsError, Context, Error,
};

/// Form submitted to log in or register.
///
/// Every field is optional here, so that a missing one is reported as a
/// malformed form rather than rejected by the extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Raw [`LoginType`].
    pub login_type: Option<String>,

    /// Raw [`user::Username`].
    pub username: Option<String>,

    /// Raw [`user::Password`].
    pub password: Option<String>,

    /// Path to redirect to on success.
    pub redirect_to: Option<String>,
}

/// Submitted values echoed back on a rejected [`LoginForm`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFields {
    /// Raw [`LoginType`].
    pub login_type: String,

    /// Raw [`user::Username`].
    pub username: String,

    /// Raw [`user::Password`].
    pub password: String,
}

/// Per-field errors of a rejected [`LoginForm`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct LoginFieldErrors {
    /// Error of the [`user::Username`] field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'static str>,

    /// Error of the [`user::Password`] field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'static str>,
}

/// What a [`LoginForm`] asks for.
#[derive(Clone, Copy, Debug, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum LoginType {
    /// Log in as an existing `User`.
    Login,

    /// Register a new `User` and log in as them.
    Register,
}

/// Handles a submitted [`LoginForm`].
///
/// Answers with a redirect setting the session cookie on success, or with
/// an [`ActionData`] otherwise.
#[tracing::instrument(
    skip_all,
    fields(
        login_type = tracing::field::Empty,
        username = tracing::field::Empty,
    ),
)]
pub async fn submit(
    ctx: Context,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => return e.into_error().into_action_response(None::<()>),
    };
    let LoginForm {
        login_type: Some(login_type),
        username: Some(username),
        password: Some(password),
        redirect_to,
    } = form
    else {
        return Error::from(FormError::Malformed)
            .into_action_response(None::<()>);
    };

    let span = tracing::Span::current();
    _ = span.record("login_type", login_type.as_str());
    _ = span.record("username", username.as_str());

    let fields = LoginFields {
        login_type,
        username,
        password,
    };

    let (username, password) = match (
        user::Username::new(fields.username.clone()),
        user::Password::new(fields.password.clone()),
    ) {
        (Ok(username), Ok(password)) => (username, password),
        (username, password) => {
            return ActionData {
                form_error: None,
                field_errors: Some(LoginFieldErrors {
                    username: username.err().map(|e| e.message()),
                    password: password.err().map(|e| e.message()),
                }),
                fields: Some(fields),
            }
            .into_response();
        }
    };
    let password = SecretBox::init_with(move || password);

    let session = match fields.login_type.parse::<LoginType>() {
        Ok(LoginType::Login) => login(&ctx, username, password).await,
        Ok(LoginType::Register) => register(&ctx, username, password).await,
        Err(_) => Err(LoginError::InvalidLoginType.into()),
    };

    match session {
        Ok(session) => {
            ctx.issue_session(session, api::local_redirect(redirect_to.as_deref()))
        }
        Err(e) => e.into_action_response(Some(fields)),
    }
}

/// Handles a logout request, removing the session cookie.
#[tracing::instrument(skip_all)]
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
pub async fn logout(ctx: Context) -> Response {
    ctx.destroy_session("/")
}

/// Creates a new session of an existing `User` by credentials.
async fn login(
    ctx: &Context,
    username: user::Username,
    password: SecretBox<user::Password>,
) -> Result<create_user_session::Output, Error> {
    ctx.service()
        .execute(command::CreateUserSession::ByCredentials {
            username,
            password,
        })
        .await
        .map_err(AsError::into_error)
}

/// Registers a new `User` and creates a session of them.
async fn register(
    ctx: &Context,
    username: user::Username,
    password: SecretBox<user::Password>,
) -> Result<create_user_session::Output, Error> {
    let user = ctx
        .service()
        .execute(command::CreateUser { username, password })
        .await
        .map_err(|e| {
            if !matches!(
                e.as_ref(),
                create_user::ExecutionError::UsernameOccupied(_),
            ) {
                log::error!("failed to create `User`: {e}");
            }
            e.into_error()
        })?;

    ctx.service()
        .execute(command::CreateUserSession::ByUserId(user.id))
        .await
        .map_err(AsError::into_error)
}

impl AsError for create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(_) | Self::PasswordHash(_) => {
                Some(LoginError::UserCreationFailed.into())
            }
            Self::UsernameOccupied(username) => Some(Error {
                code: "USERNAME_OCCUPIED",
                status_code: http::StatusCode::BAD_REQUEST,
                message: format!("User with username {username} already exists"),
                backtrace: None,
            }),
        }
    }
}

impl AsError for create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) | Self::UserNotExists(_) => None,
            Self::WrongCredentials => {
                Some(LoginError::WrongCredentials.into())
            }
        }
    }
}

define_error! {
    enum LoginError {
        #[code = "WRONG_CREDENTIALS"]
        #[status = BAD_REQUEST]
        #[message = "Username/Password combination is incorrect"]
        WrongCredentials,

        #[code = "USER_CREATION_FAILED"]
        #[status = BAD_REQUEST]
        #[message = "Something went wrong trying to create a new user."]
        UserCreationFailed,

        #[code = "INVALID_LOGIN_TYPE"]
        #[status = BAD_REQUEST]
        #[message = "Login type invalid"]
        InvalidLoginType,
    }
}

#[cfg(test)]
mod spec {
    use axum::http::{header, StatusCode};
    use serde_json::json;

    use crate::api::spec::{
        app, get, json, post_form, register, session_cookie, COOKIE,
    };

    #[tokio::test]
    async fn registers_and_redirects_to_jokes() {
        let app = app();

        let resp = post_form(
            &app,
            "/login",
            "loginType=register&username=alice&password=secret123",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/jokes");
        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("{COOKIE}=")));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Expires="));

        let cookie = session_cookie(&resp).unwrap();
        let resp = get(&app, "/jokes/new", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_short_username_without_creating_user() {
        let app = app();

        let resp = post_form(
            &app,
            "/login",
            "loginType=register&username=al&password=secret123",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(session_cookie(&resp).is_none());
        assert_eq!(
            json(resp).await,
            json!({
                "fieldErrors": {"username": "That username is too short"},
                "fields": {
                    "loginType": "register",
                    "username": "al",
                    "password": "secret123",
                },
            }),
        );

        let resp = post_form(
            &app,
            "/login",
            "loginType=login&username=al&password=secret123",
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json(resp).await["fieldErrors"]["username"],
            "That username is too short",
        );
    }

    #[tokio::test]
    async fn reports_both_invalid_fields() {
        let resp = post_form(
            &app(),
            "/login",
            "loginType=login&username=al&password=12345",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json(resp).await["fieldErrors"],
            json!({
                "username": "That username is too short",
                "password": "That password is too short",
            }),
        );
    }

    #[tokio::test]
    async fn rejects_malformed_form_without_echo() {
        let app = app();

        for form in ["username=alice&password=secret123", "", "loginType=login"]
        {
            let resp = post_form(&app, "/login", form, None).await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{form}");
            assert_eq!(
                json(resp).await,
                json!({"formError": "Form not submitted correctly."}),
                "{form}",
            );
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_registration() {
        let app = app();
        drop(register(&app, "alice").await);

        let resp = post_form(
            &app,
            "/login",
            "loginType=register&username=alice&password=another123",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(session_cookie(&resp).is_none());
        assert_eq!(
            json(resp).await,
            json!({
                "formError": "User with username alice already exists",
                "fields": {
                    "loginType": "register",
                    "username": "alice",
                    "password": "another123",
                },
            }),
        );

        // The original password still works, so nothing was overwritten.
        let resp = post_form(
            &app,
            "/login",
            "loginType=login&username=alice&password=secret123",
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn logs_in_with_correct_credentials() {
        let app = app();
        drop(register(&app, "alice").await);

        let resp = post_form(
            &app,
            "/login",
            "loginType=login&username=alice&password=secret123\
             &redirectTo=%2Fjokes%2Fnew",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/jokes/new");
        assert!(session_cookie(&resp).is_some());
    }

    #[tokio::test]
    async fn ignores_off_site_redirect() {
        let app = app();

        let resp = post_form(
            &app,
            "/login",
            "loginType=register&username=alice&password=secret123\
             &redirectTo=https%3A%2F%2Fevil.com",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/jokes");
    }

    #[tokio::test]
    async fn ignores_backslash_redirect() {
        let app = app();

        let resp = post_form(
            &app,
            "/login",
            "loginType=register&username=alice&password=secret123\
             &redirectTo=%2F%5Cevil.com",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/jokes");
    }

    #[tokio::test]
    async fn ignores_redirect_with_control_chars() {
        let app = app();

        let resp = post_form(
            &app,
            "/login",
            "loginType=register&username=alice&password=secret123\
             &redirectTo=%2Fjokes%0Aevil",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/jokes");
        assert!(session_cookie(&resp).is_some());
    }

    #[tokio::test]
    async fn wrong_password_yields_combined_error() {
        let app = app();
        drop(register(&app, "alice").await);

        for form in [
            "loginType=login&username=alice&password=secret124",
            "loginType=login&username=bobby&password=secret123",
        ] {
            let resp = post_form(&app, "/login", form, None).await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{form}");
            assert!(session_cookie(&resp).is_none(), "{form}");
            let body = json(resp).await;
            assert_eq!(
                body["formError"],
                "Username/Password combination is incorrect",
                "{form}",
            );
            assert!(body.get("fieldErrors").is_none(), "{form}");
        }
    }

    #[tokio::test]
    async fn rejects_unknown_login_type() {
        let resp = post_form(
            &app(),
            "/login",
            "loginType=sudo&username=alice&password=secret123",
            None,
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(resp).await["formError"], "Login type invalid");
    }

    #[tokio::test]
    async fn logout_removes_cookie() {
        let app = app();
        let cookie = register(&app, "alice").await;

        let resp = post_form(&app, "/logout", "", Some(&cookie)).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/");
        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("{COOKIE}=;")));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
