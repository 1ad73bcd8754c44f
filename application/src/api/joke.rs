//! [`Joke`]-related handlers.

use axum::{
    extract::{rejection::FormRejection, Path},
    response::{IntoResponse as _, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, create_joke, Command as _},
    domain::{self, joke},
    query,
};

use crate::{
    api::{ActionData, FormError},
    context::AuthError,
    define_error, AsError, Context, Error,
};

/// Maximum number of [`Joke`]s listed by [`latest()`].
pub const LATEST_LIMIT: u16 = 5;

/// Joke as shown to clients.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Joke {
    /// ID of this [`Joke`].
    pub id: joke::Id,

    /// Name of this [`Joke`].
    pub name: String,

    /// Content of this [`Joke`].
    pub content: String,

    /// ID of the `User` who submitted this [`Joke`].
    pub jokester_id: domain::user::Id,
}

impl From<domain::Joke> for Joke {
    fn from(joke: domain::Joke) -> Self {
        Self {
            id: joke.id,
            name: joke.name.to_string(),
            content: joke.content.to_string(),
            jokester_id: joke.jokester_id,
        }
    }
}

/// List of the latest [`Joke`]s.
#[derive(Clone, Debug, Serialize)]
pub struct Jokes {
    /// [`Joke`]s, newest first.
    pub jokes: Vec<Joke>,
}

/// Data of the new [`Joke`] form.
///
/// Carries nothing: the form is only gated behind a session.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct NewJoke {}

/// Form submitted to create a new [`Joke`].
#[derive(Debug, Deserialize)]
pub struct JokeForm {
    /// Raw [`joke::Name`].
    pub name: Option<String>,

    /// Raw [`joke::Content`].
    pub content: Option<String>,
}

/// Submitted values echoed back on a rejected [`JokeForm`].
#[derive(Clone, Debug, Serialize)]
pub struct JokeFields {
    /// Raw [`joke::Name`].
    pub name: String,

    /// Raw [`joke::Content`].
    pub content: String,
}

/// Per-field errors of a rejected [`JokeForm`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct JokeFieldErrors {
    /// Error of the [`joke::Name`] field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,

    /// Error of the [`joke::Content`] field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'static str>,
}

/// Loads the new [`Joke`] form, available to logged in `User`s only.
///
/// # Errors
///
/// With [`AuthError::AuthorizationRequired`] if there is no valid session.
#[tracing::instrument(skip_all)]
pub async fn new(ctx: Context) -> Result<Json<NewJoke>, Error> {
    drop(ctx.require_session().await?);
    Ok(Json(NewJoke {}))
}

/// Handles a submitted [`JokeForm`] on behalf of the logged in `User`.
///
/// Answers with a redirect to the created [`Joke`] on success, or with an
/// [`ActionData`] otherwise.
#[tracing::instrument(skip_all, fields(jokester.id = tracing::field::Empty))]
pub async fn create(
    ctx: Context,
    form: Result<Form<JokeForm>, FormRejection>,
) -> Response {
    let jokester_id = match ctx.require_session().await {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    _ = tracing::Span::current()
        .record("jokester.id", tracing::field::display(jokester_id));

    let JokeForm {
        name: Some(name),
        content: Some(content),
    } = (match form {
        Ok(Form(form)) => form,
        Err(e) => return e.into_error().into_action_response(None::<()>),
    })
    else {
        return Error::from(FormError::Malformed)
            .into_action_response(None::<()>);
    };
    let fields = JokeFields { name, content };

    let (name, content) = match (
        joke::Name::new(fields.name.clone()),
        joke::Content::new(fields.content.clone()),
    ) {
        (Ok(name), Ok(content)) => (name, content),
        (name, content) => {
            return ActionData {
                form_error: None,
                field_errors: Some(JokeFieldErrors {
                    name: name.err().map(|e| e.message()),
                    content: content.err().map(|e| e.message()),
                }),
                fields: Some(fields),
            }
            .into_response();
        }
    };

    match ctx
        .service()
        .execute(command::CreateJoke {
            jokester_id,
            name,
            content,
        })
        .await
    {
        Ok(joke) => Redirect::to(&format!("/jokes/{}", joke.id)).into_response(),
        Err(e) => e.into_error().into_action_response(Some(fields)),
    }
}

/// Shows the [`Joke`] with the provided ID.
///
/// # Errors
///
/// With [`JokeError::NotExists`] if there is no such [`Joke`].
#[tracing::instrument(skip_all, fields(joke.id = %id))]
pub async fn show(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Json<Joke>, Error> {
    let id = id
        .parse::<joke::Id>()
        .map_err(|_| Error::from(JokeError::NotExists))?;

    ctx.service()
        .execute(query::joke::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|j| Json(j.into()))
        .ok_or_else(|| JokeError::NotExists.into())
}

/// Lists the latest [`Joke`]s, newest first.
///
/// # Errors
///
/// If the [`Joke`]s cannot be loaded.
#[tracing::instrument(skip_all)]
pub async fn latest(ctx: Context) -> Result<Json<Jokes>, Error> {
    let jokes = ctx
        .service()
        .execute(query::jokes::Latest::by(joke::Latest {
            limit: LATEST_LIMIT,
        }))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Jokes {
        jokes: jokes.into_iter().map(Into::into).collect(),
    }))
}

impl AsError for create_joke::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JokesterNotExists(_) => {
                Some(AuthError::AuthorizationRequired.into())
            }
        }
    }
}

define_error! {
    enum JokeError {
        #[code = "JOKE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Joke does not exist"]
        NotExists,
    }
}
