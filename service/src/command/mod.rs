//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_joke;
pub mod create_user;
pub mod create_user_session;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, create_joke::CreateJoke,
    create_user::CreateUser, create_user_session::CreateUserSession,
};
