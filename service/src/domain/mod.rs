//! Domain definitions.

pub mod field;
pub mod joke;
pub mod user;

pub use self::{joke::Joke, user::User};
