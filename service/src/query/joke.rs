//! [`Query`] collection related to a single [`Joke`].

use common::operations::By;

use crate::domain::{joke, Joke};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Joke`] by its [`joke::Id`].
pub type ById = DatabaseQuery<By<Option<Joke>, joke::Id>>;
