//! Result types shared by the weather and water providers.

use crate::http::FetchError;
use std::sync::Arc;
use thiserror::Error;

/// Why an upstream payload could not be turned into a snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("upstream reported an error: {0}")]
    Upstream(String),
    #[error("missing field '{0}' in upstream payload")]
    MissingField(&'static str),
    #[error("unexpected upstream payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A snapshot, or the fact that none could be obtained.
///
/// Keeps "the upstream failed" apart from "the upstream had nothing to say".
#[derive(Debug)]
pub enum Availability<T> {
    Available(Arc<T>),
    Unavailable,
}

impl<T> Availability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable => None,
        }
    }
}

impl<T> Clone for Availability<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Available(v) => Self::Available(Arc::clone(v)),
            Self::Unavailable => Self::Unavailable,
        }
    }
}

impl<T, E> From<Result<Arc<T>, E>> for Availability<T> {
    fn from(result: Result<Arc<T>, E>) -> Self {
        match result {
            Ok(v) => Self::Available(v),
            Err(_) => Self::Unavailable,
        }
    }
}
