//! Endpoint selector policies.
//!
//! A policy inspects or rewrites the candidate set between matching and
//! execution. Policies run in ascending `order`.

use axum::http::request::Parts;
use futures_util::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::pages::loader::LoadError;
use crate::routing::candidate::CandidateSet;

/// Errors raised by selector policies.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A required collaborator or argument was missing. Configuration bug.
    #[error("invalid argument: {0} is required")]
    InvalidArgument(&'static str),

    /// The page loader failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Per-request selection state shared by all policies.
#[derive(Debug, Clone)]
pub struct SelectorContext {
    request_id: Uuid,
}

impl SelectorContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_request_id(request_id: Uuid) -> Self {
        Self { request_id }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Default for SelectorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A stage that runs over the candidate set before selection.
pub trait EndpointSelectorPolicy: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &'static str;

    /// Lower runs first.
    fn order(&self) -> i32;

    /// Cheap check whether `apply` has anything to do for these candidates.
    /// Must not mutate anything.
    fn applies_to(&self, candidates: &CandidateSet) -> bool;

    fn apply<'a>(
        &'a self,
        request: &'a Parts,
        ctx: &'a SelectorContext,
        candidates: &'a mut CandidateSet,
    ) -> BoxFuture<'a, Result<(), PolicyError>>;
}
