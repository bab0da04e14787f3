//! Remote collaborators consumed by the list controller

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::pagination::ListResponse;
use crate::query::ListQuery;

/// Provides pages of rows for a [`crate::controller::ListController`].
///
/// Implementations map the query onto their protocol (see
/// [`ListQuery::to_params`]) and decode the answer into one of the two
/// [`ListResponse`] shapes. Status mapping is their job too: a rejected
/// token must surface as [`FetchError::Unauthenticated`].
#[async_trait]
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_page(&self, query: &ListQuery) -> Result<ListResponse<Self::Item>, FetchError>;
}

#[async_trait]
impl<S: ListSource> ListSource for Arc<S> {
    type Item = S::Item;

    async fn fetch_page(&self, query: &ListQuery) -> Result<ListResponse<Self::Item>, FetchError> {
        (**self).fetch_page(query).await
    }
}

/// Kind of side-channel change made to the listed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}
