//! Storage contract for ads and their views, plus the backends implementing it.

use std::future::Future;

use snafu::{Location, Snafu};

use crate::database::DatabaseError;
use crate::model::{Ad, AdId, Timestamp, View};

pub use memory::MemoryStore;
pub use repository::AdRepository;
pub use surreal::SurrealStore;

mod memory;
mod repository;
mod surreal;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    #[snafu(display("ad `{id}` does not exist"))]
    NotFound {
        id: AdId,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(transparent)]
    Database { source: DatabaseError },
}

/// Persistence of [Ad] records.
///
/// "Visible" ads are the ones that have not been soft-deleted.
pub trait AdStore: Clone + Send + Sync + 'static {
    fn insert_ad(&self, ad: &Ad) -> impl Future<Output = Result<()>> + Send;

    /// Overwrites the stored ad with the same id.
    fn save_ad(&self, ad: &Ad) -> impl Future<Output = Result<()>> + Send;

    /// Finds a visible ad.
    fn find_ad(&self, id: AdId) -> impl Future<Output = Result<Option<Ad>>> + Send;

    /// Finds an ad whether or not it has been soft-deleted.
    fn find_ad_with_trashed(&self, id: AdId) -> impl Future<Output = Result<Option<Ad>>> + Send;

    /// Lists visible ads, newest first.
    fn list_ads(&self) -> impl Future<Output = Result<Vec<Ad>>> + Send;

    fn soft_delete_ad(&self, id: AdId, at: Timestamp) -> impl Future<Output = Result<()>> + Send;

    fn restore_ad(&self, id: AdId) -> impl Future<Output = Result<()>> + Send;

    /// Removes the ad from storage for good.
    fn force_delete_ad(&self, id: AdId) -> impl Future<Output = Result<()>> + Send;

    fn increment_views(&self, id: AdId) -> impl Future<Output = Result<()>> + Send;
}

/// Persistence of [View] records.
///
/// The bulk deletions operate on every view of an ad in a single command and must succeed when
/// there is nothing left to delete.
pub trait ViewStore: Clone + Send + Sync + 'static {
    fn insert_view(&self, view: &View) -> impl Future<Output = Result<()>> + Send;

    /// Lists the visible views of an ad, oldest first.
    fn views_of(&self, ad_id: AdId) -> impl Future<Output = Result<Vec<View>>> + Send;

    /// Lists every stored view of an ad, including soft-deleted ones.
    fn views_of_with_trashed(&self, ad_id: AdId)
        -> impl Future<Output = Result<Vec<View>>> + Send;

    /// Soft-deletes the visible views of an ad.
    fn delete_views_of(&self, ad_id: AdId, at: Timestamp)
        -> impl Future<Output = Result<()>> + Send;

    /// Removes every view of an ad, soft-deleted or not.
    fn force_delete_views_of(&self, ad_id: AdId) -> impl Future<Output = Result<()>> + Send;
}

/// A backend that can hold both ads and views.
pub trait Store: AdStore + ViewStore {}

impl<T: AdStore + ViewStore> Store for T {}
