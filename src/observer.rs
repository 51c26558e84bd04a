//! Lifecycle hooks for persisted models.
//!
//! The persistence layer ([AdRepository](crate::store::AdRepository)) calls each hook explicitly
//! at a fixed point of a model's lifecycle and awaits it before going on, so a failing hook aborts
//! the operation that triggered it with the hook's error unchanged.

use std::future::Future;

use crate::model::{now, Ad};
use crate::store::{Result, ViewStore};

/// Reacts to the lifecycle of a model of type `M`.
///
/// | hook               | called                                                        |
/// |--------------------|---------------------------------------------------------------|
/// | `on_creating`      | before a new model is first written                           |
/// | `on_updating`      | before changes to an existing model are written               |
/// | `on_deleting`      | before a model is soft-deleted, and before a force delete     |
/// | `on_restored`      | after a soft-deleted model has been brought back              |
/// | `on_force_deleted` | after a model has been removed from storage for good          |
pub trait Observer<M>: Clone + Send + Sync + 'static {
    fn on_creating(&self, model: &mut M) -> impl Future<Output = Result<()>> + Send;

    fn on_updating(&self, model: &mut M) -> impl Future<Output = Result<()>> + Send;

    fn on_deleting(&self, model: &M) -> impl Future<Output = Result<()>> + Send;

    fn on_restored(&self, model: &M) -> impl Future<Output = Result<()>> + Send;

    fn on_force_deleted(&self, model: &M) -> impl Future<Output = Result<()>> + Send;
}

/// Keeps an [Ad]'s view counter defined and its views from outliving it.
#[derive(Debug, Clone)]
pub struct AdObserver<V> {
    views: V,
}

impl<V: ViewStore> AdObserver<V> {
    pub fn new(views: V) -> Self {
        Self { views }
    }
}

impl<V: ViewStore> Observer<Ad> for AdObserver<V> {
    async fn on_creating(&self, ad: &mut Ad) -> Result<()> {
        if ad.views_count.is_none() {
            ad.views_count = Some(0);
        }

        Ok(())
    }

    async fn on_updating(&self, _ad: &mut Ad) -> Result<()> {
        Ok(())
    }

    /// Soft-deletes the visible views of the ad.
    async fn on_deleting(&self, ad: &Ad) -> Result<()> {
        tracing::debug!(ad.id = %ad.id, "soft deleting views of ad");
        self.views.delete_views_of(ad.id, now()).await
    }

    // Views trashed by `on_deleting` stay trashed.
    async fn on_restored(&self, _ad: &Ad) -> Result<()> {
        Ok(())
    }

    async fn on_force_deleted(&self, ad: &Ad) -> Result<()> {
        tracing::debug!(ad.id = %ad.id, "force deleting views of ad");
        self.views.force_delete_views_of(ad.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::View;
    use crate::store::{AdStore, MemoryStore};

    async fn ad_with_views(store: &MemoryStore, views: usize) -> Ad {
        let ad = Ad::new("Guitar".into(), "Six strings".into(), Some(views as u64));
        store.insert_ad(&ad).await.unwrap();

        for _ in 0..views {
            store.insert_view(&View::new(ad.id)).await.unwrap();
        }

        ad
    }

    #[tokio::test]
    async fn creating_defaults_unset_counter_to_zero() {
        let observer = AdObserver::new(MemoryStore::new());
        let mut ad = Ad::new("Guitar".into(), String::new(), None);

        observer.on_creating(&mut ad).await.unwrap();

        assert_eq!(ad.views_count, Some(0));
    }

    #[tokio::test]
    async fn creating_keeps_an_explicit_counter() {
        let observer = AdObserver::new(MemoryStore::new());

        for count in [0, 1, 42] {
            let mut ad = Ad::new("Guitar".into(), String::new(), Some(count));
            observer.on_creating(&mut ad).await.unwrap();
            assert_eq!(ad.views_count, Some(count));
        }
    }

    #[tokio::test]
    async fn updating_and_restored_leave_everything_alone() {
        let store = MemoryStore::new();
        let observer = AdObserver::new(store.clone());
        let mut ad = ad_with_views(&store, 2).await;
        let before = ad.clone();

        observer.on_updating(&mut ad).await.unwrap();
        observer.on_restored(&ad).await.unwrap();

        assert_eq!(ad, before);
        assert_eq!(store.views_of(ad.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn deleting_soft_deletes_every_view_of_the_ad() {
        let store = MemoryStore::new();
        let observer = AdObserver::new(store.clone());
        let ad = ad_with_views(&store, 3).await;
        let other = ad_with_views(&store, 1).await;

        observer.on_deleting(&ad).await.unwrap();

        assert!(store.views_of(ad.id).await.unwrap().is_empty());
        assert_eq!(store.views_of_with_trashed(ad.id).await.unwrap().len(), 3);
        assert_eq!(store.views_of(other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deletion_cascade_is_idempotent() {
        let store = MemoryStore::new();
        let observer = AdObserver::new(store.clone());
        let ad = ad_with_views(&store, 0).await;

        observer.on_deleting(&ad).await.unwrap();
        observer.on_deleting(&ad).await.unwrap();
        observer.on_force_deleted(&ad).await.unwrap();
        observer.on_force_deleted(&ad).await.unwrap();
    }

    #[tokio::test]
    async fn force_deleted_removes_trashed_views_too() {
        let store = MemoryStore::new();
        let observer = AdObserver::new(store.clone());
        let ad = ad_with_views(&store, 2).await;

        observer.on_deleting(&ad).await.unwrap();
        store.insert_view(&View::new(ad.id)).await.unwrap();

        observer.on_force_deleted(&ad).await.unwrap();

        assert!(store.views_of_with_trashed(ad.id).await.unwrap().is_empty());
    }
}
