use snafu::OptionExt as _;
use tracing::instrument;

use super::*;
use crate::model::{now, NewAd, UpdateAd};
use crate::observer::{AdObserver, Observer};

/// Ad persistence with lifecycle hooks.
///
/// Every write goes through here so that the observer sees it; the hooks run inline and their
/// errors abort the write.
#[derive(Debug, Clone)]
pub struct AdRepository<S, O = AdObserver<S>> {
    store: S,
    observer: O,
}

impl<S: Store> AdRepository<S> {
    /// A repository observed by the default [AdObserver] working on the same store.
    pub fn new(store: S) -> Self {
        let observer = AdObserver::new(store.clone());
        Self { store, observer }
    }
}

impl<S: Store, O: Observer<Ad>> AdRepository<S, O> {
    pub fn with_observer(store: S, observer: O) -> Self {
        Self { store, observer }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn visible(&self, id: AdId) -> Result<Ad> {
        self.store.find_ad(id).await?.context(NotFoundSnafu { id })
    }

    async fn with_trashed(&self, id: AdId) -> Result<Ad> {
        self.store
            .find_ad_with_trashed(id)
            .await?
            .context(NotFoundSnafu { id })
    }

    #[instrument(skip(self))]
    pub async fn create(&self, payload: NewAd) -> Result<Ad> {
        let mut ad = Ad::from(payload);

        self.observer.on_creating(&mut ad).await?;
        self.store.insert_ad(&ad).await?;

        tracing::info!(ad.id = %ad.id, "created ad");
        Ok(ad)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: AdId, changes: UpdateAd) -> Result<Ad> {
        let mut ad = self.visible(id).await?;
        changes.apply(&mut ad);
        ad.updated_at = now();

        self.observer.on_updating(&mut ad).await?;
        self.store.save_ad(&ad).await?;

        tracing::info!(ad.id = %ad.id, "updated ad");
        Ok(ad)
    }

    /// Soft-deletes a visible ad.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AdId) -> Result<Ad> {
        let mut ad = self.visible(id).await?;

        self.observer.on_deleting(&ad).await?;

        let at = now();
        self.store.soft_delete_ad(id, at).await?;
        ad.deleted_at = Some(at);

        tracing::info!(ad.id = %ad.id, "deleted ad");
        Ok(ad)
    }

    /// Brings back a soft-deleted ad. Restoring a visible ad is a no-op apart from the hook.
    #[instrument(skip(self))]
    pub async fn restore(&self, id: AdId) -> Result<Ad> {
        let mut ad = self.with_trashed(id).await?;

        self.store.restore_ad(id).await?;
        ad.deleted_at = None;

        self.observer.on_restored(&ad).await?;

        tracing::info!(ad.id = %ad.id, "restored ad");
        Ok(ad)
    }

    /// Removes an ad for good, whether or not it was soft-deleted first.
    ///
    /// Runs `on_deleting` before the removal and `on_force_deleted` after it.
    #[instrument(skip(self))]
    pub async fn force_delete(&self, id: AdId) -> Result<()> {
        let ad = self.with_trashed(id).await?;

        self.observer.on_deleting(&ad).await?;
        self.store.force_delete_ad(id).await?;
        self.observer.on_force_deleted(&ad).await?;

        tracing::info!(ad.id = %ad.id, "force deleted ad");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn record_view(&self, id: AdId) -> Result<View> {
        let ad = self.visible(id).await?;
        let view = View::new(ad.id);

        self.store.insert_view(&view).await?;
        self.store.increment_views(ad.id).await?;

        tracing::debug!(ad.id = %ad.id, view.id = %view.id, "recorded view");
        Ok(view)
    }

    pub async fn find(&self, id: AdId) -> Result<Ad> {
        self.visible(id).await
    }

    pub async fn list(&self) -> Result<Vec<Ad>> {
        self.store.list_ads().await
    }

    /// Visible views of a visible ad.
    pub async fn views(&self, id: AdId) -> Result<Vec<View>> {
        let ad = self.visible(id).await?;
        self.store.views_of(ad.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> AdRepository<MemoryStore> {
        AdRepository::new(MemoryStore::new())
    }

    fn payload(views_count: Option<u64>) -> NewAd {
        NewAd {
            title: "Kayak".into(),
            description: "Two seats".into(),
            views_count,
        }
    }

    async fn ad_with_views(repository: &AdRepository<MemoryStore>, views: usize) -> Ad {
        let ad = repository.create(payload(None)).await.unwrap();
        for _ in 0..views {
            repository.record_view(ad.id).await.unwrap();
        }
        ad
    }

    #[tokio::test]
    async fn created_ads_always_have_a_counter() {
        let repository = repository();

        let unset = repository.create(payload(None)).await.unwrap();
        let explicit = repository.create(payload(Some(7))).await.unwrap();

        assert_eq!(repository.find(unset.id).await.unwrap().views_count, Some(0));
        assert_eq!(repository.find(explicit.id).await.unwrap().views_count, Some(7));
    }

    #[tokio::test]
    async fn recording_views_bumps_the_counter() {
        let repository = repository();
        let ad = ad_with_views(&repository, 3).await;

        assert_eq!(repository.find(ad.id).await.unwrap().views_count, Some(3));
        assert_eq!(repository.views(ad.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_applies_changes_and_keeps_counter() {
        let repository = repository();
        let ad = ad_with_views(&repository, 1).await;

        let changes = UpdateAd {
            title: Some("Canoe".into()),
            description: None,
        };
        let updated = repository.update(ad.id, changes).await.unwrap();

        assert_eq!(updated.title, "Canoe");
        assert_eq!(updated.description, "Two seats");
        assert_eq!(updated.views_count, Some(1));
        assert!(updated.updated_at >= ad.updated_at);
        assert_eq!(repository.find(ad.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn soft_delete_hides_the_ad_and_its_views() {
        let repository = repository();
        let ad = ad_with_views(&repository, 4).await;

        let deleted = repository.delete(ad.id).await.unwrap();
        assert!(deleted.is_trashed());

        assert!(matches!(
            repository.find(ad.id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(repository.store().views_of(ad.id).await.unwrap().is_empty());
        assert_eq!(
            repository.store().views_of_with_trashed(ad.id).await.unwrap().len(),
            4
        );
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let repository = repository();
        let ad = ad_with_views(&repository, 1).await;

        repository.delete(ad.id).await.unwrap();
        let again = repository.delete(ad.id).await;

        assert!(matches!(again, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn restore_brings_back_the_ad_but_not_its_views() {
        let repository = repository();
        let ad = ad_with_views(&repository, 2).await;

        repository.delete(ad.id).await.unwrap();
        let restored = repository.restore(ad.id).await.unwrap();

        assert!(!restored.is_trashed());
        assert_eq!(repository.find(ad.id).await.unwrap().views_count, Some(2));
        assert!(repository.views(ad.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn force_delete_leaves_no_views_at_all() {
        let repository = repository();
        let live = ad_with_views(&repository, 2).await;
        let trashed = ad_with_views(&repository, 3).await;
        let bystander = ad_with_views(&repository, 1).await;

        repository.delete(trashed.id).await.unwrap();

        repository.force_delete(live.id).await.unwrap();
        repository.force_delete(trashed.id).await.unwrap();

        let store = repository.store();
        for id in [live.id, trashed.id] {
            assert_eq!(store.find_ad_with_trashed(id).await.unwrap(), None);
            assert!(store.views_of_with_trashed(id).await.unwrap().is_empty());
        }
        assert_eq!(store.views_of(bystander.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn force_delete_of_an_ad_without_views_succeeds() {
        let repository = repository();
        let ad = ad_with_views(&repository, 0).await;

        repository.force_delete(ad.id).await.unwrap();

        let again = repository.force_delete(ad.id).await;
        assert!(matches!(again, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn views_of_a_missing_ad_is_not_found() {
        let repository = repository();
        let result = repository.views(AdId::uuid()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    /// Records the order in which hooks fire and can be told to fail on `on_deleting`.
    #[derive(Debug, Clone, Default)]
    struct Recording {
        calls: std::sync::Arc<std::sync::Mutex<Vec<&'static str>>>,
        fail_deleting: bool,
    }

    impl Recording {
        fn push(&self, hook: &'static str) {
            self.calls.lock().unwrap().push(hook);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Observer<Ad> for Recording {
        async fn on_creating(&self, _ad: &mut Ad) -> Result<()> {
            self.push("creating");
            Ok(())
        }

        async fn on_updating(&self, _ad: &mut Ad) -> Result<()> {
            self.push("updating");
            Ok(())
        }

        async fn on_deleting(&self, ad: &Ad) -> Result<()> {
            self.push("deleting");
            if self.fail_deleting {
                return NotFoundSnafu { id: ad.id }.fail();
            }
            Ok(())
        }

        async fn on_restored(&self, _ad: &Ad) -> Result<()> {
            self.push("restored");
            Ok(())
        }

        async fn on_force_deleted(&self, _ad: &Ad) -> Result<()> {
            self.push("force_deleted");
            Ok(())
        }
    }

    #[tokio::test]
    async fn hooks_fire_at_their_lifecycle_points() {
        let observer = Recording::default();
        let repository = AdRepository::with_observer(MemoryStore::new(), observer.clone());

        let ad = repository.create(payload(None)).await.unwrap();
        repository.update(ad.id, UpdateAd::default()).await.unwrap();
        repository.delete(ad.id).await.unwrap();
        repository.restore(ad.id).await.unwrap();
        repository.force_delete(ad.id).await.unwrap();

        assert_eq!(
            observer.calls(),
            vec![
                "creating",
                "updating",
                "deleting",
                "restored",
                "deleting",
                "force_deleted"
            ]
        );
    }

    #[tokio::test]
    async fn a_failing_hook_aborts_the_write() {
        let observer = Recording {
            fail_deleting: true,
            ..Default::default()
        };
        let repository = AdRepository::with_observer(MemoryStore::new(), observer.clone());
        let ad = repository.create(payload(None)).await.unwrap();

        let result = repository.delete(ad.id).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(repository.find(ad.id).await.is_ok());

        let result = repository.force_delete(ad.id).await;
        assert!(result.is_err());
        assert!(repository.find(ad.id).await.is_ok());
        assert!(!observer.calls().contains(&"force_deleted"));
    }
}
