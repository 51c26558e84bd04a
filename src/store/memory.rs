use std::sync::Arc;

use dashmap::DashMap;
use snafu::OptionExt as _;

use super::*;
use crate::model::ViewId;

/// Process-local storage. Clones share the same maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    ads: Arc<DashMap<AdId, Ad>>,
    views: Arc<DashMap<ViewId, View>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_ad<T>(&self, id: AdId, f: impl FnOnce(&mut Ad) -> T) -> Result<T> {
        let mut ad = self.ads.get_mut(&id).context(NotFoundSnafu { id })?;
        Ok(f(ad.value_mut()))
    }
}

impl AdStore for MemoryStore {
    async fn insert_ad(&self, ad: &Ad) -> Result<()> {
        self.ads.insert(ad.id, ad.clone());
        Ok(())
    }

    async fn save_ad(&self, ad: &Ad) -> Result<()> {
        self.with_ad(ad.id, |stored| *stored = ad.clone())
    }

    async fn find_ad(&self, id: AdId) -> Result<Option<Ad>> {
        let ad = self.ads.get(&id).filter(|ad| !ad.is_trashed());
        Ok(ad.map(|ad| ad.value().clone()))
    }

    async fn find_ad_with_trashed(&self, id: AdId) -> Result<Option<Ad>> {
        Ok(self.ads.get(&id).map(|ad| ad.value().clone()))
    }

    async fn list_ads(&self) -> Result<Vec<Ad>> {
        let mut ads: Vec<Ad> = self
            .ads
            .iter()
            .filter(|ad| !ad.is_trashed())
            .map(|ad| ad.value().clone())
            .collect();

        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ads)
    }

    async fn soft_delete_ad(&self, id: AdId, at: Timestamp) -> Result<()> {
        self.with_ad(id, |ad| ad.deleted_at = Some(at))
    }

    async fn restore_ad(&self, id: AdId) -> Result<()> {
        self.with_ad(id, |ad| ad.deleted_at = None)
    }

    async fn force_delete_ad(&self, id: AdId) -> Result<()> {
        self.ads.remove(&id);
        Ok(())
    }

    async fn increment_views(&self, id: AdId) -> Result<()> {
        self.with_ad(id, |ad| {
            ad.views_count = Some(ad.views_count.unwrap_or_default() + 1);
        })
    }
}

impl ViewStore for MemoryStore {
    async fn insert_view(&self, view: &View) -> Result<()> {
        self.views.insert(view.id, view.clone());
        Ok(())
    }

    async fn views_of(&self, ad_id: AdId) -> Result<Vec<View>> {
        let mut views = self.views_of_with_trashed(ad_id).await?;
        views.retain(|view| !view.is_trashed());
        Ok(views)
    }

    async fn views_of_with_trashed(&self, ad_id: AdId) -> Result<Vec<View>> {
        let mut views: Vec<View> = self
            .views
            .iter()
            .filter(|view| view.ad_id == ad_id)
            .map(|view| view.value().clone())
            .collect();

        views.sort_by(|a, b| a.viewed_at.cmp(&b.viewed_at));
        Ok(views)
    }

    async fn delete_views_of(&self, ad_id: AdId, at: Timestamp) -> Result<()> {
        self.views
            .iter_mut()
            .filter(|view| view.ad_id == ad_id && !view.is_trashed())
            .for_each(|mut view| view.deleted_at = Some(at));
        Ok(())
    }

    async fn force_delete_views_of(&self, ad_id: AdId) -> Result<()> {
        self.views.retain(|_, view| view.ad_id != ad_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;

    fn ad(title: &str) -> Ad {
        Ad::new(title.into(), String::new(), Some(0))
    }

    #[tokio::test]
    async fn soft_deleted_ads_are_hidden_but_kept() {
        let store = MemoryStore::new();
        let ad = ad("Lamp");
        store.insert_ad(&ad).await.unwrap();

        store.soft_delete_ad(ad.id, now()).await.unwrap();

        assert_eq!(store.find_ad(ad.id).await.unwrap(), None);
        assert!(store.list_ads().await.unwrap().is_empty());

        let trashed = store.find_ad_with_trashed(ad.id).await.unwrap().unwrap();
        assert!(trashed.is_trashed());

        store.restore_ad(ad.id).await.unwrap();
        assert!(store.find_ad(ad.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn bulk_view_deletion_only_touches_one_ad() {
        let store = MemoryStore::new();
        let lamp = ad("Lamp");
        let desk = ad("Desk");
        store.insert_ad(&lamp).await.unwrap();
        store.insert_ad(&desk).await.unwrap();

        for _ in 0..3 {
            store.insert_view(&View::new(lamp.id)).await.unwrap();
        }
        store.insert_view(&View::new(desk.id)).await.unwrap();

        store.delete_views_of(lamp.id, now()).await.unwrap();
        assert!(store.views_of(lamp.id).await.unwrap().is_empty());
        assert_eq!(store.views_of_with_trashed(lamp.id).await.unwrap().len(), 3);
        assert_eq!(store.views_of(desk.id).await.unwrap().len(), 1);

        store.force_delete_views_of(lamp.id).await.unwrap();
        assert!(store.views_of_with_trashed(lamp.id).await.unwrap().is_empty());
        assert_eq!(store.views_of(desk.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn operations_on_a_missing_ad_report_not_found() {
        let store = MemoryStore::new();
        let id = AdId::uuid();

        let result = store.increment_views(id).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        let result = store.save_ad(&ad("Ghost")).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn increment_treats_unset_counter_as_zero() {
        let store = MemoryStore::new();
        let ad = Ad::new("Chair".into(), String::new(), None);
        store.insert_ad(&ad).await.unwrap();

        store.increment_views(ad.id).await.unwrap();

        let stored = store.find_ad(ad.id).await.unwrap().unwrap();
        assert_eq!(stored.views_count, Some(1));
    }
}
