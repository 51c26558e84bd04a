use serde::Serialize;
use surrealdb::sql::Thing;

use super::*;
use crate::database::Database;
use crate::define_query;
use crate::model::{Id, Table};

/// SurrealDB-backed storage.
///
/// Records are keyed as `ads:⟨uuid⟩` and `views:⟨uuid⟩`. Soft-deleted records carry a
/// `deleted_at` field; visible ones have none.
#[derive(Debug, Clone)]
pub struct SurrealStore {
    database: Database,
}

/// The stored fields of an ad; the id lives in the record key.
#[derive(Debug, Serialize)]
struct AdRecord<'a> {
    title: &'a str,
    description: &'a str,
    views_count: Option<u64>,
    created_at: Timestamp,
    updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_at: Option<Timestamp>,
}

impl<'a> From<&'a Ad> for AdRecord<'a> {
    fn from(ad: &'a Ad) -> Self {
        Self {
            title: &ad.title,
            description: &ad.description,
            views_count: ad.views_count,
            created_at: ad.created_at,
            updated_at: ad.updated_at,
            deleted_at: ad.deleted_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct ViewRecord {
    ad_id: String,
    viewed_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_at: Option<Timestamp>,
}

impl From<&View> for ViewRecord {
    fn from(view: &View) -> Self {
        Self {
            ad_id: view.ad_id.to_string(),
            viewed_at: view.viewed_at,
            deleted_at: view.deleted_at,
        }
    }
}

fn record_id<T: Table>(id: Id<T>) -> Thing {
    (T::table().to_string(), id.to_string()).into()
}

impl SurrealStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    async fn ensure_ad(&self, id: AdId) -> Result<()> {
        if self.select_ad_with_trashed(record_id(id)).await?.is_none() {
            tracing::debug!(record = %id.qualified(), "no such record");
            return NotFoundSnafu { id }.fail();
        }

        Ok(())
    }

    define_query! {
        create_ad(rid: Thing, record: AdRecord<'_>) -> ()
            where "CREATE $rid CONTENT $record RETURN NONE"
    }

    define_query! {
        replace_ad(rid: Thing, record: AdRecord<'_>) -> ()
            where "UPDATE $rid CONTENT $record RETURN NONE"
    }

    define_query! {
        select_ad(rid: Thing) -> Option<Ad>
            where "SELECT meta::id(id) AS id, title, description, views_count, created_at, updated_at, deleted_at
                   FROM ads WHERE id = $rid AND deleted_at = NONE LIMIT 1"
    }

    define_query! {
        select_ad_with_trashed(rid: Thing) -> Option<Ad>
            where "SELECT meta::id(id) AS id, title, description, views_count, created_at, updated_at, deleted_at
                   FROM ads WHERE id = $rid LIMIT 1"
    }

    define_query! {
        select_ads() -> Vec<Ad>
            where "SELECT meta::id(id) AS id, title, description, views_count, created_at, updated_at, deleted_at
                   FROM ads WHERE deleted_at = NONE ORDER BY created_at DESC"
    }

    define_query! {
        trash_ad(rid: Thing, at: Timestamp) -> ()
            where "UPDATE $rid SET deleted_at = $at RETURN NONE"
    }

    define_query! {
        untrash_ad(rid: Thing) -> ()
            where "UPDATE $rid SET deleted_at = NONE RETURN NONE"
    }

    define_query! {
        remove_ad(rid: Thing) -> ()
            where "DELETE $rid RETURN NONE"
    }

    define_query! {
        bump_views(rid: Thing) -> ()
            where "UPDATE $rid SET views_count += 1 RETURN NONE"
    }

    define_query! {
        create_view(rid: Thing, record: ViewRecord) -> ()
            where "CREATE $rid CONTENT $record RETURN NONE"
    }

    define_query! {
        select_views(ad_id: String) -> Vec<View>
            where "SELECT meta::id(id) AS id, ad_id, viewed_at, deleted_at
                   FROM views WHERE ad_id = $ad_id AND deleted_at = NONE ORDER BY viewed_at ASC"
    }

    define_query! {
        select_views_with_trashed(ad_id: String) -> Vec<View>
            where "SELECT meta::id(id) AS id, ad_id, viewed_at, deleted_at
                   FROM views WHERE ad_id = $ad_id ORDER BY viewed_at ASC"
    }

    define_query! {
        /// One statement for every view of the ad.
        trash_views(ad_id: String, at: Timestamp) -> ()
            where "UPDATE views SET deleted_at = $at WHERE ad_id = $ad_id AND deleted_at = NONE RETURN NONE"
    }

    define_query! {
        /// One statement for every view of the ad.
        remove_views(ad_id: String) -> ()
            where "DELETE views WHERE ad_id = $ad_id RETURN NONE"
    }
}

impl AdStore for SurrealStore {
    async fn insert_ad(&self, ad: &Ad) -> Result<()> {
        Ok(self.create_ad(record_id(ad.id), ad.into()).await?)
    }

    async fn save_ad(&self, ad: &Ad) -> Result<()> {
        self.ensure_ad(ad.id).await?;
        Ok(self.replace_ad(record_id(ad.id), ad.into()).await?)
    }

    async fn find_ad(&self, id: AdId) -> Result<Option<Ad>> {
        Ok(self.select_ad(record_id(id)).await?)
    }

    async fn find_ad_with_trashed(&self, id: AdId) -> Result<Option<Ad>> {
        Ok(self.select_ad_with_trashed(record_id(id)).await?)
    }

    async fn list_ads(&self) -> Result<Vec<Ad>> {
        Ok(self.select_ads().await?)
    }

    async fn soft_delete_ad(&self, id: AdId, at: Timestamp) -> Result<()> {
        self.ensure_ad(id).await?;
        Ok(self.trash_ad(record_id(id), at).await?)
    }

    async fn restore_ad(&self, id: AdId) -> Result<()> {
        self.ensure_ad(id).await?;
        Ok(self.untrash_ad(record_id(id)).await?)
    }

    async fn force_delete_ad(&self, id: AdId) -> Result<()> {
        Ok(self.remove_ad(record_id(id)).await?)
    }

    async fn increment_views(&self, id: AdId) -> Result<()> {
        self.ensure_ad(id).await?;
        Ok(self.bump_views(record_id(id)).await?)
    }
}

impl ViewStore for SurrealStore {
    async fn insert_view(&self, view: &View) -> Result<()> {
        Ok(self.create_view(record_id(view.id), view.into()).await?)
    }

    async fn views_of(&self, ad_id: AdId) -> Result<Vec<View>> {
        Ok(self.select_views(ad_id.to_string()).await?)
    }

    async fn views_of_with_trashed(&self, ad_id: AdId) -> Result<Vec<View>> {
        Ok(self.select_views_with_trashed(ad_id.to_string()).await?)
    }

    async fn delete_views_of(&self, ad_id: AdId, at: Timestamp) -> Result<()> {
        Ok(self.trash_views(ad_id.to_string(), at).await?)
    }

    async fn force_delete_views_of(&self, ad_id: AdId) -> Result<()> {
        Ok(self.remove_views(ad_id.to_string()).await?)
    }
}
