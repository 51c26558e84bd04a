use super::*;

pub type AdId = Id<Ad>;

/// A classified listing. Parent of its [View] records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct Ad {
    #[new(default)]
    pub id: AdId,

    pub title: String,
    pub description: String,

    /// Denormalized number of recorded views. `None` only before the ad is first persisted.
    #[serde(default)]
    pub views_count: Option<u64>,

    #[new(value = "now()")]
    pub created_at: Timestamp,
    #[new(value = "now()")]
    pub updated_at: Timestamp,
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

table!("ads": Ad);

impl Ad {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Payload for creating an ad.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct NewAd {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[new(default)]
    pub views_count: Option<u64>,
}

impl From<NewAd> for Ad {
    fn from(payload: NewAd) -> Self {
        Ad::new(payload.title, payload.description, payload.views_count)
    }
}

/// Partial update of an ad; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpdateAd {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdateAd {
    pub fn apply(self, ad: &mut Ad) {
        if let Some(title) = self.title {
            ad.title = title;
        }

        if let Some(description) = self.description {
            ad.description = description;
        }
    }
}
