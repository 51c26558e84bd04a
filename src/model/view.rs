use super::*;

pub type ViewId = Id<View>;

/// One recorded view of an [Ad].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct View {
    #[new(default)]
    pub id: ViewId,
    pub ad_id: AdId,
    #[new(value = "now()")]
    pub viewed_at: Timestamp,
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

table!("views": View);

impl View {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}
