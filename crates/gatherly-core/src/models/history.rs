use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Field set of a profile history record kind (education, work).
pub trait HistoryKind: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Resource segment used in `/api/{resource}` and `/api/users/{id}/{resource}`
    const RESOURCE: &'static str;
}

/// A history record owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<F> {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(flatten)]
    pub fields: F,
}

/// Body of a create request: the server assigns `id`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewHistoryEntry<'a, F> {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(flatten)]
    pub fields: &'a F,
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationFields {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(rename = "fieldOfStudy", default)]
    pub field_of_study: Option<String>,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl HistoryKind for EducationFields {
    const RESOURCE: &'static str = "education";
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkFields {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl HistoryKind for WorkFields {
    const RESOURCE: &'static str = "work";
}

pub type Education = HistoryEntry<EducationFields>;
pub type Work = HistoryEntry<WorkFields>;

/// "start - end" span for display, with "Present" for open-ended records
pub fn date_span(start: &Option<String>, end: &Option<String>) -> String {
    let start = start.as_deref().map(|s| s.chars().take(10).collect::<String>());
    let end = end.as_deref().map(|s| s.chars().take(10).collect::<String>());
    match (start, end) {
        (Some(s), Some(e)) => format!("{} - {}", s, e),
        (Some(s), None) => format!("{} - Present", s),
        (None, Some(e)) => format!("until {}", e),
        (None, None) => String::new(),
    }
}
