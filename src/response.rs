use serde::Serialize;
use utoipa::ToSchema;

/// Plain detail message, the body for acknowledgement-only endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Page-numbered listing envelope with a fixed server-side page size.
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub count: i64,
    pub page: i64,
    pub per_page: i64,
    pub items: Vec<T>,
}
