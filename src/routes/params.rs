use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

/// Fixed server-side page size for catalog listings.
pub const PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let offset = (page - 1) * PAGE_SIZE;
        (page, offset)
    }
}

// `page` is inlined rather than flattened: serde_urlencoded cannot
// deserialize numeric fields through a flattened struct.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub collection: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<Decimal>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<Decimal>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination { page: self.page }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_one_based_with_fixed_size() {
        assert_eq!(Pagination { page: None }.normalize(), (1, 0));
        assert_eq!(Pagination { page: Some(0) }.normalize(), (1, 0));
        assert_eq!(Pagination { page: Some(3) }.normalize(), (3, 40));
    }
}
