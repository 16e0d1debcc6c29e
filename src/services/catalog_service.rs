use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    entity::products::{Column, Entity as Products},
    error::{AppError, AppResult},
    models::Product,
    response::Paginated,
    routes::params::{PAGE_SIZE, ProductQuery},
    state::AppState,
};

/// Disabled products never leave the catalog, whatever the filters say.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<Paginated<Product>> {
    let (page, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(collection) = query.collection.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col(Column::Collection)))
                .eq(collection.to_lowercase()),
        );
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let count = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(PAGE_SIZE as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from_entity)
        .collect();

    Ok(Paginated {
        count,
        page,
        per_page: PAGE_SIZE,
        items,
    })
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    let product = Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    match product {
        Some(p) => Ok(Product::from_entity(p)),
        None => Err(AppError::NotFound("Product not found.".to_string())),
    }
}
