use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use apparel_shop_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_id = ensure_user(&pool, "9876543210", "asha@example.com", "Asha", "pass-word-1").await?;
    seed_products(&pool).await?;

    println!("Seed completed. User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    phone: &str,
    email: &str,
    first_name: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, phone, email, first_name, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (phone) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(phone)
    .bind(email)
    .bind(first_name)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch the id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
                .bind(phone)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {phone} <{email}>");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "Midnight Bloom Tee",
            "Oversized fit, heavyweight cotton",
            Decimal::new(79900, 2),
            "tshirts",
            vec!["Black", "Off-White"],
            vec!["S", "M", "L", "XL"],
            50,
        ),
        (
            "Desert Trail Tee",
            "Relaxed fit graphic tee",
            Decimal::new(89900, 2),
            "tshirts",
            vec!["Sand", "Olive"],
            vec!["M", "L", "XL"],
            35,
        ),
        (
            "Monsoon Hoodie",
            "Brushed fleece, drop shoulder",
            Decimal::new(129900, 2),
            "hoodies",
            vec!["Charcoal", "Navy"],
            vec!["S", "M", "L", "XL", "XXL"],
            20,
        ),
        (
            "Ember Hoodie",
            "Midweight zip-up hoodie",
            Decimal::new(149900, 2),
            "hoodies",
            vec!["Rust", "Black"],
            vec!["M", "L", "XL"],
            15,
        ),
    ];

    for (name, desc, price, collection, colors, sizes, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, collection, colors, sizes, stock_quantity)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(collection)
        .bind(serde_json::json!(colors))
        .bind(serde_json::json!(sizes))
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
