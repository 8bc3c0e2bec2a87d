use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use tastebud_core::domain::product::{Product, ProductId};

use super::{decode_error, decode_list, decode_u8, encode_list, ProductCatalog, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, category, description, ingredients_json, price, calories,
     dietary_tags_json, mood_tags_json, allergens_json, popularity_score, spice_level,
     chef_special, limited_time";

pub struct SqlProductCatalog {
    pool: DbPool,
}

impl SqlProductCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let ingredients: String = row.try_get("ingredients_json").map_err(decode_error)?;
    let dietary_tags: String = row.try_get("dietary_tags_json").map_err(decode_error)?;
    let mood_tags: String = row.try_get("mood_tags_json").map_err(decode_error)?;
    let allergens: String = row.try_get("allergens_json").map_err(decode_error)?;
    let calories: i64 = row.try_get("calories").map_err(decode_error)?;
    let popularity: Option<i64> = row.try_get("popularity_score").map_err(decode_error)?;
    let spice_level: i64 = row.try_get("spice_level").map_err(decode_error)?;

    Ok(Product {
        id: ProductId(id),
        name: row.try_get("name").map_err(decode_error)?,
        category: row.try_get("category").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        ingredients: decode_list(&ingredients)?,
        price: row.try_get("price").map_err(decode_error)?,
        calories: u32::try_from(calories).map_err(decode_error)?,
        dietary_tags: decode_list(&dietary_tags)?,
        mood_tags: decode_list(&mood_tags)?,
        allergens: decode_list(&allergens)?,
        popularity_score: popularity
            .map(|value| decode_u8(value, "popularity_score"))
            .transpose()?,
        spice_level: decode_u8(spice_level, "spice_level")?,
        chef_special: row.try_get("chef_special").map_err(decode_error)?,
        limited_time: row.try_get("limited_time").map_err(decode_error)?,
    })
}

#[async_trait::async_trait]
impl ProductCatalog for SqlProductCatalog {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        product.validate()?;
        sqlx::query(
            "INSERT INTO products
                (id, name, category, description, ingredients_json, price, calories,
                 dietary_tags_json, mood_tags_json, allergens_json, popularity_score,
                 spice_level, chef_special, limited_time)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                description = excluded.description,
                ingredients_json = excluded.ingredients_json,
                price = excluded.price,
                calories = excluded.calories,
                dietary_tags_json = excluded.dietary_tags_json,
                mood_tags_json = excluded.mood_tags_json,
                allergens_json = excluded.allergens_json,
                popularity_score = excluded.popularity_score,
                spice_level = excluded.spice_level,
                chef_special = excluded.chef_special,
                limited_time = excluded.limited_time",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(encode_list(&product.ingredients)?)
        .bind(product.price)
        .bind(i64::from(product.calories))
        .bind(encode_list(&product.dietary_tags)?)
        .bind(encode_list(&product.mood_tags)?)
        .bind(encode_list(&product.allergens)?)
        .bind(product.popularity_score.map(i64::from))
        .bind(i64::from(product.spice_level))
        .bind(product.chef_special)
        .bind(product.limited_time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
