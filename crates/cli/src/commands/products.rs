use serde::Serialize;
use tastebud_core::catalog::{parse_label_list, CatalogQuery};
use tastebud_core::domain::product::Product;
use tastebud_db::{ConversationService, Repositories};

use crate::commands::{
    application_failure, execute, open_database, to_json, CommandResult, EXIT_INVALID_INPUT,
};

#[derive(Debug, Default)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub dietary: Option<String>,
    pub mood: Option<String>,
}

impl ProductFilters {
    fn into_query(self) -> Result<CatalogQuery, String> {
        for (flag, value) in [("--min-price", self.min_price), ("--max-price", self.max_price)] {
            if value.is_some_and(|price| !price.is_finite() || price < 0.0) {
                return Err(format!("{flag} must be a non-negative number"));
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(format!("--min-price {min} is greater than --max-price {max}"));
            }
        }

        let mut query = CatalogQuery::default()
            .with_price_range(self.min_price, self.max_price)
            .with_dietary(self.dietary.as_deref().map(parse_label_list).unwrap_or_default())
            .with_moods(self.mood.as_deref().map(parse_label_list).unwrap_or_default());
        if let Some(category) = self.category {
            query = query.with_category(category);
        }
        Ok(query)
    }
}

#[derive(Debug, Serialize)]
struct ProductsOutput {
    count: usize,
    products: Vec<Product>,
}

pub fn run(filters: ProductFilters) -> CommandResult {
    let query = match filters.into_query() {
        Ok(query) => query,
        Err(message) => {
            return CommandResult::failure(
                "products",
                "invalid_input",
                message,
                EXIT_INVALID_INPUT,
            );
        }
    };

    let result = execute("products", |config| async move {
        let pool = open_database(&config).await?;
        let service = ConversationService::from_config(
            Repositories::sqlite(pool.clone()),
            &config.recommendation,
        );
        let products = service.browse(&query).await;
        pool.close().await;

        let products = products.map_err(application_failure)?;
        let output = ProductsOutput { count: products.len(), products };
        Ok((format!("{} matching product(s)", output.count), to_json(&output)?))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data("products", message, Some(data)),
        Err(failure) => failure,
    }
}

#[cfg(test)]
mod tests {
    use super::ProductFilters;

    #[test]
    fn filters_become_a_catalog_query() {
        let query = ProductFilters {
            category: Some("pizza".to_string()),
            max_price: Some(14.0),
            dietary: Some("vegetarian, gluten-free".to_string()),
            mood: Some("comfort".to_string()),
            ..ProductFilters::default()
        }
        .into_query()
        .expect("valid filters");

        assert_eq!(query.category.as_deref(), Some("pizza"));
        assert_eq!(query.max_price, Some(14.0));
        assert_eq!(query.dietary, vec!["vegetarian".to_string(), "gluten-free".to_string()]);
        assert_eq!(query.moods, vec!["comfort".to_string()]);
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let error = ProductFilters {
            min_price: Some(20.0),
            max_price: Some(10.0),
            ..ProductFilters::default()
        }
        .into_query()
        .unwrap_err();

        assert!(error.contains("--min-price"));
    }
}
