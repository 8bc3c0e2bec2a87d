//! Popularity fallback used when the primary ranking comes back empty or weak.

use std::cmp::Reverse;

use super::dietary::DietaryFilter;
use super::types::RankedRecommendation;
use super::{FALLBACK_POPULARITY_BONUS, FALLBACK_SCORE_FLOOR};
use crate::domain::product::Product;

/// Empty, or nothing reached the floor.
pub fn needs_fallback(ranked: &[RankedRecommendation]) -> bool {
    ranked.iter().all(|entry| entry.recommendation_score < FALLBACK_SCORE_FLOOR)
}

/// Most popular products whose category contains `category`, still filtered
/// by every active restriction. Unrated products sort last.
pub fn popular_in_category(
    catalog: &[Product],
    category: &str,
    restrictions: &[String],
    limit: usize,
    dietary: &DietaryFilter,
) -> Vec<RankedRecommendation> {
    let needle = category.to_lowercase();
    let mut matching: Vec<&Product> = catalog
        .iter()
        .filter(|product| product.category.to_lowercase().contains(&needle))
        .collect();
    matching.sort_by_key(|product| Reverse(product.popularity_score));

    matching
        .into_iter()
        .filter(|product| dietary.complies_with_all(product, restrictions))
        .take(limit)
        .map(|product| {
            RankedRecommendation::new(
                product,
                product.popularity() + FALLBACK_POPULARITY_BONUS,
                vec![
                    format!("Popular {category} option that meets your dietary requirements"),
                    "High customer rating".to_string(),
                ],
                None,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{needs_fallback, popular_in_category};
    use crate::domain::product::fixtures::product;
    use crate::domain::product::Product;
    use crate::recommend::dietary::DietaryFilter;
    use crate::recommend::types::RankedRecommendation;

    fn rated(id: &str, category: &str, popularity: Option<u8>) -> Product {
        let mut item = product(id, id, category);
        item.popularity_score = popularity;
        item
    }

    #[test]
    fn weak_or_empty_rankings_need_fallback() {
        let item = product("PZ001", "Margherita", "Pizza");
        assert!(needs_fallback(&[]));
        assert!(needs_fallback(&[RankedRecommendation::new(&item, 29.99, Vec::new(), None)]));
        assert!(!needs_fallback(&[
            RankedRecommendation::new(&item, 12.0, Vec::new(), None),
            RankedRecommendation::new(&item, 30.0, Vec::new(), None),
        ]));
    }

    #[test]
    fn orders_by_popularity_with_unrated_last() {
        let catalog = vec![
            rated("PZ001", "Pizza", None),
            rated("PZ002", "Pizza", Some(70)),
            rated("BR001", "Burgers", Some(99)),
            rated("PZ003", "Deep Dish Pizza", Some(90)),
        ];

        let picked = popular_in_category(&catalog, "pizza", &[], 5, &DietaryFilter::default());
        let ids: Vec<_> = picked.iter().map(|entry| entry.product_id.0.as_str()).collect();
        assert_eq!(ids, vec!["PZ003", "PZ002", "PZ001"]);
        assert_eq!(picked[0].recommendation_score, 110.0);
        assert_eq!(picked[2].recommendation_score, 70.0);
        assert_eq!(
            picked[0].reasons,
            vec![
                "Popular pizza option that meets your dietary requirements".to_string(),
                "High customer rating".to_string(),
            ]
        );
    }

    #[test]
    fn keeps_dietary_compliance_and_limit() {
        let mut veggie = rated("PZ010", "Pizza", Some(40));
        veggie.dietary_tags = vec!["vegetarian".to_string()];
        let catalog =
            vec![rated("PZ011", "Pizza", Some(95)), veggie, rated("PZ012", "Pizza", Some(60))];

        let picked = popular_in_category(
            &catalog,
            "pizza",
            &["vegetarian".to_string()],
            3,
            &DietaryFilter::default(),
        );
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].product_id.0, "PZ010");

        let limited = popular_in_category(&catalog, "pizza", &[], 2, &DietaryFilter::default());
        assert_eq!(limited.len(), 2);
    }
}
