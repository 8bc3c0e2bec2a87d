//! Deterministic demo menu for local runs and tests.

use serde::Serialize;
use tracing::info;

use tastebud_core::domain::product::{Product, ProductId};

use crate::repositories::{ProductCatalog, RepositoryError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub inserted: usize,
    /// Products already present are left untouched.
    pub skipped: usize,
}

struct DemoItem {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    description: &'static str,
    ingredients: &'static [&'static str],
    price: f64,
    calories: u32,
    dietary: &'static [&'static str],
    moods: &'static [&'static str],
    allergens: &'static [&'static str],
    popularity: Option<u8>,
    spice_level: u8,
    chef_special: bool,
    limited_time: bool,
}

const DEMO_MENU: &[DemoItem] = &[
    DemoItem {
        id: "BR001",
        name: "Classic Smash Burger",
        category: "Burgers",
        description: "Two smashed beef patties with american cheese and house sauce",
        ingredients: &["beef", "cheddar cheese", "brioche bun", "pickles", "onion"],
        price: 11.5,
        calories: 820,
        dietary: &[],
        moods: &["comfort", "indulgent", "satisfying"],
        allergens: &["dairy", "gluten"],
        popularity: Some(94),
        spice_level: 0,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "BR002",
        name: "Black Bean Garden Burger",
        category: "Burgers",
        description: "Smoky black bean patty with avocado and pickled onion",
        ingredients: &["black beans", "avocado", "whole wheat bun", "lettuce", "tomato"],
        price: 10.0,
        calories: 540,
        dietary: &["vegetarian", "vegan"],
        moods: &["healthy", "satisfying"],
        allergens: &["gluten"],
        popularity: Some(71),
        spice_level: 1,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "PZ001",
        name: "Margherita Pizza",
        category: "Pizza",
        description: "San marzano tomato, fresh mozzarella and basil on a blistered crust",
        ingredients: &["tomato", "mozzarella", "basil", "dough", "olive oil"],
        price: 13.0,
        calories: 900,
        dietary: &["vegetarian"],
        moods: &["comfort", "quick"],
        allergens: &["dairy", "gluten"],
        popularity: Some(88),
        spice_level: 0,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "PZ002",
        name: "Hot Honey Pepperoni",
        category: "Pizza",
        description: "Cup pepperoni, chili flakes and a drizzle of hot honey",
        ingredients: &["pepperoni", "mozzarella", "honey", "chili", "dough"],
        price: 15.5,
        calories: 1080,
        dietary: &[],
        moods: &["indulgent", "adventurous"],
        allergens: &["dairy", "gluten"],
        popularity: Some(90),
        spice_level: 5,
        chef_special: true,
        limited_time: false,
    },
    DemoItem {
        id: "FC001",
        name: "Spicy Korean Fried Chicken",
        category: "Fried Chicken",
        description: "Double fried wings glazed in gochujang with sesame",
        ingredients: &["chicken", "gochujang", "garlic", "sesame", "rice flour"],
        price: 13.5,
        calories: 760,
        dietary: &["gluten-free"],
        moods: &["adventurous", "indulgent"],
        allergens: &["sesame", "soy"],
        popularity: Some(92),
        spice_level: 8,
        chef_special: true,
        limited_time: false,
    },
    DemoItem {
        id: "FC002",
        name: "Buttermilk Chicken Tenders",
        category: "Fried Chicken",
        description: "Crispy tenders with honey mustard for dipping",
        ingredients: &["chicken", "buttermilk", "flour", "mustard"],
        price: 9.0,
        calories: 640,
        dietary: &[],
        moods: &["comfort", "quick"],
        allergens: &["dairy", "gluten"],
        popularity: Some(80),
        spice_level: 0,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "TW001",
        name: "Al Pastor Tacos",
        category: "Tacos & Wraps",
        description: "Marinated pork with grilled pineapple and cilantro on corn tortillas",
        ingredients: &["pork", "pineapple", "corn tortilla", "cilantro", "onion"],
        price: 10.5,
        calories: 610,
        dietary: &["gluten-free", "dairy-free"],
        moods: &["adventurous", "quick"],
        allergens: &[],
        popularity: Some(85),
        spice_level: 4,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "TW002",
        name: "Grilled Veggie Wrap",
        category: "Tacos & Wraps",
        description: "Charred peppers, zucchini and hummus in a spinach tortilla",
        ingredients: &["peppers", "zucchini", "hummus", "spinach tortilla"],
        price: 8.5,
        calories: 480,
        dietary: &["vegetarian", "vegan", "dairy-free"],
        moods: &["healthy", "quick"],
        allergens: &["gluten", "sesame"],
        popularity: None,
        spice_level: 1,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "SH001",
        name: "Quinoa Power Bowl",
        category: "Salads & Healthy Options",
        description: "Quinoa, roasted sweet potato, kale and lemon tahini",
        ingredients: &["quinoa", "sweet potato", "kale", "tahini", "lemon"],
        price: 12.0,
        calories: 520,
        dietary: &["vegetarian", "vegan", "gluten-free", "dairy-free"],
        moods: &["healthy"],
        allergens: &["sesame"],
        popularity: Some(74),
        spice_level: 0,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "SH002",
        name: "Grilled Salmon Salad",
        category: "Salads & Healthy Options",
        description: "Grilled salmon over greens with avocado and citrus vinaigrette",
        ingredients: &["salmon", "mixed greens", "avocado", "orange"],
        price: 16.0,
        calories: 480,
        dietary: &["gluten-free", "keto", "low-carb"],
        moods: &["healthy", "fancy"],
        allergens: &["fish"],
        popularity: Some(69),
        spice_level: 0,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "DS001",
        name: "Molten Chocolate Cake",
        category: "Desserts",
        description: "Warm chocolate cake with a gooey center and vanilla ice cream",
        ingredients: &["chocolate", "butter", "eggs", "flour", "ice cream"],
        price: 7.5,
        calories: 690,
        dietary: &["vegetarian"],
        moods: &["indulgent", "comfort"],
        allergens: &["dairy", "eggs", "gluten"],
        popularity: Some(89),
        spice_level: 0,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "BV001",
        name: "Mango Lassi Shake",
        category: "Beverages",
        description: "Mango blended with yogurt and cardamom",
        ingredients: &["mango", "yogurt", "cardamom", "milk"],
        price: 5.0,
        calories: 330,
        dietary: &["vegetarian", "gluten-free"],
        moods: &["quick"],
        allergens: &["dairy"],
        popularity: Some(66),
        spice_level: 0,
        chef_special: false,
        limited_time: false,
    },
    DemoItem {
        id: "LT001",
        name: "Truffle Mushroom Melt",
        category: "Limited Time Specials",
        description: "Roasted mushrooms and truffle aioli with melted gruyere on sourdough",
        ingredients: &["mushroom", "truffle", "gruyere", "sourdough", "aioli"],
        price: 14.0,
        calories: 780,
        dietary: &["vegetarian"],
        moods: &["fancy", "indulgent"],
        allergens: &["dairy", "gluten", "eggs"],
        popularity: Some(77),
        spice_level: 0,
        chef_special: true,
        limited_time: true,
    },
];

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

pub fn demo_catalog() -> Vec<Product> {
    DEMO_MENU
        .iter()
        .map(|item| Product {
            id: ProductId(item.id.to_string()),
            name: item.name.to_string(),
            category: item.category.to_string(),
            description: item.description.to_string(),
            ingredients: labels(item.ingredients),
            price: item.price,
            calories: item.calories,
            dietary_tags: labels(item.dietary),
            mood_tags: labels(item.moods),
            allergens: labels(item.allergens),
            popularity_score: item.popularity,
            spice_level: item.spice_level,
            chef_special: item.chef_special,
            limited_time: item.limited_time,
        })
        .collect()
}

/// Inserts demo products that are not in the catalog yet. Running it twice
/// inserts nothing the second time.
pub async fn seed_demo_catalog(
    catalog: &dyn ProductCatalog,
) -> Result<SeedResult, RepositoryError> {
    let mut result = SeedResult { inserted: 0, skipped: 0 };
    for product in demo_catalog() {
        if catalog.find_by_id(&product.id).await?.is_some() {
            result.skipped += 1;
            continue;
        }
        catalog.save(product).await?;
        result.inserted += 1;
    }

    info!(
        event_name = "catalog.seeded",
        inserted = result.inserted,
        skipped = result.skipped,
        "demo catalog seeded"
    );
    Ok(result)
}
