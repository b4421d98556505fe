//! Mock product search
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub asin: String,
    pub title: String,
    pub price: f64,
    pub rating: f64,
    pub reviews: u32,
}

fn product(asin: &str, title: &str, price: f64, rating: f64, reviews: u32) -> Product {
    Product {
        asin: asin.to_string(),
        title: title.to_string(),
        price,
        rating,
        reviews,
    }
}

fn catalog() -> Vec<Product> {
    vec![
        product(
            "B0COMP01",
            "HydroFlask 32oz Wide Mouth Stainless Steel Water Bottle",
            44.99,
            4.5,
            8932,
        ),
        product(
            "B0COMP02",
            "Yeti Rambler 26oz Insulated Steel Bottle",
            34.99,
            4.4,
            5621,
        ),
        product("B0COMP03", "Generic Steel Water Bottle", 8.99, 3.2, 45),
        product("B0COMP04", "Bottle Cleaning Brush Set", 4.99, 4.6, 3421),
        product(
            "B0COMP05",
            "Stanley Insulated Water Bottle 40oz",
            35.0,
            4.3,
            4102,
        ),
        product(
            "B0COMP06",
            "Replacement Lid for Steel Bottles",
            12.99,
            4.1,
            1200,
        ),
        product("B0COMP07", "Budget Insulated Bottle 1L", 15.49, 3.9, 320),
    ]
}

/// Products whose title contains at least one keyword, best match first.
pub fn search(keywords: &[String], limit: usize) -> Vec<Product> {
    let mut hits: Vec<(usize, Product)> = catalog()
        .into_iter()
        .map(|p| {
            let title = p.title.to_lowercase();
            let matched = keywords.iter().filter(|k| title.contains(k.as_str())).count();
            (matched, p)
        })
        .filter(|(matched, _)| *matched > 0)
        .collect();
    hits.sort_by(|a, b| b.0.cmp(&a.0));
    hits.into_iter().take(limit).map(|(_, p)| p).collect()
}
