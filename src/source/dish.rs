//! Catalog records shared by every data source.
//!
//! These mirror the JSON documents served by the catalog API (camelCase
//! field names).  The feed controller treats [`Dish`] as opaque: it only
//! appends or replaces whole records and never looks inside them.

use serde::{Deserialize, Serialize};

/// One entry of the paginated dish list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    /// Stable server-side identifier.
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Whether `GET dishes/{id}/image` has anything to serve.
    #[serde(default)]
    pub has_image: bool,
}

/// A single ingredient line of a dish's tech card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub weight_grams: f64,
}

/// Full dish record returned by `GET dishes/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishDetail {
    #[serde(flatten)]
    pub dish: Dish,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl DishDetail {
    /// Sum of all ingredient weights, in grams.
    pub fn total_weight_grams(&self) -> f64 {
        self.ingredients.iter().map(|i| i.weight_grams).sum()
    }
}

/// Credentials posted to `auth/login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Successful login body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub role: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
