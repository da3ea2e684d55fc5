//! Product domain entity, reviews and catalog query types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{AppError, AppResult};

fn non_negative_price(price: &Decimal) -> Result<(), validator::ValidationError> {
    if *price < Decimal::ZERO {
        return Err(validator::ValidationError::new("negative_price")
            .with_message("Price cannot be negative".into()));
    }
    Ok(())
}

/// Review left on a product. Owned by exactly one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    /// Identifier of the review author
    #[schema(example = "alice")]
    pub author: String,
    /// Numeric rating
    #[schema(example = 5)]
    pub rating: i16,
    /// Free-text comment
    #[schema(example = "Works as advertised")]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Product domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub quantity: i32,
    pub category: Option<String>,
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full product payload, used for creation and full replacement.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(length(min = 1, message = "All fields are required"))]
    #[schema(example = "Mechanical Keyboard")]
    pub name: String,
    #[validate(length(min = 1, message = "All fields are required"))]
    #[schema(example = "Tenkeyless, brown switches")]
    pub description: String,
    #[validate(length(min = 1, message = "All fields are required"))]
    #[schema(example = "keyboard.png")]
    pub image: String,
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = String, example = "59.90")]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    #[schema(example = 10)]
    pub quantity: i32,
    #[schema(example = "electronics")]
    pub category: Option<String>,
}

/// Partial product payload; only supplied fields are overwritten.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct ProductPatch {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    pub category: Option<String>,
}

impl ProductPatch {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.category.is_none()
    }
}

/// Review submission payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate, ToSchema)]
pub struct ReviewInput {
    #[validate(length(min = 1, message = "Author is required"))]
    #[schema(example = "alice")]
    pub author: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    #[schema(example = 4)]
    pub rating: i16,
    #[serde(default)]
    #[schema(example = "Solid build quality")]
    pub comment: String,
}

impl ReviewInput {
    /// Stamp the submission into a stored review.
    pub fn into_review(self) -> Review {
        Review {
            author: self.author,
            rating: self.rating,
            comment: self.comment,
            created_at: Utc::now(),
        }
    }
}

/// Search filter. Every supplied predicate must hold.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name
    pub name: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Inclusive lower price bound
    #[serde(alias = "minPrice")]
    #[schema(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    #[serde(alias = "maxPrice")]
    #[schema(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// Evaluate the filter against a product in memory.
    ///
    /// The repository translates the same predicates into SQL; this is the
    /// reference semantics.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(name) = &self.name {
            if !product.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if product.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

/// Field a product listing can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Price,
}

/// Ordering direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            other => Err(AppError::validation(format!("Unsupported sort field: {}", other))),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::validation(format!("Unsupported sort direction: {}", other))),
        }
    }
}

/// Listing order, name ascending unless told otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl ProductSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Stable in-memory sort. Names compare case-sensitively.
    pub fn apply(&self, products: &mut [Product]) {
        products.sort_by(|a, b| {
            let ord = match self.field {
                SortField::Name => a.name.cmp(&b.name),
                SortField::Price => a.price.cmp(&b.price),
            };
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
}
