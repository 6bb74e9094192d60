//! Data models for container capacity estimation.
//!
//! - `Container`: internal dimensions and weight limit of one container class
//! - `ContainerCatalog`: the class name → `Container` lookup injected by the caller
//! - `ItemType`: one line of an order (dimensions, unit weight, quantity)
//!
//! All structures are request-scoped values and are never mutated by the
//! estimation core.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Dimensional, Dims, validation};

/// Validation error for container or item data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

/// Failures surfaced by the estimation operations.
///
/// Returned as values so the transport layer can map them straight to a
/// response code. No partial result accompanies an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackingError {
    #[error("Unknown container class: {0}")]
    UnknownContainerClass(String),
    #[error("No item types provided")]
    EmptyItemList,
    #[error("Item {item_id} is degenerate: {source}")]
    DegenerateItem {
        item_id: u64,
        #[source]
        source: ValidationError,
    },
}

/// Errors raised while loading a container catalog from JSON.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Could not read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Container class '{class}' is invalid: {source}")]
    InvalidEntry {
        class: String,
        #[source]
        source: ValidationError,
    },
    #[error("Catalog contains no container classes")]
    Empty,
}

fn check_dims(dims: &Dims, prefix: &str) -> Result<(), ValidationError> {
    validation::validate_dims(dims, prefix).map_err(ValidationError::InvalidDimension)
}

/// Internal dimensions and weight limit of a container.
///
/// # Fields
/// * `class` - Catalog key this container was resolved from, if any
/// * `dims` - Internal width, height and depth
/// * `max_weight` - Maximum cargo weight in kg
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Container {
    pub class: Option<String>,
    pub dims: Dims,
    pub max_weight: f64,
}

impl Container {
    /// Creates a new container after validating its dimensions and weight limit.
    ///
    /// # Examples
    /// ```
    /// use container_fit::model::Container;
    /// use container_fit::types::Dims;
    ///
    /// assert!(Container::new(Dims::new(589.0, 239.0, 233.0), 25_400.0).is_ok());
    /// assert!(Container::new(Dims::new(589.0, 0.0, 233.0), 25_400.0).is_err());
    /// ```
    pub fn new(dims: Dims, max_weight: f64) -> Result<Self, ValidationError> {
        check_dims(&dims, "Container ")?;
        validation::validate_weight_limit(max_weight).map_err(ValidationError::InvalidWeight)?;
        Ok(Self {
            class: None,
            dims,
            max_weight,
        })
    }

    /// Stores the catalog key on the container.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Dims {
        self.dims
    }
}

/// One catalog entry as it appears in a JSON catalog file.
#[derive(Clone, Copy, Debug, Deserialize)]
struct ContainerSpec {
    width: f64,
    height: f64,
    depth: f64,
    max_weight: f64,
}

/// Lookup from container class (e.g. `"20ft"`) to its internal specification.
///
/// The core never hardcodes a container; callers resolve a class here and
/// pass the resulting `Container` on.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerCatalog {
    classes: BTreeMap<String, Container>,
}

impl ContainerCatalog {
    /// Standard ISO dry containers, internal dimensions in cm and payload in kg.
    pub fn standard() -> Self {
        let mut classes = BTreeMap::new();
        classes.insert(
            "20ft".to_string(),
            Container {
                class: Some("20ft".to_string()),
                dims: Dims::new(589.0, 239.0, 233.0),
                max_weight: 25_400.0,
            },
        );
        classes.insert(
            "40ft".to_string(),
            Container {
                class: Some("40ft".to_string()),
                dims: Dims::new(1219.0, 259.0, 244.0),
                max_weight: 25_400.0,
            },
        );
        Self { classes }
    }

    /// Parses a catalog from a JSON object keyed by class name.
    ///
    /// ```json
    /// {"20ft": {"width": 589, "height": 239, "depth": 233, "max_weight": 25400}}
    /// ```
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let specs: BTreeMap<String, ContainerSpec> = serde_json::from_str(raw)?;
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let classes = specs
            .into_iter()
            .map(|(class, spec)| {
                let dims = Dims::new(spec.width, spec.height, spec.depth);
                match Container::new(dims, spec.max_weight) {
                    Ok(container) => Ok((class.clone(), container.with_class(class))),
                    Err(source) => Err(CatalogError::InvalidEntry { class, source }),
                }
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self { classes })
    }

    /// Reads and parses a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Looks up a container class.
    pub fn resolve(&self, class: &str) -> Result<&Container, PackingError> {
        self.classes
            .get(class)
            .ok_or_else(|| PackingError::UnknownContainerClass(class.to_string()))
    }

    /// Iterates over all classes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Container)> {
        self.classes.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if the catalog holds no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for ContainerCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// One cargo item type of an order.
///
/// # Fields
/// * `id` - Caller-assigned identifier
/// * `name` - Display name
/// * `quantity` - Requested number of units (1 to [`ItemType::MAX_QUANTITY`])
/// * `dims` - Nominal width, height and depth of one unit
/// * `weight` - Weight of one unit in kg (0 means weight imposes no limit)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Pallet box",
    "quantity": 100,
    "dims": {"width": 100.0, "height": 100.0, "depth": 100.0},
    "weight": 50.0
}))]
pub struct ItemType {
    pub id: u64,
    pub name: String,
    pub quantity: u64,
    pub dims: Dims,
    pub weight: f64,
}

impl ItemType {
    /// Upper bound for `quantity`. Keeps order totals far away from `u64` overflow.
    pub const MAX_QUANTITY: u64 = 1_000_000_000;

    /// Creates a new item type with validation.
    ///
    /// # Examples
    /// ```
    /// use container_fit::model::ItemType;
    /// use container_fit::types::Dims;
    ///
    /// let ok = ItemType::new(1, "Crate", 10, Dims::new(100.0, 100.0, 100.0), 0.0);
    /// assert!(ok.is_ok());
    ///
    /// let none_requested = ItemType::new(2, "Crate", 0, Dims::new(100.0, 100.0, 100.0), 5.0);
    /// assert!(none_requested.is_err());
    /// ```
    pub fn new(
        id: u64,
        name: impl Into<String>,
        quantity: u64,
        dims: Dims,
        weight: f64,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            id,
            name: name.into(),
            quantity,
            dims,
            weight,
        };
        item.check()?;
        Ok(item)
    }

    /// Re-checks an item that may have been built without `new`.
    pub fn check(&self) -> Result<(), ValidationError> {
        check_dims(&self.dims, "Item ")?;
        validation::validate_weight(self.weight).map_err(ValidationError::InvalidWeight)?;
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if self.quantity > Self::MAX_QUANTITY {
            return Err(ValidationError::InvalidQuantity(format!(
                "Quantity must be at most {}, got: {}",
                Self::MAX_QUANTITY,
                self.quantity
            )));
        }
        Ok(())
    }

    /// Volume of all requested units.
    pub fn requested_volume(&self) -> f64 {
        self.quantity as f64 * self.volume()
    }

    /// Weight of all requested units.
    pub fn requested_weight(&self) -> f64 {
        self.quantity as f64 * self.weight
    }
}

impl Dimensional for ItemType {
    fn dimensions(&self) -> Dims {
        self.dims
    }
}

/// Rejects empty or degenerate item lists before any arithmetic runs.
pub(crate) fn check_items(items: &[ItemType]) -> Result<(), PackingError> {
    if items.is_empty() {
        return Err(PackingError::EmptyItemList);
    }
    items.iter().try_for_each(|item| {
        item.check().map_err(|source| PackingError::DegenerateItem {
            item_id: item.id,
            source,
        })
    })
}
