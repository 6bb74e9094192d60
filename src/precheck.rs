//! Quick feasibility check without running the allocator.
//!
//! Each item type is only tested for fitting in isolation, and the order's
//! raw volume and weight totals are compared with container capacity. The
//! result can disagree with a full [`pack`](crate::allocator::pack) run,
//! e.g. totals may fit while ordering or grid rounding truncates quantities.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{Container, ItemType, PackingError, check_items};
use crate::orientation::find_best_orientation;
use crate::types::{CM3_PER_M3, Dimensional, Dims};

/// Item type that does not fit the container in any orientation.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct OversizedItem {
    pub item_id: u64,
    pub name: String,
    pub dims: Dims,
}

/// Outcome of [`validate`].
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ValidationReport {
    pub valid: bool,
    pub total_volume: f64,
    pub total_cbm: f64,
    pub container_cbm: f64,
    pub volume_percent: f64,
    pub volume_fits: bool,
    pub total_weight: f64,
    pub max_weight: f64,
    pub weight_percent: f64,
    pub weight_fits: bool,
    pub oversized_items: Vec<OversizedItem>,
    pub warnings: Vec<String>,
}

/// Checks an order against a container without allocating quantities.
///
/// # Examples
/// ```
/// use container_fit::model::{Container, ItemType};
/// use container_fit::precheck::validate;
/// use container_fit::types::Dims;
///
/// let container = Container::new(Dims::new(589.0, 239.0, 233.0), 25_400.0).unwrap();
/// let items = [ItemType::new(1, "Cube", 10, Dims::new(100.0, 100.0, 100.0), 50.0).unwrap()];
///
/// let report = validate(&container, &items).unwrap();
/// assert!(report.valid);
/// assert!(report.oversized_items.is_empty());
/// ```
pub fn validate(
    container: &Container,
    items: &[ItemType],
) -> Result<ValidationReport, PackingError> {
    check_items(items)?;

    let oversized_items: Vec<OversizedItem> = items
        .iter()
        .filter(|item| !find_best_orientation(item.dims, container.dims).fits())
        .map(|item| OversizedItem {
            item_id: item.id,
            name: item.name.clone(),
            dims: item.dims,
        })
        .collect();

    let total_volume: f64 = items.iter().map(ItemType::requested_volume).sum();
    let total_weight: f64 = items.iter().map(ItemType::requested_weight).sum();
    let container_volume = container.volume();

    let volume_fits = total_volume <= container_volume;
    let weight_fits = total_weight <= container.max_weight;
    let total_cbm = total_volume / CM3_PER_M3;
    let container_cbm = container_volume / CM3_PER_M3;

    let mut warnings = Vec::new();
    if !volume_fits {
        warnings.push(format!(
            "Total CBM ({:.2}) exceeds container capacity ({:.2})",
            total_cbm, container_cbm
        ));
    }
    if !weight_fits {
        warnings.push(format!(
            "Total weight ({:.2} kg) exceeds limit ({} kg)",
            total_weight, container.max_weight
        ));
    }
    if !oversized_items.is_empty() {
        warnings.push(format!(
            "{} items are too large for container",
            oversized_items.len()
        ));
    }

    Ok(ValidationReport {
        valid: oversized_items.is_empty() && volume_fits && weight_fits,
        total_volume,
        total_cbm,
        container_cbm,
        volume_percent: total_volume / container_volume * 100.0,
        volume_fits,
        total_weight,
        max_weight: container.max_weight,
        weight_percent: total_weight / container.max_weight * 100.0,
        weight_fits,
        oversized_items,
        warnings,
    })
}
