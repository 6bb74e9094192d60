//! Sequential, weight-budget-aware capacity allocation.
//!
//! Item types are processed one after another. Each type receives as many
//! units as fit geometrically (best single orientation) and as the remaining
//! weight budget allows, capped at the requested quantity. The remaining
//! budget is threaded from one item type to the next as an explicit value,
//! so earlier types have priority when weight becomes the binding limit.
//! There is no backtracking and no attempt to improve overall utilization.

use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::model::{Container, ItemType, PackingError, check_items};
use crate::orientation::{OrientationResult, find_best_orientation};
use crate::types::Dimensional;
use crate::utilization::{Utilization, WarningThresholds, aggregate};

/// Order in which item types draw from the weight budget.
///
/// Deserializes through [`AllocationStrategy::parse`], so request bodies and
/// `CONTAINER_FIT_STRATEGY` accept the same spellings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum AllocationStrategy {
    /// Exactly the order supplied by the caller.
    #[default]
    InputOrder,
    /// Largest unit volume first; equal volumes keep their input order.
    LargestFirst,
}

impl AllocationStrategy {
    pub fn code(&self) -> &'static str {
        match self {
            AllocationStrategy::InputOrder => "input_order",
            AllocationStrategy::LargestFirst => "largest_first",
        }
    }

    /// Parses a strategy code, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "input_order" => Some(AllocationStrategy::InputOrder),
            "largest_first" => Some(AllocationStrategy::LargestFirst),
            _ => None,
        }
    }

    /// Indices into `items` in processing order.
    fn processing_order(&self, items: &[ItemType]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..items.len()).collect();
        if matches!(self, AllocationStrategy::LargestFirst) {
            // sort_by is stable, so equal volumes stay in input order.
            order.sort_by(|&a, &b| items[b].volume().total_cmp(&items[a].volume()));
        }
        order
    }
}

impl TryFrom<String> for AllocationStrategy {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or_else(|| {
            format!("unknown strategy '{raw}', expected input_order or largest_first")
        })
    }
}

/// Configuration for the allocator and its warnings.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AllocationConfig {
    pub strategy: AllocationStrategy,
    pub thresholds: WarningThresholds,
}

impl AllocationConfig {
    /// Creates a builder for custom configuration.
    pub fn builder() -> AllocationConfigBuilder {
        AllocationConfigBuilder::default()
    }
}

/// Builder for [`AllocationConfig`].
#[derive(Clone, Debug, Default)]
pub struct AllocationConfigBuilder {
    config: AllocationConfig,
}

impl AllocationConfigBuilder {
    pub fn strategy(mut self, strategy: AllocationStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn volume_warning_percent(mut self, percent: f64) -> Self {
        self.config.thresholds.volume_percent = percent;
        self
    }

    pub fn weight_warning_percent(mut self, percent: f64) -> Self {
        self.config.thresholds.weight_percent = percent;
        self
    }

    pub fn build(self) -> AllocationConfig {
        self.config
    }
}

/// Remaining allowable cargo weight during a single allocation pass.
///
/// Drawing from a budget consumes it and yields the next one, so the value
/// cannot be shared or mutated behind the allocator's back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightBudget {
    remaining: f64,
}

impl WeightBudget {
    pub fn new(limit: f64) -> Self {
        Self {
            remaining: limit.max(0.0),
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// How many units of `unit_weight` the budget can still carry.
    ///
    /// Weightless units are never limited by weight, so `requested` is returned.
    pub fn units_affordable(&self, unit_weight: f64, requested: u64) -> u64 {
        if unit_weight <= 0.0 {
            return requested;
        }
        let mut units = (self.remaining / unit_weight).floor() as u64;
        // Rounding in the division may overshoot by one unit.
        if units > 0 && units as f64 * unit_weight > self.remaining {
            units -= 1;
        }
        units
    }

    /// Consumes the weight of `units` units and returns the remaining budget.
    pub fn draw(self, units: u64, unit_weight: f64) -> Self {
        Self {
            remaining: (self.remaining - units as f64 * unit_weight).max(0.0),
        }
    }
}

/// The limit that stopped an item type from being fitted completely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BindingConstraint {
    /// Every requested unit was fitted.
    None,
    /// No orientation fits a single unit.
    TooLarge,
    WeightLimited,
    SpaceLimited,
}

impl BindingConstraint {
    pub fn code(&self) -> &'static str {
        match self {
            BindingConstraint::None => "none",
            BindingConstraint::TooLarge => "too_large",
            BindingConstraint::WeightLimited => "weight_limited",
            BindingConstraint::SpaceLimited => "space_limited",
        }
    }

    fn classify(requested: u64, unfitted: u64, volume_max: u64, weight_max: u64) -> Self {
        if unfitted == 0 {
            BindingConstraint::None
        } else if volume_max == 0 {
            BindingConstraint::TooLarge
        } else if weight_max < requested && weight_max < volume_max {
            BindingConstraint::WeightLimited
        } else {
            BindingConstraint::SpaceLimited
        }
    }
}

impl std::fmt::Display for BindingConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingConstraint::None => write!(f, "All requested units fit"),
            BindingConstraint::TooLarge => {
                write!(f, "Item is too large for any orientation in the container")
            }
            BindingConstraint::WeightLimited => {
                write!(f, "Remaining weight capacity is exhausted")
            }
            BindingConstraint::SpaceLimited => {
                write!(f, "Could not fit in remaining space")
            }
        }
    }
}

/// Allocation outcome for one item type.
///
/// `fitted + unfitted == requested` and `fitted <= volume_max` always hold.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct AllocationResult {
    pub item_id: u64,
    pub name: String,
    pub requested: u64,
    pub fitted: u64,
    pub unfitted: u64,
    /// Units that fit by geometry alone.
    pub volume_max: u64,
    /// Units the remaining weight budget could carry.
    pub weight_max: u64,
    pub orientation: OrientationResult,
    pub volume_used: f64,
    pub weight_used: f64,
    pub constraint: BindingConstraint,
}

/// Allocates one item type against the current budget.
///
/// Returns the result together with the budget left for the next item type.
pub fn allocate_item(
    item: &ItemType,
    container: &Container,
    budget: WeightBudget,
) -> (AllocationResult, WeightBudget) {
    let orientation = find_best_orientation(item.dims, container.dims);
    let volume_max = orientation.total;
    let weight_max = budget.units_affordable(item.weight, item.quantity);

    let fitted = volume_max.min(weight_max).min(item.quantity);
    let unfitted = item.quantity - fitted;
    let constraint = BindingConstraint::classify(item.quantity, unfitted, volume_max, weight_max);

    debug!(
        item_id = item.id,
        orientation = orientation.label(),
        volume_max,
        weight_max,
        fitted,
        unfitted,
        constraint = constraint.code(),
        "allocated item type"
    );

    let result = AllocationResult {
        item_id: item.id,
        name: item.name.clone(),
        requested: item.quantity,
        fitted,
        unfitted,
        volume_max,
        weight_max,
        orientation,
        volume_used: fitted as f64 * item.volume(),
        weight_used: fitted as f64 * item.weight,
        constraint,
    };
    (result, budget.draw(fitted, item.weight))
}

/// Per-type results (in input order) and the budget left after the pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
    pub results: Vec<AllocationResult>,
    pub remaining: WeightBudget,
}

/// Runs a single forward pass over `items`.
///
/// Items are expected to be valid; [`pack`] checks them first. The
/// strategy decides processing order, results are always returned in the
/// caller's order.
pub fn allocate(
    container: &Container,
    items: &[ItemType],
    strategy: AllocationStrategy,
) -> Allocation {
    let order = strategy.processing_order(items);

    let (mut indexed, remaining) = order.into_iter().fold(
        (
            Vec::with_capacity(items.len()),
            WeightBudget::new(container.max_weight),
        ),
        |(mut acc, budget), idx| {
            let (result, next) = allocate_item(&items[idx], container, budget);
            acc.push((idx, result));
            (acc, next)
        },
    );

    indexed.sort_by_key(|(idx, _)| *idx);
    Allocation {
        results: indexed.into_iter().map(|(_, result)| result).collect(),
        remaining,
    }
}

/// Sums a per-type count without wrapping on overflow.
pub(crate) fn saturating_total(
    results: &[AllocationResult],
    count: impl Fn(&AllocationResult) -> u64,
) -> u64 {
    results
        .iter()
        .fold(0u64, |total, result| total.saturating_add(count(result)))
}

/// Capacity estimate for one container and one order.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingReport {
    pub container: Container,
    pub strategy: AllocationStrategy,
    pub total_requested: u64,
    pub total_fitted: u64,
    pub total_unfitted: u64,
    pub items: Vec<AllocationResult>,
    pub utilization: Utilization,
    pub remaining_weight: f64,
    pub warnings: Vec<String>,
}

impl PackingReport {
    /// Whether every requested unit was fitted.
    pub fn is_complete(&self) -> bool {
        self.total_unfitted == 0
    }
}

/// Estimates how many units of each item type fit into `container`.
///
/// # Errors
/// `EmptyItemList` for an empty order and `DegenerateItem` for items with
/// non-positive dimensions, negative weight or zero quantity.
///
/// # Examples
/// ```
/// use container_fit::allocator::{pack, AllocationConfig};
/// use container_fit::model::{Container, ItemType};
/// use container_fit::types::Dims;
///
/// let container = Container::new(Dims::new(589.0, 239.0, 233.0), 25_400.0).unwrap();
/// let item = ItemType::new(1, "Cube", 100, Dims::new(100.0, 100.0, 100.0), 50.0).unwrap();
///
/// let report = pack(&container, &[item], &AllocationConfig::default()).unwrap();
/// assert_eq!(report.total_fitted, 20);
/// assert_eq!(report.total_unfitted, 80);
/// ```
pub fn pack(
    container: &Container,
    items: &[ItemType],
    config: &AllocationConfig,
) -> Result<PackingReport, PackingError> {
    check_items(items)?;

    let Allocation { results, remaining } = allocate(container, items, config.strategy);
    let summary = aggregate(container, &results, &config.thresholds);

    let total_requested = saturating_total(&results, |r| r.requested);
    let total_fitted = saturating_total(&results, |r| r.fitted);
    let total_unfitted = saturating_total(&results, |r| r.unfitted);

    Ok(PackingReport {
        container: container.clone(),
        strategy: config.strategy,
        total_requested,
        total_fitted,
        total_unfitted,
        items: results,
        utilization: summary.utilization,
        remaining_weight: remaining.remaining(),
        warnings: summary.warnings,
    })
}
