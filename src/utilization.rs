//! Container-wide utilization figures and threshold warnings.

use serde::Serialize;
use utoipa::ToSchema;

use crate::allocator::{AllocationResult, saturating_total};
use crate::model::Container;
use crate::types::{CM3_PER_M3, Dimensional};

/// Utilization percentages above which an informational warning is emitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarningThresholds {
    pub volume_percent: f64,
    pub weight_percent: f64,
}

impl WarningThresholds {
    pub const DEFAULT_PERCENT: f64 = 95.0;
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            volume_percent: Self::DEFAULT_PERCENT,
            weight_percent: Self::DEFAULT_PERCENT,
        }
    }
}

/// Volume and weight actually used by the fitted units.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Utilization {
    pub volume_percent: f64,
    pub weight_percent: f64,
    pub container_volume: f64,
    pub used_volume: f64,
    pub container_cbm: f64,
    pub used_cbm: f64,
    pub container_weight: f64,
    pub used_weight: f64,
}

/// Output of [`aggregate`].
#[derive(Clone, Debug, PartialEq)]
pub struct UtilizationSummary {
    pub utilization: Utilization,
    pub warnings: Vec<String>,
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

/// Folds per-type allocation results into container-wide utilization.
///
/// Warnings are informational; exceeding a threshold is never an error.
pub fn aggregate(
    container: &Container,
    results: &[AllocationResult],
    thresholds: &WarningThresholds,
) -> UtilizationSummary {
    let used_volume: f64 = results.iter().map(|r| r.volume_used).sum();
    let used_weight: f64 = results.iter().map(|r| r.weight_used).sum();
    let unfitted = saturating_total(results, |r| r.unfitted);

    let container_volume = container.volume();
    let utilization = Utilization {
        volume_percent: percent_of(used_volume, container_volume),
        weight_percent: percent_of(used_weight, container.max_weight),
        container_volume,
        used_volume,
        container_cbm: container_volume / CM3_PER_M3,
        used_cbm: used_volume / CM3_PER_M3,
        container_weight: container.max_weight,
        used_weight,
    };

    let mut warnings = Vec::new();
    if unfitted > 0 {
        warnings.push(format!("{unfitted} items could not fit in the container"));
    }
    if utilization.weight_percent > thresholds.weight_percent {
        warnings.push("Container is near weight capacity limit".to_string());
    }
    if utilization.volume_percent > thresholds.volume_percent {
        warnings.push("Container is near volume capacity limit".to_string());
    }

    UtilizationSummary {
        utilization,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::BindingConstraint;
    use crate::orientation::OrientationResult;
    use crate::types::Dims;

    fn container() -> Container {
        Container::new(Dims::new(100.0, 100.0, 100.0), 1_000.0).unwrap()
    }

    fn result(fitted: u64, unfitted: u64, unit_volume: f64, unit_weight: f64) -> AllocationResult {
        AllocationResult {
            item_id: 1,
            name: "Box".to_string(),
            requested: fitted + unfitted,
            fitted,
            unfitted,
            volume_max: fitted,
            weight_max: fitted,
            orientation: OrientationResult::NONE,
            volume_used: fitted as f64 * unit_volume,
            weight_used: fitted as f64 * unit_weight,
            constraint: if unfitted == 0 {
                BindingConstraint::None
            } else {
                BindingConstraint::SpaceLimited
            },
        }
    }

    #[test]
    fn sums_volume_and_weight_across_types() {
        let summary = aggregate(
            &container(),
            &[result(100, 0, 1_000.0, 2.0), result(50, 0, 2_000.0, 4.0)],
            &WarningThresholds::default(),
        );
        let u = &summary.utilization;
        assert_eq!(u.used_volume, 200_000.0);
        assert_eq!(u.container_volume, 1_000_000.0);
        assert!((u.volume_percent - 20.0).abs() < 1e-9);
        assert_eq!(u.used_weight, 400.0);
        assert!((u.weight_percent - 40.0).abs() < 1e-9);
        assert!((u.container_cbm - 1.0).abs() < 1e-12);
        assert!((u.used_cbm - 0.2).abs() < 1e-12);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn warns_about_unfitted_units_with_total_count() {
        let summary = aggregate(
            &container(),
            &[result(1, 3, 10.0, 1.0), result(2, 4, 10.0, 1.0)],
            &WarningThresholds::default(),
        );
        assert_eq!(
            summary.warnings,
            vec!["7 items could not fit in the container".to_string()]
        );
    }

    #[test]
    fn unfitted_count_saturates() {
        let summary = aggregate(
            &container(),
            &[result(0, u64::MAX, 10.0, 1.0), result(0, 5, 10.0, 1.0)],
            &WarningThresholds::default(),
        );
        assert_eq!(
            summary.warnings,
            vec![format!("{} items could not fit in the container", u64::MAX)]
        );
    }

    #[test]
    fn warns_above_thresholds_only() {
        // 960 kg of 1000 kg and 96 % of the volume.
        let summary = aggregate(
            &container(),
            &[result(96, 0, 10_000.0, 10.0)],
            &WarningThresholds::default(),
        );
        assert_eq!(
            summary.warnings,
            vec![
                "Container is near weight capacity limit".to_string(),
                "Container is near volume capacity limit".to_string(),
            ]
        );

        // Exactly 95 % is not above the threshold.
        let summary = aggregate(
            &container(),
            &[result(95, 0, 10_000.0, 10.0)],
            &WarningThresholds::default(),
        );
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let thresholds = WarningThresholds {
            volume_percent: 50.0,
            weight_percent: 100.0,
        };
        let summary = aggregate(&container(), &[result(60, 0, 10_000.0, 10.0)], &thresholds);
        assert_eq!(
            summary.warnings,
            vec!["Container is near volume capacity limit".to_string()]
        );
    }
}
