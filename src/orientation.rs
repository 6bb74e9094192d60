//! Orientation search for one item type inside one container.
//!
//! An item's three dimensions can be assigned to the container's three
//! fixed axes in six ways. Each assignment is evaluated as a uniform grid
//! (`floor(W/a) * floor(H/b) * floor(D/c)`) and the assignment that yields
//! the most units wins. Mixed orientations within one item type are not
//! considered.

use serde::Serialize;
use utoipa::ToSchema;

use crate::types::Dims;

/// Assignment of item dimensions to container axes `(W, H, D)`.
///
/// The variant name lists which item dimension lies along each container
/// axis, e.g. `HDW` places the item's height along the container width,
/// its depth along the container height and its width along the container depth.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub enum Orientation {
    WHD,
    WDH,
    HWD,
    HDW,
    DWH,
    DHW,
}

impl Orientation {
    /// All six orientations in evaluation order. Ties are resolved in favour
    /// of the earlier entry, so this order is part of the output contract.
    pub const ALL: [Orientation; 6] = [
        Orientation::WHD,
        Orientation::WDH,
        Orientation::HWD,
        Orientation::HDW,
        Orientation::DWH,
        Orientation::DHW,
    ];

    /// Short label, matching the variant name.
    pub fn label(&self) -> &'static str {
        match self {
            Orientation::WHD => "WHD",
            Orientation::WDH => "WDH",
            Orientation::HWD => "HWD",
            Orientation::HDW => "HDW",
            Orientation::DWH => "DWH",
            Orientation::DHW => "DHW",
        }
    }

    /// Item extents along the container's `(W, H, D)` axes.
    pub fn apply(&self, item: Dims) -> Dims {
        let Dims {
            width: w,
            height: h,
            depth: d,
        } = item;
        match self {
            Orientation::WHD => Dims::new(w, h, d),
            Orientation::WDH => Dims::new(w, d, h),
            Orientation::HWD => Dims::new(h, w, d),
            Orientation::HDW => Dims::new(h, d, w),
            Orientation::DWH => Dims::new(d, w, h),
            Orientation::DHW => Dims::new(d, h, w),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-axis unit counts of a uniform grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AxisCounts {
    /// Units along the container width.
    pub x: u64,
    /// Units stacked along the container height.
    pub y: u64,
    /// Units along the container depth.
    pub z: u64,
}

impl AxisCounts {
    pub fn total(&self) -> u64 {
        self.x.saturating_mul(self.y).saturating_mul(self.z)
    }
}

/// Best orientation found for an item/container pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct OrientationResult {
    /// Winning orientation, `None` if the item fits in no orientation.
    pub orientation: Option<Orientation>,
    pub counts: AxisCounts,
    pub total: u64,
    /// Units in one horizontal layer (width × depth).
    pub items_per_layer: u64,
    /// Number of layers stacked along the vertical axis.
    pub layers: u64,
}

impl OrientationResult {
    /// Result for an item that exceeds the container in every orientation.
    pub const NONE: OrientationResult = OrientationResult {
        orientation: None,
        counts: AxisCounts { x: 0, y: 0, z: 0 },
        total: 0,
        items_per_layer: 0,
        layers: 0,
    };

    fn from_counts(orientation: Orientation, counts: AxisCounts) -> Self {
        Self {
            orientation: Some(orientation),
            counts,
            total: counts.total(),
            items_per_layer: counts.x.saturating_mul(counts.z),
            layers: counts.y,
        }
    }

    /// Label of the winning orientation, or `"none"`.
    pub fn label(&self) -> &'static str {
        self.orientation.map_or("none", |o| o.label())
    }

    /// Whether at least one unit fits.
    pub fn fits(&self) -> bool {
        self.total > 0
    }
}

/// Grid counts for one orientation, or `None` if a single unit overhangs any axis.
pub fn grid_counts(oriented: Dims, container: Dims) -> Option<AxisCounts> {
    if !oriented.fits_within(&container) {
        return None;
    }
    // a <= W implies W / a >= 1, so every count is at least one here.
    Some(AxisCounts {
        x: (container.width / oriented.width).floor() as u64,
        y: (container.height / oriented.height).floor() as u64,
        z: (container.depth / oriented.depth).floor() as u64,
    })
}

/// Finds the axis-aligned orientation that fits the most units of `item`
/// into `container`.
///
/// Orientations are evaluated in [`Orientation::ALL`] order and a candidate
/// only replaces the current best if its total is strictly greater, so the
/// first orientation to reach the maximum is returned.
///
/// # Examples
/// ```
/// use container_fit::orientation::{find_best_orientation, Orientation};
/// use container_fit::types::Dims;
///
/// let result = find_best_orientation(
///     Dims::new(100.0, 100.0, 100.0),
///     Dims::new(589.0, 239.0, 233.0),
/// );
/// assert_eq!(result.orientation, Some(Orientation::WHD));
/// assert_eq!(result.total, 20);
/// assert_eq!(result.items_per_layer, 10);
/// assert_eq!(result.layers, 2);
/// ```
pub fn find_best_orientation(item: Dims, container: Dims) -> OrientationResult {
    let mut best = OrientationResult::NONE;

    for orientation in Orientation::ALL {
        let Some(counts) = grid_counts(orientation.apply(item), container) else {
            continue;
        };
        if counts.total() > best.total {
            best = OrientationResult::from_counts(orientation, counts);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWENTY_FT: Dims = Dims::new(589.0, 239.0, 233.0);

    #[test]
    fn cube_in_twenty_foot_container() {
        let result = find_best_orientation(Dims::new(100.0, 100.0, 100.0), TWENTY_FT);
        assert_eq!(result.counts, AxisCounts { x: 5, y: 2, z: 2 });
        assert_eq!(result.total, 20);
        assert_eq!(result.orientation, Some(Orientation::WHD));
        assert_eq!(result.items_per_layer, 10);
        assert_eq!(result.layers, 2);
    }

    #[test]
    fn permutation_order_is_fixed() {
        let item = Dims::new(1.0, 2.0, 3.0);
        let applied: Vec<_> = Orientation::ALL
            .iter()
            .map(|o| {
                let d = o.apply(item);
                (d.width, d.height, d.depth)
            })
            .collect();
        assert_eq!(
            applied,
            vec![
                (1.0, 2.0, 3.0),
                (1.0, 3.0, 2.0),
                (2.0, 1.0, 3.0),
                (2.0, 3.0, 1.0),
                (3.0, 1.0, 2.0),
                (3.0, 2.0, 1.0),
            ]
        );
    }

    #[test]
    fn rotation_beats_nominal_orientation() {
        // A tall item only fits a flat container on its side; WDH is the
        // first orientation to reach five units.
        let flat = Dims::new(50.0, 10.0, 50.0);
        let result = find_best_orientation(Dims::new(10.0, 40.0, 10.0), flat);
        assert_eq!(result.orientation, Some(Orientation::WDH));
        assert_eq!(result.counts, AxisCounts { x: 5, y: 1, z: 1 });
        assert_eq!(result.total, 5);
    }

    #[test]
    fn first_orientation_reaching_maximum_wins_ties() {
        // A cube yields the same total in all six orientations.
        let result = find_best_orientation(Dims::new(10.0, 10.0, 10.0), TWENTY_FT);
        assert_eq!(result.orientation, Some(Orientation::WHD));

        // WHD: 2*1*1 = 2, HWD: 1*2*1 = 2 -> the earlier WHD is kept.
        let container = Dims::new(20.0, 20.0, 10.0);
        let result = find_best_orientation(Dims::new(10.0, 20.0, 10.0), container);
        assert_eq!(result.total, 2);
        assert_eq!(result.orientation, Some(Orientation::WHD));
    }

    #[test]
    fn later_orientation_wins_only_when_strictly_better() {
        // WHD: floor(30/20)*floor(10/10)*floor(10/5) = 1*1*2 = 2.
        // WDH: 5 along H, 10 along D: floor(30/20)*floor(10/5)*floor(10/10) = 2.
        // HWD: 10 along W, 20 along H -> 20 > 10, no fit.
        // HDW: 10 along W, 5 along H, 20 along D -> 20 > 10, no fit.
        // DWH: 5 along W, 20 along H -> no fit.
        // DHW: 5 along W, 10 along H, 20 along D -> no fit.
        let container = Dims::new(30.0, 10.0, 10.0);
        let result = find_best_orientation(Dims::new(20.0, 10.0, 5.0), container);
        assert_eq!(result.total, 2);
        assert_eq!(result.orientation, Some(Orientation::WHD));

        // WHD fails (height 12 > 10) and WDH fits 6*2*1 = 12.
        let container = Dims::new(30.0, 10.0, 12.0);
        let result = find_best_orientation(Dims::new(5.0, 12.0, 5.0), container);
        assert_eq!(result.orientation, Some(Orientation::WDH));
        assert_eq!(result.counts, AxisCounts { x: 6, y: 2, z: 1 });
        assert_eq!(result.total, 12);
    }

    #[test]
    fn oversized_item_fits_nowhere() {
        let result = find_best_orientation(Dims::new(300.0, 300.0, 600.0), TWENTY_FT);
        assert_eq!(result, OrientationResult::NONE);
        assert_eq!(result.label(), "none");
        assert!(!result.fits());
    }

    #[test]
    fn total_is_zero_iff_no_permutation_fits() {
        let container = Dims::new(50.0, 30.0, 20.0);
        let items = [
            Dims::new(10.0, 10.0, 10.0),
            Dims::new(50.0, 30.0, 20.0),
            Dims::new(20.0, 50.0, 30.0),
            Dims::new(51.0, 1.0, 1.0),
            Dims::new(31.0, 31.0, 1.0),
            Dims::new(25.0, 25.0, 25.0),
            Dims::new(0.5, 49.9, 19.9),
        ];
        for item in items {
            let any_fits = Orientation::ALL
                .iter()
                .any(|o| o.apply(item).fits_within(&container));
            let result = find_best_orientation(item, container);
            assert_eq!(result.total == 0, !any_fits, "item {item}");
            assert_eq!(result.orientation.is_none(), !any_fits, "item {item}");
        }
    }

    #[test]
    fn exact_fit_counts_one_unit() {
        let result = find_best_orientation(TWENTY_FT, TWENTY_FT);
        assert_eq!(result.total, 1);
        assert_eq!(result.items_per_layer, 1);
        assert_eq!(result.layers, 1);
    }

    #[test]
    fn grid_counts_rejects_overhang() {
        assert_eq!(
            grid_counts(Dims::new(10.0, 10.0, 10.0), Dims::new(25.0, 9.0, 30.0)),
            None
        );
        assert_eq!(
            grid_counts(Dims::new(10.0, 10.0, 10.0), Dims::new(25.0, 10.0, 30.0)),
            Some(AxisCounts { x: 2, y: 1, z: 3 })
        );
    }
}
