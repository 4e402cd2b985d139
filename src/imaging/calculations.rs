//! Pure variant-planning math.
//!
//! All functions here are pure and testable without I/O or pixels.

use crate::types::{Breakpoint, Dimensions};

/// One planned resize target for a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedVariant {
    pub breakpoint: Breakpoint,
    pub width: u32,
    pub height: u32,
}

/// Aspect-preserving height for a target width.
pub fn scaled_height(original: Dimensions, target_width: u32) -> u32 {
    (original.height as f64 * target_width as f64 / original.width as f64).round() as u32
}

/// Plan the breakpoint matrix for one source image.
///
/// A ladder breakpoint is emitted only when its target width is strictly
/// smaller than the source width (no upscaling, and a target equal to the
/// source would duplicate `original`). The `original` breakpoint is always
/// emitted last at exact source dimensions, so every image yields at least
/// one variant and the returned widths are strictly increasing.
///
/// `ladder` must be ascending (validated at config load).
pub fn plan_variants(original: Dimensions, ladder: &[(Breakpoint, u32)]) -> Vec<PlannedVariant> {
    let mut planned: Vec<PlannedVariant> = ladder
        .iter()
        .filter(|&&(_, target)| target < original.width)
        .map(|&(breakpoint, target)| PlannedVariant {
            breakpoint,
            width: target,
            height: scaled_height(original, target),
        })
        .collect();

    planned.push(PlannedVariant {
        breakpoint: Breakpoint::Original,
        width: original.width,
        height: original.height,
    });

    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Breakpoint::*;

    const LADDER: [(Breakpoint, u32); 4] =
        [(Mobile, 480), (Tablet, 768), (Desktop, 1200), (Xl, 1920)];

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn scaled_height_rounds() {
        // 1920x900 at 480 wide: 900 * 480/1920 = 225
        assert_eq!(scaled_height(dims(1920, 900), 480), 225);
        // 1920x900 at 768 wide: 900 * 768/1920 = 360
        assert_eq!(scaled_height(dims(1920, 900), 768), 360);
        // 1920x900 at 1200 wide: 900 * 1200/1920 = 562.5 → 563
        assert_eq!(scaled_height(dims(1920, 900), 1200), 563);
    }

    #[test]
    fn plan_skips_target_equal_to_source_width() {
        // 1920 target == source width, so xl is not emitted and original
        // closes the matrix: mobile, tablet, desktop, original.
        let planned = plan_variants(dims(1920, 900), &LADDER);
        let breakpoints: Vec<Breakpoint> = planned.iter().map(|p| p.breakpoint).collect();
        assert_eq!(breakpoints, vec![Mobile, Tablet, Desktop, Original]);
        assert_eq!(planned[0].height, 225);
        assert_eq!(planned[1].height, 360);
        assert_eq!(planned[2].height, 563);
        assert_eq!((planned[3].width, planned[3].height), (1920, 900));
    }

    #[test]
    fn plan_full_ladder_for_large_source() {
        let planned = plan_variants(dims(4000, 3000), &LADDER);
        assert_eq!(planned.len(), 5);
        assert_eq!(planned[3].breakpoint, Xl);
        assert_eq!(planned[3].width, 1920);
        assert_eq!(planned[3].height, 1440);
        assert_eq!(planned[4].breakpoint, Original);
        assert_eq!(planned[4].width, 4000);
    }

    #[test]
    fn plan_small_source_emits_only_original() {
        let planned = plan_variants(dims(400, 300), &LADDER);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].breakpoint, Original);
        assert_eq!((planned[0].width, planned[0].height), (400, 300));
    }

    #[test]
    fn plan_widths_strictly_increasing() {
        for source in [dims(500, 400), dims(1000, 600), dims(1920, 900), dims(5000, 2000)] {
            let planned = plan_variants(source, &LADDER);
            assert!(
                planned.windows(2).all(|w| w[0].width < w[1].width),
                "widths not strictly increasing for {source:?}: {planned:?}"
            );
        }
    }

    #[test]
    fn plan_never_upscales() {
        for width in [100, 480, 481, 768, 1200, 1920, 1921, 8000] {
            let planned = plan_variants(dims(width, width / 2), &LADDER);
            assert!(planned.iter().all(|p| p.width <= width));
        }
    }

    #[test]
    fn plan_portrait_source_uses_width_not_longer_edge() {
        // 600x1200 portrait: only mobile (480) is below the 600px width,
        // even though the longer edge is 1200.
        let planned = plan_variants(dims(600, 1200), &LADDER);
        let breakpoints: Vec<Breakpoint> = planned.iter().map(|p| p.breakpoint).collect();
        assert_eq!(breakpoints, vec![Mobile, Original]);
        assert_eq!(planned[0].height, 960);
    }
}
