//! Evidence reduction.
//!
//! Turns incoming statistics grids into the scalars the control loop runs
//! on: a weighted (phase, confidence) pair from the sensor's PDAF grid, a
//! weighted contrast value from the ISP focus grid, and a green-channel
//! scene mean from the AWB grid used for scene-change detection.

use shared::regions::{AwbRegion, FocusRegion, PdafData, RegionGrid};

use crate::weights::RegionWeights;

/// Reduce a PDAF grid to a single (phase, confidence) estimate.
///
/// Regions below `conf_thresh` are ignored. Accepted confidences are
/// clipped to `conf_clip` and offset down by a quarter of the threshold
/// before weighting the confidence sum, then by another quarter before
/// weighting the phase sum. Phase therefore carries a linear confidence
/// weight while the reported confidence is quadratically suppressed near
/// the threshold, which keeps barely-confident regions from polluting the
/// phase without hiding that they contributed.
///
/// Returns `None` unless the accepted confidence mass reaches the weight
/// sum, i.e. unless the grid would average at least one confidence unit
/// per unit of window weight.
pub fn reduce_phase(
    regions: &RegionGrid<PdafData>,
    weights: &RegionWeights,
    conf_thresh: u32,
    conf_clip: u32,
) -> Option<(f64, f64)> {
    let mut sum_wc: u32 = 0;
    let mut sum_wcp: i64 = 0;

    for (data, &w) in regions.iter().zip(weights.w.iter()) {
        if w == 0 {
            continue;
        }
        let conf = u32::from(data.conf);
        if conf < conf_thresh {
            continue;
        }
        let mut c = conf.min(conf_clip);
        c -= conf_thresh / 4;
        sum_wc += w * c;
        c -= conf_thresh / 4;
        sum_wcp += i64::from(w * c) * i64::from(data.phase);
    }

    if 0 < weights.sum && weights.sum <= sum_wc {
        Some((
            sum_wcp as f64 / f64::from(sum_wc),
            f64::from(sum_wc) / f64::from(weights.sum),
        ))
    } else {
        None
    }
}

/// Reduce a focus grid to its weighted average contrast.
pub fn reduce_contrast(regions: &RegionGrid<FocusRegion>, weights: &RegionWeights) -> f64 {
    if weights.sum == 0 {
        return 0.0;
    }
    let sum_wc: u64 = regions
        .iter()
        .zip(weights.w.iter())
        .map(|(region, &w)| u64::from(w) * u64::from(region.val))
        .sum();
    sum_wc as f64 / f64::from(weights.sum)
}

/// Reduce an AWB grid to the mean green level of usable zones.
///
/// A zone is usable when at least `min_pixels` pixels were counted and its
/// mean green level reaches `min_g`. Returns `None` when no zone qualifies,
/// meaning no scene-change evidence is available this frame.
pub fn reduce_scene_mean(
    regions: &RegionGrid<AwbRegion>,
    min_pixels: u32,
    min_g: f64,
) -> Option<f64> {
    let mut sum = 0.0;
    let mut zones = 0usize;
    for region in regions.iter() {
        if region.counted >= min_pixels {
            let zone = region.g_sum as f64 / f64::from(region.counted);
            if zone >= min_g {
                sum += zone;
                zones += 1;
            }
        }
    }
    (zones > 0).then(|| sum / zones as f64)
}
