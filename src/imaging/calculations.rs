//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Geometry of one cover-fit: the intermediate resample size and the crop
/// window taken out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverPlan {
    /// Size the source is resampled to before cropping.
    pub resized: (u32, u32),
    /// Top-left corner of the crop window inside `resized`.
    pub offset: (u32, u32),
    /// Final output size. Always equal to the requested target.
    pub target: (u32, u32),
}

/// Plan a cover-fit of `source` into `target`.
///
/// The scale is the smallest one that covers the target on both axes:
///
/// ```text
/// scale = max(tw / sw, th / sh)
/// new_w = max(1, ceil(sw * scale))
/// new_h = max(1, ceil(sh * scale))
/// ```
///
/// Rounding up keeps the resampled size at or above the target even when the
/// float product lands a hair under it. The crop window is centred, with the
/// odd pixel of an uneven margin going to the right/bottom.
///
/// # Examples
/// ```
/// # use cover_crop::imaging::plan_cover;
/// let plan = plan_cover((4000, 2000), (600, 350));
/// assert_eq!(plan.resized, (700, 350));
/// assert_eq!(plan.offset, (50, 0));
/// ```
pub fn plan_cover(source: (u32, u32), target: (u32, u32)) -> CoverPlan {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let (tgt_w, tgt_h) = target;

    let scale = f64::max(
        tgt_w as f64 / src_w as f64,
        tgt_h as f64 / src_h as f64,
    );

    // The max(target) guard only matters for pathological float input; the
    // ceil already covers every real case.
    let new_w = ((src_w as f64 * scale).ceil() as u32).max(1).max(tgt_w);
    let new_h = ((src_h as f64 * scale).ceil() as u32).max(1).max(tgt_h);

    CoverPlan {
        resized: (new_w, new_h),
        offset: ((new_w - tgt_w) / 2, (new_h - tgt_h) / 2),
        target,
    }
}

/// Apply a scale multiplier to one base dimension.
///
/// Rounds half away from zero (`2.5 → 3`) and never returns less than 1.
pub fn scale_dimension(base: u32, scale: f64) -> u32 {
    let scaled = (base as f64 * scale).round();
    if scaled < 1.0 {
        1
    } else if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        scaled as u32
    }
}
