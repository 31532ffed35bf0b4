//! `srcset` candidate selection
//!
//! A `srcset` list is collapsed to the single candidate with the highest
//! weight. Width descriptors (`400w`) weigh their pixel count; density
//! descriptors (`2x`) weigh their integer part times 1000, so a `2x` image
//! beats a `1200w` one. A candidate without descriptor counts as `1x`.

/// Multiplier that puts density descriptors on the width scale
const DENSITY_WEIGHT: i64 = 1000;

/// One entry of a `srcset` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetCandidate {
    pub url: String,
    pub weight: i64,
}

/// Computes the weight of a descriptor
///
/// # Returns
///
/// * `Some(weight)` - The descriptor was understood, or is of an unknown
///   kind (weight 0)
/// * `None` - A `w` or `x` descriptor whose number does not parse; the
///   candidate must be ignored
///
/// # Examples
///
/// ```
/// use offline_mirror::rewrite::srcset::descriptor_weight;
///
/// assert_eq!(descriptor_weight("400w"), Some(400));
/// assert_eq!(descriptor_weight("2x"), Some(2000));
/// assert_eq!(descriptor_weight("1.5x"), Some(1000));
/// assert_eq!(descriptor_weight("bigw"), None);
/// ```
pub fn descriptor_weight(descriptor: &str) -> Option<i64> {
    if let Some(width) = descriptor.strip_suffix('w') {
        return width.parse::<i64>().ok();
    }

    if let Some(density) = descriptor.strip_suffix('x') {
        let density = density.parse::<f64>().ok().filter(|d| d.is_finite())?;
        return Some((density.trunc() as i64).saturating_mul(DENSITY_WEIGHT));
    }

    Some(0)
}

/// Parses a `srcset` attribute into weighted candidates
///
/// Candidates whose descriptor cannot be parsed are dropped.
pub fn parse_candidates(srcset: &str) -> Vec<SrcsetCandidate> {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let weight = descriptor_weight(parts.next().unwrap_or("1x"))?;
            Some(SrcsetCandidate {
                url: url.to_string(),
                weight,
            })
        })
        .collect()
}

/// Picks the candidate with the strictly largest weight; the first wins ties
///
/// # Examples
///
/// ```
/// use offline_mirror::rewrite::srcset::select_best;
///
/// assert_eq!(select_best("x1.jpg 1x, x2.jpg 2x, x3.jpg 400w").as_deref(), Some("x2.jpg"));
/// ```
pub fn select_best(srcset: &str) -> Option<String> {
    let mut best: Option<SrcsetCandidate> = None;
    for candidate in parse_candidates(srcset) {
        if best.as_ref().map_or(true, |b| candidate.weight > b.weight) {
            best = Some(candidate);
        }
    }
    best.map(|c| c.url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_beats_width() {
        assert_eq!(
            select_best("x1.jpg 1x, x2.jpg 2x, x3.jpg 400w").as_deref(),
            Some("x2.jpg")
        );
    }

    #[test]
    fn test_largest_width_wins() {
        assert_eq!(
            select_best("s.jpg 320w, m.jpg 800w, l.jpg 1600w").as_deref(),
            Some("l.jpg")
        );
    }

    #[test]
    fn test_first_wins_ties() {
        assert_eq!(select_best("a.jpg 2x, b.jpg 2000w").as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_missing_descriptor_is_one_x() {
        assert_eq!(select_best("a.jpg, b.jpg 999w").as_deref(), Some("a.jpg"));
        assert_eq!(select_best("a.jpg, b.jpg 1001w").as_deref(), Some("b.jpg"));
    }

    #[test]
    fn test_fractional_density_truncates() {
        assert_eq!(descriptor_weight("2.9x"), Some(2000));
        assert_eq!(descriptor_weight("0.5x"), Some(0));
    }

    #[test]
    fn test_unparsable_candidates_are_ignored() {
        assert_eq!(select_best("bad.jpg abcw, good.jpg 10w").as_deref(), Some("good.jpg"));
        assert_eq!(descriptor_weight("NaNx"), None);
    }

    #[test]
    fn test_unknown_descriptor_weighs_zero() {
        assert_eq!(descriptor_weight("100h"), Some(0));
        assert_eq!(select_best("a.jpg 100h").as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_empty_srcset() {
        assert_eq!(select_best(""), None);
        assert_eq!(select_best(" , ,"), None);
        assert!(parse_candidates(" , ").is_empty());
    }

    #[test]
    fn test_parse_candidates_keeps_order() {
        let candidates = parse_candidates(" a.png 1x ,b.png 300w");
        assert_eq!(
            candidates,
            vec![
                SrcsetCandidate {
                    url: "a.png".to_string(),
                    weight: 1000
                },
                SrcsetCandidate {
                    url: "b.png".to_string(),
                    weight: 300
                },
            ]
        );
    }
}
