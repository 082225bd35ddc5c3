use hashmatch_cascade::QueryNeighbors;

/// Lowe's distance ratio test on squared distances: the nearest neighbor is
/// kept only if `d1 < ratio^2 * d2`. Equality is rejected.
#[inline]
pub fn passes_ratio_test(d1: f32, d2: f32, ratio: f32) -> bool {
    d1 < ratio * ratio * d2
}

/// `(query, base)` index of every query whose nearest neighbor passes the
/// ratio test against its second nearest. Queries with fewer than two
/// neighbors are rejected.
pub fn ratio_test_filter(found: &[QueryNeighbors], ratio: f32) -> Vec<(usize, usize)> {
    found
        .iter()
        .filter_map(|qn| match qn.neighbors.as_slice() {
            [first, second, ..] if passes_ratio_test(first.distance, second.distance, ratio) => {
                Some((qn.query, first.index))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashmatch_cascade::Neighbor;

    #[test]
    fn test_ratio_boundary() {
        assert!(passes_ratio_test(1.0, 4.0, 0.8));
        assert!(!passes_ratio_test(3.0, 3.2, 0.8));
        // 0.5^2 * 4 == 1
        assert!(!passes_ratio_test(1.0, 4.0, 0.5));
        assert!(!passes_ratio_test(0.0, 0.0, 0.8));
    }

    #[test]
    fn test_filter() {
        let found = vec![
            QueryNeighbors::new(0, [Neighbor::new(0, 1.0), Neighbor::new(1, 4.0)]),
            QueryNeighbors::new(1, [Neighbor::new(2, 3.0), Neighbor::new(0, 3.2)]),
            QueryNeighbors::new(2, [Neighbor::new(4, 0.0)]),
            QueryNeighbors::new(5, [Neighbor::new(3, 0.0), Neighbor::new(1, 10.0)]),
        ];
        assert_eq!(ratio_test_filter(&found, 0.8), vec![(0, 0), (5, 3)]);
    }
}
