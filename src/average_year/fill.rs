//! Neighbour interpolation for empty hour-of-year slots.

/// Fill each null slot with the mean of the nearest non-null value before
/// and after it. With only one neighbour that value is used alone; with none
/// the slot stays null. The sequence is not treated as circular.
pub fn fill_gaps(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let forward: Vec<Option<f64>> = values
        .iter()
        .scan(None, |last, value| {
            if value.is_some() {
                *last = *value;
            }
            Some(*last)
        })
        .collect();

    let mut backward: Vec<Option<f64>> = values
        .iter()
        .rev()
        .scan(None, |next, value| {
            if value.is_some() {
                *next = *value;
            }
            Some(*next)
        })
        .collect();
    backward.reverse();

    values
        .iter()
        .zip(forward)
        .zip(backward)
        .map(|((value, before), after)| match (*value, before, after) {
            (Some(v), _, _) => Some(v),
            (None, Some(before), Some(after)) => Some((before + after) / 2.0),
            (None, Some(only), None) | (None, None, Some(only)) => Some(only),
            (None, None, None) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_between_neighbours_takes_their_mean() {
        let filled = fill_gaps(&[Some(0.4), None, Some(0.6)]);
        assert_eq!(filled[0], Some(0.4));
        assert!((filled[1].unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(filled[2], Some(0.6));
    }

    #[test]
    fn test_long_gap_uses_nearest_on_each_side() {
        let filled = fill_gaps(&[Some(1.0), None, None, None, Some(3.0)]);
        assert_eq!(filled, vec![Some(1.0), Some(2.0), Some(2.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_edges_do_not_wrap_around() {
        let filled = fill_gaps(&[None, Some(5.0), None, Some(9.0), None]);
        assert_eq!(
            filled,
            vec![Some(5.0), Some(5.0), Some(7.0), Some(9.0), Some(9.0)]
        );
    }

    #[test]
    fn test_all_null_stays_null() {
        assert_eq!(fill_gaps(&[None, None]), vec![None, None]);
        assert!(fill_gaps(&[]).is_empty());
    }
}
