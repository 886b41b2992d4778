//! Matching utilities for multi-object tracking.
//!
//! The solvers work on a plain cost matrix (rows are tracks, columns are
//! detections) and know nothing about either type.

use ndarray::Array2;
use tracing::warn;

use crate::error::TrackerError;
use crate::tracker::rect::Rect;

/// Padding cost for the dummy rows/columns that square up the matrix.
const PAD_COST: f64 = 1e6;

/// Compute IoU distance matrix between tracks and detections.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_boxes.len(), det_boxes.len()));
    for (i, t) in track_boxes.iter().enumerate() {
        for (j, d) in det_boxes.iter().enumerate() {
            dists[[i, j]] = 1.0 - t.iou(d);
        }
    }
    dists
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// `(row, col)` pairs, ascending by row.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn unmatched(num_rows: usize, num_cols: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        }
    }

    fn from_pairs(pairs: Vec<(usize, usize)>, num_rows: usize, num_cols: usize) -> Self {
        let mut row_matched = vec![false; num_rows];
        let mut col_matched = vec![false; num_cols];
        for &(r, c) in &pairs {
            row_matched[r] = true;
            col_matched[c] = true;
        }

        let mut matches = pairs;
        matches.sort_unstable();

        Self {
            matches,
            unmatched_tracks: unmatched_indices(&row_matched),
            unmatched_detections: unmatched_indices(&col_matched),
        }
    }

    pub fn total_cost(&self, cost_matrix: &Array2<f32>) -> f32 {
        self.matches.iter().map(|&(r, c)| cost_matrix[[r, c]]).sum()
    }
}

fn unmatched_indices(matched: &[bool]) -> Vec<usize> {
    matched
        .iter()
        .enumerate()
        .filter_map(|(i, &m)| if m { None } else { Some(i) })
        .collect()
}

/// Minimum-cost one-to-one assignment, keeping only pairs with cost `<= thresh`.
///
/// Pairs above `thresh` are dropped after solving, so they never steal a row or
/// column from a cheaper pair.
pub fn linear_assignment(
    cost_matrix: &Array2<f32>,
    thresh: f32,
) -> Result<AssignmentResult, TrackerError> {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return Ok(AssignmentResult::unmatched(num_rows, num_cols));
    }

    if let Some(bad) = cost_matrix.iter().find(|c| !c.is_finite()) {
        return Err(TrackerError::AssignmentFailure(format!(
            "non-finite cost {bad} in {num_rows}x{num_cols} matrix"
        )));
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), PAD_COST);

    for i in 0..num_rows {
        for j in 0..num_cols {
            padded[[i, j]] = cost_matrix[[i, j]] as f64;
        }
    }

    let (row_to_col, _) = lapjv::lapjv(&padded)
        .map_err(|e| TrackerError::AssignmentFailure(format!("{e:?}")))?;

    let pairs = row_to_col
        .iter()
        .enumerate()
        .filter(|&(row, &col)| {
            row < num_rows && col < num_cols && cost_matrix[[row, col]] <= thresh
        })
        .map(|(row, &col)| (row, col))
        .collect();

    Ok(AssignmentResult::from_pairs(pairs, num_rows, num_cols))
}

/// Greedy lowest-cost-first assignment.
///
/// Deterministic but not globally optimal: a cheap pair taken early can force
/// a worse total than [`linear_assignment`] finds. Ties break by row, then
/// column. Non-finite costs never match.
pub fn greedy_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    let mut candidates: Vec<(f32, usize, usize)> = cost_matrix
        .indexed_iter()
        .filter(|&(_, &c)| c.is_finite() && c <= thresh)
        .map(|((r, c), &cost)| (cost, r, c))
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut row_used = vec![false; num_rows];
    let mut col_used = vec![false; num_cols];
    let mut pairs = Vec::new();
    for (_, r, c) in candidates {
        if !row_used[r] && !col_used[c] {
            row_used[r] = true;
            col_used[c] = true;
            pairs.push((r, c));
        }
    }

    AssignmentResult::from_pairs(pairs, num_rows, num_cols)
}

/// Optimal assignment with a greedy fallback for frames where it fails.
///
/// The returned error, if any, describes why this frame ran in degraded mode.
pub fn associate(
    cost_matrix: &Array2<f32>,
    thresh: f32,
) -> (AssignmentResult, Option<TrackerError>) {
    match linear_assignment(cost_matrix, thresh) {
        Ok(result) => (result, None),
        Err(err) => {
            warn!(error = %err, "optimal assignment failed, using greedy matching for this frame");
            (greedy_assignment(cost_matrix, thresh), Some(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_empty_inputs() {
        let empty = Array2::<f32>::zeros((0, 0));
        let result = linear_assignment(&empty, 0.7).unwrap();
        assert_eq!(result, AssignmentResult::default());

        let no_tracks = Array2::<f32>::zeros((0, 3));
        let result = linear_assignment(&no_tracks, 0.7).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_detections, vec![0, 1, 2]);

        let no_dets = Array2::<f32>::zeros((2, 0));
        let result = linear_assignment(&no_dets, 0.7).unwrap();
        assert_eq!(result.unmatched_tracks, vec![0, 1]);
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_finds_global_optimum_where_greedy_does_not() {
        let cost = array![[0.1_f32, 0.2], [0.15, 0.9]];

        let optimal = linear_assignment(&cost, 1.0).unwrap();
        assert_eq!(optimal.matches, vec![(0, 1), (1, 0)]);
        assert!((optimal.total_cost(&cost) - 0.35).abs() < 1e-6);

        let greedy = greedy_assignment(&cost, 1.0);
        assert_eq!(greedy.matches, vec![(0, 0), (1, 1)]);
        assert!(greedy.total_cost(&cost) > optimal.total_cost(&cost));
    }

    #[test]
    fn test_three_by_three_known_optimum() {
        let cost = array![[0.4_f32, 0.1, 0.3], [0.2, 0.0, 0.5], [0.3, 0.2, 0.2]];
        let result = linear_assignment(&cost, 1.0).unwrap();
        assert_eq!(result.matches, vec![(0, 1), (1, 0), (2, 2)]);
        assert!((result.total_cost(&cost) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_rejects_optimal_pair() {
        let cost = array![[0.2_f32, 1.0], [1.0, 0.9]];
        let result = linear_assignment(&cost, 0.7).unwrap();
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_tracks, vec![1]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_rectangular_matrices() {
        let wide = array![[0.9_f32, 0.1, 0.5]];
        let result = linear_assignment(&wide, 0.7).unwrap();
        assert_eq!(result.matches, vec![(0, 1)]);
        assert_eq!(result.unmatched_detections, vec![0, 2]);

        let tall = array![[0.9_f32], [0.1], [0.5]];
        let result = linear_assignment(&tall, 0.7).unwrap();
        assert_eq!(result.matches, vec![(1, 0)]);
        assert_eq!(result.unmatched_tracks, vec![0, 2]);
    }

    #[test]
    fn test_non_finite_cost_falls_back_to_greedy() {
        let cost = array![[f32::NAN, 0.1], [0.2, 0.9]];
        assert!(matches!(
            linear_assignment(&cost, 0.7),
            Err(TrackerError::AssignmentFailure(_))
        ));

        let (result, err) = associate(&cost, 0.7);
        assert!(err.is_some());
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_iou_distance() {
        let tracks = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let dets = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 50.0, 10.0, 10.0)];
        let dists = iou_distance(&tracks, &dets);
        assert_eq!(dists.dim(), (1, 2));
        assert!(dists[[0, 0]].abs() < 1e-6);
        assert_eq!(dists[[0, 1]], 1.0);
    }
}
