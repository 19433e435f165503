use crate::utils::bbox::Position;
use pathfinding::kuhn_munkres::kuhn_munkres;
use pathfinding::matrix::Matrix;

const F64_I64_MULT: f64 = 1_000_000.0;

/// Euclidean distances between every `rows` position and every `columns` position
///
/// `None` when either side is empty, a matrix without rows or columns is not representable.
///
pub fn euclidean_cost_matrix(rows: &[Position], columns: &[Position]) -> Option<Matrix<f64>> {
    if rows.is_empty() || columns.is_empty() {
        return None;
    }

    let mut costs = Matrix::new(rows.len(), columns.len(), 0.0);
    for (i, r) in rows.iter().enumerate() {
        for (j, c) in columns.iter().enumerate() {
            costs[(i, j)] = r.distance(c);
        }
    }
    Some(costs)
}

/// Minimum total cost one-to-one assignment
///
/// Returns `min(rows, columns)` pairs `(row, column)` sorted by row. The costs are
/// converted to fixed point integers before solving, so differences below `1e-6`
/// are not distinguished.
///
pub fn linear_sum_assignment(costs: &Matrix<f64>) -> Vec<(usize, usize)> {
    if costs.rows == 0 || costs.columns == 0 {
        return Vec::default();
    }

    // Kuhn-Munkres requires rows <= columns
    let transposed = costs.rows > costs.columns;
    let (rows, columns) = if transposed {
        (costs.columns, costs.rows)
    } else {
        (costs.rows, costs.columns)
    };

    let mut weights = Matrix::new(rows, columns, 0i64);
    for i in 0..rows {
        for j in 0..columns {
            let cost = if transposed {
                costs[(j, i)]
            } else {
                costs[(i, j)]
            };
            weights[(i, j)] = -(cost * F64_I64_MULT).round() as i64;
        }
    }

    let (_, solution) = kuhn_munkres(&weights);

    let mut pairs = solution
        .into_iter()
        .enumerate()
        .map(|(i, j)| if transposed { (j, i) } else { (i, j) })
        .collect::<Vec<_>>();
    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use crate::utils::bbox::Position;
    use crate::utils::linear_sum_assignment::{euclidean_cost_matrix, linear_sum_assignment};
    use itertools::Itertools;
    use pathfinding::matrix::Matrix;
    use rand::Rng;

    fn matrix(rows: &[&[f64]]) -> Matrix<f64> {
        let mut m = Matrix::new(rows.len(), rows[0].len(), 0.0);
        for (i, r) in rows.iter().enumerate() {
            for (j, v) in r.iter().enumerate() {
                m[(i, j)] = *v;
            }
        }
        m
    }

    fn total(costs: &Matrix<f64>, pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|p| costs[*p]).sum()
    }

    fn brute_force(costs: &Matrix<f64>) -> f64 {
        let (rows, columns) = (costs.rows, costs.columns);
        if rows <= columns {
            (0..columns)
                .permutations(rows)
                .map(|cols| (0..rows).map(|r| costs[(r, cols[r])]).sum::<f64>())
                .fold(f64::INFINITY, f64::min)
        } else {
            (0..rows)
                .permutations(columns)
                .map(|rs| (0..columns).map(|c| costs[(rs[c], c)]).sum::<f64>())
                .fold(f64::INFINITY, f64::min)
        }
    }

    #[test]
    fn square() {
        let costs = matrix(&[&[4.0, 1.0, 3.0], &[2.0, 0.0, 5.0], &[3.0, 2.0, 2.0]]);
        let pairs = linear_sum_assignment(&costs);
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
        assert_eq!(total(&costs, &pairs), 5.0);
    }

    #[test]
    fn more_rows_than_columns() {
        let costs = matrix(&[&[1.0, 2.0], &[3.0, 4.0], &[0.0, 10.0]]);
        let pairs = linear_sum_assignment(&costs);
        assert_eq!(pairs, vec![(0, 1), (2, 0)]);
    }

    #[test]
    fn more_columns_than_rows() {
        let costs = matrix(&[&[7.0, 1.0, 9.0, 0.5], &[0.1, 2.0, 3.0, 0.2]]);
        let pairs = linear_sum_assignment(&costs);
        assert_eq!(pairs, vec![(0, 3), (1, 0)]);
    }

    #[test]
    fn chain_is_not_greedy() {
        // greedy takes (0, 0) first and pays 1 + 100
        let costs = matrix(&[&[1.0, 2.0], &[2.0, 100.0]]);
        let pairs = linear_sum_assignment(&costs);
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn empty_sides() {
        let some = [Position::new(0, 0), Position::new(1, 1)];
        assert!(euclidean_cost_matrix(&some, &[]).is_none());
        assert!(euclidean_cost_matrix(&[], &some).is_none());
        assert!(euclidean_cost_matrix(&[], &[]).is_none());
    }

    #[test]
    fn euclidean() {
        let costs = euclidean_cost_matrix(
            &[Position::new(0, 0), Position::new(10, 10)],
            &[Position::new(3, 4), Position::new(10, 10), Position::new(0, 0)],
        )
        .unwrap();
        assert_eq!((costs.rows, costs.columns), (2, 3));
        assert_eq!(costs[(0, 0)], 5.0);
        assert_eq!(costs[(1, 1)], 0.0);
        assert_eq!(costs[(0, 2)], 0.0);
    }

    #[test]
    fn optimal_against_brute_force() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let rows = rng.gen_range(1..6);
            let columns = rng.gen_range(1..6);
            let mut costs = Matrix::new(rows, columns, 0.0);
            for i in 0..rows {
                for j in 0..columns {
                    costs[(i, j)] = rng.gen_range(0.0..500.0);
                }
            }
            let pairs = linear_sum_assignment(&costs);
            assert_eq!(pairs.len(), rows.min(columns));
            assert!(pairs.iter().map(|p| p.0).all_unique());
            assert!(pairs.iter().map(|p| p.1).all_unique());
            assert!((total(&costs, &pairs) - brute_force(&costs)).abs() < 1e-3);
        }
    }
}
