use petgraph::graph::{UnGraph, NodeIndex};
use petgraph::visit::Dfs;
use nalgebra::*;
use std::cmp::Ordering;

/* Orders an unstructured point cloud (e.g. the boundary cells of a highest density contour,
which come out in raster order) into a sequence that can be drawn as a continuous line. The points
are the nodes of an undirected graph in which each point is linked to its nearest neighbors, and
the line follows the depth-first traversal of that graph. */

const N_NEIGHBORS : usize = 2;

/// Builds a square distance matrix from an arbitrary metric. Only the upper-triangular
/// part is evaluated; the lower-triangular part is copied from it.
fn generic_distance_matrix<T, F>(obs : &[T], metric : F) -> DMatrix<f64>
where
    F : Fn(&T, &T)->f64
{
    let n = obs.len();
    let mut dist = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i+1)..n {
            dist[(i, j)] = metric(&obs[i], &obs[j]);
            dist[(j, i)] = dist[(i, j)];
        }
    }
    dist
}

fn euclidean(a : &(f64, f64), b : &(f64, f64)) -> f64 {
    ((a.0 - b.0).powf(2.) + (a.1 - b.1).powf(2.)).sqrt()
}

/// Undirected graph linking each point to its k nearest neighbors (the point itself excluded;
/// ties are resolved in favor of the point with the smaller index).
pub struct NeighborGraph {

    graph : UnGraph<usize, f64>,

    dist : DMatrix<f64>

}

impl NeighborGraph {

    pub fn build(points : &[(f64, f64)], k : usize) -> Self {
        let n = points.len();
        let dist = generic_distance_matrix(points, euclidean);
        let mut graph = UnGraph::<usize, f64>::with_capacity(n, n * k);
        for i in 0..n {
            graph.add_node(i);
        }
        let k = k.min(n.saturating_sub(1));
        for i in 0..n {
            let mut others : Vec<usize> = (0..n).filter(|j| *j != i ).collect();
            others.sort_by(|a, b| dist[(i, *a)].partial_cmp(&dist[(i, *b)]).unwrap_or(Ordering::Equal) );
            for j in others.iter().take(k) {
                graph.update_edge(NodeIndex::new(i), NodeIndex::new(*j), dist[(i, *j)]);
            }
        }
        Self { graph, dist }
    }

    pub fn n_points(&self) -> usize {
        self.graph.node_count()
    }

    pub fn n_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Depth-first preorder starting at start. When the graph is disconnected, the traversal
    /// continues from the unvisited point closest to the last visited one, so that every
    /// point appears exactly once.
    pub fn traversal(&self, start : usize) -> Vec<usize> {
        let n = self.n_points();
        let mut order = Vec::with_capacity(n);
        if n == 0 {
            return order;
        }
        let mut visited = vec![false; n];
        let mut dfs = Dfs::new(&self.graph, NodeIndex::new(start));
        loop {
            while let Some(nx) = dfs.next(&self.graph) {
                let ix = self.graph[nx];
                visited[ix] = true;
                order.push(ix);
            }
            if order.len() == n {
                break;
            }
            let last = order[order.len() - 1];
            let next = (0..n)
                .filter(|j| !visited[*j] )
                .min_by(|a, b| self.dist[(last, *a)].partial_cmp(&self.dist[(last, *b)]).unwrap_or(Ordering::Equal) );
            match next {
                Some(next) => dfs.move_to(NodeIndex::new(next)),
                None => break
            }
        }
        order
    }

    /// Sum of the distances between consecutive points of the order.
    pub fn path_length(&self, order : &[usize]) -> f64 {
        order.windows(2).map(|w| self.dist[(w[0], w[1])] ).sum()
    }

}

/// Sorts the points (x, y) so they form a continuous line, starting at the first point. If
/// search_optimal_start is true, every point is tried as the start of the traversal, and the
/// order with the smallest total length is returned instead (this costs n traversals).
///
/// # Panics
///
/// Panics if x and y have different lengths.
pub fn sort_points_to_form_continuous_line(
    x : &DVector<f64>,
    y : &DVector<f64>,
    search_optimal_start : bool
) -> (DVector<f64>, DVector<f64>) {
    assert!(x.nrows() == y.nrows(), "x and y should have the same number of points");
    let points : Vec<(f64, f64)> = x.iter().cloned().zip(y.iter().cloned()).collect();
    if points.is_empty() {
        return (x.clone(), y.clone());
    }
    let graph = NeighborGraph::build(&points[..], N_NEIGHBORS);
    let mut order = graph.traversal(0);
    if search_optimal_start {
        let mut min_length = graph.path_length(&order[..]);
        for start in 1..points.len() {
            let cand = graph.traversal(start);
            let length = graph.path_length(&cand[..]);
            if length < min_length {
                min_length = length;
                order = cand;
            }
        }
    }
    let xx = DVector::from_iterator(order.len(), order.iter().map(|ix| x[*ix] ));
    let yy = DVector::from_iterator(order.len(), order.iter().map(|ix| y[*ix] ));
    (xx, yy)
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::f64::consts::PI;

    fn shuffled_circle(n : usize) -> (DVector<f64>, DVector<f64>) {
        // 7 is coprime with the tested sizes, so i * 7 mod n is a permutation.
        let angle = |i : usize| 2. * PI * ((i * 7) % n) as f64 / n as f64;
        (DVector::from_fn(n, |i, _| angle(i).cos() ), DVector::from_fn(n, |i, _| angle(i).sin() ))
    }

    fn sorted_pairs(x : &DVector<f64>, y : &DVector<f64>) -> Vec<(f64, f64)> {
        let mut p : Vec<(f64, f64)> = x.iter().cloned().zip(y.iter().cloned()).collect();
        p.sort_by(|a, b| a.partial_cmp(b).unwrap() );
        p
    }

    #[test]
    fn output_is_permutation() {
        let (x, y) = shuffled_circle(30);
        for search in [false, true].iter() {
            let (xx, yy) = sort_points_to_form_continuous_line(&x, &y, *search);
            assert_eq!(sorted_pairs(&x, &y), sorted_pairs(&xx, &yy));
        }
        assert_eq!(x, shuffled_circle(30).0);
    }

    #[test]
    fn circle_is_traced_by_neighbors() {
        let n = 24;
        let (x, y) = shuffled_circle(n);
        let (xx, yy) = sort_points_to_form_continuous_line(&x, &y, false);
        let step = 2. * (PI / n as f64).sin();
        for i in 1..n {
            let d = ((xx[i] - xx[i-1]).powf(2.) + (yy[i] - yy[i-1]).powf(2.)).sqrt();
            assert!((d - step).abs() < 1E-9);
        }
    }

    #[test]
    fn disconnected_clusters_are_all_visited() {
        let x = DVector::from_column_slice(&[0.0, 0.1, 0.2, 10.0, 10.1, 10.2, 20.0]);
        let y = DVector::zeros(7);
        let points : Vec<(f64, f64)> = x.iter().cloned().zip(y.iter().cloned()).collect();
        let graph = NeighborGraph::build(&points[..], 2);
        assert_eq!(graph.n_points(), 7);
        let order = graph.traversal(0);
        assert_eq!(order.len(), 7);
        let mut first = order[0..3].to_vec();
        first.sort();
        assert_eq!(first, vec![0, 1, 2]);
        let mut second = order[3..].to_vec();
        second.sort();
        assert_eq!(second, vec![3, 4, 5, 6]);
        let (xx, _) = sort_points_to_form_continuous_line(&x, &y, true);
        assert_eq!(xx.len(), 7);
    }

    #[test]
    fn optimal_start_is_never_longer() {
        let x = DVector::from_column_slice(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = DVector::from_column_slice(&[0.0, 0.5, 0.0, 0.5, 0.0, 0.5]);
        let length = |xx : &DVector<f64>, yy : &DVector<f64>| {
            (1..xx.len()).map(|i| ((xx[i] - xx[i-1]).powf(2.) + (yy[i] - yy[i-1]).powf(2.)).sqrt() ).sum::<f64>()
        };
        let (x0, y0) = sort_points_to_form_continuous_line(&x, &y, false);
        let (x1, y1) = sort_points_to_form_continuous_line(&x, &y, true);
        assert!(length(&x1, &y1) <= length(&x0, &y0) + 1E-12);
    }

    #[test]
    #[should_panic]
    fn unequal_lengths_panic() {
        sort_points_to_form_continuous_line(&DVector::zeros(3), &DVector::zeros(2), false);
    }

}
