use std::fmt::Debug;

/// Dense n-dimensional array of cells, stored in row-major order (the last dimension varies
/// fastest). Used to represent densities evaluated over the sampling grid of a
/// multivariate distribution, and the masks/labels derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T = f64> {

    shape : Vec<usize>,

    strides : Vec<usize>,

    values : Vec<T>

}

fn row_major_strides(shape : &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d+1] * shape[d+1];
    }
    strides
}

impl<T> Grid<T>
where
    T : Copy + Debug
{

    pub fn filled(shape : Vec<usize>, value : T) -> Self {
        let n : usize = shape.iter().product();
        let strides = row_major_strides(&shape);
        Self { shape, strides, values : vec![value; n] }
    }

    /// Wraps a row-major vector of values. Returns None when the number of values
    /// does not match the shape.
    pub fn from_values(shape : Vec<usize>, values : Vec<T>) -> Option<Self> {
        if shape.iter().product::<usize>() != values.len() {
            return None;
        }
        let strides = row_major_strides(&shape);
        Some(Self { shape, strides, values })
    }

    pub fn map<U, F>(&self, f : F) -> Grid<U>
    where
        U : Copy + Debug,
        F : Fn(T) -> U
    {
        Grid {
            shape : self.shape.clone(),
            strides : self.strides.clone(),
            values : self.values.iter().map(|v| f(*v) ).collect()
        }
    }

    pub fn n_dim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape[..]
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides[..]
    }

    pub fn values(&self) -> &[T] {
        &self.values[..]
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values[..]
    }

    pub fn get(&self, index : &[usize]) -> T {
        self.values[self.ravel(index)]
    }

    pub fn set(&mut self, index : &[usize], value : T) {
        let flat = self.ravel(index);
        self.values[flat] = value;
    }

    pub fn ravel(&self, index : &[usize]) -> usize {
        assert!(index.len() == self.shape.len(), "Index should have one entry per dimension");
        index.iter().zip(self.strides.iter()).map(|(i, s)| i * s ).sum()
    }

    pub fn unravel(&self, flat : usize) -> Vec<usize> {
        let mut index = Vec::with_capacity(self.shape.len());
        let mut rem = flat;
        for s in self.strides.iter() {
            index.push(rem / s);
            rem %= s;
        }
        index
    }

    /// Flat indices of the cells at the informed offsets (see neighbor_offsets) from the cell at
    /// flat. Offsets falling outside the grid yield None.
    pub fn neighbors<'a>(&'a self, flat : usize, offsets : &'a [Vec<isize>]) -> impl Iterator<Item=Option<usize>> + 'a {
        let index = self.unravel(flat);
        offsets.iter().map(move |offset| {
            let mut nflat = 0;
            for (d, o) in offset.iter().enumerate() {
                let i = index[d] as isize + o;
                if i < 0 || i >= self.shape[d] as isize {
                    return None;
                }
                nflat += i as usize * self.strides[d];
            }
            Some(nflat)
        })
    }

}

/// All offsets in {-1, 0, 1}^n except the origin, in raster order: The cells touching a cell
/// through its faces, edges and corners.
pub fn neighbor_offsets(n_dim : usize) -> Vec<Vec<isize>> {
    let total = 3usize.pow(n_dim as u32);
    let mut offsets = Vec::with_capacity(total - 1);
    for k in 0..total {
        let mut rem = k;
        let mut offset = vec![0; n_dim];
        for d in (0..n_dim).rev() {
            offset[d] = (rem % 3) as isize - 1;
            rem /= 3;
        }
        if offset.iter().any(|o| *o != 0 ) {
            offsets.push(offset);
        }
    }
    offsets
}

#[test]
fn grid_indexing() {
    let mut g = Grid::filled(vec![3, 4, 2], 0usize);
    assert_eq!(g.strides(), &[8, 2, 1]);
    assert_eq!(g.len(), 24);
    g.set(&[2, 1, 1], 7);
    assert_eq!(g.values()[19], 7);
    assert_eq!(g.unravel(19), vec![2, 1, 1]);
    assert_eq!(g.ravel(&[2, 1, 1]), 19);

    // A corner of a 2D grid touches three cells; an interior cell touches eight.
    let g2 = Grid::filled(vec![4, 4], false);
    let offsets = neighbor_offsets(2);
    let inside = |flat| g2.neighbors(flat, &offsets[..]).filter(|n| n.is_some() ).count();
    assert_eq!(inside(0), 3);
    assert_eq!(inside(5), 8);
    assert_eq!(neighbor_offsets(3).len(), 26);
    assert!(Grid::from_values(vec![2, 2], vec![1.0; 3]).is_none());
}
