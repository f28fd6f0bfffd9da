extern crate nalgebra as na;

use crate::quaternions::Matrix3N;
use crate::strong::Index;

use std::marker::PhantomData;

/// Stack column vectors into a matrix, allowing an empty set
pub fn columns_to_matrix(columns: &[na::Vector3<f64>]) -> Matrix3N {
    Matrix3N::from_fn(columns.len(), |i, j| columns[j][i])
}

/// Owned positions matrix indexed by a new type
#[derive(Clone, Debug, PartialEq)]
pub struct Positions<I: Index> {
    /// The underlying matrix, one column per point
    pub matrix: Matrix3N,
    index_type: PhantomData<I>
}

impl<I: Index> Positions<I> {
    /// Wrap a matrix
    pub fn wrap(matrix: Matrix3N) -> Positions<I> {
        Positions {matrix, index_type: PhantomData}
    }

    /// Collect positions from point vectors
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a na::Vector3<f64>>) -> Positions<I> {
        let columns: Vec<na::Vector3<f64>> = points.into_iter().copied().collect();
        Positions::wrap(columns_to_matrix(&columns))
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.ncols() == 0
    }

    /// Access the position of a particular point
    pub fn point(&self, index: I) -> na::VectorView3<f64> {
        self.matrix.column(index.position())
    }

    /// Euclidean distance between two points
    pub fn distance(&self, a: I, b: I) -> f64 {
        (self.point(a) - self.point(b)).norm()
    }

    /// Gather the points in the order of `indices` into a new plain matrix
    pub fn gather(&self, indices: impl IntoIterator<Item = I>) -> Matrix3N {
        let columns: Vec<na::Vector3<f64>> = indices.into_iter()
            .map(|i| self.point(i).into_owned())
            .collect();
        columns_to_matrix(&columns)
    }
}
