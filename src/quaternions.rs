extern crate nalgebra as na;

pub type Matrix3N = na::Matrix3xX<f64>;
pub type Matrix3 = na::Matrix3<f64>;
pub type Vector3 = na::Vector3<f64>;
pub type Quaternion = na::UnitQuaternion<f64>;
type Matrix4 = na::Matrix4<f64>;

use serde::Serialize;

/// Minimum number of point pairs for a meaningful rigid-body fit
pub const MIN_FIT_POINTS: usize = 3;

pub fn random_rotation() -> Quaternion {
    let random_axis = na::Unit::new_normalize(Vector3::new_random());
    let random_angle = rand::random::<f64>() * std::f64::consts::PI;
    Quaternion::from_axis_angle(&random_axis, random_angle)
}

pub fn quaternion_pair_contribution<'a>(stator_col: &na::VectorView3<'a, f64>, rotor_col: &na::VectorView3<'a, f64>) -> Matrix4 {
    let mut a = Matrix4::zeros();

    let forward_difference = (rotor_col - stator_col).transpose();
    a.fixed_view_mut::<1, 3>(0, 1).copy_from(&forward_difference);

    let backward_difference = stator_col - rotor_col;
    a.fixed_view_mut::<3, 1>(1, 0).copy_from(&backward_difference);

    let mut block = Matrix3::zeros();
    let sum = stator_col + rotor_col;
    for (col, mut block_col) in Matrix3::identity().column_iter().zip(block.column_iter_mut()) {
        block_col.copy_from(&col.cross(&sum));
    }
    a.fixed_view_mut::<3, 3>(1, 1).copy_from(&block);

    a.transpose() * a
}

pub struct Fit {
    pub quaternion: Quaternion,
    pub msd: f64
}

impl Fit {
    pub fn rotate_stator(&self, stator: &Matrix3N) -> Matrix3N {
        self.quaternion.to_rotation_matrix() * stator
    }
    pub fn rotate_rotor(&self, rotor: &Matrix3N) -> Matrix3N {
        self.quaternion.inverse().to_rotation_matrix() * rotor
    }
}

pub fn quaternion_decomposition(mat: Matrix4) -> Fit {
    let decomposition = na::SymmetricEigen::new(mat);
    // Eigenvalues are unsorted here, we seek the minimum value
    let (min_eigenvalue_index, msd) = decomposition.eigenvalues
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best_i, best), (i, &value)| {
            if value < best { (i, value) } else { (best_i, best) }
        });

    let q = decomposition.eigenvectors.column(min_eigenvalue_index);
    let pre_quat = na::Quaternion::new(q[0], q[1], q[2], q[3]);

    Fit {
        quaternion: na::UnitQuaternion::from_quaternion(pre_quat),
        msd: msd.max(0.0)
    }
}

/// Remove the centroid of a point cloud, returning the centered cloud and the centroid
pub fn centered(mut cloud: Matrix3N) -> (Matrix3N, Vector3) {
    if cloud.ncols() == 0 {
        return (cloud, Vector3::zeros());
    }

    let centroid = cloud.column_mean();
    for mut v in cloud.column_iter_mut() {
        v -= centroid;
    }
    (cloud, centroid)
}

/// Find a quaternion that best transforms the stator into the rotor
///
/// Both clouds must already be centered and have matching columns.
pub fn fit(stator: &Matrix3N, rotor: &Matrix3N) -> Fit {
    let mut a = Matrix4::zeros();
    for (rotor_col, stator_col) in rotor.column_iter().zip(stator.column_iter()) {
        a += quaternion_pair_contribution(&stator_col, &rotor_col);
    }

    quaternion_decomposition(a)
}

/// Rigid-body transformation taking model coordinates into the reference frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transform {
    pub rotation: Matrix3,
    pub translation: Vector3
}

impl Transform {
    pub fn identity() -> Transform {
        Transform {rotation: Matrix3::identity(), translation: Vector3::zeros()}
    }

    pub fn apply(&self, point: &Vector3) -> Vector3 {
        self.rotation * point + self.translation
    }

    pub fn apply_matrix(&self, cloud: &Matrix3N) -> Matrix3N {
        let mut transformed = self.rotation * cloud;
        for mut v in transformed.column_iter_mut() {
            v += self.translation;
        }
        transformed
    }
}

/// Result of superposing a model point set onto matching reference points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Superposition {
    pub transform: Transform,
    /// Root mean square deviation of the fitted point pairs after transformation
    pub rmsd: f64
}

/// Optimal rigid-body superposition of `model` onto `reference`
///
/// Columns of both matrices are point pairs. Yields `None` if the point counts
/// differ or fewer than [`MIN_FIT_POINTS`] pairs are supplied.
pub fn superpose(reference: &Matrix3N, model: &Matrix3N) -> Option<Superposition> {
    let n = reference.ncols();
    if n != model.ncols() || n < MIN_FIT_POINTS {
        return None;
    }

    let (stator, reference_centroid) = centered(reference.clone());
    let (rotor, model_centroid) = centered(model.clone());
    let fit = fit(&stator, &rotor);

    // rotor = q * stator, so the model is brought back by the inverse
    let rotation = fit.quaternion.inverse().to_rotation_matrix().into_inner();
    let translation = reference_centroid - rotation * model_centroid;
    let transform = Transform {rotation, translation};

    let rmsd = rmsd(reference, &transform.apply_matrix(model));
    Some(Superposition {transform, rmsd})
}

/// Root mean square deviation between columns of two equally sized clouds
pub fn rmsd(a: &Matrix3N, b: &Matrix3N) -> f64 {
    let n = a.ncols().min(b.ncols());
    if n == 0 {
        return 0.0;
    }

    let sum_of_squares: f64 = a.column_iter()
        .zip(b.column_iter())
        .map(|(x, y)| (x - y).norm_squared())
        .sum();
    (sum_of_squares / n as f64).sqrt()
}
