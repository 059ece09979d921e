/// compute the cross product of two vectors
pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// compute the dot product between a vector and a matrix
pub fn dot(v: [f64; 3], m: [[f64; 3]; 3]) -> [f64; 3] {
    let mut out = [0f64; 3];
    for (i, out) in out.iter_mut().enumerate() {
        *out = v[0] * m[0][i] + v[1] * m[1][i] + v[2] * m[2][i]
    }
    out
}

/// compute the dot product between two vectors
pub fn vdot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// compute the norm of a vector
pub fn norm(a: [f64; 3]) -> f64 {
    vdot(a, a).sqrt()
}

/// a - b
pub fn subtract(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// a + b
pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// a + t * (b - a)
pub fn lerp(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    [
        a[0] + t * (b[0] - a[0]),
        a[1] + t * (b[1] - a[1]),
        a[2] + t * (b[2] - a[2]),
    ]
}

/// the triple product a.(b x c), the signed volume of the cell
pub fn triple_product(m: &[[f64; 3]; 3]) -> f64 {
    vdot(m[0], cross(m[1], m[2]))
}

/// calculates the inverse of a 3x3 matrix
pub fn invert_lattice(lattice: &[[f64; 3]; 3]) -> Result<[[f64; 3]; 3], String> {
    let minor00 = lattice[1][1] * lattice[2][2] - lattice[1][2] * lattice[2][1];
    let minor01 = lattice[1][0] * lattice[2][2] - lattice[1][2] * lattice[2][0];
    let minor02 = lattice[1][0] * lattice[2][1] - lattice[1][1] * lattice[2][0];
    let determinant = lattice[0][0] * minor00 - lattice[0][1] * minor01
        + lattice[0][2] * minor02;
    if determinant.abs() < 1e-16 {
        Err(String::from("Matrix doesn't span 3D space"))
    } else {
        Ok([
            [
                minor00 / determinant,
                (lattice[0][2] * lattice[2][1] - lattice[2][2] * lattice[0][1])
                    / determinant,
                (lattice[0][1] * lattice[1][2] - lattice[1][1] * lattice[0][2])
                    / determinant,
            ],
            [
                -minor01 / determinant,
                (lattice[0][0] * lattice[2][2] - lattice[2][0] * lattice[0][2])
                    / determinant,
                (lattice[0][2] * lattice[1][0] - lattice[1][2] * lattice[0][0])
                    / determinant,
            ],
            [
                minor02 / determinant,
                (lattice[0][1] * lattice[2][0] - lattice[2][1] * lattice[0][0])
                    / determinant,
                (lattice[0][0] * lattice[1][1] - lattice[1][0] * lattice[0][1])
                    / determinant,
            ],
        ])
    }
}

/// Solves the square system `a x = b` by Gaussian elimination with partial
/// pivoting. Returns None if the system is singular.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|i, j| {
            a[*i][col].abs().total_cmp(&a[*j][col].abs())
        })?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0f64; n];
    for row in (0..n).rev() {
        let tail = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum::<f64>();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utils_dot() {
        assert_eq!(
            dot([1., 2., 3.], [[1., 0., 0.], [0., 2., 0.], [0., 0., 3.]]),
            [1., 4., 9.]
        )
    }

    #[test]
    fn utils_vdot() {
        assert_eq!(vdot([1., 2., 3.], [1., 2., 3.]), 14.)
    }

    #[test]
    fn utils_norm() {
        assert_eq!(norm([3., 4., 12.]), 13.)
    }

    #[test]
    fn utils_cross() {
        assert_eq!(cross([1., 0., 0.], [0., 1., 0.]), [0., 0., 1.])
    }

    #[test]
    fn utils_lerp() {
        assert_eq!(lerp([0., 0., 0.], [2., 4., -6.], 0.5), [1., 2., -3.])
    }

    #[test]
    fn utils_triple_product() {
        let m = [[2., 0., 0.], [0., 3., 0.], [0., 0., 4.]];
        assert_eq!(triple_product(&m), 24.);
        let m = [[0., 3., 0.], [2., 0., 0.], [0., 0., 4.]];
        assert_eq!(triple_product(&m), -24.);
    }

    #[test]
    fn utils_invert_lattice() {
        let m = [[2., 0., 0.], [0., 4., 0.], [0., 0., 5.]];
        let inv = invert_lattice(&m).unwrap();
        assert_eq!(inv, [[0.5, 0., 0.], [0., 0.25, 0.], [0., 0., 0.2]]);
    }

    #[test]
    fn utils_invert_lattice_singular() {
        let m = [[1., 0., 0.], [1., 0., 0.], [0., 0., 2.]];
        assert!(invert_lattice(&m).is_err());
    }

    #[test]
    fn utils_solve() {
        let a = vec![vec![2., 1.], vec![1., 3.]];
        let x = solve(a, vec![3., 5.]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn utils_solve_singular() {
        let a = vec![vec![1., 2.], vec![2., 4.]];
        assert!(solve(a, vec![1., 2.]).is_none());
    }
}
