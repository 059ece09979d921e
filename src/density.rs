use crate::errors::BadelfError;
use std::ops::Index;

/// A periodic scalar field sampled on the voxel grid.
///
/// The data is stored flattened with the x axis fastest. Interpolation treats
/// the field as padded by one wrapped voxel on every axis: node k along an
/// axis sits at voxel position k and holds voxel ((k - 1) mod n) + 1, so any
/// wrapped position in [1, n + 1) has both of its bracketing nodes available.
#[derive(Debug)]
pub struct Density {
    /// The flattened values.
    pub data: Vec<f64>,
    /// The number of voxels along each axis.
    pub grid: [usize; 3],
}

impl Index<usize> for Density {
    type Output = f64;

    fn index(&self, i: usize) -> &Self::Output {
        &self.data[i]
    }
}

impl Density {
    /// Wraps the flattened data, the length must match the grid.
    pub fn new(data: Vec<f64>, grid: [usize; 3]) -> Result<Self, BadelfError> {
        let expected = grid[0] * grid[1] * grid[2];
        if data.len() != expected || expected == 0 {
            return Err(BadelfError::InputShapeMismatch {
                field: String::from("density length"),
                expected: format!("{} values for grid {:?}", expected, grid),
                found: format!("{} values", data.len()),
            });
        }
        Ok(Self { data, grid })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The sum of every value.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// The value held by the (possibly out of range) node v.
    pub fn node(&self, v: [isize; 3]) -> f64 {
        let [nx, ny, nz] = self.grid;
        let x = (v[0] - 1).rem_euclid(nx as isize) as usize;
        let y = (v[1] - 1).rem_euclid(ny as isize) as usize;
        let z = (v[2] - 1).rem_euclid(nz as isize) as usize;
        self.data[x + nx * (y + ny * z)]
    }

    /// Splits a wrapped position into its lower node and the offset from it.
    fn bracket(&self, pos: [f64; 3]) -> ([isize; 3], [f64; 3]) {
        let mut lower = [0isize; 3];
        let mut t = [0f64; 3];
        for i in 0..3 {
            let n = self.grid[i] as f64;
            let p = pos[i].clamp(1., n + 1.);
            let l = p.floor().min(n);
            lower[i] = l as isize;
            t[i] = p - l;
        }
        (lower, t)
    }

    /// Trilinear interpolation at a wrapped voxel position.
    pub fn linear(&self, pos: [f64; 3]) -> f64 {
        let ([x, y, z], [tx, ty, tz]) = self.bracket(pos);
        let mut value = 0.;
        for (i, wx) in [(0, 1. - tx), (1, tx)] {
            for (j, wy) in [(0, 1. - ty), (1, ty)] {
                for (k, wz) in [(0, 1. - tz), (1, tz)] {
                    let w = wx * wy * wz;
                    if w != 0. {
                        value += w * self.node([x + i, y + j, z + k]);
                    }
                }
            }
        }
        value
    }

    /// Tricubic (Catmull-Rom) interpolation at a wrapped voxel position.
    pub fn cubic(&self, pos: [f64; 3]) -> f64 {
        let ([x, y, z], [tx, ty, tz]) = self.bracket(pos);
        let (wx, wy, wz) = (catmull_rom(tx), catmull_rom(ty), catmull_rom(tz));
        let mut value = 0.;
        for (i, wx) in wx.iter().enumerate() {
            for (j, wy) in wy.iter().enumerate() {
                for (k, wz) in wz.iter().enumerate() {
                    value += wx
                        * wy
                        * wz
                        * self.node([
                            x + i as isize - 1,
                            y + j as isize - 1,
                            z + k as isize - 1,
                        ]);
                }
            }
        }
        value
    }
}

/// The weights of the four nodes surrounding t in [0, 1].
fn catmull_rom(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2. * t2 - t),
        0.5 * (3. * t3 - 5. * t2 + 2.),
        0.5 * (-3. * t3 + 4. * t2 + t),
        0.5 * (t3 - t2),
    ]
}
