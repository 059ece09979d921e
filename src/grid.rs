use crate::atoms::Lattice;
use crate::errors::BadelfError;
use crate::utils::{add, dot, norm};

/// Structure for managing positions within the voxel grid.
///
/// Voxel indices run 1..=size along each axis and fractional coordinate 0
/// lies on the corner of voxel (1, 1, 1), so a voxel position `v` and a
/// fractional position `f` are related by `v = f * size + 1`. The flattened
/// index stores the x axis fastest, the order the values appear in the file.
pub struct Grid {
    /// The 3d size of the data.
    pub size: Size,
    /// The lattice of the cell.
    pub lattice: Lattice,
    /// Information on the voxel basis.
    pub voxel_lattice: Lattice,
}

impl Grid {
    /// Initialises a grid structure. Computes the voxel_lattice from the grid and lattice.
    pub fn new(grid: [usize; 3], lattice: &Lattice) -> Result<Self, BadelfError> {
        let size = Size::new(grid[0], grid[1], grid[2])?;
        let [a, b, c] = lattice.to_cartesian;
        let scale = |v: [f64; 3], n: usize| {
            [v[0] / n as f64, v[1] / n as f64, v[2] / n as f64]
        };
        let voxel_lattice =
            Lattice::new([scale(a, grid[0]), scale(b, grid[1]), scale(c, grid[2])])?;
        Ok(Self {
            size,
            lattice: lattice.clone(),
            voxel_lattice,
        })
    }

    /// The grid dimensions as an array.
    pub fn dims(&self) -> [usize; 3] {
        [self.size.x, self.size.y, self.size.z]
    }

    /// Converts a 1-based 3d voxel index into the flattened index.
    pub fn index(&self, v: [usize; 3]) -> usize {
        (v[0] - 1) + self.size.x * ((v[1] - 1) + self.size.y * (v[2] - 1))
    }

    /// Converts a flattened index into the 1-based 3d voxel index.
    pub fn to_3d(&self, p: usize) -> [usize; 3] {
        let x = p % self.size.x;
        let y = (p / self.size.x) % self.size.y;
        let z = p / (self.size.x * self.size.y);
        [x + 1, y + 1, z + 1]
    }

    /// Wraps any integer voxel index back onto 1..=size.
    pub fn wrap(&self, v: [isize; 3]) -> [usize; 3] {
        let mut out = [0usize; 3];
        for (i, n) in self.dims().iter().enumerate() {
            out[i] = (v[i] - 1).rem_euclid(*n as isize) as usize + 1;
        }
        out
    }

    /// Wraps a continuous voxel position onto [1, size + 1).
    pub fn wrap_position(&self, pos: [f64; 3]) -> [f64; 3] {
        let mut out = [0f64; 3];
        for (i, n) in self.dims().iter().enumerate() {
            let n = *n as f64;
            let w = (pos[i] - 1.).rem_euclid(n);
            // rem_euclid can round up to n for tiny negative inputs
            out[i] = if w >= n { 1. } else { w + 1. };
        }
        out
    }

    pub fn voxel_to_fractional(&self, pos: [f64; 3]) -> [f64; 3] {
        let mut out = [0f64; 3];
        for (i, n) in self.dims().iter().enumerate() {
            out[i] = (pos[i] - 1.) / *n as f64;
        }
        out
    }

    pub fn fractional_to_voxel(&self, frac: [f64; 3]) -> [f64; 3] {
        let mut out = [0f64; 3];
        for (i, n) in self.dims().iter().enumerate() {
            out[i] = frac[i] * *n as f64 + 1.;
        }
        out
    }

    pub fn voxel_to_cartesian(&self, pos: [f64; 3]) -> [f64; 3] {
        dot([pos[0] - 1., pos[1] - 1., pos[2] - 1.], self.voxel_lattice.to_cartesian)
    }

    pub fn cartesian_to_voxel(&self, cart: [f64; 3]) -> [f64; 3] {
        add(dot(cart, self.voxel_lattice.to_fractional), [1.; 3])
    }

    /// The cartesian position of the voxel at flattened index p.
    pub fn cartesian(&self, p: usize) -> [f64; 3] {
        let [x, y, z] = self.to_3d(p);
        self.voxel_to_cartesian([x as f64, y as f64, z as f64])
    }

    /// The flattened indices of the voxels within `radius` steps of p along
    /// every axis, excluding p, wrapped periodically.
    pub fn neighbours(&self, p: usize, radius: usize) -> Vec<usize> {
        let r = radius as isize;
        let [x, y, z] = self.to_3d(p);
        let (x, y, z) = (x as isize, y as isize, z as isize);
        let width = (2 * radius + 1).pow(3);
        let mut out = Vec::with_capacity(width - 1);
        for i in -r..=r {
            for j in -r..=r {
                for k in -r..=r {
                    if i == 0 && j == 0 && k == 0 {
                        continue;
                    }
                    out.push(self.index(self.wrap([x + i, y + j, z + k])));
                }
            }
        }
        out
    }

    /// The volume of a single voxel.
    pub fn voxel_volume(&self) -> f64 {
        self.voxel_lattice.volume
    }

    /// Number of voxels per unit volume.
    pub fn resolution(&self) -> f64 {
        self.size.total as f64 / self.lattice.volume
    }

    /// The furthest a point in a voxel can be from the voxel's position,
    /// half the longest body diagonal of the voxel.
    pub fn max_voxel_distance(&self) -> f64 {
        let [a, b, c] = self.voxel_lattice.to_cartesian;
        [[1., 1., 1.], [1., 1., -1.], [1., -1., 1.], [-1., 1., 1.]]
            .iter()
            .map(|s| {
                norm([
                    s[0] * a[0] + s[1] * b[0] + s[2] * c[0],
                    s[0] * a[1] + s[1] * b[1] + s[2] * c[1],
                    s[0] * a[2] + s[1] * b[2] + s[2] * c[2],
                ])
            })
            .fold(0f64, f64::max)
            * 0.5
    }
}

/// Size of the density data in 3d
pub struct Size {
    /// Number of voxels in the x-direction.
    pub x: usize,
    /// Number of voxels in the y-direction.
    pub y: usize,
    /// Number of voxels in the z-direction.
    pub z: usize,
    /// Total number of voxels.
    pub total: usize,
}

impl Size {
    /// The length of the flattened array for the density data in 3d
    pub fn new(x: usize, y: usize, z: usize) -> Result<Self, BadelfError> {
        let total = x
            .checked_mul(y)
            .and_then(|xy| xy.checked_mul(z))
            .filter(|t| *t > 0 && *t < isize::MAX as usize)
            .ok_or(BadelfError::InvalidGrid { grid: [x, y, z] })?;
        Ok(Self { x, y, z, total })
    }
}
