use crate::grid::Grid;

/// Describes the state of the voxel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Voxel<'a> {
    /// Wholly assigned to a site.
    Site(usize),
    /// Split between sites, the weights sum to one.
    Weight(&'a [(usize, f64)]),
    /// Not assigned by any pass so far.
    Unresolved,
}

/// An assignment produced by a partition pass.
#[derive(Clone, Debug, PartialEq)]
pub enum Assignment {
    Site(usize),
    Split(Vec<(usize, f64)>),
}

/// A voxel, its charge and where that charge goes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelRecord<'a> {
    pub voxel: [usize; 3],
    pub charge: f64,
    pub state: Voxel<'a>,
}

/// A structure for storing the map between voxel and site. Sites are stored
/// in the voxel_map whilst split voxels store -2 - i, where i is the index of
/// their weights in the weight_map. Unassigned voxels hold -1.
///
/// The map is only written between passes, every pass reads a frozen map.
///
/// # Examples
/// ```
/// use badelf::voxel_map::{Assignment, Voxel, VoxelMap};
///
/// let mut voxel_map = VoxelMap::new(8);
/// voxel_map.store(0, Assignment::Site(1));
/// voxel_map.store(1, Assignment::Split(vec![(0, 0.5), (1, 0.5)]));
/// assert_eq!(voxel_map.voxel_get(0), Voxel::Site(1));
/// assert_eq!(voxel_map.voxel_get(2), Voxel::Unresolved);
/// assert_eq!(voxel_map.unresolved(), (2..8).collect::<Vec<usize>>());
/// ```
pub struct VoxelMap {
    voxel_map: Vec<isize>,
    weight_map: Vec<Vec<(usize, f64)>>,
}

impl VoxelMap {
    pub fn new(size: usize) -> Self {
        Self {
            voxel_map: vec![-1; size],
            weight_map: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.voxel_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxel_map.is_empty()
    }

    /// Retrieves the state of the voxel, p.
    pub fn voxel_get(&self, p: usize) -> Voxel {
        let site = self.voxel_map[p];
        match site.cmp(&-1) {
            std::cmp::Ordering::Equal => Voxel::Unresolved,
            std::cmp::Ordering::Greater => Voxel::Site(site as usize),
            std::cmp::Ordering::Less => {
                Voxel::Weight(&self.weight_map[(-2 - site) as usize])
            }
        }
    }

    /// The record of voxel p with its charge.
    pub fn record(&self, p: usize, grid: &Grid, charge: f64) -> VoxelRecord {
        VoxelRecord {
            voxel: grid.to_3d(p),
            charge,
            state: self.voxel_get(p),
        }
    }

    /// Stores the assignment of voxel p.
    pub fn store(&mut self, p: usize, assignment: Assignment) {
        self.voxel_map[p] = match assignment {
            Assignment::Site(site) => site as isize,
            Assignment::Split(weights) => {
                self.weight_map.push(weights);
                -1 - (self.weight_map.len() as isize)
            }
        };
    }

    /// Stores every assignment from a pass.
    pub fn store_all(&mut self, assignments: Vec<(usize, Assignment)>) {
        for (p, assignment) in assignments {
            self.store(p, assignment);
        }
    }

    /// The voxels no pass has assigned, in order.
    pub fn unresolved(&self) -> Vec<usize> {
        self.voxel_map
            .iter()
            .enumerate()
            .filter_map(|(p, site)| if *site == -1 { Some(p) } else { None })
            .collect()
    }

    /// How many voxels are split between sites?
    pub fn split_voxels(&self) -> usize {
        self.weight_map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Lattice;

    #[test]
    fn voxel_map_site_store() {
        let mut voxel_map = VoxelMap::new(4);
        voxel_map.store_all(vec![(3, Assignment::Site(0)), (1, Assignment::Site(7))]);
        assert_eq!(voxel_map.voxel_get(1), Voxel::Site(7));
        assert_eq!(voxel_map.voxel_get(3), Voxel::Site(0));
        assert_eq!(voxel_map.unresolved(), vec![0, 2]);
    }

    #[test]
    fn voxel_map_weight_store() {
        let mut voxel_map = VoxelMap::new(3);
        voxel_map.store(2, Assignment::Split(vec![(0, 0.25), (1, 0.75)]));
        voxel_map.store(0, Assignment::Split(vec![(2, 1.)]));
        assert_eq!(voxel_map.voxel_get(2), Voxel::Weight(&[(0, 0.25), (1, 0.75)]));
        assert_eq!(voxel_map.voxel_get(0), Voxel::Weight(&[(2, 1.)]));
        assert_eq!(voxel_map.split_voxels(), 2);
    }

    #[test]
    fn voxel_map_record() {
        let lattice =
            Lattice::new([[2., 0., 0.], [0., 2., 0.], [0., 0., 2.]]).unwrap();
        let grid = Grid::new([2, 2, 2], &lattice).unwrap();
        let mut voxel_map = VoxelMap::new(8);
        voxel_map.store(5, Assignment::Site(1));
        let record = voxel_map.record(5, &grid, 0.5);
        assert_eq!(record.voxel, [2, 1, 2]);
        assert_eq!(record.state, Voxel::Site(1));
    }
}
