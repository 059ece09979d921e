use crate::classify::{ElectrideMask, SiteClassifier};
use crate::errors::BadelfError;
use crate::grid::Grid;
use crate::neighbours::NeighbourStrategy;
use crate::plane::SitePolyhedron;
use crate::pool::{Parallelism, WorkerPool};
use crate::profile::Sampling;
use crate::progress::bar;
use crate::voxel_map::{Assignment, Voxel, VoxelMap};
use rustc_hash::FxHashMap;

/// Default neighbourhood radius, in voxels, of the multi-plane fallback.
pub const MULTI_PLANE_RADIUS: usize = 2;
/// Default share of unresolved voxels above which a run is flagged.
pub const UNRESOLVED_WARNING: f64 = 1e-3;

/// Everything that tunes a partition run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartitionConfig {
    pub neighbours: NeighbourStrategy,
    pub sampling: Sampling,
    pub parallelism: Parallelism,
    /// Half width of the voxel cube polled by the multi-plane fallback.
    pub multi_plane_radius: usize,
    /// Unresolved share of the grid worth warning about.
    pub unresolved_warning: f64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            neighbours: NeighbourStrategy::default(),
            sampling: Sampling::Auto,
            parallelism: Parallelism::default(),
            multi_plane_radius: MULTI_PLANE_RADIUS,
            unresolved_warning: UNRESOLVED_WARNING,
        }
    }
}

/// How many voxels each pass resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub electride: usize,
    pub primary: usize,
    pub periodic: usize,
    pub near_plane: usize,
    pub multi_plane: usize,
    pub unresolved: usize,
}

impl PassSummary {
    pub fn total(&self) -> usize {
        self.electride
            + self.primary
            + self.periodic
            + self.near_plane
            + self.multi_plane
            + self.unresolved
    }

    /// The share of the grid left unresolved.
    pub fn unresolved_fraction(&self) -> f64 {
        match self.total() {
            0 => 0.,
            total => self.unresolved as f64 / total as f64,
        }
    }
}

/// Turns a vote tally into an assignment, None if nobody voted.
fn tally_to_assignment(tally: FxHashMap<usize, f64>) -> Option<Assignment> {
    let total = tally.values().sum::<f64>();
    if tally.is_empty() || total <= 0. {
        return None;
    }
    let mut weights = tally
        .into_iter()
        .filter(|(_, votes)| *votes > 0.)
        .map(|(site, votes)| (site, votes / total))
        .collect::<Vec<_>>();
    weights.sort_unstable_by_key(|(site, _)| *site);
    if weights.len() == 1 {
        Some(Assignment::Site(weights[0].0))
    } else {
        Some(Assignment::Split(weights))
    }
}

/// Assigns every voxel of the grid to a site in five passes. Each pass reads
/// the map as the previous pass left it and only considers the voxels still
/// unresolved.
pub struct GridPartitioner<'a> {
    grid: &'a Grid,
    classifier: SiteClassifier<'a>,
    electrides: &'a [ElectrideMask],
    pool: &'a WorkerPool,
    multi_plane_radius: usize,
}

impl<'a> GridPartitioner<'a> {
    pub fn new(
        grid: &'a Grid,
        polyhedra: &'a [Option<SitePolyhedron>],
        electrides: &'a [ElectrideMask],
        pool: &'a WorkerPool,
        multi_plane_radius: usize,
    ) -> Self {
        Self {
            grid,
            classifier: SiteClassifier::new(polyhedra, &grid.lattice),
            electrides,
            pool,
            multi_plane_radius,
        }
    }

    fn is_electride(&self, site: usize) -> bool {
        self.electrides.iter().any(|mask| mask.site == site)
    }

    /// Runs `assign` on every unresolved voxel in parallel against the frozen
    /// map, then stores the results.
    fn run_pass<F>(
        &self,
        voxel_map: &mut VoxelMap,
        name: &str,
        visible: bool,
        assign: F,
    ) -> Result<usize, BadelfError>
    where
        F: Fn(usize, &VoxelMap) -> Option<Assignment> + Sync,
    {
        let pending = voxel_map.unresolved();
        let progress_bar = bar(pending.len(), &format!("{}: ", name), visible);
        let pbar = &progress_bar;
        let frozen = &*voxel_map;
        let chunks = self.pool.map_chunks(&pending, name, |chunk| {
            Ok(chunk
                .iter()
                .filter_map(|p| {
                    let assignment = assign(*p, frozen).map(|a| (*p, a));
                    pbar.tick();
                    assignment
                })
                .collect::<Vec<_>>())
        })?;
        let assignments = chunks.into_iter().flatten().collect::<Vec<_>>();
        let count = assignments.len();
        voxel_map.store_all(assignments);
        Ok(count)
    }

    /// Voxels flagged by an electride's mask go to that electride, the last
    /// flagging electride if there are several.
    pub fn electride_pass(
        &self,
        voxel_map: &mut VoxelMap,
        visible: bool,
    ) -> Result<usize, BadelfError> {
        if self.electrides.is_empty() {
            return Ok(0);
        }
        self.run_pass(voxel_map, "Electride Override", visible, |p, _| {
            self.electrides
                .iter()
                .rev()
                .find(|mask| mask.flags(p))
                .map(|mask| Assignment::Site(mask.site))
        })
    }

    /// Voxels lying in exactly one polyhedron.
    pub fn primary_pass(
        &self,
        voxel_map: &mut VoxelMap,
        visible: bool,
    ) -> Result<usize, BadelfError> {
        self.run_pass(voxel_map, "Primary Classification", visible, |p, _| {
            self.classifier
                .primary(self.grid.cartesian(p))
                .map(Assignment::Site)
        })
    }

    /// Voxels whose periodic image lies in a polyhedron.
    pub fn periodic_pass(
        &self,
        voxel_map: &mut VoxelMap,
        visible: bool,
    ) -> Result<usize, BadelfError> {
        self.run_pass(voxel_map, "Periodic Images", visible, |p, _| {
            self.classifier
                .periodic(self.grid.cartesian(p))
                .map(Assignment::Site)
        })
    }

    /// Voxels within a voxel's reach of a polyhedron are split between the
    /// atomic sites holding their 26 neighbours.
    pub fn near_plane_pass(
        &self,
        voxel_map: &mut VoxelMap,
        visible: bool,
    ) -> Result<usize, BadelfError> {
        let tolerance = self.grid.max_voxel_distance();
        self.run_pass(voxel_map, "Near-Plane Fallback", visible, |p, frozen| {
            if !self.classifier.near_plane(self.grid.cartesian(p), tolerance) {
                return None;
            }
            tally_to_assignment(self.site_votes(p, 1, frozen, false))
        })
    }

    /// Remaining voxels are split by polling a wider neighbourhood, counting
    /// split neighbours by their weights.
    pub fn multi_plane_pass(
        &self,
        voxel_map: &mut VoxelMap,
        visible: bool,
    ) -> Result<usize, BadelfError> {
        let radius = self.multi_plane_radius;
        self.run_pass(voxel_map, "Multi-Plane Fallback", visible, |p, frozen| {
            tally_to_assignment(self.site_votes(p, radius, frozen, true))
        })
    }

    /// Tallies the atomic sites of the voxels around p.
    fn site_votes(
        &self,
        p: usize,
        radius: usize,
        voxel_map: &VoxelMap,
        count_splits: bool,
    ) -> FxHashMap<usize, f64> {
        let mut tally = FxHashMap::<usize, f64>::default();
        for neighbour in self.grid.neighbours(p, radius) {
            match voxel_map.voxel_get(neighbour) {
                Voxel::Site(site) if !self.is_electride(site) => {
                    *tally.entry(site).or_insert(0.) += 1.;
                }
                Voxel::Weight(weights) if count_splits => {
                    for (site, weight) in weights.iter() {
                        if !self.is_electride(*site) {
                            *tally.entry(*site).or_insert(0.) += weight;
                        }
                    }
                }
                _ => (),
            }
        }
        tally
    }

    /// Runs every pass in order.
    pub fn partition(&self, visible: bool) -> Result<(VoxelMap, PassSummary), BadelfError> {
        let mut voxel_map = VoxelMap::new(self.grid.size.total);
        let mut summary = PassSummary {
            electride: self.electride_pass(&mut voxel_map, visible)?,
            ..PassSummary::default()
        };
        summary.primary = self.primary_pass(&mut voxel_map, visible)?;
        summary.periodic = self.periodic_pass(&mut voxel_map, visible)?;
        summary.near_plane = self.near_plane_pass(&mut voxel_map, visible)?;
        summary.multi_plane = self.multi_plane_pass(&mut voxel_map, visible)?;
        summary.unresolved = voxel_map.unresolved().len();
        Ok((voxel_map, summary))
    }

    /// Classifies any, possibly out of range, voxel index by its home voxel.
    pub fn classify_voxel(&self, v: [isize; 3]) -> Option<usize> {
        let p = self.grid.index(self.grid.wrap(v));
        if let Some(mask) = self.electrides.iter().rev().find(|mask| mask.flags(p)) {
            return Some(mask.site);
        }
        self.classifier.classify(self.grid.cartesian(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Lattice;
    use crate::density::Density;
    use crate::plane::BondPlane;

    fn grid() -> Grid {
        let lattice =
            Lattice::new([[10., 0., 0.], [0., 10., 0.], [0., 0., 10.]]).unwrap();
        Grid::new([10, 10, 10], &lattice).unwrap()
    }

    #[test]
    fn partition_tally_split() {
        let mut tally = FxHashMap::default();
        tally.insert(3, 3.);
        tally.insert(1, 1.);
        assert_eq!(
            tally_to_assignment(tally),
            Some(Assignment::Split(vec![(1, 0.25), (3, 0.75)]))
        );
    }

    #[test]
    fn partition_tally_single_and_empty() {
        let mut tally = FxHashMap::default();
        tally.insert(2, 5.);
        assert_eq!(tally_to_assignment(tally), Some(Assignment::Site(2)));
        assert_eq!(tally_to_assignment(FxHashMap::default()), None);
    }

    #[test]
    fn partition_summary_fraction() {
        let summary = PassSummary {
            primary: 998,
            unresolved: 2,
            ..PassSummary::default()
        };
        assert_eq!(summary.total(), 1000);
        assert!((summary.unresolved_fraction() - 0.002).abs() < 1e-15);
        assert_eq!(PassSummary::default().unresolved_fraction(), 0.);
    }

    /// Resolves the radius 2 shell around the centre, leaving the first shell
    /// unresolved.
    fn second_shell(grid: &Grid, centre: usize) -> VoxelMap {
        let first_shell = grid.neighbours(centre, 1);
        let mut voxel_map = VoxelMap::new(grid.size.total);
        for p in grid.neighbours(centre, 2) {
            if first_shell.contains(&p) {
                continue;
            }
            let assignment = match grid.to_3d(p)[0] {
                3 => Assignment::Site(0),
                7 => Assignment::Split(vec![(0, 0.5), (1, 0.5)]),
                _ => Assignment::Site(1),
            };
            voxel_map.store(p, assignment);
        }
        voxel_map
    }

    #[test]
    fn partition_multi_plane_reaches_second_shell() {
        let grid = grid();
        let pool = WorkerPool::new(Parallelism::Explicit(2));
        let polyhedra: Vec<Option<SitePolyhedron>> = vec![None, None];
        let electrides: Vec<ElectrideMask> = Vec::new();
        let centre = grid.index([5, 5, 5]);

        let narrow = GridPartitioner::new(&grid, &polyhedra, &electrides, &pool, 1);
        let mut voxel_map = second_shell(&grid, centre);
        narrow.multi_plane_pass(&mut voxel_map, false).unwrap();
        assert_eq!(voxel_map.voxel_get(centre), Voxel::Unresolved);

        let wide = GridPartitioner::new(&grid, &polyhedra, &electrides, &pool, 2);
        let mut voxel_map = second_shell(&grid, centre);
        wide.multi_plane_pass(&mut voxel_map, false).unwrap();
        // 25 votes at x = 3, 25 half votes at x = 7 and 48 for site 1
        match voxel_map.voxel_get(centre) {
            Voxel::Weight(weights) => {
                assert_eq!(weights.len(), 2);
                assert!((weights[0].1 - 37.5 / 98.).abs() < 1e-12);
                assert!((weights[1].1 - 60.5 / 98.).abs() < 1e-12);
            }
            state => panic!("centre voxel not split: {:?}", state),
        }
    }

    #[test]
    fn partition_near_plane_ignores_electrides() {
        let grid = grid();
        let pool = WorkerPool::new(Parallelism::Explicit(1));
        let a = [2.5, 0., 0.];
        let b = [7.5, 0., 0.];
        let polyhedra = vec![
            Some(SitePolyhedron {
                site: 0,
                planes: vec![
                    BondPlane::new(a, [-2.5, 0., 0.], 0.5, 1, [-1, 0, 0]),
                    BondPlane::new(a, b, 0.5, 1, [0, 0, 0]),
                ],
            }),
            Some(SitePolyhedron {
                site: 1,
                planes: vec![
                    BondPlane::new(b, a, 0.5, 0, [0, 0, 0]),
                    BondPlane::new(b, [12.5, 0., 0.], 0.5, 0, [1, 0, 0]),
                ],
            }),
            None,
        ];
        let electrides = vec![ElectrideMask {
            site: 2,
            density: Density::new(vec![0.; 1000], [10, 10, 10]).unwrap(),
        }];
        let partitioner = GridPartitioner::new(&grid, &polyhedra, &electrides, &pool, 2);
        let mut voxel_map = VoxelMap::new(grid.size.total);
        partitioner.primary_pass(&mut voxel_map, false).unwrap();
        // electride voxels on the far side of the plane at x = 5
        for p in 0..grid.size.total {
            if grid.to_3d(p)[0] == 7 {
                voxel_map.store(p, Assignment::Site(2));
            }
        }
        partitioner.near_plane_pass(&mut voxel_map, false).unwrap();
        assert_eq!(voxel_map.voxel_get(grid.index([6, 4, 4])), Voxel::Site(0));
    }
}
