use crate::atoms::Atoms;
use crate::classify::ElectrideMask;
use crate::density::Density;
use crate::errors::BadelfError;
use crate::grid::Grid;
use crate::partition::{GridPartitioner, PartitionConfig, PassSummary};
use crate::plane::{build_polyhedra, SitePolyhedron};
use crate::pool::WorkerPool;
use crate::progress::{bar, ProgressBar};
use crate::voxel_map::{Voxel, VoxelMap};

/// Relative difference allowed between partitioned and raw totals.
pub const CONSERVATION_TOLERANCE: f64 = 1e-8;

/// The charge and volume of every site.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteTotals {
    /// Normalised by the number of voxels.
    pub charge: Vec<f64>,
    pub volume: Vec<f64>,
    /// The normalised charge of voxels no pass resolved.
    pub unresolved_charge: f64,
    pub unresolved_volume: f64,
}

impl SiteTotals {
    fn new(sites: usize) -> Self {
        Self {
            charge: vec![0.; sites],
            volume: vec![0.; sites],
            unresolved_charge: 0.,
            unresolved_volume: 0.,
        }
    }

    /// Adds another set of totals to this one.
    fn merge(mut self, other: Self) -> Self {
        self.charge
            .iter_mut()
            .zip(other.charge)
            .for_each(|(a, b)| *a += b);
        self.volume
            .iter_mut()
            .zip(other.volume)
            .for_each(|(a, b)| *a += b);
        self.unresolved_charge += other.unresolved_charge;
        self.unresolved_volume += other.unresolved_volume;
        self
    }

    fn scale(mut self, charge: f64, volume: f64) -> Self {
        self.charge.iter_mut().for_each(|c| *c *= charge);
        self.volume.iter_mut().for_each(|v| *v *= volume);
        self.unresolved_charge *= charge;
        self.unresolved_volume *= volume;
        self
    }
}

/// Sums the charge and volume of every site. Split voxels contribute their
/// weight of both, unresolved voxels are kept apart. Charges are divided by
/// the number of voxels.
pub fn sum_site_densities(
    voxel_map: &VoxelMap,
    charge: &Density,
    grid: &Grid,
    sites: usize,
    pool: &WorkerPool,
    progress_bar: Box<dyn ProgressBar>,
) -> Result<SiteTotals, BadelfError> {
    let pbar = &progress_bar;
    let chunks = pool.map_ranges(voxel_map.len(), "charge summation", |range| {
        let mut totals = SiteTotals::new(sites);
        for p in range {
            let record = voxel_map.record(p, grid, charge[p]);
            match record.state {
                Voxel::Site(site) => {
                    totals.charge[site] += record.charge;
                    totals.volume[site] += 1.;
                }
                Voxel::Weight(weights) => {
                    for (site, weight) in weights.iter() {
                        totals.charge[*site] += record.charge * weight;
                        totals.volume[*site] += weight;
                    }
                }
                Voxel::Unresolved => {
                    totals.unresolved_charge += record.charge;
                    totals.unresolved_volume += 1.;
                }
            }
            pbar.tick();
        }
        Ok(totals)
    })?;
    let totals = chunks
        .into_iter()
        .fold(SiteTotals::new(sites), SiteTotals::merge);
    Ok(totals.scale(1. / grid.size.total as f64, grid.voxel_volume()))
}

fn relative_difference(expected: f64, found: f64) -> f64 {
    (found - expected).abs() / expected.abs().max(1.)
}

/// Checks the partitioned charge and volume, unresolved included, against
/// the raw totals.
pub fn check_conservation(
    totals: &SiteTotals,
    charge: &Density,
    grid: &Grid,
) -> Result<(), BadelfError> {
    let expected = charge.sum() / grid.size.total as f64;
    let found = totals.charge.iter().sum::<f64>() + totals.unresolved_charge;
    if relative_difference(expected, found) > CONSERVATION_TOLERANCE {
        return Err(BadelfError::NonConservation {
            quantity: String::from("charge"),
            expected,
            found,
        });
    }
    let expected = grid.lattice.volume;
    let found = totals.volume.iter().sum::<f64>() + totals.unresolved_volume;
    if relative_difference(expected, found) > CONSERVATION_TOLERANCE {
        return Err(BadelfError::NonConservation {
            quantity: String::from("volume"),
            expected,
            found,
        });
    }
    Ok(())
}

/// The result of a full partition run.
pub struct Analysis {
    /// Cartesian position of every site.
    pub positions: Vec<[f64; 3]>,
    pub charge: Vec<f64>,
    pub volume: Vec<f64>,
    /// Smallest bond-plane radius, 0 for electride sites.
    pub min_radius: Vec<f64>,
    /// Sum of the site charges.
    pub total_charge: f64,
    pub unresolved_charge: f64,
    pub summary: PassSummary,
    pub threads: usize,
}

impl Analysis {
    /// Partitions `elf` into site regions and integrates `charge` over them.
    ///
    /// Every grid must share the ELF grid. Sites listed in `electrides` are
    /// assigned only through their masks.
    pub fn run(
        atoms: &Atoms,
        elf: &Density,
        charge: &Density,
        electrides: &[ElectrideMask],
        config: &PartitionConfig,
        visible: bool,
    ) -> Result<Self, BadelfError> {
        check_shape("charge density grid", elf.grid, charge.grid)?;
        for mask in electrides.iter() {
            check_shape(
                &format!("electride {} grid", mask.site + 1),
                elf.grid,
                mask.density.grid,
            )?;
            if mask.site >= atoms.len() {
                return Err(BadelfError::InputShapeMismatch {
                    field: String::from("electride site"),
                    expected: format!("a site below {}", atoms.len() + 1),
                    found: format!("{}", mask.site + 1),
                });
            }
        }
        let grid = Grid::new(elf.grid, &atoms.lattice)?;
        let pool = WorkerPool::new(config.parallelism);
        let electride_sites = electrides.iter().map(|m| m.site).collect::<Vec<_>>();
        let neighbours = config
            .neighbours
            .finder()
            .all_neighbours(atoms, &electride_sites)?;
        let polyhedra = build_polyhedra(
            atoms,
            elf,
            &grid,
            &neighbours,
            &electride_sites,
            config.sampling,
            &pool,
            bar(atoms.len(), "Building Polyhedra: ", visible),
        )?;
        let partitioner = GridPartitioner::new(
            &grid,
            &polyhedra,
            electrides,
            &pool,
            config.multi_plane_radius,
        );
        let (voxel_map, summary) = partitioner.partition(visible)?;
        let totals = sum_site_densities(
            &voxel_map,
            charge,
            &grid,
            atoms.len(),
            &pool,
            bar(grid.size.total, "Summing Charge: ", visible),
        )?;
        check_conservation(&totals, charge, &grid)?;
        Ok(Self {
            positions: (0..atoms.len()).map(|i| atoms.cartesian(i)).collect(),
            total_charge: totals.charge.iter().sum(),
            min_radius: min_radii(&polyhedra),
            charge: totals.charge,
            volume: totals.volume,
            unresolved_charge: totals.unresolved_charge,
            summary,
            threads: pool.threads,
        })
    }
}

/// The smallest bond radius of every site, 0 without a polyhedron.
pub fn min_radii(polyhedra: &[Option<SitePolyhedron>]) -> Vec<f64> {
    polyhedra
        .iter()
        .map(|p| p.as_ref().map_or(0., |p| p.min_radius()))
        .collect()
}

fn check_shape(field: &str, expected: [usize; 3], found: [usize; 3]) -> Result<(), BadelfError> {
    if expected != found {
        return Err(BadelfError::InputShapeMismatch {
            field: String::from(field),
            expected: format!("{:?}", expected),
            found: format!("{:?}", found),
        });
    }
    Ok(())
}
