use crate::atoms::Atoms;
use crate::density::Density;
use crate::errors::BadelfError;
use crate::grid::Grid;
use crate::neighbours::Neighbour;
use crate::pool::WorkerPool;
use crate::profile::{LineProfiler, Sampling};
use crate::progress::ProgressBar;
use crate::utils::{lerp, norm, subtract, vdot};

/// Relative tolerance for a point to lie on a plane.
pub const ON_PLANE_TOLERANCE: f64 = 1e-8;

/// Which side of a plane a point lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Positive,
    Negative,
    On,
}

/// The half-space dividing a site from one of its neighbours, passing
/// through the minimum of the bond line with the bond as its normal.
#[derive(Clone, Debug)]
pub struct BondPlane {
    pub neighbour: usize,
    pub image: [i32; 3],
    /// Cartesian position of the bond minimum.
    pub point: [f64; 3],
    pub normal: [f64; 3],
    /// The side the owning site lies on.
    pub inside: Side,
    /// Distance from the owning site to the bond minimum.
    pub radius: f64,
}

impl BondPlane {
    /// Builds the plane from the cartesian ends of the bond and the position
    /// of the minimum along it.
    pub fn new(
        site: [f64; 3],
        neighbour_position: [f64; 3],
        fraction: f64,
        neighbour: usize,
        image: [i32; 3],
    ) -> Self {
        let point = lerp(site, neighbour_position, fraction);
        let normal = subtract(neighbour_position, site);
        let mut plane = Self {
            neighbour,
            image,
            point,
            normal,
            inside: Side::On,
            radius: norm(subtract(site, point)),
        };
        plane.inside = plane.side(site);
        plane
    }

    /// Evaluates normal.(x - point).
    pub fn evaluate(&self, x: [f64; 3]) -> f64 {
        vdot(self.normal, subtract(x, self.point))
    }

    pub fn side(&self, x: [f64; 3]) -> Side {
        let value = self.evaluate(x);
        if value.abs() <= ON_PLANE_TOLERANCE * norm(self.normal) {
            Side::On
        } else if value > 0. {
            Side::Positive
        } else {
            Side::Negative
        }
    }

    /// Is x strictly on the owning site's side?
    pub fn contains(&self, x: [f64; 3]) -> bool {
        self.side(x) == self.inside
    }

    /// Signed distance of x from the plane, positive away from the site.
    pub fn outward_distance(&self, x: [f64; 3]) -> f64 {
        let distance = self.evaluate(x) / norm(self.normal);
        match self.inside {
            Side::Positive => -distance,
            _ => distance,
        }
    }
}

/// The convex region of a site: the intersection of its bond half-spaces.
#[derive(Clone, Debug)]
pub struct SitePolyhedron {
    pub site: usize,
    pub planes: Vec<BondPlane>,
}

impl SitePolyhedron {
    pub fn contains(&self, x: [f64; 3]) -> bool {
        self.planes.iter().all(|plane| plane.contains(x))
    }

    /// How far x lies outside the polyhedron's furthest plane, negative if
    /// it is inside all of them.
    pub fn outside_distance(&self, x: [f64; 3]) -> f64 {
        self.planes
            .iter()
            .map(|plane| plane.outward_distance(x))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// The smallest bond radius.
    pub fn min_radius(&self) -> f64 {
        self.planes
            .iter()
            .map(|plane| plane.radius)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Profiles the bonds of one site and builds its polyhedron. Neighbours that
/// are electride sites do not bound the polyhedron.
pub fn site_polyhedron(
    site: usize,
    neighbours: &[Neighbour],
    atoms: &Atoms,
    grid: &Grid,
    profiler: &LineProfiler,
    electrides: &[usize],
) -> Result<SitePolyhedron, BadelfError> {
    let site_cartesian = atoms.cartesian(site);
    let site_voxel = grid.fractional_to_voxel(atoms.positions[site]);
    let mut planes = Vec::with_capacity(neighbours.len());
    for n in neighbours.iter() {
        if electrides.contains(&n.neighbour) {
            continue;
        }
        let neighbour_voxel = grid.fractional_to_voxel(n.fractional(atoms));
        let minimum = profiler.profile(site_voxel, neighbour_voxel).ok_or(
            BadelfError::DegenerateLocalMinimum {
                site,
                neighbour: n.neighbour,
                image: n.image,
            },
        )?;
        planes.push(BondPlane::new(
            site_cartesian,
            n.cartesian(atoms),
            minimum.fraction,
            n.neighbour,
            n.image,
        ));
    }
    if planes.is_empty() {
        return Err(BadelfError::NoNeighbours { site });
    }
    Ok(SitePolyhedron { site, planes })
}

/// Builds the polyhedron of every atomic site in parallel. Electride sites get
/// None. A bond without an interior minimum fails the whole build.
#[allow(clippy::too_many_arguments)]
pub fn build_polyhedra(
    atoms: &Atoms,
    elf: &Density,
    grid: &Grid,
    neighbours: &[Vec<Neighbour>],
    electrides: &[usize],
    sampling: Sampling,
    pool: &WorkerPool,
    progress_bar: Box<dyn ProgressBar>,
) -> Result<Vec<Option<SitePolyhedron>>, BadelfError> {
    let profiler = LineProfiler::new(elf, grid, sampling);
    let pbar = &progress_bar;
    let chunks = pool.map_ranges(atoms.len(), "polyhedron construction", |range| {
        range
            .map(|site| {
                let polyhedron = if electrides.contains(&site) {
                    None
                } else {
                    Some(site_polyhedron(
                        site,
                        &neighbours[site],
                        atoms,
                        grid,
                        &profiler,
                        electrides,
                    )?)
                };
                pbar.tick();
                Ok(polyhedron)
            })
            .collect::<Result<Vec<_>, BadelfError>>()
    })?;
    Ok(chunks.into_iter().flatten().collect())
}
