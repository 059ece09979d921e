use crate::atoms::Atoms;
use crate::errors::BadelfError;
use crate::utils::{add, norm, subtract};
use crate::voronoi::voronoi_faces;

/// Starting search radius for neighbour candidates in Angstrom.
pub const INITIAL_CUTOFF: f64 = 5.;
/// Fixed count searches stop growing the radius past this.
pub const MAX_CUTOFF: f64 = 50.;
/// The most candidates handed to the Voronoi face test.
pub const MAX_VORONOI_CANDIDATES: usize = 48;

/// A bonded neighbour of a site: another site (or another image of the same
/// site) shifted by a whole number of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbour {
    pub site: usize,
    pub neighbour: usize,
    pub image: [i32; 3],
    pub distance: f64,
}

impl Neighbour {
    /// Fractional position of the neighbour's image.
    pub fn fractional(&self, atoms: &Atoms) -> [f64; 3] {
        let image = [
            self.image[0] as f64,
            self.image[1] as f64,
            self.image[2] as f64,
        ];
        add(atoms.positions[self.neighbour], image)
    }

    /// Cartesian position of the neighbour's image.
    pub fn cartesian(&self, atoms: &Atoms) -> [f64; 3] {
        atoms.lattice.fractional_to_cartesian(self.fractional(atoms))
    }
}

/// Which neighbours a site builds planes against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NeighbourStrategy {
    /// The n nearest neighbours.
    Fixed(usize),
    /// Every neighbour within the cutoff sharing a Voronoi face with the site.
    Voronoi { cutoff: f64 },
}

impl Default for NeighbourStrategy {
    fn default() -> Self {
        Self::Fixed(26)
    }
}

impl NeighbourStrategy {
    pub fn finder(&self) -> Box<dyn NeighbourFinder> {
        match *self {
            Self::Fixed(count) => Box::new(FixedNeighbours { count }),
            Self::Voronoi { cutoff } => Box::new(VoronoiNeighbours { cutoff }),
        }
    }
}

/// Supplies the ordered neighbours of a site.
pub trait NeighbourFinder: Sync {
    fn neighbours(&self, atoms: &Atoms, site: usize) -> Vec<Neighbour>;

    /// The neighbours of every site, failing for a site that has none.
    fn all_neighbours(
        &self,
        atoms: &Atoms,
        skip: &[usize],
    ) -> Result<Vec<Vec<Neighbour>>, BadelfError> {
        (0..atoms.len())
            .map(|site| {
                if skip.contains(&site) {
                    return Ok(Vec::new());
                }
                let neighbours = self.neighbours(atoms, site);
                if neighbours.is_empty() {
                    Err(BadelfError::NoNeighbours { site })
                } else {
                    Ok(neighbours)
                }
            })
            .collect()
    }
}

/// Every periodic image of every site within cutoff of `site`, excluding the
/// site itself, sorted by distance then site then image.
pub fn candidates(atoms: &Atoms, site: usize, cutoff: f64) -> Vec<Neighbour> {
    let origin = atoms.cartesian(site);
    let spacing = atoms.lattice.plane_spacing();
    // fractional differences lie in (-1, 1) so one extra image is needed
    let reach = spacing.map(|s| (cutoff / s).ceil() as i32 + 1);
    let mut out = Vec::new();
    for (neighbour, position) in atoms.positions.iter().enumerate() {
        let base = atoms.lattice.fractional_to_cartesian(*position);
        for i in -reach[0]..=reach[0] {
            for j in -reach[1]..=reach[1] {
                for k in -reach[2]..=reach[2] {
                    let image = [i, j, k];
                    if neighbour == site && image == [0, 0, 0] {
                        continue;
                    }
                    let shifted = add(base, atoms.lattice.image_shift(image));
                    let distance = norm(subtract(shifted, origin));
                    if distance <= cutoff && distance > 0. {
                        out.push(Neighbour {
                            site,
                            neighbour,
                            image,
                            distance,
                        });
                    }
                }
            }
        }
    }
    out.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.neighbour.cmp(&b.neighbour))
            .then(a.image.cmp(&b.image))
    });
    out
}

/// The `count` nearest neighbours.
pub struct FixedNeighbours {
    pub count: usize,
}

impl NeighbourFinder for FixedNeighbours {
    fn neighbours(&self, atoms: &Atoms, site: usize) -> Vec<Neighbour> {
        let mut cutoff = INITIAL_CUTOFF;
        let mut found = candidates(atoms, site, cutoff);
        while found.len() < self.count && cutoff < MAX_CUTOFF {
            cutoff *= 1.5;
            found = candidates(atoms, site, cutoff);
        }
        found.truncate(self.count);
        found
    }
}

/// Neighbours sharing a face of the site's Voronoi cell. The search reaches
/// at least the longest cell vector whatever the cutoff.
pub struct VoronoiNeighbours {
    pub cutoff: f64,
}

impl NeighbourFinder for VoronoiNeighbours {
    fn neighbours(&self, atoms: &Atoms, site: usize) -> Vec<Neighbour> {
        // the site's own images along the cell vectors always bound the cell
        let lattice = &atoms.lattice;
        let cutoff = self
            .cutoff
            .max(lattice.a.max(lattice.b).max(lattice.c) * (1. + 1e-8));
        let mut found = candidates(atoms, site, cutoff);
        found.truncate(MAX_VORONOI_CANDIDATES);
        let origin = atoms.cartesian(site);
        let vectors = found
            .iter()
            .map(|n| subtract(n.cartesian(atoms), origin))
            .collect::<Vec<_>>();
        let faces = voronoi_faces(&vectors);
        found
            .into_iter()
            .enumerate()
            .filter_map(|(i, n)| if faces.contains(&i) { Some(n) } else { None })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Lattice;

    fn pair() -> Atoms {
        let lattice =
            Lattice::new([[10., 0., 0.], [0., 10., 0.], [0., 0., 10.]]).unwrap();
        Atoms::new(
            lattice,
            vec![String::from("Na")],
            vec![2],
            vec![[0.25, 0., 0.], [0.75, 0., 0.]],
        )
        .unwrap()
    }

    fn simple_cubic() -> Atoms {
        let lattice =
            Lattice::new([[3., 0., 0.], [0., 3., 0.], [0., 0., 3.]]).unwrap();
        Atoms::new(lattice, vec![String::from("Po")], vec![1], vec![[0.; 3]])
            .unwrap()
    }

    #[test]
    fn neighbours_candidates_sorted() {
        let atoms = pair();
        let found = candidates(&atoms, 0, 5.);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].image, [-1, 0, 0]);
        assert_eq!(found[1].image, [0, 0, 0]);
        assert!(found.iter().all(|n| n.neighbour == 1 && n.distance == 5.));
        assert_eq!(found[0].cartesian(&atoms), [-2.5, 0., 0.]);
    }

    #[test]
    fn neighbours_fixed_grows_cutoff() {
        let atoms = pair();
        let found = FixedNeighbours { count: 8 }.neighbours(&atoms, 0);
        assert_eq!(found.len(), 8);
        // after the two bonded images come the images of the site itself
        assert!(found[2..6].iter().all(|n| n.neighbour == 0));
    }

    #[test]
    fn neighbours_fixed_includes_self_images() {
        let atoms = simple_cubic();
        let found = FixedNeighbours { count: 6 }.neighbours(&atoms, 0);
        assert_eq!(found.len(), 6);
        assert!(found.iter().all(|n| n.neighbour == 0 && n.distance == 3.));
    }

    #[test]
    fn neighbours_voronoi_simple_cubic() {
        let atoms = simple_cubic();
        let found = VoronoiNeighbours { cutoff: 5. }.neighbours(&atoms, 0);
        assert_eq!(found.len(), 6);
        assert!(found.iter().all(|n| n.distance == 3.));
    }

    #[test]
    fn neighbours_voronoi_reaches_cell_vectors() {
        // within 5 Angstrom only the x neighbours are found, which leaves the
        // cell open along y and z
        let atoms = pair();
        let found = VoronoiNeighbours { cutoff: 5. }.neighbours(&atoms, 0);
        assert_eq!(found.len(), 6);
        assert_eq!(found.iter().filter(|n| n.neighbour == 1).count(), 2);
        let mut images = found
            .iter()
            .filter(|n| n.neighbour == 0)
            .map(|n| n.image)
            .collect::<Vec<_>>();
        images.sort();
        assert_eq!(
            images,
            vec![[0, -1, 0], [0, 0, -1], [0, 0, 1], [0, 1, 0]]
        );
    }

    #[test]
    fn neighbours_none_is_an_error() {
        let atoms = simple_cubic();
        let finder = FixedNeighbours { count: 0 };
        assert!(matches!(
            finder.all_neighbours(&atoms, &[]),
            Err(BadelfError::NoNeighbours { site: 0 })
        ));
        assert!(finder.all_neighbours(&atoms, &[0]).is_ok());
    }

    #[test]
    fn neighbours_strategy_default() {
        assert_eq!(NeighbourStrategy::default(), NeighbourStrategy::Fixed(26));
    }
}
