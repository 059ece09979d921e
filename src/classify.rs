use crate::atoms::{Atoms, Lattice};
use crate::density::Density;
use crate::errors::BadelfError;
use crate::io::vasp::Vasp;
use crate::plane::SitePolyhedron;
use crate::utils::add;

/// The 27 whole-cell images in the order they are tried: the identity, then
/// shifts whose non-zero components share a sign, then mixed signs. Within
/// each group the order is x slowest, z fastest, counting up from -1.
pub fn image_order() -> Vec<[i32; 3]> {
    let mut same = vec![[0, 0, 0]];
    let mut mixed = Vec::with_capacity(12);
    for i in -1..=1 {
        for j in -1..=1 {
            for k in -1..=1 {
                let image = [i, j, k];
                if image == [0, 0, 0] {
                    continue;
                }
                if image.iter().all(|c| *c <= 0) || image.iter().all(|c| *c >= 0) {
                    same.push(image);
                } else {
                    mixed.push(image);
                }
            }
        }
    }
    same.extend(mixed);
    same
}

/// The auxiliary density of an electride site. A voxel with a non-zero value
/// belongs to the electride.
pub struct ElectrideMask {
    pub site: usize,
    pub density: Density,
}

impl ElectrideMask {
    pub fn flags(&self, p: usize) -> bool {
        self.density[p] != 0.
    }
}

/// Reads the mask of every site labelled `marker` from `filename(site)`. A
/// file that cannot be read, or that holds a different number of sites or a
/// different grid, is MissingElectrideData.
pub fn load_electride_masks<F>(
    atoms: &Atoms,
    grid: [usize; 3],
    marker: &str,
    filename: F,
) -> Result<Vec<ElectrideMask>, BadelfError>
where
    F: Fn(usize) -> String,
{
    atoms
        .electride_sites(marker)
        .into_iter()
        .map(|site| {
            let file = filename(site);
            let missing = || BadelfError::MissingElectrideData {
                site,
                file: file.clone(),
            };
            let (mask_atoms, density) = Vasp {}.read(&file).map_err(|_| missing())?;
            if mask_atoms.len() != atoms.len() || density.grid != grid {
                return Err(missing());
            }
            Ok(ElectrideMask { site, density })
        })
        .collect()
}

/// Loads the electride masks, falling back to no electride sites at all when
/// any of them is missing. The error behind a fallback is handed back so it
/// can be reported.
pub fn electride_masks_or_none<F>(
    atoms: &Atoms,
    grid: [usize; 3],
    marker: &str,
    filename: F,
) -> (Vec<ElectrideMask>, Option<BadelfError>)
where
    F: Fn(usize) -> String,
{
    match load_electride_masks(atoms, grid, marker, filename) {
        Ok(masks) => (masks, None),
        Err(e) => (Vec::new(), Some(e)),
    }
}

/// Decides which site's polyhedron a point lies in.
pub struct SiteClassifier<'a> {
    polyhedra: &'a [Option<SitePolyhedron>],
    /// Cartesian image shifts in the order of [`image_order`].
    shifts: Vec<[f64; 3]>,
}

impl<'a> SiteClassifier<'a> {
    pub fn new(polyhedra: &'a [Option<SitePolyhedron>], lattice: &Lattice) -> Self {
        let shifts = image_order()
            .into_iter()
            .map(|image| lattice.image_shift(image))
            .collect();
        Self { polyhedra, shifts }
    }

    /// Every atomic site whose polyhedron contains x.
    pub fn matches(&self, x: [f64; 3]) -> Vec<usize> {
        self.polyhedra
            .iter()
            .flatten()
            .filter(|polyhedron| polyhedron.contains(x))
            .map(|polyhedron| polyhedron.site)
            .collect()
    }

    /// The site containing x, if exactly one does.
    pub fn primary(&self, x: [f64; 3]) -> Option<usize> {
        let mut found = self
            .polyhedra
            .iter()
            .flatten()
            .filter(|polyhedron| polyhedron.contains(x));
        match (found.next(), found.next()) {
            (Some(polyhedron), None) => Some(polyhedron.site),
            _ => None,
        }
    }

    /// The first site containing an image of x, trying images in order.
    pub fn periodic(&self, x: [f64; 3]) -> Option<usize> {
        self.shifts.iter().find_map(|shift| {
            let image = add(x, *shift);
            self.polyhedra
                .iter()
                .flatten()
                .find(|polyhedron| polyhedron.contains(image))
                .map(|polyhedron| polyhedron.site)
        })
    }

    /// Primary classification with the periodic images as a fallback.
    pub fn classify(&self, x: [f64; 3]) -> Option<usize> {
        self.primary(x).or_else(|| self.periodic(x))
    }

    /// Does some image of x lie within `tolerance` of the inside of an atomic
    /// site's polyhedron?
    pub fn near_plane(&self, x: [f64; 3], tolerance: f64) -> bool {
        self.shifts.iter().any(|shift| {
            let image = add(x, *shift);
            self.polyhedra
                .iter()
                .flatten()
                .any(|polyhedron| polyhedron.outside_distance(image) <= tolerance)
        })
    }
}
