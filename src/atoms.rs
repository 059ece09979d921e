use crate::errors::BadelfError;
use crate::utils;

/// struct for containing the information about the sites of the structure
///
/// > lattice: Lattice - the lattice of the structure
/// > elements: Vec<String> - the element labels in the order they appear
/// > counts: Vec<usize> - the number of sites of each element
/// > positions: Vec<[f64; 3]> - the positions of the sites in fractional
/// >                            coordinates, wrapped into [0, 1)
#[derive(Debug)]
pub struct Atoms {
    pub lattice: Lattice,
    pub elements: Vec<String>,
    pub counts: Vec<usize>,
    pub positions: Vec<[f64; 3]>,
}

impl Atoms {
    /// initialises the structure, the element counts must cover every site
    pub fn new(
        lattice: Lattice,
        elements: Vec<String>,
        counts: Vec<usize>,
        positions: Vec<[f64; 3]>,
    ) -> Result<Self, BadelfError> {
        let total = counts.iter().sum::<usize>();
        if total != positions.len() || elements.len() != counts.len() {
            return Err(BadelfError::InputShapeMismatch {
                field: String::from("site count"),
                expected: format!("{} sites in {} elements", total, counts.len()),
                found: format!(
                    "{} sites in {} elements",
                    positions.len(),
                    elements.len()
                ),
            });
        }
        let positions = positions
            .into_iter()
            .map(|p| [p[0].rem_euclid(1.), p[1].rem_euclid(1.), p[2].rem_euclid(1.)])
            .collect();
        Ok(Self {
            lattice,
            elements,
            counts,
            positions,
        })
    }

    /// The number of sites.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The element label of every site.
    pub fn labels(&self) -> Vec<&str> {
        self.elements
            .iter()
            .zip(&self.counts)
            .flat_map(|(e, c)| std::iter::repeat(e.as_str()).take(*c))
            .collect()
    }

    /// The cartesian position of a site.
    pub fn cartesian(&self, site: usize) -> [f64; 3] {
        self.lattice.fractional_to_cartesian(self.positions[site])
    }

    /// The sites carrying the reserved electride marker label.
    pub fn electride_sites(&self, marker: &str) -> Vec<usize> {
        self.labels()
            .into_iter()
            .enumerate()
            .filter_map(|(i, label)| if label == marker { Some(i) } else { None })
            .collect()
    }
}

/// Lattice - structure for containing information on the cell
///
/// > a: f64 - length of the a-vector
/// > b: f64 - length of the b-vector
/// > c: f64 - length of the c-vector
/// > to_fractional: [[f64; 3]; 3] - transformation matrix for converting to fractional
/// >                                coordinates
/// > to_cartesian: [[f64; 3]; 3] - transformation matrix for converting to cartesian
/// >                               coordinates, the rows are the cell vectors
/// > volume: f64 - a.(b x c), always positive
#[derive(Clone, Debug)]
pub struct Lattice {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub to_fractional: [[f64; 3]; 3],
    pub to_cartesian: [[f64; 3]; 3],
    pub volume: f64,
}

impl Lattice {
    /// Initialises the structure. Builds all the fields of the lattice structure
    /// from a 2d vector in the form:
    ///
    /// > [
    /// >     [ax, ay, az],
    /// >     [bx, by, bz],
    /// >     [cx, cy, cz],
    /// >  ]
    pub fn new(lattice: [[f64; 3]; 3]) -> Result<Self, BadelfError> {
        let volume = utils::triple_product(&lattice);
        if volume <= 0. || !volume.is_finite() {
            return Err(BadelfError::InvalidLattice { volume });
        }
        let to_fractional = utils::invert_lattice(&lattice)
            .map_err(|_| BadelfError::InvalidLattice { volume })?;
        Ok(Self {
            a: utils::norm(lattice[0]),
            b: utils::norm(lattice[1]),
            c: utils::norm(lattice[2]),
            to_fractional,
            to_cartesian: lattice,
            volume,
        })
    }

    pub fn fractional_to_cartesian(&self, frac: [f64; 3]) -> [f64; 3] {
        utils::dot(frac, self.to_cartesian)
    }

    pub fn cartesian_to_fractional(&self, cart: [f64; 3]) -> [f64; 3] {
        utils::dot(cart, self.to_fractional)
    }

    /// The cartesian translation of a whole-cell image.
    pub fn image_shift(&self, image: [i32; 3]) -> [f64; 3] {
        self.fractional_to_cartesian([
            image[0] as f64,
            image[1] as f64,
            image[2] as f64,
        ])
    }

    /// The distance between opposite faces of the cell along each axis.
    pub fn plane_spacing(&self) -> [f64; 3] {
        let [a, b, c] = self.to_cartesian;
        [
            self.volume / utils::norm(utils::cross(b, c)),
            self.volume / utils::norm(utils::cross(c, a)),
            self.volume / utils::norm(utils::cross(a, b)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(a: f64) -> Lattice {
        Lattice::new([[a, 0., 0.], [0., a, 0.], [0., 0., a]]).unwrap()
    }

    #[test]
    fn atoms_new() {
        let atoms = Atoms::new(
            cubic(2.),
            vec![String::from("Na"), String::from("Cl")],
            vec![1, 1],
            vec![[0., 0., 0.], [1.5, -0.5, 0.5]],
        )
        .unwrap();
        assert_eq!(atoms.positions, vec![[0., 0., 0.], [0.5, 0.5, 0.5]]);
        assert_eq!(atoms.cartesian(1), [1., 1., 1.]);
        assert_eq!(atoms.labels(), vec!["Na", "Cl"]);
    }

    #[test]
    fn atoms_new_count_mismatch() {
        let atoms = Atoms::new(
            cubic(2.),
            vec![String::from("Na")],
            vec![2],
            vec![[0., 0., 0.]],
        );
        assert!(matches!(
            atoms,
            Err(BadelfError::InputShapeMismatch { .. })
        ));
    }

    #[test]
    fn atoms_electride_sites() {
        let atoms = Atoms::new(
            cubic(4.),
            vec![String::from("Ca"), String::from("He"), String::from("N")],
            vec![2, 2, 1],
            vec![[0.; 3], [0.5; 3], [0.25; 3], [0.75; 3], [0.1; 3]],
        )
        .unwrap();
        assert_eq!(atoms.electride_sites("He"), vec![2, 3]);
        assert!(atoms.electride_sites("Xe").is_empty());
    }

    #[test]
    fn lattice_new() {
        let lattice =
            Lattice::new([[1., 0., 0.], [0., 2., 0.], [0., 0., 2.]]).unwrap();
        assert_eq!(lattice.volume, 4.);
        assert_eq!(lattice.b, 2.);
        assert_eq!(lattice.plane_spacing(), [1., 2., 2.]);
    }

    #[test]
    fn lattice_new_non_invert() {
        let lattice = Lattice::new([[1., 0., 0.], [1., 0., 0.], [0., 0., 2.]]);
        assert!(matches!(lattice, Err(BadelfError::InvalidLattice { .. })));
    }

    #[test]
    fn lattice_new_left_handed() {
        let lattice = Lattice::new([[0., 1., 0.], [1., 0., 0.], [0., 0., 1.]]);
        assert!(lattice.is_err());
    }

    #[test]
    fn lattice_round_trip() {
        let lattice =
            Lattice::new([[3., 3., 0.], [-3., 3., 0.], [1., 1., 1.]]).unwrap();
        let frac = [0.2, 0.7, 0.4];
        let back = lattice
            .cartesian_to_fractional(lattice.fractional_to_cartesian(frac));
        for i in 0..3 {
            assert!((back[i] - frac[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn lattice_image_shift() {
        let lattice = cubic(3.);
        assert_eq!(lattice.image_shift([1, -1, 0]), [3., -3., 0.]);
    }
}
