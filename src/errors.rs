use std::fmt::{Debug, Display};

/// Errors raised while building or running a partition.
///
/// Input validation errors abort the run before any partitioning happens,
/// per-bond errors abort polyhedron construction and a failed chunk aborts
/// the pass it belongs to.
pub enum BadelfError {
    /// Two inputs that must share a shape do not.
    /// InputShapeMismatch(field, expected, found)
    InputShapeMismatch {
        field: String,
        expected: String,
        found: String,
    },
    /// The auxiliary density of an electride site could not be loaded.
    MissingElectrideData { site: usize, file: String },
    /// The bond line between a site and a neighbour has no interior minimum.
    DegenerateLocalMinimum {
        site: usize,
        neighbour: usize,
        image: [i32; 3],
    },
    /// The partitioned totals disagree with the raw totals.
    NonConservation {
        quantity: String,
        expected: f64,
        found: f64,
    },
    /// The cell vectors do not span a right-handed 3d space.
    InvalidLattice { volume: f64 },
    /// The grid cannot be used, ie. it has a zero length axis or overflows.
    InvalidGrid { grid: [usize; 3] },
    /// A non-electride site has no neighbours to build planes from.
    NoNeighbours { site: usize },
    /// A worker thread panicked.
    WorkerPanic { task: String },
}

impl Display for BadelfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputShapeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "Input shape mismatch for {}: expected {}, found {}.",
                field, expected, found
            ),
            Self::MissingElectrideData { site, file } => write!(
                f,
                "Unable to load the electride density for site {} from \"{}\".",
                site + 1,
                file
            ),
            Self::DegenerateLocalMinimum {
                site,
                neighbour,
                image,
            } => write!(
                f,
                "No interior minimum on the line between site {} and site {} (image {:?}).",
                site + 1,
                neighbour + 1,
                image
            ),
            Self::NonConservation {
                quantity,
                expected,
                found,
            } => write!(
                f,
                "Partitioned {} ({}) does not match the raw total ({}).",
                quantity, found, expected
            ),
            Self::InvalidLattice { volume } => write!(
                f,
                "Lattice doesn't span a right-handed 3D space (volume: {}).",
                volume
            ),
            Self::InvalidGrid { grid } => {
                write!(f, "Grid {:?} cannot be partitioned.", grid)
            }
            Self::NoNeighbours { site } => {
                write!(f, "Site {} has no neighbours to partition against.", site + 1)
            }
            Self::WorkerPanic { task } => {
                write!(f, "A worker thread panicked during {}.", task)
            }
        }
    }
}

impl Debug for BadelfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for BadelfError {}
