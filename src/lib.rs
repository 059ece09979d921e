//! A multi-threaded charge partitioning binary and library that divides a
//! crystal's charge density between its sites using the electron
//! localisation function (ELF). Bonds are cut by planes through the ELF
//! minimum along each bond, every voxel is assigned to the site whose plane
//! polyhedron contains it and the charge density is integrated over the
//! resulting regions. Electride sites, which hold electrons without a
//! nucleus, are assigned through their own density masks.
//!
//! ### Supported Platforms
//! - Linux
//! - Os X
//! - Windows
//!
//! ## Installing the binary
//! ### From Source
//! Running the following will create the ./target/release/badelf executable.
//! ```sh
//! $ cargo build --verbose --release
//! ```
//! From here you can either move or link the binary to folder in your path.
//! ```sh
//! $ mv ./target/release/badelf ~/bin
//! ```
//!
//! ## Usage
//! The program reads an ELFCAR and a CHGCAR from a VASP calculation, both on
//! the same grid. Electride sites are labelled with a marker element (He by
//! default) in the structure and their masks are read from BvAt####.dat files,
//! numbered from 1 by site.
//! ```sh
//! $ badelf path/to/calculation
//! ```
//! The neighbours planes are built against can be the nearest few sites or
//! every site sharing a Voronoi face.
//! ```sh
//! $ badelf -n voronoi --cutoff 6
//! ```
//! For a detailed list of usage options run
//! ```sh
//! $ badelf --help
//! ```
//! ## Output
//! The program writes the Atomic Charge File (ACF.dat) containing the
//! position, charge, minimum partition radius and volume of every site.
//! ## License
//! MIT

/// Integrates the charge density over the partitioned grid and runs the whole
/// pipeline through [Analysis](analysis::Analysis).
pub mod analysis;
/// For parsing command-line arguments.
pub mod arguments;
/// Contains [Atoms](atoms::Atoms) for storing the relevant data on the sites
/// in the calculation. Also contains [Lattice](atoms::Lattice) for storing
/// information about the cell in which the density is stored.
pub mod atoms;
/// Finds the site whose polyhedron contains a point, and electride masks.
pub mod classify;
/// Scalar fields sampled on the grid and their interpolation.
pub mod density;
/// Provides custom errors types.
pub mod errors;
/// Contains [Grid](grid::Grid) for managing the movement around the grid on
/// which the density is stored.
pub mod grid;
/// Handles the File I/O for both the density files and result file.
pub mod io;
/// Finds the neighbours of each site that bond planes are built against.
pub mod neighbours;
/// The five pass assignment of voxels to sites.
pub mod partition;
/// Bond planes and the polyhedra they bound.
pub mod plane;
/// A scoped worker pool for the data parallel passes.
pub mod pool;
/// Finds the ELF minimum along a bond.
pub mod profile;
/// Provides a [visible](progress::Bar) and [hidden](progress::HiddenBar) implementation of the
/// trait [ProgressBar](progress::ProgressBar).
pub mod progress;
/// Misc functions mainly for vector and matrix manipulation.
pub mod utils;
/// Vertex enumeration of a site's Voronoi cell.
pub mod voronoi;
/// Provides the [VoxelMap](voxel_map::VoxelMap) for storing the site or
/// weights of partitioned voxels.
pub mod voxel_map;
