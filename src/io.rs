//! Reading the volumetric inputs and writing the charge report.
//!
//! The ELF, the charge density and any electride densities all come in the
//! same VASP volumetric layout, so a single reader serves every input.

/// For writing the atomic charge file.
pub mod output;
/// For reading VASP volumetric files.
pub mod vasp;
