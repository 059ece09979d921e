use crate::atoms::{Atoms, Lattice};
use crate::density::Density;
use crate::utils;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::str::Lines;

/// The coordinate system.
enum Coord {
    /// Fractional coordinates.
    Fractional,
    /// Cartesian coordinates.
    Cartesian,
}

/// The VASP file format for reading ELFCARs, CHGCARs and the BvAt####.dat
/// electride densities.
///
/// Only the first volumetric block is read, any augmentation occupancies or
/// spin densities following it are ignored. Values are returned as stored,
/// in file order with x fastest.
pub struct Vasp {}

impl Vasp {
    /// Read the structure and first volumetric block of a file.
    pub fn read(&self, filename: &str) -> Result<(Atoms, Density)> {
        let text = std::fs::read_to_string(filename)
            .with_context(|| format!("Unable to read \"{}\".", filename))?;
        self.parse(&text)
            .with_context(|| format!("Unable to parse \"{}\".", filename))
    }

    /// Parse the contents of a file.
    pub fn parse(&self, text: &str) -> Result<(Atoms, Density)> {
        let mut lines = text.lines();
        let atoms = self.to_atoms(&mut lines)?;
        // the structure is separated from the grid by a blank line
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
        }
        let grid_line = lines.next().context("Missing grid dimensions.")?;
        let grid = parse_values::<usize>(grid_line, "grid dimensions")?;
        let grid: [usize; 3] = match grid.as_slice() {
            [x, y, z, ..] => [*x, *y, *z],
            _ => bail!("Grid line needs three dimensions: \"{}\".", grid_line),
        };
        let total = grid[0] * grid[1] * grid[2];
        let mut data = Vec::with_capacity(total);
        'lines: for line in lines {
            for value in line.split_whitespace() {
                if data.len() == total {
                    break 'lines;
                }
                data.push(
                    value
                        .parse::<f64>()
                        .with_context(|| format!("Invalid density value \"{}\".", value))?,
                );
            }
            if data.len() == total {
                break;
            }
        }
        if data.len() != total {
            bail!(
                "Expected {} density values for grid {:?}, found {}.",
                total,
                grid,
                data.len()
            );
        }
        Ok((atoms, Density::new(data, grid)?))
    }

    /// Read atom information.
    fn to_atoms(&self, lines: &mut Lines) -> Result<Atoms> {
        let element_regex = Regex::new(r"^\s*[A-Za-z]")?;
        let selective_regex = Regex::new(r"(?i)^\s*s")?;
        let direct_regex = Regex::new(r"(?i)^\s*d")?;
        // skip the comment line and then read the lattice information
        let _ = lines.next().context("Empty file.")?;
        let scale =
            parse_values::<f64>(lines.next().context("Missing scale.")?, "scale")?;
        let mut lattice = [[0f64; 3]; 3];
        for (i, vector) in lattice.iter_mut().enumerate() {
            let line = lines.next().context("Missing lattice vectors.")?;
            match parse_values::<f64>(line, "lattice vector")?.as_slice() {
                [x, y, z, ..] => *vector = [*x, *y, *z],
                _ => bail!("Lattice vector {} needs three values: \"{}\".", i + 1, line),
            }
        }
        // a negative scale is the volume of the cell, three are per-axis factors
        let volume = utils::triple_product(&lattice).abs();
        let scale: [f64; 3] = match scale.as_slice() {
            [s] if *s < 0. => [(-s / volume).cbrt(); 3],
            [s] => [*s; 3],
            [x, y, z] => [*x, *y, *z],
            _ => bail!("Scale must be one or three values."),
        };
        for vector in lattice.iter_mut() {
            for (v, s) in vector.iter_mut().zip(&scale) {
                *v *= s;
            }
        }
        let lattice = Lattice::new(lattice)?;
        // the element line is optional
        let line = lines.next().context("Missing site counts.")?;
        let (elements, line) = if element_regex.is_match(line) {
            let elements = line
                .split_whitespace()
                .map(String::from)
                .collect::<Vec<String>>();
            (elements, lines.next().context("Missing site counts.")?)
        } else {
            (Vec::new(), line)
        };
        let counts = parse_values::<usize>(line, "site counts")?;
        let elements = if elements.len() == counts.len() {
            elements
        } else {
            (1..=counts.len()).map(|i| format!("X{}", i)).collect()
        };
        let mut line = lines.next().context("Missing coordinate system.")?;
        if selective_regex.is_match(line) {
            line = lines.next().context("Missing coordinate system.")?;
        }
        let coord = if direct_regex.is_match(line) {
            Coord::Fractional
        } else {
            Coord::Cartesian
        };
        let total_sites = counts.iter().sum::<usize>();
        let mut positions = Vec::with_capacity(total_sites);
        for i in 0..total_sites {
            let line = lines
                .next()
                .with_context(|| format!("Missing position of site {}.", i + 1))?;
            let values = line
                .split_whitespace()
                .take(3)
                .map(|x| x.parse::<f64>().ok())
                .collect::<Option<Vec<f64>>>();
            let p = match values.as_deref() {
                Some([x, y, z]) => [*x, *y, *z],
                _ => bail!("Invalid position of site {}: \"{}\".", i + 1, line.trim()),
            };
            positions.push(match coord {
                Coord::Fractional => p,
                Coord::Cartesian => lattice.cartesian_to_fractional([
                    p[0] * scale[0],
                    p[1] * scale[1],
                    p[2] * scale[2],
                ]),
            });
        }
        Ok(Atoms::new(lattice, elements, counts, positions)?)
    }
}

/// Parses every whitespace separated value of a line.
fn parse_values<T: std::str::FromStr>(line: &str, field: &str) -> Result<Vec<T>> {
    line.split_whitespace()
        .map(|x| {
            x.parse::<T>()
                .ok()
                .with_context(|| format!("Invalid {}: \"{}\".", field, line.trim()))
        })
        .collect()
}
