use crate::analysis::Analysis;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;

const HEADER: &str =
    "    #         X           Y           Z       CHARGE      MIN DIST   ATOMIC VOL\n";

/// The dashed rule above and below the site rows.
fn separator() -> String {
    format!(" {}\n", "-".repeat(80))
}

/// Builds the atomic charge file: one row per site with its Cartesian
/// position, charge, minimum partition radius and volume, followed by the
/// vacuum lines and the electron count.
///
/// The column widths match the ACF.dat files of other grid based charge
/// partitioning codes so existing tooling can read the report.
pub fn partitions_file(analysis: &Analysis) -> String {
    let mut file = String::from(HEADER);
    file.push_str(&separator());
    for (i, position) in analysis.positions.iter().enumerate() {
        file.push_str(&format!(
            "{:>5}{:>12.6}{:>12.6}{:>12.6}{:>12.6}{:>13.6}{:>13.6}\n",
            i + 1,
            position[0],
            position[1],
            position[2],
            analysis.charge[i],
            analysis.min_radius[i],
            analysis.volume[i]
        ));
    }
    file.push_str(&separator());
    file.push_str(&footer(analysis));
    file
}

/// Nothing is ever classed as vacuum, every voxel goes to a site.
fn footer(analysis: &Analysis) -> String {
    format!(
        "    VACUUM CHARGE:{:>21.4}\n    VACUUM VOLUME:{:>21.4}\n    NUMBER OF ELECTRONS:{:>15.4}\n",
        0.,
        0.,
        analysis.total_charge
    )
}

/// Write the file
///
/// * `contents`: The contents of the report.
/// * `filename`: Where to write it.
pub fn write(contents: String, filename: &str) -> Result<()> {
    let mut file = File::create(filename)
        .with_context(|| format!("Unable to create \"{}\".", filename))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Unable to write \"{}\".", filename))?;
    Ok(())
}
