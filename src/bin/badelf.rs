use anyhow::{Context, Result};
use badelf::analysis::Analysis;
use badelf::arguments::{Args, ClapApp};
use badelf::classify::electride_masks_or_none;
use badelf::errors::BadelfError;
use badelf::io::{self, vasp::Vasp};
use badelf::partition::PassSummary;
use std::time::Instant;

fn print_summary(summary: &PassSummary) {
    println!("Voxels assigned by each pass:");
    println!("  Electride:   {:>12}", summary.electride);
    println!("  Primary:     {:>12}", summary.primary);
    println!("  Periodic:    {:>12}", summary.periodic);
    println!("  Near-plane:  {:>12}", summary.near_plane);
    println!("  Multi-plane: {:>12}", summary.multi_plane);
    println!("  Unresolved:  {:>12}", summary.unresolved);
}

fn main() -> Result<()> {
    // argument parsing
    let app = ClapApp::App.get();
    let args = Args::new(app.get_matches());
    // print splash
    println!("BadELF Charge Partitioning ({})", env!("CARGO_PKG_VERSION"));
    let config = args.config();
    println!("Running on {} threads.", config.parallelism.threads());
    // read the ELF and charge density, they must describe the same structure
    let elf_file = args.path(&args.elf);
    let (atoms, elf) = Vasp {}.read(&elf_file)?;
    println!("Read {} sites on a {:?} grid from {}.", atoms.len(), elf.grid, elf_file);
    let charge_file = args.path(&args.charge);
    let (charge_atoms, charge) = Vasp {}.read(&charge_file)?;
    if charge_atoms.len() != atoms.len() {
        return Err(BadelfError::InputShapeMismatch {
            field: format!("site count of {}", charge_file),
            expected: format!("{}", atoms.len()),
            found: format!("{}", charge_atoms.len()),
        }
        .into());
    }
    println!("Read charge density from {}.", charge_file);
    let (electrides, missing) = electride_masks_or_none(
        &atoms,
        elf.grid,
        &args.electride_marker,
        |site| args.electride_file(site),
    );
    if let Some(e) = missing {
        eprintln!("Warning: {} Continuing without electride sites.", e);
    }
    if !electrides.is_empty() {
        println!("Found {} electride sites.", electrides.len());
    }
    let start = Instant::now();
    let analysis = Analysis::run(&atoms, &elf, &charge, &electrides, &config, !args.quiet)
        .context("Partitioning failed")?;
    println!("Partitioned in {:.2}s.", start.elapsed().as_secs_f64());
    print_summary(&analysis.summary);
    if analysis.summary.unresolved_fraction() > config.unresolved_warning {
        eprintln!(
            "Warning: {} voxels ({:.3}% of the grid) could not be assigned, holding {:.6} electrons.",
            analysis.summary.unresolved,
            analysis.summary.unresolved_fraction() * 100.,
            analysis.unresolved_charge
        );
    }
    let atoms_charge_file = io::output::partitions_file(&analysis);
    // check that the write was successfull
    let output = args.output_file();
    io::output::write(atoms_charge_file, &output)?;
    println!("Wrote {}.", output);
    Ok(())
}
