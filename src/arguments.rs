use crate::neighbours::NeighbourStrategy;
use crate::partition::{PartitionConfig, MULTI_PLANE_RADIUS, UNRESOLVED_WARNING};
use crate::pool::{Parallelism, DEFAULT_WORKER_MEMORY};
use crate::profile::Sampling;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::Path;

/// Default number of neighbours for the fixed strategy.
pub const FIXED_NEIGHBOURS: usize = 26;
/// Default search cutoff, in Angstrom, for the Voronoi strategy.
pub const VORONOI_CUTOFF: f64 = 5.;

/// Create a container for dealing with clap and being able to test arg parsing
pub enum ClapApp {
    App,
}

impl ClapApp {
    /// Create and return the clap::Command
    pub fn get(&self) -> Command<'static> {
        Command::new("BadELF Charge Partitioning")
            .version(env!("CARGO_PKG_VERSION"))
            .arg(Arg::new("directory")
                .index(1)
                .default_value(".")
                .help("The directory containing the calculation."))
            .arg(Arg::new("elf")
                .short('e')
                .long("elf")
                .takes_value(true)
                .default_value("ELFCAR")
                .help("The file containing the ELF."))
            .arg(Arg::new("charge")
                .short('c')
                .long("charge")
                .takes_value(true)
                .default_value("CHGCAR")
                .help("The file containing the charge density."))
            .arg(Arg::new("neighbours")
                .short('n')
                .long("neighbours")
                .takes_value(true)
                .value_parser(["fixed", "voronoi"])
                .default_value("fixed")
                .help("How to find the neighbours planes are built against.")
                .long_help(
"The \"fixed\" strategy builds planes against the nearest sites, set with
--count. The \"voronoi\" strategy searches every site within --cutoff and
keeps those sharing a face of the site's Voronoi cell, this is more accurate
for irregular structures but slower."))
            .arg(Arg::new("count")
                .long("count")
                .takes_value(true)
                .value_parser(value_parser!(usize))
                .default_value("26")
                .help("Number of neighbours for the fixed strategy."))
            .arg(Arg::new("cutoff")
                .long("cutoff")
                .takes_value(true)
                .value_parser(value_parser!(f64))
                .default_value("5.0")
                .help("Search cutoff, in Angstrom, for the Voronoi strategy.")
                .long_help(
"Sites within this distance are tested for a shared Voronoi face. The search
always reaches at least the longest cell vector so the cell is closed."))
            .arg(Arg::new("sampling")
                .short('s')
                .long("sampling")
                .takes_value(true)
                .value_parser(["rough", "fine", "auto"])
                .default_value("auto")
                .help("How finely to interpolate along each bond.")
                .long_help(
"The \"rough\" sampling uses trilinear interpolation along the whole bond and
\"fine\" refines the rough minimum with tricubic interpolation. The default
\"auto\" uses rough sampling for grids denser than 130000 voxels per cubic
Angstrom and fine otherwise."))
            .arg(Arg::new("threads")
                .short('J')
                .long("threads")
                .takes_value(true)
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Number of threads to distribute the calculation over.")
                .long_help(
"The number of threads to be used by the program. A default value of 0 is used
to allow the program to best decide how to use the available hardware."))
            .arg(Arg::new("memory")
                .short('m')
                .long("memory")
                .takes_value(true)
                .value_parser(value_parser!(f64))
                .help("Total memory, in GB, available to the workers.")
                .long_help(
"When the thread count is decided automatically it is capped by the total
memory divided by the memory of each worker. Without this the memory available
when the run starts is used."))
            .arg(Arg::new("worker memory")
                .long("worker-memory")
                .takes_value(true)
                .value_parser(value_parser!(f64))
                .default_value("2.0")
                .help("Memory, in GB, needed by each worker."))
            .arg(Arg::new("electride marker")
                .long("electride-marker")
                .takes_value(true)
                .default_value("He")
                .help("The element label marking electride sites."))
            .arg(Arg::new("multi plane radius")
                .long("multi-plane-radius")
                .takes_value(true)
                .value_parser(value_parser!(usize))
                .default_value("2")
                .help("Voxel radius polled for voxels no plane resolves."))
            .arg(Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .default_value("ACF.dat")
                .help("The file to write the charge report to."))
            .arg(Arg::new("quiet")
                .short('q')
                .long("quiet")
                .takes_value(false)
                .help("Hide the progress bars."))
    }
}

/// Holds the arguments passed to the program from the command-line
pub struct Args {
    pub directory: String,
    pub elf: String,
    pub charge: String,
    pub neighbours: NeighbourStrategy,
    pub sampling: Sampling,
    pub parallelism: Parallelism,
    pub electride_marker: String,
    pub multi_plane_radius: usize,
    pub output: String,
    pub quiet: bool,
}

impl Args {
    /// Initialises the structure from the command-line arguments.
    pub fn new(arguments: ArgMatches) -> Self {
        let string = |name: &str, default: &str| {
            arguments
                .get_one::<String>(name)
                .cloned()
                .unwrap_or_else(|| String::from(default))
        };
        let neighbours = match arguments.get_one::<String>("neighbours").map(String::as_str) {
            Some("voronoi") => NeighbourStrategy::Voronoi {
                cutoff: arguments
                    .get_one::<f64>("cutoff")
                    .copied()
                    .unwrap_or(VORONOI_CUTOFF),
            },
            _ => NeighbourStrategy::Fixed(
                arguments
                    .get_one::<usize>("count")
                    .copied()
                    .unwrap_or(FIXED_NEIGHBOURS),
            ),
        };
        let sampling = match arguments.get_one::<String>("sampling").map(String::as_str) {
            Some("rough") => Sampling::Rough,
            Some("fine") => Sampling::Fine,
            _ => Sampling::Auto,
        };
        let parallelism = match arguments.get_one::<usize>("threads").copied() {
            Some(threads) if threads > 0 => Parallelism::Explicit(threads),
            _ => Parallelism::Auto {
                memory_budget: arguments.get_one::<f64>("memory").copied(),
                worker_memory: arguments
                    .get_one::<f64>("worker memory")
                    .copied()
                    .unwrap_or(DEFAULT_WORKER_MEMORY),
            },
        };
        Self {
            directory: string("directory", "."),
            elf: string("elf", "ELFCAR"),
            charge: string("charge", "CHGCAR"),
            neighbours,
            sampling,
            parallelism,
            electride_marker: string("electride marker", "He"),
            multi_plane_radius: arguments
                .get_one::<usize>("multi plane radius")
                .copied()
                .unwrap_or(MULTI_PLANE_RADIUS),
            output: string("output", "ACF.dat"),
            quiet: arguments.is_present("quiet"),
        }
    }

    /// The path of a file inside the calculation directory.
    pub fn path(&self, filename: &str) -> String {
        Path::new(&self.directory)
            .join(filename)
            .to_string_lossy()
            .into_owned()
    }

    /// The auxiliary density file of an electride site, numbered from 1.
    pub fn electride_file(&self, site: usize) -> String {
        self.path(&format!("BvAt{:04}.dat", site + 1))
    }

    /// Where the charge report is written, inside the calculation directory.
    pub fn output_file(&self) -> String {
        self.path(&self.output)
    }

    /// The library configuration of the run.
    pub fn config(&self) -> PartitionConfig {
        PartitionConfig {
            neighbours: self.neighbours,
            sampling: self.sampling,
            parallelism: self.parallelism,
            multi_plane_radius: self.multi_plane_radius,
            unresolved_warning: UNRESOLVED_WARNING,
        }
    }
}
