use badelf::analysis::Analysis;
use badelf::atoms::{Atoms, Lattice};
use badelf::classify::ElectrideMask;
use badelf::density::Density;
use badelf::errors::BadelfError;
use badelf::grid::Grid;
use badelf::neighbours::NeighbourStrategy;
use badelf::partition::{GridPartitioner, PartitionConfig};
use badelf::plane::build_polyhedra;
use badelf::pool::{Parallelism, WorkerPool};
use badelf::profile::Sampling;
use badelf::progress::HiddenBar;
use proptest::prelude::*;

const N: usize = 10;

fn lattice() -> Lattice {
    Lattice::new([[10., 0., 0.], [0., 10., 0.], [0., 0., 10.]]).unwrap()
}

/// Two sodium sites on the x axis, optionally with an electride site in the
/// middle of the cell.
fn slabs(electride: bool) -> Atoms {
    let mut elements = vec![String::from("Na")];
    let mut counts = vec![2];
    let mut positions = vec![[0.25, 0., 0.], [0.75, 0., 0.]];
    if electride {
        elements.push(String::from("He"));
        counts.push(1);
        positions.push([0.5, 0.5, 0.5]);
    }
    Atoms::new(lattice(), elements, counts, positions).unwrap()
}

/// An ELF varying only along x with minima at x = 0 and x = 5 Angstrom.
fn elf() -> Density {
    let data = (0..N * N * N)
        .map(|p| {
            let x = (p % N) as f64 / N as f64;
            (2. * std::f64::consts::PI * x).sin().powi(2)
        })
        .collect();
    Density::new(data, [N; 3]).unwrap()
}

fn uniform_charge() -> Density {
    Density::new(vec![1.; N * N * N], [N; 3]).unwrap()
}

fn config() -> PartitionConfig {
    PartitionConfig {
        neighbours: NeighbourStrategy::Fixed(2),
        sampling: Sampling::Rough,
        parallelism: Parallelism::Explicit(2),
        ..PartitionConfig::default()
    }
}

#[test]
fn partition_two_slabs() {
    let atoms = slabs(false);
    let analysis =
        Analysis::run(&atoms, &elf(), &uniform_charge(), &[], &config(), false).unwrap();
    // the x = 0 and x = 5 layers lie on the planes and are split in half
    assert_eq!(analysis.summary.near_plane, 200);
    assert_eq!(analysis.summary.primary, 800);
    assert_eq!(analysis.summary.unresolved, 0);
    assert_eq!(analysis.unresolved_charge, 0.);
    for site in 0..2 {
        assert!((analysis.volume[site] - 500.).abs() < 1e-9);
        assert!((analysis.charge[site] - 0.5).abs() < 1e-12);
        assert!((analysis.min_radius[site] - 2.5).abs() < 1e-9);
    }
    assert!((analysis.total_charge - 1.).abs() < 1e-12);
    assert_eq!(analysis.positions[1], [7.5, 0., 0.]);
}

#[test]
fn partition_electride_precedence() {
    let atoms = slabs(true);
    let mut mask = vec![0.; N * N * N];
    // voxel [3, 3, 3] sits well inside the first site's slab
    mask[2 + N * (2 + N * 2)] = 0.7;
    let electrides = vec![ElectrideMask {
        site: 2,
        density: Density::new(mask, [N; 3]).unwrap(),
    }];
    let analysis =
        Analysis::run(&atoms, &elf(), &uniform_charge(), &electrides, &config(), false)
            .unwrap();
    assert_eq!(analysis.summary.electride, 1);
    assert!((analysis.volume[2] - 1.).abs() < 1e-12);
    assert!((analysis.charge[2] - 1e-3).abs() < 1e-12);
    assert!((analysis.volume[0] - 499.).abs() < 1e-9);
    assert!((analysis.volume[1] - 500.).abs() < 1e-9);
    assert_eq!(analysis.min_radius[2], 0.);
}

#[test]
fn partition_conserves_charge() {
    let atoms = slabs(false);
    let charge = Density::new(
        (0..N * N * N).map(|p| 1. + (p % 7) as f64 * 0.125).collect(),
        [N; 3],
    )
    .unwrap();
    let analysis = Analysis::run(&atoms, &elf(), &charge, &[], &config(), false).unwrap();
    let expected = charge.sum() / (N * N * N) as f64;
    let found = analysis.charge.iter().sum::<f64>() + analysis.unresolved_charge;
    assert!((found - expected).abs() / expected < 1e-8);
    assert!((analysis.volume.iter().sum::<f64>() - 1000.).abs() < 1e-8);
}

#[test]
fn partition_grid_mismatch() {
    let atoms = slabs(false);
    let charge = Density::new(vec![1.; 8], [2, 2, 2]).unwrap();
    assert!(matches!(
        Analysis::run(&atoms, &elf(), &charge, &[], &config(), false),
        Err(BadelfError::InputShapeMismatch { .. })
    ));
}

#[test]
fn partition_rising_elf_is_degenerate() {
    let atoms = slabs(false);
    // rises along the whole bond between the two sites
    let ramp = Density::new(
        (0..N * N * N).map(|p| (p % N) as f64 / N as f64).collect(),
        [N; 3],
    )
    .unwrap();
    assert!(matches!(
        Analysis::run(&atoms, &ramp, &uniform_charge(), &[], &config(), false),
        Err(BadelfError::DegenerateLocalMinimum { .. })
    ));
}

#[test]
fn partition_flat_bond_is_degenerate() {
    let atoms = slabs(false);
    // 26 neighbours reach the images along y and z, where the ELF is constant
    let config = PartitionConfig {
        neighbours: NeighbourStrategy::Fixed(26),
        ..config()
    };
    assert!(matches!(
        Analysis::run(&atoms, &elf(), &uniform_charge(), &[], &config, false),
        Err(BadelfError::DegenerateLocalMinimum { .. })
    ));
}

#[test]
fn partition_two_slabs_voronoi() {
    let atoms = slabs(false);
    // minima at 0 and 5 Angstrom along every axis
    let s = |v: usize| (std::f64::consts::PI * v as f64 / 5.).sin().powi(2);
    let elf = Density::new(
        (0..N * N * N)
            .map(|p| s(p % N) + s((p / N) % N) + s(p / (N * N)))
            .collect(),
        [N; 3],
    )
    .unwrap();
    let config = PartitionConfig {
        neighbours: NeighbourStrategy::Voronoi { cutoff: 5. },
        ..config()
    };
    let analysis = Analysis::run(&atoms, &elf, &uniform_charge(), &[], &config, false).unwrap();
    assert_eq!(analysis.summary.unresolved, 0);
    for site in 0..2 {
        assert!((analysis.volume[site] - 500.).abs() < 1e-9);
        assert!((analysis.charge[site] - 0.5).abs() < 1e-12);
        assert!((analysis.min_radius[site] - 2.5).abs() < 1e-9);
    }
}

proptest! {
    #[test]
    fn partition_classify_periodic(
        x in 1isize..=10,
        y in 1isize..=10,
        z in 1isize..=10,
        i in -3isize..=3,
        j in -3isize..=3,
        k in -3isize..=3,
    ) {
        let atoms = slabs(false);
        let elf = elf();
        let grid = Grid::new([N; 3], &atoms.lattice).unwrap();
        let pool = WorkerPool::new(Parallelism::Explicit(1));
        let neighbours = NeighbourStrategy::Fixed(2)
            .finder()
            .all_neighbours(&atoms, &[])
            .unwrap();
        let polyhedra = build_polyhedra(
            &atoms,
            &elf,
            &grid,
            &neighbours,
            &[],
            Sampling::Rough,
            &pool,
            Box::new(HiddenBar {}),
        )
        .unwrap();
        let partitioner = GridPartitioner::new(&grid, &polyhedra, &[], &pool, 2);
        let n = N as isize;
        let home = partitioner.classify_voxel([x, y, z]);
        prop_assert_eq!(home, partitioner.classify_voxel([x + i * n, y + j * n, z + k * n]));
        // layers strictly between the planes belong to one site
        match x {
            2..=5 => prop_assert_eq!(home, Some(0)),
            7..=10 => prop_assert_eq!(home, Some(1)),
            _ => prop_assert_eq!(home, None),
        }
    }
}
