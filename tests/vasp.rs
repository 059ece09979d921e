#[cfg(test)]
mod tests {
    use badelf::arguments::{Args, ClapApp};
    use badelf::atoms::Atoms;
    use badelf::classify::{electride_masks_or_none, load_electride_masks};
    use badelf::errors::BadelfError;
    use badelf::io::vasp::Vasp;

    fn calculation() -> (Args, Atoms) {
        let app = ClapApp::App.get();
        let args = Args::new(app.get_matches_from(vec!["badelf", "tests/vasp"]));
        let (atoms, _) = Vasp {}.read(&args.path(&args.elf)).unwrap();
        (args, atoms)
    }

    #[test]
    fn vasp_read_elfcar() {
        let vasp = Vasp {};
        let (atoms, elf) = match vasp.read("tests/vasp/ELFCAR") {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        };
        assert_eq!(elf.grid, [2, 2, 2]);
        assert_eq!(atoms.lattice.volume, 64.);
        assert_eq!(atoms.positions, vec![[0., 0., 0.], [0.5, 0.5, 0.5]]);
        assert_eq!(atoms.labels(), vec!["Na", "He"]);
        assert_eq!(elf.data[0], 0.1);
        assert_eq!(elf.data[7], 0.8);
    }

    #[test]
    fn vasp_read_chgcar_first_block() {
        let vasp = Vasp {};
        let (atoms, charge) = match vasp.read("tests/vasp/CHGCAR") {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        };
        assert_eq!(atoms.len(), 2);
        assert_eq!(charge.data.len(), 8);
        assert_eq!(charge.data[6], 64.);
        assert_eq!(charge.data[7], 128.);
        // CHGCAR stores charge times volume, averaging gives the electrons
        assert_eq!(charge.sum() / 8., 72.);
    }

    #[test]
    fn vasp_read_electride_mask() {
        let app = ClapApp::App.get();
        let args = Args::new(app.get_matches_from(vec!["badelf", "tests/vasp"]));
        let (atoms, _) = Vasp {}.read(&args.path(&args.elf)).unwrap();
        let sites = atoms.electride_sites(&args.electride_marker);
        assert_eq!(sites, vec![1]);
        let (_, mask) = match (Vasp {}).read(&args.electride_file(sites[0])) {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        };
        assert_eq!(mask.data.iter().filter(|v| **v != 0.).count(), 1);
    }

    #[test]
    fn vasp_read_missing_file() {
        let e = Vasp {}.read("tests/vasp/BvAt0001.dat").unwrap_err();
        assert!(format!("{:#}", e).contains("BvAt0001.dat"));
    }

    #[test]
    fn vasp_load_electride_masks() {
        let (args, atoms) = calculation();
        let masks =
            load_electride_masks(&atoms, [2, 2, 2], "He", |s| args.electride_file(s)).unwrap();
        assert_eq!(masks.len(), 1);
        assert_eq!(masks[0].site, 1);
        assert!(masks[0].flags(7));
        assert!(!masks[0].flags(0));
    }

    #[test]
    fn vasp_electride_mask_wrong_site_count() {
        let (args, atoms) = calculation();
        // one more site than the mask file describes, He stays at index 1
        let atoms = Atoms::new(
            atoms.lattice.clone(),
            vec![String::from("Na"), String::from("He"), String::from("Na")],
            vec![1, 1, 1],
            vec![[0., 0., 0.], [0.5, 0.5, 0.5], [0.25, 0.25, 0.25]],
        )
        .unwrap();
        let (masks, missing) =
            electride_masks_or_none(&atoms, [2, 2, 2], "He", |s| args.electride_file(s));
        assert!(masks.is_empty());
        assert!(matches!(
            missing,
            Some(BadelfError::MissingElectrideData { site: 1, .. })
        ));
    }

    #[test]
    fn vasp_electride_mask_wrong_grid() {
        let (args, atoms) = calculation();
        let (masks, missing) =
            electride_masks_or_none(&atoms, [3, 3, 3], "He", |s| args.electride_file(s));
        assert!(masks.is_empty());
        assert!(matches!(
            missing,
            Some(BadelfError::MissingElectrideData { site: 1, .. })
        ));
    }
}
