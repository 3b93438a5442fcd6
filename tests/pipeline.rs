use std::{fs, path::Path};

use blockatlas::{
    BoundaryType, BuildingCategory, DiskStore, NOISE_LABEL, Pipeline, PipelineConfig, PipelinePaths,
    UnitStatus, UnitStore, category_stats, columns,
};
use tempfile::TempDir;

const HEADER: &str = "id,center.lat,center.lon,geometry,tags.building,building_levels,building_types";

struct Building {
    id: &'static str,
    lat: f64,
    lon: f64,
    levels: &'static str,
    category: &'static str,
}

fn row(b: &Building) -> String {
    let (x0, y0, x1, y1) = (b.lon - 5e-6, b.lat - 5e-6, b.lon + 5e-6, b.lat + 5e-6);
    let tag = if b.category == "to_be_classified" { "yes" } else { b.category };
    format!(r#"{},{},{},"POLYGON (({x0} {y0}, {x1} {y0}, {x1} {y1}, {x0} {y1}, {x0} {y0}))",{tag},{},{}"#,
        b.id, b.lat, b.lon, b.levels, b.category)
}

fn write_unit(dir: &Path, code: &str, buildings: &[Building]) {
    let mut text = String::from(HEADER);
    for b in buildings {
        text.push('\n');
        text.push_str(&row(b));
    }
    text.push('\n');
    fs::write(dir.join(format!("buildings_ags_{code}.csv")), text).unwrap();
}

/// Ten buildings about three metres apart plus two far-away outliers, split
/// over two municipalities of district 09162.
fn tight_group_with_outliers() -> (Vec<Building>, Vec<Building>) {
    let categories = ["residential", "to_be_classified", "commercial", "residential", "to_be_classified"];
    let group = |i: usize| Building {
        id: ["b0", "b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8", "b9"][i],
        lat: 48.137 + (i / 5) as f64 * 3e-5,
        lon: 11.575 + (i % 5) as f64 * 4e-5,
        levels: ["2", "", "1", "3", "x"][i % 5],
        category: categories[i % 5],
    };
    let mut first = (0..6).map(group).collect::<Vec<_>>();
    first.push(Building { id: "far0", lat: 48.137, lon: 11.582, levels: "1", category: "industrial" });
    let mut second = (6..10).map(group).collect::<Vec<_>>();
    second.push(Building { id: "far1", lat: 48.146, lon: 11.575, levels: "1", category: "to_be_classified" });
    (first, second)
}

fn config(root: &TempDir) -> PipelineConfig {
    let paths = PipelinePaths {
        intermediate: root.path().join("intermediate"),
        primary: root.path().join("primary"),
        feature: root.path().join("feature"),
        model_output: root.path().join("model_output"),
        region_list: None,
    };
    fs::create_dir_all(&paths.intermediate).unwrap();
    PipelineConfig { paths, ..PipelineConfig::default() }
}

fn store(dir: &Path) -> DiskStore { DiskStore::new(dir, BoundaryType::Ags).unwrap() }

#[test]
fn district_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let config = config(&root);
    let (first, second) = tight_group_with_outliers();
    write_unit(&config.paths.intermediate, "09162000", &first);
    write_unit(&config.paths.intermediate, "09162001", &second);

    let pipeline = Pipeline::from_config(config.clone()).unwrap();
    let reports = pipeline.run_all().unwrap();
    assert_eq!(reports.iter().map(|r| r.processed()).collect::<Vec<_>>(), vec![2, 1, 1]);
    assert!(reports.iter().all(|r| r.failed() == 0));

    // Features per municipality.
    let primary = store(&config.paths.primary).read("09162000").unwrap();
    let surface = primary.required_floats(columns::SURFACE_AREA).unwrap();
    let total = primary.required_floats(columns::TOTAL_AREA).unwrap();
    let rect = primary.required_floats(columns::RECTANGULARITY).unwrap();
    let levels = [2.0, 1.0, 1.0, 3.0, 1.0, 2.0, 1.0];
    for i in 0..primary.len() {
        assert!((total[i] - surface[i] * levels[i]).abs() < 1e-9);
        assert!((rect[i] - 1.0).abs() < 1e-6);
    }

    // One block of ten, two noise buildings; raw tag columns pass through.
    let clustered = store(&config.paths.feature).read("09162").unwrap();
    assert!(clustered.has_column("tags.building"));
    let ids = clustered.strings(columns::ID).unwrap();
    let blocks = clustered.strings(columns::BUILDING_BLOCK).unwrap();
    for (id, block) in ids.iter().zip(&blocks) {
        let (id, block) = (id.as_deref().unwrap(), block.as_deref().unwrap());
        if id.starts_with("far") {
            assert_eq!(block, NOISE_LABEL, "{id}");
        } else {
            assert_eq!(block, "0", "{id}");
        }
    }

    // Only sentinel rows may change, and only to residential.
    let classified = store(&config.paths.model_output).read("09162").unwrap();
    let before = clustered.categories().unwrap();
    let after = classified.categories().unwrap();
    assert_eq!(before.len(), 12);
    for (b, a) in before.iter().zip(&after) {
        if b.is_sentinel() {
            assert!(matches!(a, BuildingCategory::Residential | BuildingCategory::ToBeClassified));
        } else {
            assert_eq!(b, a);
        }
    }

    let stats = category_stats(&classified).unwrap();
    assert_eq!(stats.iter().map(|s| s.count).sum::<usize>(), 12);
}

#[test]
fn completed_units_are_not_reprocessed() {
    let root = tempfile::tempdir().unwrap();
    let config = config(&root);
    let (first, second) = tight_group_with_outliers();
    write_unit(&config.paths.intermediate, "09162000", &first);
    write_unit(&config.paths.intermediate, "09162001", &second);

    let pipeline = Pipeline::from_config(config.clone()).unwrap();
    assert_eq!(pipeline.generate_features().unwrap().processed(), 2);
    let written = fs::read_to_string(config.paths.primary.join("buildings_ags_09162000.csv")).unwrap();

    // A unit that would now fail is never touched again.
    fs::write(config.paths.intermediate.join("buildings_ags_09162000.csv"), "id\n1\n").unwrap();
    let report = pipeline.generate_features().unwrap();
    assert!(report.units.is_empty());
    assert_eq!(report.already_done, 2);
    assert_eq!(fs::read_to_string(config.paths.primary.join("buildings_ags_09162000.csv")).unwrap(), written);
}

#[test]
fn failing_unit_does_not_stop_the_batch() {
    let root = tempfile::tempdir().unwrap();
    let config = config(&root);
    let (first, second) = tight_group_with_outliers();
    write_unit(&config.paths.intermediate, "09162000", &first);
    fs::write(config.paths.intermediate.join("buildings_ags_09162001.csv"), "id,center.lat\n1,48.1\n").unwrap();
    write_unit(&config.paths.intermediate, "09162002", &second);

    let pipeline = Pipeline::from_config(config.clone()).unwrap();
    let report = pipeline.generate_features().unwrap();
    assert_eq!(report.failed_units(), vec!["09162001"]);
    assert_eq!(report.units[1].position, 2);
    assert!(matches!(report.status_of("09162000"), Some(UnitStatus::Done { rows: 7 })));
    assert!(matches!(report.status_of("09162002"), Some(UnitStatus::Done { rows: 5 })));

    let primary = store(&config.paths.primary);
    assert_eq!(primary.completed().unwrap().into_iter().collect::<Vec<_>>(), vec!["09162000", "09162002"]);
    assert!(!config.paths.primary.join("buildings_ags_09162001.csv").exists());

    // Fixing the input and rerunning picks up exactly the failed unit.
    write_unit(&config.paths.intermediate, "09162001", &second);
    let retry = pipeline.generate_features().unwrap();
    assert_eq!(retry.units.iter().map(|u| u.unit.as_str()).collect::<Vec<_>>(), vec!["09162001"]);
    assert_eq!(retry.processed(), 1);
}

#[test]
fn district_is_clustered_only_once_every_municipality_succeeded() {
    let root = tempfile::tempdir().unwrap();
    let config = config(&root);
    let (first, second) = tight_group_with_outliers();
    write_unit(&config.paths.intermediate, "09162000", &first);
    fs::write(config.paths.intermediate.join("buildings_ags_09162001.csv"), "id,center.lat\n1,48.1\n").unwrap();

    let pipeline = Pipeline::from_config(config.clone()).unwrap();
    let reports = pipeline.run_all().unwrap();
    assert_eq!(reports[0].failed_units(), vec!["09162001"]);
    assert_eq!(
        reports[1].status_of("09162"),
        Some(&UnitStatus::Skipped { reason: "members pending: 09162001".to_string() }),
    );
    assert!(!store(&config.paths.feature).has("09162"));
    assert!(reports[2].units.is_empty());

    // Once the municipality is fixed the whole district is clustered.
    write_unit(&config.paths.intermediate, "09162001", &second);
    let reports = pipeline.run_all().unwrap();
    assert_eq!(reports.iter().map(|r| r.processed()).collect::<Vec<_>>(), vec![1, 1, 1]);

    let primary = store(&config.paths.primary);
    let municipal_rows = ["09162000", "09162001"].iter()
        .map(|code| primary.read(code).unwrap().len())
        .sum::<usize>();
    assert_eq!(municipal_rows, 12);
    assert_eq!(store(&config.paths.feature).read("09162").unwrap().len(), municipal_rows);
}

#[test]
fn region_list_limits_the_batch() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config(&root);
    let (first, second) = tight_group_with_outliers();
    write_unit(&config.paths.intermediate, "09162000", &first);
    write_unit(&config.paths.intermediate, "09163000", &second);

    let list = root.path().join("regions.csv");
    fs::write(&list, "name,ags\nMuenchen,09162000\n").unwrap();
    config.paths.region_list = Some(list);

    let pipeline = Pipeline::from_config(config.clone()).unwrap();
    let report = pipeline.generate_features().unwrap();
    assert_eq!(report.units.iter().map(|u| u.unit.as_str()).collect::<Vec<_>>(), vec!["09162000"]);
    assert!(!store(&config.paths.primary).has("09163000"));
}

#[test]
fn missing_intermediate_directory_is_a_setup_error() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config(&root);
    config.paths.intermediate = root.path().join("absent");
    let pipeline = Pipeline::from_config(config).unwrap();
    assert!(pipeline.generate_features().is_err());
}
