use std::collections::BTreeSet;

use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::info;

use crate::{
    batch::{BatchReport, UnitOutcome, pending_units, run_batch},
    classify::refine_table,
    cluster::assign_building_blocks,
    common::ensure_dir_exists,
    district::{aggregate_units, district_codes, district_members},
    footprint::engineer_features,
    io::csv::read_region_codes,
    pipeline::PipelineConfig,
    stats::stats_frame,
    store::{DiskStore, UnitStore},
};

/// One store per persisted stage.
pub struct Stores {
    pub intermediate: Box<dyn UnitStore>,
    pub primary: Box<dyn UnitStore>,
    pub feature: Box<dyn UnitStore>,
    pub model_output: Box<dyn UnitStore>,
}

/// The feature, clustering and classification stages over a set of stores.
///
/// Each stage lists what its output store already holds, schedules only the
/// missing units and never aborts on a single unit's failure.
pub struct Pipeline {
    config: PipelineConfig,
    stores: Stores,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, stores: Stores) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, stores })
    }

    /// Pipeline over the CSV directories named in `config`, creating the
    /// output directories when missing.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let paths = &config.paths;
        for dir in [&paths.primary, &paths.feature, &paths.model_output] {
            ensure_dir_exists(dir)?;
        }
        let boundary = config.boundary_type;
        let stores = Stores {
            intermediate: Box::new(DiskStore::new(&paths.intermediate, boundary)?),
            primary: Box::new(DiskStore::new(&paths.primary, boundary)?),
            feature: Box::new(DiskStore::new(&paths.feature, boundary)?),
            model_output: Box::new(DiskStore::new(&paths.model_output, boundary)?),
        };
        Self::new(config, stores)
    }

    #[inline] pub fn config(&self) -> &PipelineConfig { &self.config }

    #[inline] pub fn stores(&self) -> &Stores { &self.stores }

    /// Units named in the region list, or `fallback` when none is configured.
    fn region_units(&self, fallback: &dyn UnitStore) -> Result<Vec<String>> {
        match &self.config.paths.region_list {
            Some(path) => read_region_codes(path, self.config.boundary_type.code()),
            None => Ok(fallback.completed()?.into_iter().collect()),
        }
    }

    /// Engineer shape features for every municipality not yet in `primary`.
    pub fn generate_features(&self) -> Result<BatchReport> {
        let Stores { intermediate, primary, .. } = &self.stores;
        let done = primary.completed()?;
        let todo = pending_units(self.region_units(intermediate.as_ref())?, &done);
        info!(from = %intermediate.location(), to = %primary.location(), "Generating building features");

        run_batch("features", &todo, done.len(), self.config.jobs, |unit| {
            let mut table = intermediate.read(unit)?;
            let summary = engineer_features(&mut table)?;
            if summary.missing_geometry + summary.malformed_geometry > 0 {
                info!(missing = summary.missing_geometry, malformed = summary.malformed_geometry,
                    "Dropped buildings without a usable footprint");
            }
            primary.write(unit, &mut table)?;
            Ok(UnitOutcome::Done(summary.kept))
        })
    }

    /// Cluster every district not yet in `feature` into building blocks.
    ///
    /// A district is clustered only once all of its expected municipalities
    /// are in `primary`; otherwise it is skipped and stays pending.
    pub fn cluster_blocks(&self) -> Result<BatchReport> {
        let Stores { intermediate, primary, feature, .. } = &self.stores;
        let done = feature.completed()?;
        let available = primary.completed()?;
        let expected = match &self.config.paths.region_list {
            Some(_) => self.region_units(primary.as_ref())?.into_iter().collect::<BTreeSet<_>>(),
            None => intermediate.completed()?.union(&available).cloned().collect(),
        };
        let todo = pending_units(district_codes(&expected), &done);
        info!(from = %primary.location(), to = %feature.location(), "Clustering building blocks");

        let params = self.config.clustering;
        run_batch("cluster", &todo, done.len(), self.config.jobs, |district| {
            let pending = district_members(&expected, district).into_iter()
                .filter(|code| !available.contains(code))
                .collect::<Vec<_>>();
            if !pending.is_empty() {
                return Ok(UnitOutcome::Skipped(format!("members pending: {}", pending.join(", "))));
            }
            let mut table = aggregate_units(primary.as_ref(), &district_members(&available, district))?;
            if table.is_empty() {
                return Ok(UnitOutcome::Skipped("no buildings in district".to_string()));
            }
            assign_building_blocks(&mut table, &params)?;
            feature.write(district, &mut table)?;
            Ok(UnitOutcome::Done(table.len()))
        })
    }

    /// Refine sentinel categories of every clustered district not yet in
    /// `model_output`.
    pub fn classify_buildings(&self) -> Result<BatchReport> {
        let Stores { feature, model_output, .. } = &self.stores;
        let done = model_output.completed()?;
        let todo = pending_units(feature.completed()?, &done);
        info!(from = %feature.location(), to = %model_output.location(), "Classifying buildings");

        let params = self.config.classifier;
        run_batch("classify", &todo, done.len(), self.config.jobs, |district| {
            let mut table = feature.read(district)?;
            refine_table(&mut table, &params)?;
            model_output.write(district, &mut table)?;
            Ok(UnitOutcome::Done(table.len()))
        })
    }

    /// Run the three stages in order.
    pub fn run_all(&self) -> Result<Vec<BatchReport>> {
        let reports = vec![self.generate_features()?, self.cluster_blocks()?, self.classify_buildings()?];
        for report in &reports {
            info!("{report}");
        }
        Ok(reports)
    }

    /// Per-category statistics of one classified district.
    pub fn district_stats(&self, district: &str) -> Result<DataFrame> {
        stats_frame(&self.stores.model_output.read(district)?)
    }

    /// Districts with classified output.
    pub fn classified_districts(&self) -> Result<BTreeSet<String>> {
        self.stores.model_output.completed()
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;
    use crate::{batch::UnitStatus, building::{BuildingTable, columns}, store::MemStore};

    fn municipality(ids: &[&str], lat: f64, lon: f64) -> DataFrame {
        let n = ids.len();
        let square = |i: usize| {
            let (x, y) = (lon + i as f64 * 3e-5, lat);
            format!("POLYGON (({x} {y}, {} {y}, {} {}, {x} {}, {x} {y}))", x + 1e-5, x + 1e-5, y + 1e-5, y + 1e-5)
        };
        DataFrame::new(vec![
            Column::new(columns::ID.into(), ids),
            Column::new(columns::LAT.into(), (0..n).map(|_| lat.to_string()).collect::<Vec<_>>()),
            Column::new(columns::LON.into(), (0..n).map(|i| (lon + i as f64 * 3e-5).to_string()).collect::<Vec<_>>()),
            Column::new(columns::GEOMETRY.into(), (0..n).map(square).collect::<Vec<_>>()),
            Column::new(columns::CATEGORY.into(), (0..n).map(|i| ["residential", "to_be_classified", "public"][i % 3]).collect::<Vec<_>>()),
        ]).unwrap()
    }

    fn pipeline(intermediate: MemStore) -> Pipeline {
        Pipeline::new(PipelineConfig::default(), Stores {
            intermediate: Box::new(intermediate),
            primary: Box::new(MemStore::new()),
            feature: Box::new(MemStore::new()),
            model_output: Box::new(MemStore::new()),
        }).unwrap()
    }

    #[test]
    fn stages_feed_each_other() {
        let ids = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];
        let pipeline = pipeline(MemStore::with_tables([
            ("09162000".to_string(), municipality(&ids[..5], 48.137, 11.575)),
            ("09162001".to_string(), municipality(&ids[5..], 48.137, 11.57515)),
        ]));

        let reports = pipeline.run_all().unwrap();
        assert_eq!(reports.iter().map(|r| r.processed()).collect::<Vec<_>>(), vec![2, 1, 1]);
        assert!(reports.iter().all(|r| r.failed() == 0));

        let classified = pipeline.stores().model_output.read("09162").unwrap();
        assert_eq!(classified.len(), 10);
        assert!(classified.has_column(columns::BUILDING_BLOCK));
        assert!(classified.has_column(columns::TOTAL_AREA));

        // Nothing left to do on a second run.
        let again = pipeline.run_all().unwrap();
        assert!(again.iter().all(|r| r.units.is_empty()));
        assert_eq!(again.iter().map(|r| r.already_done).collect::<Vec<_>>(), vec![2, 1, 1]);
    }

    #[test]
    fn district_waits_for_all_municipalities() {
        let ids = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];
        let pipeline = pipeline(MemStore::with_tables([
            ("09162000".to_string(), municipality(&ids[..5], 48.137, 11.575)),
            ("09162001".to_string(), municipality(&ids[5..], 48.137, 11.57515)),
        ]));
        let mut first = BuildingTable::new(municipality(&ids[..5], 48.137, 11.575));
        engineer_features(&mut first).unwrap();
        pipeline.stores().primary.write("09162000", &mut first).unwrap();

        let report = pipeline.cluster_blocks().unwrap();
        assert_eq!(report.status_of("09162"), Some(&UnitStatus::Skipped { reason: "members pending: 09162001".to_string() }));
        assert!(!pipeline.stores().feature.has("09162"));

        let reports = pipeline.run_all().unwrap();
        assert_eq!(reports[1].processed(), 1);
        assert_eq!(pipeline.stores().feature.read("09162").unwrap().len(), 10);
    }

    #[test]
    fn empty_district_is_skipped() {
        let pipeline = pipeline(MemStore::new());
        pipeline.stores().primary.write("01001000", &mut BuildingTable::default()).unwrap();
        let report = pipeline.cluster_blocks().unwrap();
        assert_eq!(report.skipped(), 1);
        assert!(!pipeline.stores().feature.has("01001"));
    }
}
