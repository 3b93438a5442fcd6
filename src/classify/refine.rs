use std::collections::HashMap;

use anyhow::Result;
use ndarray::{Array2, Axis};
use tracing::{info, warn};

use crate::building::{BuildingCategory, BuildingTable, columns};

use super::{ClassifierParams, GradientBoostingClassifier, StandardScaler, train_test_split};

/// Outcome of refining one district.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefineSummary {
    /// Rows with a non-sentinel label.
    pub labelled: usize,
    pub train: usize,
    pub test: usize,
    /// Rows still carrying the sentinel before refinement.
    pub sentinel: usize,
    /// Sentinel rows moved to `residential`.
    pub upgraded: usize,
    /// Held-out accuracy, `None` when no model was evaluated.
    pub accuracy: Option<f64>,
}

/// Integer codes in first-appearance order, equal values sharing a code.
pub fn factorize<S: AsRef<str>>(values: &[S]) -> Vec<usize> {
    let mut codes = HashMap::new();
    values.iter()
        .map(|value| {
            let next = codes.len();
            *codes.entry(value.as_ref()).or_insert(next)
        })
        .collect()
}

/// Train on labelled rows of `features` and upgrade sentinel rows predicted
/// residential. Non-sentinel categories are returned unchanged.
pub fn refine_categories(
    categories: &[BuildingCategory],
    features: &Array2<f64>,
    params: &ClassifierParams,
) -> Result<(Vec<BuildingCategory>, RefineSummary)> {
    anyhow::ensure!(features.nrows() == categories.len(),
        "[classify::refine] {} feature rows but {} categories", features.nrows(), categories.len());

    let (labelled, sentinel): (Vec<usize>, Vec<usize>) = (0..categories.len())
        .partition(|&i| categories[i].is_residential().is_some());
    let mut summary = RefineSummary { labelled: labelled.len(), sentinel: sentinel.len(), ..Default::default() };
    let mut refined = categories.to_vec();
    if labelled.is_empty() || sentinel.is_empty() { return Ok((refined, summary)) }

    let targets = labelled.iter()
        .map(|&i| categories[i].is_residential().unwrap_or(false))
        .collect::<Vec<_>>();
    let (train, test) = train_test_split(labelled.len(), params.test_fraction, params.seed);
    summary.train = train.len();
    summary.test = test.len();

    let x_labelled = features.select(Axis(0), &labelled);
    let x_train = x_labelled.select(Axis(0), &train);
    let y_train = train.iter().map(|&i| targets[i]).collect::<Vec<_>>();

    let scaler = StandardScaler::fit(x_train.view())?;
    let model = GradientBoostingClassifier::fit(scaler.transform(x_train.view()).view(), &y_train, params)?;

    let x_test = scaler.transform(x_labelled.select(Axis(0), &test).view());
    let y_test = test.iter().map(|&i| targets[i]).collect::<Vec<_>>();
    summary.accuracy = model.accuracy(x_test.view(), &y_test);

    let x_sentinel = scaler.transform(features.select(Axis(0), &sentinel).view());
    for (&row, positive) in sentinel.iter().zip(model.predict(x_sentinel.view())) {
        refined[row] = categories[row].refine(positive);
        if positive { summary.upgraded += 1 }
    }

    Ok((refined, summary))
}

/// Feature matrix `[rectangularity, surface_area, building_block code]`.
fn feature_matrix(table: &BuildingTable) -> Result<Array2<f64>> {
    table.require_columns(&[columns::RECTANGULARITY, columns::SURFACE_AREA, columns::BUILDING_BLOCK])?;
    let rectangularity = table.required_floats(columns::RECTANGULARITY)?;
    let surface_area = table.required_floats(columns::SURFACE_AREA)?;
    let blocks = table.strings(columns::BUILDING_BLOCK)?.into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>();
    let block_codes = factorize(&blocks);

    Ok(Array2::from_shape_fn((table.len(), 3), |(row, col)| match col {
        0 => rectangularity[row],
        1 => surface_area[row],
        _ => block_codes[row] as f64,
    }))
}

/// Refine the category column of a clustered district table in place.
pub fn refine_table(table: &mut BuildingTable, params: &ClassifierParams) -> Result<RefineSummary> {
    let categories = table.categories()?;
    let features = feature_matrix(table)?;
    let (refined, summary) = refine_categories(&categories, &features, params)?;

    if summary.labelled == 0 {
        warn!(sentinel = summary.sentinel, "No labelled buildings to train on, categories left unchanged");
        return Ok(summary);
    }
    if summary.sentinel == 0 {
        info!(labelled = summary.labelled, "No buildings to classify");
        return Ok(summary);
    }

    table.set_categories(&refined)?;
    match summary.accuracy {
        Some(accuracy) => info!(train = summary.train, test = summary.test, "Accuracy of classifier: {:.3}", accuracy),
        None => info!(train = summary.train, "Accuracy of classifier: n/a (empty test split)"),
    }
    info!(upgraded = summary.upgraded, sentinel = summary.sentinel, "Refined unclassified buildings");
    Ok(summary)
}
