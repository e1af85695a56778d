//! Debug endpoints: inspect the category weights the ranker uses.
//! Mount with e.g. `app.merge(analyze::debug::router(weights))`.

use serde::Serialize;
use shuttle_axum::axum::{routing::get, Json, Router};

use super::CategoryWeights;
use crate::candidate::SignalCategory;

#[derive(Debug, Serialize)]
pub struct WeightsOut {
    pub weights: Vec<WeightEntry>,
    pub total: f32,
}

#[derive(Debug, Serialize)]
pub struct WeightEntry {
    pub category: &'static str,
    pub weight: f32,
}

pub fn weights_out(w: &CategoryWeights) -> WeightsOut {
    WeightsOut {
        weights: SignalCategory::ALL
            .iter()
            .map(|c| WeightEntry {
                category: c.key(),
                weight: w.weight(*c),
            })
            .collect(),
        total: w.total(),
    }
}

pub fn router(weights: CategoryWeights) -> Router {
    Router::new().route(
        "/debug/weights",
        get(move || async move { Json(weights_out(&weights)) }),
    )
}
