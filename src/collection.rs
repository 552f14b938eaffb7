//! `ragline init`, `ragline count`, and `ragline drop`.

use anyhow::{Context, Result};
use ragline_core::ingest::FailurePolicy;
use ragline_core::models::Distance;

use crate::services::Services;

/// Create the configured collection if it is missing. Returns `true` when
/// it was created by this call.
pub fn run_init(
    services: &Services,
    vector_size: Option<usize>,
    distance: Option<Distance>,
) -> Result<bool> {
    let store = &services.config().store;
    let vector_size = vector_size.unwrap_or(store.vector_size);
    let distance = distance.unwrap_or(store.distance);
    anyhow::ensure!(vector_size > 0, "vector size must be positive");

    let pipeline = services.ingestion(None, FailurePolicy::FailFast);
    let created = pipeline
        .ensure_collection(vector_size, distance)
        .with_context(|| format!("Failed to initialize collection '{}'", pipeline.collection()))?;

    if created {
        println!(
            "Created collection '{}' (size {}, {:?}).",
            pipeline.collection(),
            vector_size,
            distance
        );
    } else {
        println!("Collection '{}' already exists.", pipeline.collection());
    }
    Ok(created)
}

pub fn run_count(services: &Services) -> Result<u64> {
    let count = services
        .store()
        .count(services.collection())
        .with_context(|| format!("Failed to count points in '{}'", services.collection()))?;
    println!("{}", count);
    Ok(count)
}

pub fn run_drop(services: &Services) -> Result<bool> {
    let deleted = services
        .store()
        .delete_collection(services.collection())
        .with_context(|| format!("Failed to delete collection '{}'", services.collection()))?;
    if deleted {
        println!("Deleted collection '{}'.", services.collection());
    } else {
        println!("Collection '{}' does not exist.", services.collection());
    }
    Ok(deleted)
}
