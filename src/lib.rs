use std::sync::Arc;

use config::Config;
use services::{AdminService, LocationService, StatsService};
use workers::LocationCheckerHandle;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod router;
pub mod routes;
pub mod services;
pub mod utils;
pub mod workers;

#[cfg(test)]
mod testing;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub location: Arc<LocationService>,
    pub admin: Arc<AdminService>,
    pub stats: Arc<StatsService>,
    pub checker: LocationCheckerHandle,
}
