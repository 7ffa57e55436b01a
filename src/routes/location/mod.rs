mod handler;
mod model;

pub use handler::{check_location, find_nearby_incidents};
pub use model::NearbyRequest;
