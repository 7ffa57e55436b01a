mod handler;
mod model;

pub use handler::{
    create_incident, delete_incident, get_incident, incident_stats, list_incidents,
    update_incident,
};
pub use model::{IncidentIdResponse, ListQuery};
