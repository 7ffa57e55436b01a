mod incident;
mod location_check;
mod webhook;

pub use incident::{
    CreateIncidentRequest, Incident, IncidentRow, IncidentStatus, ListIncidentsResponse,
    MAX_RADIUS_KM, MIN_RADIUS_KM, UpdateIncidentRequest,
};
pub use location_check::{
    IncidentStats, LocationCheck, LocationCheckRequest, LocationCheckResponse, StatsQuery,
};
pub use webhook::WebhookPayload;
