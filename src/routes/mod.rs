pub mod incident;
pub mod location;
pub mod system;
