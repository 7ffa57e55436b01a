// 存储库模块
// 每个存储库对外提供一个 trait，便于在服务层替换实现

pub mod incident;
pub mod location_check;

pub use incident::{IncidentRepository, PgIncidentRepository};
pub use location_check::{CheckRecorder, LocationCheckRepository, StatsRepository};
