// 业务服务
// 位置检查、事件管理、统计和快照刷新

pub mod admin;
pub mod location;
pub mod matcher;
pub mod snapshot;
pub mod stats;

pub use admin::AdminService;
pub use location::LocationService;
pub use matcher::{NearbyIncident, find_nearby};
pub use snapshot::SnapshotRefresher;
pub use stats::StatsService;
