/// 缓存数据模型
pub mod incident;

pub use incident::CachedIncident;
