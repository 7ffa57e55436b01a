use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AdminError;
use crate::utils::is_valid_coordinate;

/// 事件半径允许范围（千米）
pub const MIN_RADIUS_KM: f64 = 0.1;
pub const MAX_RADIUS_KM: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Active,
    Inactive,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Active => "active",
            IncidentStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(IncidentStatus::Active),
            "inactive" => Ok(IncidentStatus::Inactive),
            other => Err(format!("unknown incident status: {}", other)),
        }
    }
}

/// 圆形地理围栏事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
}

/// incidents 表的行结构
#[derive(Debug, FromRow)]
pub struct IncidentRow {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<IncidentRow> for Incident {
    type Error = sqlx::Error;

    fn try_from(row: IncidentRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<IncidentStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Self {
            id: row.id,
            lat: row.latitude,
            lng: row.longitude,
            radius_km: row.radius_km,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIncidentRequest {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    pub status: Option<IncidentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIncidentRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub status: Option<IncidentStatus>,
}

#[derive(Debug, Serialize)]
pub struct ListIncidentsResponse {
    pub incidents: Vec<Incident>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

fn validate_radius(radius_km: f64) -> Result<(), AdminError> {
    if (MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
        Ok(())
    } else {
        Err(AdminError::Validation(format!(
            "radius_km must be within [{}, {}]",
            MIN_RADIUS_KM, MAX_RADIUS_KM
        )))
    }
}

impl CreateIncidentRequest {
    pub fn validate(&self) -> Result<(), AdminError> {
        if !is_valid_coordinate(self.lat, self.lng) {
            return Err(AdminError::Validation("invalid coordinates".into()));
        }
        validate_radius(self.radius_km)
    }
}

impl UpdateIncidentRequest {
    pub fn validate(&self) -> Result<(), AdminError> {
        if let Some(lat) = self.lat {
            if !is_valid_coordinate(lat, 0.0) {
                return Err(AdminError::Validation("invalid latitude".into()));
            }
        }
        if let Some(lng) = self.lng {
            if !is_valid_coordinate(0.0, lng) {
                return Err(AdminError::Validation("invalid longitude".into()));
            }
        }
        if let Some(radius_km) = self.radius_km {
            validate_radius(radius_km)?;
        }
        Ok(())
    }

    /// 将非空字段合并到已有事件上
    pub fn apply(&self, incident: &mut Incident) {
        if let Some(lat) = self.lat {
            incident.lat = lat;
        }
        if let Some(lng) = self.lng {
            incident.lng = lng;
        }
        if let Some(radius_km) = self.radius_km {
            incident.radius_km = radius_km;
        }
        if let Some(status) = self.status {
            incident.status = status;
        }
    }
}
