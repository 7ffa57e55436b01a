//! 测试用的内存实现

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::cache::{CachedIncident, IncidentCache, WebhookQueue};
use crate::database::{CheckRecorder, IncidentRepository, StatsRepository};
use crate::error::{CacheError, QueueError};
use crate::models::{Incident, IncidentStatus, LocationCheck, WebhookPayload};

pub fn redis_down() -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"))
}

pub fn db_down() -> sqlx::Error {
    sqlx::Error::Protocol("database unavailable".into())
}

pub fn cached(lat: f64, lng: f64, radius_km: f64) -> CachedIncident {
    CachedIncident {
        id: Uuid::new_v4(),
        lat,
        lng,
        radius_km,
    }
}

pub fn active_incident(lat: f64, lng: f64, radius_km: f64) -> Incident {
    Incident {
        id: Uuid::new_v4(),
        lat,
        lng,
        radius_km,
        status: IncidentStatus::Active,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct MemoryIncidentCache {
    pub incidents: Mutex<Vec<CachedIncident>>,
    pub fail: AtomicBool,
    pub get_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
    pub last_ttl: Mutex<Option<Duration>>,
    pub read_delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MemoryIncidentCache {
    pub fn with(incidents: Vec<CachedIncident>) -> Self {
        Self {
            incidents: Mutex::new(incidents),
            ..Default::default()
        }
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn snapshot(&self) -> Vec<CachedIncident> {
        self.incidents.lock().unwrap().clone()
    }
}

#[async_trait]
impl IncidentCache for MemoryIncidentCache {
    async fn get_active(&self) -> Result<Vec<CachedIncident>, CacheError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(redis_down().into());
        }
        Ok(self.snapshot())
    }

    async fn set_active(
        &self,
        incidents: &[CachedIncident],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(redis_down().into());
        }
        *self.incidents.lock().unwrap() = incidents.to_vec();
        *self.last_ttl.lock().unwrap() = Some(ttl);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryQueue {
    pub items: Mutex<VecDeque<WebhookPayload>>,
    pub fail_enqueue: AtomicBool,
    pub fail_dequeue: AtomicBool,
    pub enqueue_calls: AtomicUsize,
    pub dequeue_calls: AtomicUsize,
}

impl MemoryQueue {
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn push(&self, payload: WebhookPayload) {
        self.items.lock().unwrap().push_back(payload);
    }
}

#[async_trait]
impl WebhookQueue for MemoryQueue {
    async fn enqueue(&self, payload: &WebhookPayload) -> Result<(), QueueError> {
        self.enqueue_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_enqueue.load(Ordering::SeqCst) {
            return Err(redis_down().into());
        }
        self.push(payload.clone());
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<WebhookPayload>, QueueError> {
        self.dequeue_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_dequeue.load(Ordering::SeqCst) {
            return Err(redis_down().into());
        }
        let next = self.items.lock().unwrap().pop_front();
        match next {
            Some(payload) => Ok(Some(payload)),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryRecorder {
    pub saved: Mutex<Vec<LocationCheck>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl CheckRecorder for MemoryRecorder {
    async fn save_check(&self, check: &LocationCheck) -> Result<(), sqlx::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(db_down());
        }
        self.saved.lock().unwrap().push(check.clone());
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for MemoryRecorder {
    async fn window_stats(&self, minutes: i64) -> Result<(i64, i64), sqlx::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(db_down());
        }
        let since = Utc::now() - chrono::Duration::minutes(minutes);
        let saved = self.saved.lock().unwrap();
        let recent: Vec<_> = saved.iter().filter(|c| c.checked_at >= since).collect();
        let mut users: Vec<_> = recent.iter().map(|c| c.user_id).collect();
        users.sort();
        users.dedup();
        Ok((users.len() as i64, recent.len() as i64))
    }
}

#[derive(Default)]
pub struct MemoryIncidentRepository {
    pub incidents: Mutex<Vec<Incident>>,
    pub fail: AtomicBool,
    pub writes: AtomicUsize,
}

impl MemoryIncidentRepository {
    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail.load(Ordering::SeqCst) {
            Err(db_down())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IncidentRepository for MemoryIncidentRepository {
    async fn create(&self, incident: &Incident) -> Result<(), sqlx::Error> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.incidents.lock().unwrap().push(incident.clone());
        Ok(())
    }

    async fn list(&self, page: i64, limit: i64) -> Result<(Vec<Incident>, i64), sqlx::Error> {
        self.check()?;
        let all = self.incidents.lock().unwrap();
        let items = all
            .iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((items, all.len() as i64))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Incident>, sqlx::Error> {
        self.check()?;
        Ok(self.incidents.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    async fn update(&self, incident: &Incident) -> Result<bool, sqlx::Error> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut all = self.incidents.lock().unwrap();
        match all.iter_mut().find(|i| i.id == incident.id) {
            Some(existing) => {
                *existing = incident.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut all = self.incidents.lock().unwrap();
        match all
            .iter_mut()
            .find(|i| i.id == id && i.status == IncidentStatus::Active)
        {
            Some(existing) => {
                existing.status = IncidentStatus::Inactive;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_active(&self) -> Result<Vec<Incident>, sqlx::Error> {
        self.check()?;
        Ok(self
            .incidents
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == IncidentStatus::Active)
            .cloned()
            .collect())
    }
}
