//! Mock timetable source for testing without API access.
//!
//! Serves search results from memory, optionally loaded from JSON files,
//! and can be scripted to fail with given status codes.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};

use crate::domain::LocationCode;

use super::error::RttError;
use super::types::{SearchResponse, ServiceRecord};
use super::{Route, TimetableSource};

/// Services keyed by route and, optionally, a specific date.
type RouteKey = (Route, Option<NaiveDate>);

/// Mock timetable that serves canned search results.
#[derive(Debug, Clone, Default)]
pub struct MockTimetable {
    routes: Arc<RwLock<HashMap<RouteKey, Vec<ServiceRecord>>>>,
    failures: Arc<Mutex<VecDeque<u16>>>,
    calls: Arc<AtomicUsize>,
}

impl MockTimetable {
    /// Create an empty mock. Every search fails with 404 until data is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load search responses from a directory.
    ///
    /// Expects files named `{ORIGIN}-{DESTINATION}.json` (e.g. `CBG-KGX.json`),
    /// each holding a search response body. The data is served for any date.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, RttError> {
        let data_dir = data_dir.as_ref();
        let mut routes = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| {
            RttError::MockData(format!(
                "failed to read mock data directory {data_dir:?}: {e}"
            ))
        })?;

        for entry in entries {
            let entry = entry
                .map_err(|e| RttError::MockData(format!("failed to read directory entry: {e}")))?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(route) = parse_route_stem(stem) else {
                tracing::warn!(?path, "skipping mock file with unrecognised name");
                continue;
            };

            let json = std::fs::read_to_string(&path)
                .map_err(|e| RttError::MockData(format!("failed to read {path:?}: {e}")))?;

            let response: SearchResponse =
                serde_json::from_str(&json).map_err(|e| RttError::Json {
                    message: format!("failed to parse {path:?}: {e}"),
                    body: None,
                })?;

            routes.insert((route, None), response.into_services());
        }

        if routes.is_empty() {
            return Err(RttError::MockData(format!(
                "no mock search files found in {data_dir:?}"
            )));
        }

        Ok(Self {
            routes: Arc::new(RwLock::new(routes)),
            ..Self::default()
        })
    }

    /// Serve `services` for `route` on every date.
    pub async fn set_services(&self, route: Route, services: Vec<ServiceRecord>) {
        self.routes.write().await.insert((route, None), services);
    }

    /// Serve `services` for `route` on `date` only, taking precedence over any-date data.
    pub async fn set_services_on(&self, route: Route, date: NaiveDate, services: Vec<ServiceRecord>) {
        self.routes.write().await.insert((route, Some(date)), services);
    }

    /// Make the next search fail with the given HTTP status.
    ///
    /// Failures queue up and are consumed one per search, before any data is served.
    pub async fn fail_next(&self, status: u16) {
        self.failures.lock().await.push_back(status);
    }

    /// Number of searches made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn lookup(&self, route: &Route, date: NaiveDate) -> Result<Vec<ServiceRecord>, RttError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = self.failures.lock().await.pop_front() {
            return Err(RttError::Http {
                status,
                message: "scripted mock failure".to_string(),
            });
        }

        let routes = self.routes.read().await;
        routes
            .get(&(*route, Some(date)))
            .or_else(|| routes.get(&(*route, None)))
            .cloned()
            .ok_or_else(|| RttError::Http {
                status: 404,
                message: format!("no mock data for {route}"),
            })
    }
}

impl TimetableSource for MockTimetable {
    fn search(
        &self,
        route: &Route,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<ServiceRecord>, RttError>> + Send {
        self.lookup(route, date)
    }
}

/// Parse "CBG-KGX" into a route.
fn parse_route_stem(stem: &str) -> Option<Route> {
    let (origin, destination) = stem.split_once('-')?;
    Some(Route::new(
        LocationCode::parse(origin).ok()?,
        LocationCode::parse(destination).ok()?,
    ))
}
