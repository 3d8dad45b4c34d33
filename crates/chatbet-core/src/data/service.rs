//! Cached access to tournaments, fixtures and odds.
//!
//! `SportsDataService` puts a [`TtlCache`] per resource kind in front of the
//! sports data client and applies the caller-supplied fetch timeout. Fixture
//! filtering is a linear scan over the cached full set, exposed as a lazy
//! view that is recomputed on every iteration.

use std::sync::Arc;
use std::time::Duration;

use chatbet_types::config::ChatBetConfig;
use chatbet_types::error::DataError;
use chatbet_types::sports::{
    DataRecords, DataRequest, Fixture, FixtureOdds, FixtureStatus, OddsQuote, ResourceKind,
    Tournament,
};
use tracing::{debug, warn};

use super::box_client::BoxSportsDataClient;
use super::window::FixtureWindow;
use crate::cache::ttl::{Cached, TtlCache};

/// Freshness windows, timeout and sport for the data service.
#[derive(Debug, Clone)]
pub struct DataSettings {
    pub sport_id: u32,
    pub tournaments_ttl: Duration,
    pub fixtures_ttl: Duration,
    pub odds_ttl: Duration,
    /// Expired entries older than this are evicted rather than kept as stale fallbacks.
    pub stale_retain: Duration,
    pub fetch_timeout: Duration,
}

impl DataSettings {
    pub fn from_config(config: &ChatBetConfig) -> Self {
        Self {
            sport_id: config.data_api.sport_id,
            tournaments_ttl: Duration::from_secs(config.cache.tournaments_ttl_secs),
            fixtures_ttl: Duration::from_secs(config.cache.fixtures_ttl_secs),
            odds_ttl: Duration::from_secs(config.cache.odds_ttl_secs),
            stale_retain: Duration::from_secs(config.cache.stale_retain_secs),
            fetch_timeout: Duration::from_millis(config.timeouts.data_timeout_ms),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self::from_config(&ChatBetConfig::default())
    }
}

pub struct SportsDataService {
    client: BoxSportsDataClient,
    settings: DataSettings,
    tournaments: TtlCache<Arc<Vec<Tournament>>>,
    fixtures: TtlCache<Arc<Vec<Fixture>>>,
    odds: TtlCache<Arc<Vec<OddsQuote>>>,
}

impl SportsDataService {
    pub fn new(client: BoxSportsDataClient, settings: DataSettings) -> Self {
        Self {
            client,
            settings,
            tournaments: TtlCache::new(),
            fixtures: TtlCache::new(),
            odds: TtlCache::new(),
        }
    }

    pub fn settings(&self) -> &DataSettings {
        &self.settings
    }

    pub async fn tournaments(&self) -> Result<Cached<Arc<Vec<Tournament>>>, DataError> {
        self.tournaments
            .get("tournaments", self.settings.tournaments_ttl, move || async move {
                match self.fetch(DataRequest::tournaments()).await? {
                    DataRecords::Tournaments(records) => Ok(Arc::new(records)),
                    other => Err(unexpected(ResourceKind::Tournaments, &other)),
                }
            })
            .await
    }

    /// Full fixture set for the configured sport, sorted by kickoff then id.
    pub async fn fixtures(&self) -> Result<Cached<Arc<Vec<Fixture>>>, DataError> {
        let sport_id = self.settings.sport_id;
        let key = format!("fixtures:{sport_id}");
        self.fixtures
            .get(&key, self.settings.fixtures_ttl, move || async move {
                match self.fetch(DataRequest::fixtures(sport_id)).await? {
                    DataRecords::Fixtures(mut records) => {
                        records.sort_by(|a, b| {
                            a.kickoff_time
                                .cmp(&b.kickoff_time)
                                .then_with(|| a.id.cmp(&b.id))
                        });
                        Ok(Arc::new(records))
                    }
                    other => Err(unexpected(ResourceKind::Fixtures, &other)),
                }
            })
            .await
    }

    pub async fn odds_for(&self, fixture: &Fixture) -> Result<Cached<Arc<Vec<OddsQuote>>>, DataError> {
        let key = format!("odds:{}", fixture.id);
        self.odds
            .get(&key, self.settings.odds_ttl, move || async move {
                match self.fetch(DataRequest::odds(fixture)).await? {
                    DataRecords::Odds(records) => Ok(Arc::new(
                        records
                            .into_iter()
                            .filter(|q| q.fixture_id == fixture.id)
                            .collect(),
                    )),
                    other => Err(unexpected(ResourceKind::Odds, &other)),
                }
            })
            .await
    }

    /// Upcoming fixtures inside `window` that involve any of `teams` and
    /// belong to any of `tournaments`.
    ///
    /// An empty team or tournament set does not filter on that field.
    pub async fn relevant_fixtures(
        &self,
        teams: &[String],
        tournaments: &[Tournament],
        window: FixtureWindow,
    ) -> Result<RelevantFixtures, DataError> {
        let cached = self.fixtures().await?;
        Ok(RelevantFixtures {
            stale: cached.is_stale(),
            all: cached.value,
            teams: teams.to_vec(),
            tournaments: tournaments.to_vec(),
            window,
        })
    }

    /// Odds for up to `limit` fixtures, skipping fixtures whose lookup fails.
    ///
    /// Fails only when every attempted lookup failed.
    pub async fn odds_for_fixtures<'a, I>(
        &self,
        fixtures: I,
        limit: usize,
    ) -> Result<Vec<FixtureOdds>, DataError>
    where
        I: IntoIterator<Item = &'a Fixture>,
    {
        let mut priced = Vec::new();
        let mut last_error = None;
        for fixture in fixtures.into_iter().take(limit) {
            match self.odds_for(fixture).await {
                Ok(cached) => priced.push(FixtureOdds {
                    fixture: fixture.clone(),
                    quotes: cached.value.as_ref().clone(),
                }),
                Err(err) => {
                    warn!(fixture_id = %fixture.id, error = %err, "odds lookup failed, skipping fixture");
                    last_error = Some(err);
                }
            }
        }
        // Odds are keyed per fixture; drop entries for fixtures long gone.
        self.odds.evict_expired(self.settings.stale_retain);
        match last_error {
            Some(err) if priced.is_empty() => Err(err),
            _ => Ok(priced),
        }
    }

    async fn fetch(&self, request: DataRequest) -> Result<DataRecords, DataError> {
        let timeout = self.settings.fetch_timeout;
        let started = std::time::Instant::now();
        let records = match tokio::time::timeout(timeout, self.client.fetch(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(kind = %request.kind, client = self.client.name(), "data fetch timed out");
                return Err(DataError::Timeout(timeout));
            }
        };
        debug!(
            kind = %request.kind,
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched sports data"
        );
        Ok(records)
    }
}

fn unexpected(expected: ResourceKind, got: &DataRecords) -> DataError {
    DataError::Upstream(format!(
        "expected {expected} records, client returned {}",
        got.kind()
    ))
}

fn in_tournament(fixture: &Fixture, tournament: &Tournament) -> bool {
    fixture.tournament_id == tournament.id
        || fixture
            .tournament_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(&tournament.name))
}

/// Lazy, restartable view over the cached fixture set.
#[derive(Debug, Clone)]
pub struct RelevantFixtures {
    all: Arc<Vec<Fixture>>,
    teams: Vec<String>,
    tournaments: Vec<Tournament>,
    window: FixtureWindow,
    stale: bool,
}

impl RelevantFixtures {
    /// Matching fixtures in kickoff order. Each call rescans the full set.
    pub fn iter(&self) -> impl Iterator<Item = &Fixture> + '_ {
        self.all.iter().filter(move |fixture| {
            matches!(fixture.status, FixtureStatus::Scheduled | FixtureStatus::Live)
                && self.window.contains(fixture.kickoff_time)
                && (self.teams.is_empty() || self.teams.iter().any(|t| fixture.involves(t)))
                && (self.tournaments.is_empty()
                    || self.tournaments.iter().any(|t| in_tournament(fixture, t)))
        })
    }

    pub fn window(&self) -> FixtureWindow {
        self.window
    }

    /// Whether the underlying set came from a stale cache entry.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}
