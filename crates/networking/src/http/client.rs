//! Quest backend HTTP client with bearer-token authentication

use crate::QuestBackend;
use async_trait::async_trait;
use questlog_cache::TtlCache;
use questlog_core::{
    ChallengeDefinition, ChallengePayload, ClaimContext, ClaimRequest, Error, LeaderboardEntry,
    LeaderboardResponse, MutationReceipt, MutationResponse, QuestDefinition, QuestInstance,
    QuestInstancePayload, QuestPayload, QuestStatus, Result, ScanResult, SessionResponse,
    SocialStats, UserChallengePayload, UserChallengeRecord, UserProfile, Xp,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, RequestBuilder, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT_VALUE: &str = concat!("questlog/", env!("CARGO_PKG_VERSION"));

const CHALLENGES_KEY: &str = "event_challenges";
const QUESTS_KEY: &str = "quest_definitions";

/// Where and how to reach the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Shared cache for definition lists (shared across clients)
#[derive(Default)]
pub struct DefinitionCache {
    challenges: TtlCache<Vec<ChallengeDefinition>>,
    quests: TtlCache<Vec<QuestDefinition>>,
}

/// Error body shape used by the backend on failures
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the quest backend
///
/// Every request carries the session token as a bearer header. Definition
/// lists go through an optional shared cache; player state never does.
pub struct QuestClient {
    http: Client,
    api_base: Url,
    cache: Option<Arc<DefinitionCache>>,
}

impl QuestClient {
    /// Create a new client for the given config and session token
    pub fn new(config: &ClientConfig, session_token: &str) -> Result<Self> {
        let token = session_token.trim();
        if token.is_empty() {
            return Err(Error::ValidationError("session token is empty".to_string()));
        }

        let api_base = Url::parse(&config.base_url).map_err(|e| {
            Error::ValidationError(format!("invalid base url '{}': {}", config.base_url, e))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(Error::ValidationError(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let http = Client::builder()
            .default_headers(Self::default_headers(token)?)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::RemoteFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base,
            cache: None,
        })
    }

    /// Create a new client sharing a definition cache
    pub fn new_with_cache(
        config: &ClientConfig,
        session_token: &str,
        cache: Arc<DefinitionCache>,
    ) -> Result<Self> {
        let mut client = Self::new(config, session_token)?;
        client.cache = Some(cache);
        Ok(client)
    }

    fn default_headers(token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            Error::ValidationError("session token contains invalid characters".to_string())
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(headers)
    }

    /// Build `{api_base}/{segments...}` with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::ValidationError("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Check if response indicates authentication failure
    fn check_auth_error(response: &Response) -> Option<Error> {
        match response.status() {
            StatusCode::UNAUTHORIZED => Some(Error::TokenExpired),
            StatusCode::FORBIDDEN => Some(Error::Unauthorized("access forbidden".to_string())),
            _ => None,
        }
    }

    /// Send a request and return the raw body of a 2xx response
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String> {
        let response = request.send().await.map_err(|e| {
            error!("{} request failed: {}", what, e);
            Error::RemoteFailure(e.to_string())
        })?;

        debug!("{} response status: {}", what, response.status());

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read {} response body: {}", what, e);
            Error::RemoteFailure(e.to_string())
        })?;

        if !status.is_success() {
            let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let message = parsed
                .error
                .or(parsed.message)
                .unwrap_or_else(|| format!("HTTP {}: {}", status, preview(&body)));
            error!("{} request failed with status {}: {}", what, status, message);
            return Err(Error::RemoteFailure(message));
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        let body = self.send(self.http.get(url), what).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse {} response: {}. Body preview: {}", what, e, preview(&body));
            Error::InvalidData(e.to_string())
        })
    }

    /// POST and interpret the body as `{ success?, error?, xpAwarded? }`
    async fn post_mutation(
        &self,
        url: Url,
        body: Option<serde_json::Value>,
        what: &str,
    ) -> Result<MutationReceipt> {
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let text = self.send(request, what).await?;
        if text.trim().is_empty() {
            return Ok(MutationReceipt::default());
        }

        let response: MutationResponse = serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse {} response: {}", what, e);
            Error::InvalidData(e.to_string())
        })?;
        response.into_result()
    }
}

#[async_trait]
impl QuestBackend for QuestClient {
    #[instrument(skip(self))]
    async fn fetch_session(&self) -> Result<UserProfile> {
        let url = self.url(&["auth", "session"])?;
        let session: SessionResponse = self.get_json(url, "session").await?;
        let profile = session.into_user_profile();
        debug!("Session verified for user: {} (admin={})", profile.username, profile.is_admin);
        Ok(profile)
    }

    #[instrument(skip(self))]
    async fn fetch_event_challenges(&self) -> Result<Vec<ChallengeDefinition>> {
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.challenges.get(CHALLENGES_KEY) {
                debug!("Cache hit for event challenges");
                return Ok(cached);
            }
        }

        let url = self.url(&["events", "challenges"])?;
        let body: serde_json::Value = self.get_json(url, "event challenges").await?;
        let payloads: Vec<ChallengePayload> =
            decode_list(body, &["challenges", "data", "items"], "challenge")?;
        let definitions = normalize_list(payloads, "challenge", ChallengePayload::normalize);

        debug!("Fetched {} event challenges", definitions.len());
        if let Some(ref cache) = self.cache {
            cache.challenges.insert(CHALLENGES_KEY, definitions.clone());
        }
        Ok(definitions)
    }

    #[instrument(skip(self))]
    async fn fetch_user_event_challenges(&self) -> Result<Vec<UserChallengeRecord>> {
        let url = self.url(&["events", "challenges", "me"])?;
        let body: serde_json::Value = self.get_json(url, "user challenges").await?;
        let payloads: Vec<UserChallengePayload> =
            decode_list(body, &["records", "challenges", "data", "items"], "challenge record")?;
        let records = normalize_list(payloads, "challenge record", UserChallengePayload::normalize);

        debug!("Fetched {} user challenge records", records.len());
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn start_challenge(&self, challenge_id: &str) -> Result<()> {
        let url = self.url(&["events", "challenges", challenge_id, "start"])?;
        self.post_mutation(url, None, "start challenge").await?;
        debug!("Challenge {} started", challenge_id);
        Ok(())
    }

    #[instrument(skip(self, context))]
    async fn claim_event_challenge(
        &self,
        challenge_id: &str,
        xp_amount: Xp,
        context: &ClaimContext,
    ) -> Result<MutationReceipt> {
        let url = self.url(&["events", "challenges", challenge_id, "claim"])?;
        let body = serde_json::to_value(ClaimRequest {
            xp_amount,
            context,
        })?;
        let receipt = self.post_mutation(url, Some(body), "claim challenge").await?;
        debug!("Challenge {} claimed for {}", challenge_id, receipt.xp_awarded);
        Ok(receipt)
    }

    #[instrument(skip(self))]
    async fn admin_complete_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<MutationReceipt> {
        let url = self.url(&["admin", "users", user_id, "challenges", challenge_id, "complete"])?;
        self.post_mutation(url, None, "admin complete challenge").await
    }

    #[instrument(skip(self))]
    async fn admin_uncomplete_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<MutationReceipt> {
        let url = self.url(&["admin", "users", user_id, "challenges", challenge_id, "uncomplete"])?;
        self.post_mutation(url, None, "admin uncomplete challenge").await
    }

    #[instrument(skip(self))]
    async fn admin_reset_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<MutationReceipt> {
        let url = self.url(&["admin", "users", user_id, "challenges", challenge_id, "reset"])?;
        self.post_mutation(url, None, "admin reset challenge").await
    }

    #[instrument(skip(self))]
    async fn fetch_quest_definitions(&self) -> Result<Vec<QuestDefinition>> {
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.quests.get(QUESTS_KEY) {
                debug!("Cache hit for quest definitions");
                return Ok(cached);
            }
        }

        let url = self.url(&["quests"])?;
        let body: serde_json::Value = self.get_json(url, "quest definitions").await?;
        let payloads: Vec<QuestPayload> = decode_list(body, &["quests", "data", "items"], "quest")?;
        let definitions = normalize_list(payloads, "quest", QuestPayload::normalize);

        debug!("Fetched {} quest definitions", definitions.len());
        if let Some(ref cache) = self.cache {
            cache.quests.insert(QUESTS_KEY, definitions.clone());
        }
        Ok(definitions)
    }

    #[instrument(skip(self))]
    async fn fetch_user_quests(&self, user_id: &str) -> Result<Vec<QuestInstance>> {
        let url = self.url(&["users", user_id, "quests"])?;
        let body: serde_json::Value = self.get_json(url, "user quests").await?;
        let payloads: Vec<QuestInstancePayload> =
            decode_list(body, &["quests", "data", "items"], "quest instance")?;
        let quests = normalize_list(payloads, "quest instance", QuestInstancePayload::normalize);

        debug!("Fetched {} quest instances for user {}", quests.len(), user_id);
        Ok(quests)
    }

    #[instrument(skip(self))]
    async fn start_quest(&self, quest_id: &str) -> Result<()> {
        let url = self.url(&["quests", quest_id, "start"])?;
        self.post_mutation(url, None, "start quest").await?;
        Ok(())
    }

    #[instrument(skip(self, code))]
    async fn redeem_scan_code(&self, code: &str) -> Result<ScanResult> {
        let url = self.url(&["quests", "redeem"])?;
        let request = self.http.post(url).json(&serde_json::json!({ "code": code }));
        let body = self.send(request, "redeem code").await?;

        let result: ScanResult = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse redeem response: {}", e);
            Error::InvalidData(e.to_string())
        })?;
        if let Some(err) = result.error.as_ref().filter(|e| !e.is_empty()) {
            return Err(Error::RemoteFailure(err.clone()));
        }

        debug!("Code redeemed for quest {} (completed={})", result.quest_id, result.completed);
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn admin_complete_quest(&self, user_id: &str, quest_id: &str) -> Result<MutationReceipt> {
        let url = self.url(&["admin", "users", user_id, "quests", quest_id, "complete"])?;
        self.post_mutation(url, None, "admin complete quest").await
    }

    #[instrument(skip(self))]
    async fn admin_uncomplete_quest(
        &self,
        user_id: &str,
        quest_id: &str,
    ) -> Result<MutationReceipt> {
        let url = self.url(&["admin", "users", user_id, "quests", quest_id, "uncomplete"])?;
        self.post_mutation(url, None, "admin uncomplete quest").await
    }

    #[instrument(skip(self))]
    async fn admin_reset_quest(
        &self,
        user_id: &str,
        quest_id: &str,
        status: QuestStatus,
    ) -> Result<MutationReceipt> {
        let url = self.url(&["admin", "users", user_id, "quests", quest_id, "reset"])?;
        let body = serde_json::json!({ "status": status });
        self.post_mutation(url, Some(body), "admin reset quest").await
    }

    #[instrument(skip(self))]
    async fn fetch_social_stats(&self, user_id: &str) -> Result<SocialStats> {
        let url = self.url(&["users", user_id, "social"])?;
        self.get_json(url, "social stats").await
    }

    #[instrument(skip(self))]
    async fn fetch_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>> {
        let mut url = self.url(&["leaderboard"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());

        let leaderboard: LeaderboardResponse = self.get_json(url, "leaderboard").await?;
        debug!("Leaderboard fetched: {} entries", leaderboard.entries.len());
        Ok(leaderboard.entries)
    }
}

/// Accept a bare array or an object wrapping one under any of `keys`.
/// Elements that don't decode are skipped with a warning.
fn decode_list<P: DeserializeOwned>(
    body: serde_json::Value,
    keys: &[&str],
    what: &str,
) -> Result<Vec<P>> {
    let items = match body {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => keys
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(serde_json::Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| Error::InvalidData(format!("no {} list in response", what)))?,
        other => {
            return Err(Error::InvalidData(format!(
                "expected a {} list, got {}",
                what,
                preview(&other.to_string())
            )))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<P>(item) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Skipping undecodable {}: {}", what, e);
                None
            }
        })
        .collect())
}

/// Normalize payloads, dropping (and logging) the ones that don't validate
fn normalize_list<P, T>(
    payloads: Vec<P>,
    what: &str,
    normalize: impl Fn(P) -> Result<T>,
) -> Vec<T> {
    payloads
        .into_iter()
        .filter_map(|payload| match normalize(payload) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping {}: {}", what, e);
                None
            }
        })
        .collect()
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(300);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
