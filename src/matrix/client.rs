use crate::config::HomeserverConfig;
use crate::matrix::echo::EchoResponder;
use crate::matrix::error::{SessionError, SessionResult};
use crate::matrix::types::{
    JoinResponse, LoginRequest, LoginResponse, MatrixErrorBody, SendResponse, SyncResponse,
    TextContent, UserIdentifier, MESSAGE_EVENT,
};
use crate::peer::{server_name_of, CorrelationToken, ProbeSession, SendError, SendResult};
use crate::probe::PROBE_BODY;
use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SYNC_TIMEOUT_MS: u64 = 30_000;

/// Logged-in session of one bot account
pub struct MatrixSession {
    client: Client,
    base_url: Url,
    access_token: String,
    user_id: String,
    server_name: String,
}

impl MatrixSession {
    /// Open a session, logging in with the password when no access token is
    /// configured.
    pub async fn connect(config: &HomeserverConfig) -> SessionResult<Self> {
        let base_url = Url::parse(&config.homeserver).map_err(|e| SessionError::InvalidHomeserver {
            url: config.homeserver.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SessionError::InvalidHomeserver {
                url: config.homeserver.clone(),
                reason: "not a base URL".to_string(),
            });
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let token = config.access_token.as_deref().filter(|t| !t.is_empty());
        let (user_id, access_token) = match token {
            Some(token) => (config.username.clone(), token.to_string()),
            None => {
                let password = config
                    .password
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| SessionError::MissingCredentials(config.homeserver.clone()))?;
                let login = Self::login(&client, &base_url, config, password).await?;

                info!("Logged in as {}", login.user_id);
                warn!(
                    "Please store the access token and device id for {} \
                     and remove the password from the config",
                    config.homeserver
                );
                warn!("Access token: {}", login.access_token);
                if let Some(device_id) = &login.device_id {
                    warn!("Device ID: {}", device_id);
                }
                (login.user_id, login.access_token)
            }
        };

        let server_name = server_name_of(&user_id)
            .ok_or_else(|| SessionError::InvalidUserId(user_id.clone()))?
            .to_string();

        Ok(Self {
            client,
            base_url,
            access_token,
            user_id,
            server_name,
        })
    }

    async fn login(
        client: &Client,
        base_url: &Url,
        config: &HomeserverConfig,
        password: &str,
    ) -> SessionResult<LoginResponse> {
        let request = LoginRequest {
            kind: "m.login.password",
            identifier: UserIdentifier {
                kind: "m.id.user",
                user: &config.username,
            },
            password,
            device_id: config.device_id.as_deref(),
        };

        let url = endpoint(base_url, &["login"])?;
        let response = client.post(url).json(&request).send().await?;
        let response = check_status(response)
            .await
            .map_err(|(_, message)| SessionError::LoginFailed(message))?;

        Ok(response.json().await?)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Join `room` (alias or id) and return its room id
    pub async fn join_room(&self, room: &str) -> SessionResult<String> {
        let url = endpoint(&self.base_url, &["join", room])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let response = check_status(response)
            .await
            .map_err(|(_, message)| SessionError::JoinFailed {
                room: room.to_string(),
                message,
            })?;
        let joined: JoinResponse = response.json().await?;

        info!(server = %self.server_name, "Joined ping room {}", joined.room_id);
        Ok(joined.room_id)
    }

    /// Send a message event and return its event id
    pub async fn send_message<T: Serialize + Sync>(
        &self,
        room_id: &str,
        content: &T,
    ) -> SendResult<CorrelationToken> {
        let txn_id = uuid::Uuid::new_v4().to_string();
        let url = endpoint(
            &self.base_url,
            &["rooms", room_id, "send", MESSAGE_EVENT, txn_id.as_str()],
        )
        .map_err(|e| SendError::Transport(e.to_string()))?;

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(content)
            .send()
            .await?;

        let response = check_status(response).await.map_err(|(status, message)| {
            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SendError::Unauthorized(message)
                }
                _ => SendError::Rejected {
                    status: status.as_u16(),
                    message,
                },
            }
        })?;

        let sent: SendResponse = response.json().await?;
        Ok(CorrelationToken::new(sent.event_id))
    }

    /// One long-poll of `/sync`
    pub async fn sync_once(&self, since: Option<&str>) -> SessionResult<SyncResponse> {
        let mut url = endpoint(&self.base_url, &["sync"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("timeout", &SYNC_TIMEOUT_MS.to_string());
            if let Some(since) = since {
                query.append_pair("since", since);
            }
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .timeout(Duration::from_millis(SYNC_TIMEOUT_MS) + REQUEST_TIMEOUT)
            .send()
            .await?;

        let response = check_status(response)
            .await
            .map_err(|(_, message)| SessionError::SyncFailed(message))?;
        Ok(response.json().await?)
    }

    /// Sync forever, answering probes that `responder` accepts. Sync errors
    /// are retried with exponential backoff.
    pub async fn run_echo(self: Arc<Self>, responder: EchoResponder) {
        let mut since: Option<String> = None;
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(60),
            max_elapsed_time: None,
            ..Default::default()
        };

        loop {
            let batch = match self.sync_once(since.as_deref()).await {
                Ok(batch) => {
                    backoff.reset();
                    batch
                }
                Err(e) => {
                    let delay = backoff.next_backoff().unwrap_or(backoff.max_interval);
                    warn!(
                        server = %self.server_name,
                        "Sync failed, retrying in {:?}: {}", delay, e
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            for message in batch.messages(responder.room_id()) {
                let Some(reply) = responder.reply_to(&message) else {
                    continue;
                };

                info!(
                    server = %self.server_name,
                    "Received ping message in ping room by {}", message.sender
                );
                if let Err(e) = self.send_message(&reply.room_id, &reply.content).await {
                    error!(server = %self.server_name, "Failed to send pong: {}", e);
                }
            }

            since = Some(batch.next_batch);
        }
    }
}

#[async_trait]
impl ProbeSession for MatrixSession {
    fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn send_probe(&self, room: &str) -> SendResult<CorrelationToken> {
        self.send_message(room, &TextContent::text(PROBE_BODY)).await
    }
}

/// Client-server API v3 URL for `segments`, each percent-encoded
fn endpoint(base: &Url, segments: &[&str]) -> SessionResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SessionError::InvalidHomeserver {
            url: base.to_string(),
            reason: "not a base URL".to_string(),
        })?
        .pop_if_empty()
        .extend(["_matrix", "client", "v3"])
        .extend(segments);
    Ok(url)
}

/// Pass through successful responses, otherwise extract the Matrix error
async fn check_status(response: Response) -> Result<Response, (StatusCode, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<MatrixErrorBody>(&body) {
        Ok(err) if !err.errcode.is_empty() => format!("{}: {}", err.errcode, err.error),
        _ => format!("HTTP {}", status.as_u16()),
    };
    Err((status, message))
}
