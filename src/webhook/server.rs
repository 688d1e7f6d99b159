use super::signature::verify_headers;
use crate::dispatch::{Dispatcher, Event};
use crate::error::WebhookError;
use crate::github::events::{
    IssueCommentEvent, PullRequestEvent, PullRequestReviewCommentEvent, PullRequestReviewEvent,
};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};

const EVENT_HEADER: &str = "X-GitHub-Event";
const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

const PLUGIN_DESCRIPTION: &str = "The blunderbuss plugin automatically requests reviews from reviewers when a new PR is created. The reviewers are selected based on the reviewers specified in the OWNERS files that apply to the files modified by the PR.";

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    secret: Arc<[u8]>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, secret: impl Into<Vec<u8>>) -> Self {
        let secret: Vec<u8> = secret.into();
        Self {
            dispatcher,
            secret: Arc::from(secret),
        }
    }
}

#[derive(Debug, Serialize)]
struct PluginHelp {
    description: &'static str,
    config: String,
    commands: Vec<CommandHelp>,
}

#[derive(Debug, Serialize)]
struct CommandHelp {
    usage: &'static str,
    description: &'static str,
    featured: bool,
    who_can_use: &'static str,
    examples: Vec<&'static str>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(hook))
        .route("/hook", post(hook))
        .route("/healthz", get(healthz))
        .route("/help", get(help))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening for webhooks on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await
}

async fn healthz() -> &'static str {
    "ok"
}

async fn help(State(state): State<AppState>) -> Json<PluginHelp> {
    Json(PluginHelp {
        description: PLUGIN_DESCRIPTION,
        config: state.dispatcher.policy().describe(),
        commands: vec![CommandHelp {
            usage: "/auto-cc",
            description: "Manually request reviews from reviewers for a PR. Useful if OWNERS file were updated since the PR was opened.",
            featured: false,
            who_can_use: "Anyone",
            examples: vec!["/auto-cc"],
        }],
    })
}

async fn hook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    accept(&state, &headers, &body)
}

fn accept(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Response {
    let event_type = header(headers, EVENT_HEADER);
    let delivery = header(headers, DELIVERY_HEADER).unwrap_or("");
    let span = info_span!("webhook", event_type = event_type.unwrap_or(""), delivery);
    let _entered = span.enter();

    // Unauthenticated callers only ever see 403
    if let Err(e) = verify_headers(&state.secret, headers, body) {
        return reject(e);
    }
    let Some(event_type) = event_type else {
        return reject(WebhookError::MissingHeader(EVENT_HEADER));
    };

    match decode(event_type, body) {
        Ok(Some(event)) => {
            state.dispatcher.spawn(event);
            (StatusCode::OK, "Event received. Have a nice day.").into_response()
        }
        Ok(None) => (StatusCode::OK, "Event ignored.").into_response(),
        Err(e) => reject(e),
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn reject(error: WebhookError) -> Response {
    let status = match &error {
        WebhookError::MissingHeader(EVENT_HEADER) | WebhookError::Decode { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::FORBIDDEN,
    };
    warn!("Rejected webhook ({}): {}", status, error);
    (status, error.to_string()).into_response()
}

fn decode(event_type: &str, body: &[u8]) -> Result<Option<Event>, WebhookError> {
    let event = match event_type {
        "ping" => {
            debug!("Received ping");
            None
        }
        "pull_request" => Some(Event::PullRequest(parse::<PullRequestEvent>(
            event_type, body,
        )?)),
        "issue_comment" => parse::<IssueCommentEvent>(event_type, body)?
            .to_generic()
            .map(Event::GenericComment),
        "pull_request_review" => parse::<PullRequestReviewEvent>(event_type, body)?
            .to_generic()
            .map(Event::GenericComment),
        "pull_request_review_comment" => parse::<PullRequestReviewCommentEvent>(event_type, body)?
            .to_generic()
            .map(Event::GenericComment),
        other => {
            debug!("Ignoring unhandled event type {}", other);
            None
        }
    };
    Ok(event)
}

fn parse<T: DeserializeOwned>(event_type: &str, body: &[u8]) -> Result<T, WebhookError> {
    serde_json::from_slice(body).map_err(|source| WebhookError::Decode {
        event: event_type.to_string(),
        source,
    })
}
