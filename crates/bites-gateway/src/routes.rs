//! Route handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bites_core::protocol::{self, status};
use bites_core::{
    ClientError, ConversationId, ItemKind, PointRequest, RangeRequest, RangeResponse, Reply,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AppState;
use crate::error::GatewayError;

pub const AUDIO_WAV: &str = "audio/wav";
pub const TEXT_PLAIN: &str = "text/plain";

/// JSON answer of the scan route
///
/// Absent neighbours are reported as `0` with the matching `has_*` flag
/// cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanBody {
    pub previous: u64,
    pub starts: Vec<u64>,
    pub next: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl From<RangeResponse> for ScanBody {
    fn from(resp: RangeResponse) -> Self {
        Self {
            previous: resp.previous.unwrap_or_default(),
            starts: resp.items,
            next: resp.next.unwrap_or_default(),
            has_previous: resp.previous.is_some(),
            has_next: resp.next.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanParams {
    from: Option<String>,
    to: Option<String>,
}

/// Parse an unsigned decimal offset; signs and blanks are rejected
fn parse_offset(name: &str, raw: Option<&str>) -> Result<u64, GatewayError> {
    let raw = raw.ok_or_else(|| GatewayError::BadRequest(format!("missing {name}")))?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::BadRequest(format!("invalid {name}: {raw:?}")));
    }
    raw.parse()
        .map_err(|_| GatewayError::BadRequest(format!("invalid {name}: {raw:?}")))
}

/// Reject conversation keys the store could never hold
fn check_conversation(key: &str) -> Result<(), GatewayError> {
    if ConversationId::is_valid(key) {
        Ok(())
    } else {
        Err(GatewayError::BadRequest(format!(
            "invalid conversation {key:?}: must match [A-Za-z0-9-]+"
        )))
    }
}

/// Run one store query under the gateway's own deadline
async fn bounded<F>(state: &AppState, query: F) -> Result<Reply, GatewayError>
where
    F: std::future::Future<Output = Result<Reply, ClientError>>,
{
    let reply = tokio::time::timeout(state.timeout, query)
        .await
        .map_err(|_| ClientError::Timeout)??;
    if reply.status != status::OK {
        debug!(status = reply.status, "Store refused query");
        return Err(GatewayError::Reply {
            status: reply.status,
            body: reply.body,
        });
    }
    Ok(reply)
}

pub async fn scan(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<ScanParams>,
) -> Result<Json<ScanBody>, GatewayError> {
    check_conversation(&key)?;
    let from = parse_offset("from", params.from.as_deref())?;
    let to = parse_offset("to", params.to.as_deref())?;

    let request = RangeRequest {
        conversation: key,
        kind: ItemKind::Segment,
        from,
        to,
    };
    let reply = bounded(&state, state.client.range(request)).await?;
    let resp: RangeResponse = protocol::decode(&reply.body)
        .map_err(|e| ClientError::Codec(e.to_string()))?;
    Ok(Json(resp.into()))
}

pub async fn segment(
    State(state): State<AppState>,
    Path((key, start)): Path<(String, String)>,
) -> Result<Response, GatewayError> {
    point(&state, ItemKind::Segment, key, &start, AUDIO_WAV).await
}

pub async fn annotation(
    State(state): State<AppState>,
    Path((key, start)): Path<(String, String)>,
) -> Result<Response, GatewayError> {
    point(&state, ItemKind::Annotation, key, &start, TEXT_PLAIN).await
}

async fn point(
    state: &AppState,
    kind: ItemKind,
    conversation: String,
    start: &str,
    content_type: &'static str,
) -> Result<Response, GatewayError> {
    check_conversation(&conversation)?;
    let start = parse_offset("start", Some(start))?;
    let request = PointRequest {
        kind,
        conversation,
        start,
    };
    let reply = bounded(state, state.client.point(request)).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], reply.body).into_response())
}
