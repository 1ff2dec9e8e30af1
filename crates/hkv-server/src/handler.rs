use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde_json::json;
use tracing::{debug, warn};

use hkv_hash::{Hash, HashOps};
use hkv_protocol::{codes, HashRequest, HashResponse, Message, RpcCodec};
use hkv_store::{Context, KvCore};

use crate::error::ServerResult;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub ops: HashOps<dyn KvCore>,
    pub request_timeout: Duration,
    /// Parent of every request context; cancelled on server shutdown.
    pub root: Context,
}

impl AppState {
    pub fn new(core: Arc<dyn KvCore>, config: &crate::ServerConfig, root: Context) -> Self {
        Self {
            ops: HashOps::with_config(core, config.hash.clone()),
            request_timeout: config.request_timeout(),
            root,
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "hkv-server",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol_version": hkv_protocol::PROTOCOL_VERSION,
    }))
}

/// Framed RPC handler: one request frame in, one response frame out.
pub async fn rpc_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let response = match RpcCodec::decode::<HashRequest>(&body) {
        Ok((request, _)) => {
            let ctx = state.root.with_timeout(state.request_timeout);
            dispatch(&state.ops, &ctx, request).await
        }
        Err(e) => {
            debug!(error = %e, "rejecting malformed rpc frame");
            HashResponse::error(codes::BAD_REQUEST, e.to_string())
        }
    };

    match encode_response(&response) {
        Ok(frame) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            frame,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, op = response.type_name(), "failed to encode rpc response");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn encode_response(response: &HashResponse) -> ServerResult<Vec<u8>> {
    Ok(RpcCodec::encode(response)?)
}

/// Run one request against `ops`.
///
/// Failures become `HashResponse::Error`; this never fails itself.
pub async fn dispatch<S: KvCore + ?Sized>(
    ops: &HashOps<S>,
    ctx: &Context,
    request: HashRequest,
) -> HashResponse {
    debug!(
        op = request.type_name(),
        key = request.key(),
        write = request.is_write(),
        "dispatch"
    );
    let result = match request {
        HashRequest::GetHash { key } => ops.get_hash(ctx, &key).await.map(HashResponse::Hash),
        HashRequest::GetHashField { key, field } => ops
            .get_hash_field(ctx, &key, &field)
            .await
            .map(HashResponse::Value),
        HashRequest::GetHashFields { key, fields } => ops
            .get_hash_fields(ctx, &key, fields)
            .await
            .map(HashResponse::Hash),
        HashRequest::HashHas { key, field } => {
            ops.hash_has(ctx, &key, &field).await.map(HashResponse::Bool)
        }
        HashRequest::HashLength { key } => ops
            .hash_length(ctx, &key)
            .await
            .map(|n| HashResponse::Length(n as u64)),
        HashRequest::HashFields { key } => ops.hash_fields(ctx, &key).await.map(HashResponse::Fields),
        HashRequest::HashValues { key } => ops.hash_values(ctx, &key).await.map(HashResponse::Values),
        HashRequest::SetHash { hash } => ops.set_hash(ctx, hash).await.map(|()| HashResponse::Done),
        HashRequest::SetHashField { key, field, value } => ops
            .set_hash_field(ctx, &key, field, value)
            .await
            .map(|()| HashResponse::Done),
        HashRequest::SetHashFields {
            hash: Hash { key, fields },
        } => ops
            .set_hash_fields(ctx, &key, fields)
            .await
            .map(|()| HashResponse::Done),
        HashRequest::DelHashField { key, field } => ops
            .del_hash_field(ctx, &key, &field)
            .await
            .map(|()| HashResponse::Done),
    };
    result.unwrap_or_else(|e| {
        debug!(error = %e, "operation failed");
        HashResponse::from_error(&e)
    })
}
