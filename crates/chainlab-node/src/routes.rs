//! HTTP surface for the chain: list, fetch by index, mine.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chainlab_core::{Block, MineError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::node::ChainService;

pub type AppState = Arc<ChainService>;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize, Deserialize)]
pub struct ChainPayload {
    pub chain: Vec<Block>,
}

/// Envelope for whole-chain responses; also what the sync routine parses
/// back from a peer.
#[derive(Serialize, Deserialize)]
pub struct ChainResponse {
    pub success: bool,
    pub data: ChainPayload,
}

#[derive(Serialize)]
struct BlockResponse {
    success: bool,
    data: Block,
}

#[derive(Serialize)]
struct MinedResponse {
    success: bool,
    message: &'static str,
    data: ChainPayload,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

#[derive(Deserialize)]
struct MineRequest {
    data: Value,
}

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/blocks", get(list_blocks))
        .route("/api/blocks/{index}", get(get_block_by_index))
        .route("/api/blocks/mine", post(mine_block))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn list_blocks(State(service): State<AppState>) -> Json<ChainResponse> {
    let chain = service.all_blocks().await;
    Json(ChainResponse {
        success: true,
        data: ChainPayload { chain },
    })
}

async fn get_block_by_index(
    State(service): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<BlockResponse>, (StatusCode, Json<ErrorResponse>)> {
    match service.get_block(index).await {
        Some(block) => Ok(Json(BlockResponse {
            success: true,
            data: block,
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                success: false,
                message: format!("no block at index {index}"),
            }),
        )),
    }
}

async fn mine_block(
    State(service): State<AppState>,
    Json(request): Json<MineRequest>,
) -> Result<(StatusCode, Json<MinedResponse>), (StatusCode, Json<ErrorResponse>)> {
    match service.add_block(request.data).await {
        Ok(_) => {
            let chain = service.all_blocks().await;
            Ok((
                StatusCode::CREATED,
                Json(MinedResponse {
                    success: true,
                    message: "Block is added",
                    data: ChainPayload { chain },
                }),
            ))
        }
        Err(err) => {
            let status = match err.downcast_ref::<MineError>() {
                Some(MineError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                status,
                Json(ErrorResponse {
                    success: false,
                    message: err.to_string(),
                }),
            ))
        }
    }
}
