use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use livekit_integration::{mint_token, LiveKitConfig, TokenGrants};
use shared::{
    config::AppConfig,
    domain::{ParticipantIdentity, RoomName},
    error::{ApiError, ErrorCode},
    protocol::{ConnectionDetails, ConnectionDetailsRequest},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;

use config::{load_settings, validated_livekit_url};

const MAX_REQUEST_BYTES: usize = 16 * 1024;

struct AppState {
    livekit: LiveKitConfig,
    livekit_url: Option<String>,
    app: AppConfig,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings()?;
    if let Err(error) = validated_livekit_url(settings.livekit_url.as_deref()) {
        error!(%error, "connection details will fail until LIVEKIT_URL is fixed");
    }

    let state = AppState {
        livekit: LiveKitConfig {
            api_key: settings.livekit_api_key,
            api_secret: settings.livekit_api_secret,
            ttl_seconds: settings.livekit_ttl_seconds,
        },
        livekit_url: settings.livekit_url,
        app: settings.app,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "token server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/connection-details", post(connection_details))
        .route("/api/app-config", get(app_config))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn app_config(State(state): State<Arc<AppState>>) -> Json<AppConfig> {
    Json(state.app.clone())
}

async fn connection_details(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<ConnectionDetails> {
    let request = if body.is_empty() {
        ConnectionDetailsRequest::default()
    } else {
        serde_json::from_slice::<ConnectionDetailsRequest>(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(ErrorCode::Validation, e.to_string())),
            )
        })?
    };

    let server_url = validated_livekit_url(state.livekit_url.as_deref()).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Misconfigured, e.to_string())),
        )
    })?;

    let suffix = random_suffix();
    let room_name = RoomName(format!("voice_assistant_room_{suffix}"));
    let participant_name = ParticipantIdentity(format!("voice_assistant_user_{suffix}"));
    let agent_name = request.agent_name().or(state.app.agent_name.as_deref());

    let participant_token = mint_token(
        &state.livekit,
        &participant_name,
        &room_name,
        TokenGrants::default(),
        agent_name,
    )
    .map_err(|e| {
        error!(error = %e, "failed to mint participant token");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;

    info!(room = %room_name, participant = %participant_name, agent = ?agent_name, "issued connection details");
    Ok(Json(ConnectionDetails {
        server_url,
        room_name,
        participant_name,
        participant_token,
    }))
}

fn random_suffix() -> u32 {
    (Uuid::new_v4().as_u128() % 10_000) as u32
}
