use std::net::SocketAddr;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use contracts::{ApiError, DemandRow, ErrorCode, Receipt, SCHEMA_VERSION_V1};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{ConfigError, ServiceConfig};
use crate::runner::{RunnerError, ScriptRunner};
use crate::store::{DemandCsvStore, StoreError};
use crate::{WorkflowApi, PRODUCTS_PER_PAGE};
use supply_core::{CacheError, LedgerError, ReadErrorKind};

const MAX_PAGE_SIZE: usize = 100;

include!("error.rs");
include!("state.rs");
include!("routes/products.rs");
include!("routes/analysis.rs");
include!("util.rs");

pub async fn serve(addr: SocketAddr, config: ServiceConfig) -> Result<(), ServerError> {
    config.validate()?;
    let state = AppState::new(&config)?;
    let app = router(state);

    info!(%addr, "supply api listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/products", post(create_product).get(list_products))
        .route(
            "/api/products/{product_id}/transfer",
            post(transfer_product),
        )
        .route(
            "/api/products/{product_id}/cancelTransfer",
            post(cancel_transfer),
        )
        .route("/api/addProduct", post(add_product))
        .route("/api/trainModel", post(train_model))
        .route("/api/Risk_trainModel", post(risk_train_model))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}
