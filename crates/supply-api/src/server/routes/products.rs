#[derive(Debug, Deserialize)]
struct CreateProductRequest {
    #[serde(with = "contracts::serde_u64_string")]
    product_id: u64,
    #[serde(alias = "name")]
    product_name: String,
}

#[derive(Debug, Serialize)]
struct WriteReceiptResponse {
    schema_version: String,
    receipt: Receipt,
}

impl WriteReceiptResponse {
    fn new(receipt: Receipt) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            receipt,
        }
    }
}

async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<WriteReceiptResponse>), HttpApiError> {
    let mut inner = state.inner.lock().await;
    let receipt = inner
        .workflow
        .create_product(request.product_id, &request.product_name)
        .map_err(HttpApiError::from_ledger)?;

    info!(product_id = request.product_id, %receipt, "product created");
    Ok((StatusCode::CREATED, Json(WriteReceiptResponse::new(receipt))))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<usize>,
    page_size: Option<usize>,
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<crate::ProductPage>, HttpApiError> {
    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(HttpApiError::invalid_request("page numbers start at 1", None));
    }
    let page_size = params
        .page_size
        .unwrap_or(PRODUCTS_PER_PAGE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut inner = state.inner.lock().await;
    let listing = inner
        .workflow
        .list_page(page, page_size)
        .map_err(HttpApiError::from_ledger)?;
    if let Some(cache_error) = inner.workflow.take_cache_error() {
        warn!(%cache_error, "pending-transfer cache write failed");
    }

    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
struct TransferRequest {
    new_owner: String,
    details: String,
}

async fn transfer_product(
    State(state): State<AppState>,
    Path(product_id): Path<u64>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<WriteReceiptResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let receipt = inner
        .workflow
        .transfer_product(product_id, &request.new_owner, &request.details)
        .map_err(HttpApiError::from_ledger)?;
    if let Some(cache_error) = inner.workflow.take_cache_error() {
        warn!(%cache_error, product_id, "transfer committed but annotation was not cached");
    }

    info!(product_id, new_owner = %request.new_owner, %receipt, "transfer submitted");
    Ok(Json(WriteReceiptResponse::new(receipt)))
}

async fn cancel_transfer(
    State(state): State<AppState>,
    Path(product_id): Path<u64>,
) -> Result<Json<WriteReceiptResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let receipt = inner
        .workflow
        .cancel_transfer(product_id)
        .map_err(HttpApiError::from_ledger)?;
    if let Some(cache_error) = inner.workflow.take_cache_error() {
        warn!(%cache_error, product_id, "cancel committed but annotation was not cleared");
    }

    info!(product_id, %receipt, "transfer cancelled");
    Ok(Json(WriteReceiptResponse::new(receipt)))
}
