#[derive(Debug, Serialize)]
struct AddProductResponse {
    schema_version: String,
    message: String,
}

/// Appends one demand observation. The legacy form posts every field as a
/// string, so the body is read as loose JSON and each field accepts either a
/// string or a number.
async fn add_product(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<AddProductResponse>, HttpApiError> {
    // The legacy contract requires a product name even though the dataset
    // does not carry a name column.
    loose_field(&body, "name")?;
    let row = DemandRow {
        date: loose_field(&body, "date")?,
        product_id: loose_field(&body, "product_id")?.parse().map_err(|_| {
            HttpApiError::invalid_request(
                "product_id must be a positive integer",
                Some("field=product_id".to_string()),
            )
        })?,
        location_id: loose_field(&body, "location_id")?,
        demand: loose_field(&body, "demand")?,
        price: loose_field(&body, "price")?,
    };

    let inner = state.inner.lock().await;
    inner.store.append_row(&row).map_err(HttpApiError::from_store)?;
    info!(product_id = row.product_id, date = %row.date, "demand row appended");

    Ok(Json(AddProductResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        message: "Product added successfully".to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct TrainResponse {
    schema_version: String,
    output: String,
}

async fn train_model(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<TrainResponse>, HttpApiError> {
    run_script(&state.forecast_runner, &body).await
}

async fn risk_train_model(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<TrainResponse>, HttpApiError> {
    run_script(&state.risk_runner, &body).await
}

// The workflow lock is not held across a run; only the permit pool bounds
// script concurrency.
async fn run_script(
    runner: &ScriptRunner,
    body: &Value,
) -> Result<Json<TrainResponse>, HttpApiError> {
    let data_path = match body.get("dataPath").and_then(Value::as_str) {
        Some(path) if !path.trim().is_empty() => path.trim(),
        _ => {
            return Err(HttpApiError::invalid_request(
                "dataPath is required",
                Some("field=dataPath".to_string()),
            ))
        }
    };

    let output = runner
        .run(data_path)
        .await
        .map_err(HttpApiError::from_runner)?;
    Ok(Json(TrainResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        output,
    }))
}
