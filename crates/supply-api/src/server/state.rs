/// Everything that lives behind the single workflow lock: the ledger facade
/// and the demand dataset store.
struct ServerInner {
    workflow: WorkflowApi,
    store: DemandCsvStore,
}

#[derive(Clone)]
struct AppState {
    inner: std::sync::Arc<Mutex<ServerInner>>,
    forecast_runner: ScriptRunner,
    risk_runner: ScriptRunner,
}

impl AppState {
    fn new(config: &ServiceConfig) -> Result<Self, ServerError> {
        let mut workflow = WorkflowApi::new(&config.ledger_caller);
        workflow.attach_pending_store(&config.pending_db_path)?;

        // Forecast and risk runs share one permit pool so their combined
        // concurrency stays bounded.
        let permits = std::sync::Arc::new(tokio::sync::Semaphore::new(config.max_concurrent_runs));
        let forecast_runner = ScriptRunner::new(
            config.python_bin.clone(),
            config.forecast_script.clone(),
            config.runner_timeout,
            permits.clone(),
        );
        let risk_runner = ScriptRunner::new(
            config.python_bin.clone(),
            config.risk_script.clone(),
            config.runner_timeout,
            permits,
        );

        Ok(Self {
            inner: std::sync::Arc::new(Mutex::new(ServerInner {
                workflow,
                store: DemandCsvStore::new(config.demand_csv_path.clone()),
            })),
            forecast_runner,
            risk_runner,
        })
    }
}
