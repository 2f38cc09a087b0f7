use std::sync::Arc;

use lambda_priming::{
    init_tracing, Config, Environment, PostgresSource, ProxyRequest, RecordHandler,
    RecordService, WarmupPlan,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = Config::from_env()?;
    info!(
        strategy = %config.strategy,
        table = %config.table,
        snapshot = config.snapshot_enabled(),
        "cold start"
    );

    // Collaborators are built once per environment and passed down explicitly.
    let source = PostgresSource::new(config.database.pg_config()?);
    let service = RecordService::new(source, config.table);
    let handler = Arc::new(RecordHandler::new(service, config.initialization_type.clone()));

    let plan = if config.strategy.primes_at_init() {
        WarmupPlan::load(&config.warmup_file)
    } else {
        WarmupPlan::default()
    };
    let environment = Arc::new(Environment::initialize(
        config.strategy,
        handler,
        &plan,
        config.workers,
    ));

    // The snapshot is taken once init returns control to the runtime loop.
    if config.snapshot_enabled() {
        environment.before_checkpoint().await;
    }
    environment.start();

    run(service_fn(move |event: LambdaEvent<ProxyRequest>| {
        let environment = Arc::clone(&environment);
        async move { Ok::<_, Error>(environment.invoke(&event.payload).await) }
    }))
    .await
}
