use lambda_priming::{init_tracing, setup, Config, ProxyRequest};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = Config::from_env()?;
    let database = &config.database;

    run(service_fn(|_event: LambdaEvent<ProxyRequest>| async move {
        Ok::<_, Error>(setup::handle(database).await)
    }))
    .await
}
