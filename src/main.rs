use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use results_ingest::{bricks, takeon, AwsClients, Function};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    results_ingest::set_up_logging();

    let function = Function::from_env()?;
    info!(
        "Initializing {} version {} as {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        function
    );

    match function {
        Function::TakeonMethod => run(service_fn(takeon::method_handler)).await,
        Function::BrickTypeMethod => run(service_fn(bricks::method_handler)).await,
        Function::TakeonWrangler | Function::BrickTypeWrangler => {
            let aws_config = aws_config::load_defaults(BehaviorVersion::v2023_11_09()).await;
            let clients = AwsClients::new(&aws_config);
            let clients = &clients;

            run(service_fn(move |request: LambdaEvent<Value>| async move {
                let services = clients.services();
                if function == Function::TakeonWrangler {
                    takeon::wrangler_handler(services, request).await
                } else {
                    bricks::wrangler_handler(services, request).await
                }
            }))
            .await
        }
    }
}
