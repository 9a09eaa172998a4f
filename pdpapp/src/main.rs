use clap::Parser;
use pdpac::platform::Builder as PlatformBuilder;
use pdpapp::{
    conf::Cli,
    http::{router, ApiKey},
};
use pdpdb::Backend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    stderrlog::new()
        .module(module_path!())
        .module("pdpapp")
        .module("pdpac")
        .module("pdpdb")
        .module("pdpdb_sqlite")
        .module("pdprbac")
        .module("tower_http")
        .verbosity((args.verbose as usize) + 1)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let platform = PlatformBuilder::new()
        .boxed_pd_platform(
            Backend::pd(args.connector.connector_option())
                .await
                .map_err(anyhow::Error::from_boxed)?
        )
        .store_timeout(args.store_timeout())
        .ready_timeout(args.ready_timeout())
        .build()?;

    let app = router(platform.clone(), ApiKey::from(args.api_key.as_str()));

    let addr = args.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on http://{addr}");

    // requests arriving while the policy set loads wait for it
    let (failed_tx, failed_rx) = tokio::sync::oneshot::channel::<()>();
    let loader = tokio::spawn(async move {
        let result = platform.reload().await;
        if result.is_err() {
            failed_tx.send(()).ok();
        }
        result
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    log::info!("shutting down");
                }
                Ok(()) = failed_rx => {
                    log::error!("shutting down as the policy set could not be loaded");
                }
            }
        })
        .await?;

    loader.await??;
    Ok(())
}
