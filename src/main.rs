use gemlet::capsule::builtin;
use gemlet::config::Config;
use gemlet::server::Server;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load(Config::path_from_args())?;

    // Async workers handle sockets; capsules run on the blocking pool, which
    // grows up to workers.max and drops idle threads after the timeout.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cfg.workers.min)
        .max_blocking_threads(cfg.workers.max)
        .thread_keep_alive(cfg.workers.idle_timeout())
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let registry = builtin::registry(&cfg.capsules)?;
        let server = Server::init(&cfg, registry).await?;

        tokio::select! {
            res = server.run() => {
                res?;
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
        }

        Ok::<(), anyhow::Error>(())
    })
}
