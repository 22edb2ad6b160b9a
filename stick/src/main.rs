//! Runs the console host.

use std::time::Duration;

use stick::{StickServer, logger};
use stick_core::config::STICK_CONFIG;
use tokio::runtime::Builder;
use tokio::signal;

fn main() -> anyhow::Result<()> {
    logger::init()?;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let server = StickServer::new(STICK_CONFIG.clone())?;
        let ticks = server.start();

        let cancel_token = server.cancel_token.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                log::info!("Interrupted");
                cancel_token.cancel();
            }
        });

        server.run_console().await?;
        ticks.await?;
        anyhow::Ok(())
    })?;

    // A pending stdin read would otherwise hold the runtime open.
    runtime.shutdown_timeout(Duration::from_millis(100));
    log::info!("Stopped");
    Ok(())
}
