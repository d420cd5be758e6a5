use canvasflow_session::{Runner, SessionConfig, SessionError, script};
use rootcause::prelude::Report;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Report<SessionError>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SessionConfig::from_env().map_err(|e| SessionError::Config {
        details: e.to_string(),
    })?;
    tracing::info!(script = ?config.script, "Loaded configuration");

    let commands = match &config.script {
        Some(path) => script::load(path)?,
        None => {
            tracing::info!("No script configured, running the risk-matrix demo");
            script::demo()
        }
    };

    let mut runner = Runner::new(config.engine);
    tokio::select! {
        result = runner.run(&commands) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, reporting executions so far");
        }
    }

    println!("{}", runner.executions_json()?);
    runner.close();
    Ok(())
}
