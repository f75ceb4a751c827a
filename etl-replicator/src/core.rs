use etl::pipeline::{Pipeline, initialize_warehouse};
use etl::source::MySqlSource;
use etl::warehouse::Warehouse;
use etl_config::shared::ReplicatorConfig;
use tracing::info;

use crate::cli::Command;
use crate::error::{ReplicatorError, ReplicatorResult};

/// Runs `command` against the configured stores, printing its summary to stdout.
///
/// `init` only opens the warehouse. Every other command also connects to the source.
/// A validation that finds inconsistencies is returned as
/// [`ReplicatorError::ValidationFailed`] after the report is printed.
pub async fn run_command(command: Command, config: ReplicatorConfig) -> ReplicatorResult<()> {
    info!(%command, "starting replicator");

    log_config(&config);

    let warehouse = Warehouse::connect(&config.target).await?;

    match command {
        Command::Init => {
            let summary = initialize_warehouse(&warehouse, &config.sync.calendar).await?;
            println!(
                "warehouse initialized: {} calendar days generated, {} already present",
                summary.generated, summary.skipped
            );
        }
        Command::FullLoad => {
            let pipeline = connect_pipeline(config, warehouse).await?;
            let summary = pipeline.full_reload().await?;
            println!("{summary}");
        }
        Command::Incremental => {
            let pipeline = connect_pipeline(config, warehouse).await?;
            let summary = pipeline.incremental_reload().await?;
            println!("{summary}");
        }
        Command::Validate => {
            let pipeline = connect_pipeline(config, warehouse).await?;
            let report = pipeline.validate().await?;
            println!("{report}");

            if !report.is_ok() {
                return Err(ReplicatorError::ValidationFailed {
                    failures: report.failures(),
                });
            }
        }
    }

    info!(%command, "replicator finished");

    Ok(())
}

async fn connect_pipeline(
    config: ReplicatorConfig,
    warehouse: Warehouse,
) -> ReplicatorResult<Pipeline<MySqlSource>> {
    let source = MySqlSource::connect(&config.source).await?;

    Ok(Pipeline::new(source, warehouse, config.sync))
}

fn log_config(config: &ReplicatorConfig) {
    info!(
        host = config.source.host,
        port = config.source.port,
        dbname = config.source.name,
        username = config.source.username,
        tls_enabled = config.source.tls.enabled,
        "source connection config"
    );
    info!(path = %config.target.path.display(), "target connection config");
    info!(
        watermark_overlap_secs = config.sync.watermark_overlap_secs,
        revenue_tolerance = config.sync.revenue_tolerance,
        calendar_start_year = config.sync.calendar.start_year,
        calendar_end_year = config.sync.calendar.end_year,
        "sync config"
    );
}

#[cfg(test)]
mod tests {
    use etl_config::shared::{
        CalendarConfig, SourceConnectionConfig, SyncConfig, TargetConnectionConfig, TlsConfig,
    };

    use super::*;

    fn config(target: TargetConnectionConfig) -> ReplicatorConfig {
        ReplicatorConfig {
            // Nothing listens on port 1, so any attempt to reach the source fails.
            source: SourceConnectionConfig {
                host: "127.0.0.1".to_owned(),
                port: 1,
                name: "sakila".to_owned(),
                username: "root".to_owned(),
                password: None,
                tls: TlsConfig::default(),
            },
            target,
            sync: SyncConfig {
                calendar: CalendarConfig {
                    start_year: 2005,
                    end_year: 2005,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn init_only_needs_the_warehouse() {
        let dir = std::env::temp_dir().join(format!("etl-replicator-init-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = TargetConnectionConfig {
            path: dir.join("analytics.db"),
        };

        run_command(Command::Init, config(target.clone()))
            .await
            .unwrap();

        run_command(Command::Init, config(target.clone()))
            .await
            .unwrap();

        let warehouse = Warehouse::connect(&target).await.unwrap();
        assert_eq!(warehouse.count_rows("dim_date").await.unwrap(), 365);
        assert_eq!(warehouse.count_rows("dim_customer").await.unwrap(), 0);
        drop(warehouse);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
