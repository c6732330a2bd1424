use crate::{
    Config,
    database::{DatabaseManager, DatabaseManagerImpl},
    metering::MeteringService,
};
use clap::Subcommand;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Subcommand)]
pub enum MaintenanceTask {
    /// Evaluate accounts and enforce limits and demo lifetimes
    Sweep {
        #[arg(long, help = "Specific account ID to evaluate (default: all accounts)")]
        account_id: Option<i32>,
        #[arg(
            long,
            help = "Dry run - report classifications without applying enforcement"
        )]
        dry_run: bool,
    },
}

pub async fn handle_maintenance_command(
    task: MaintenanceTask,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let db_manager: Arc<dyn DatabaseManager> =
        Arc::new(DatabaseManagerImpl::new_from_config(&config.database).await?);
    let metering = MeteringService::new(db_manager.clone(), &config.limits);

    match task {
        MaintenanceTask::Sweep {
            account_id,
            dry_run,
        } => {
            let account_ids = match account_id {
                Some(id) => vec![id],
                None => db_manager.accounts().list_ids().await?,
            };

            info!(
                "Sweeping {} account(s) (dry_run: {})",
                account_ids.len(),
                dry_run
            );

            let mut stragglers = Vec::new();
            for id in account_ids {
                if dry_run {
                    let status = metering.usage_status(id).await?;
                    println!(
                        "account {}: {:?}, {:.1}/{:.1} minutes, {} active assistant(s), limit reached: {}",
                        id,
                        status.warning_level,
                        status.total_minutes,
                        status.minutes_limit,
                        status.active_assistants,
                        status.any_limit_reached
                    );
                    continue;
                }

                let decision = metering.enforce(id).await?;
                if !decision.assistants_to_expire.is_empty() {
                    info!(
                        "account {}: retired {} assistant(s)",
                        id,
                        decision.assistants_to_expire.len()
                    );
                }
                if !decision.failed_assistants.is_empty() {
                    warn!(
                        "account {}: {} assistant(s) failed to retire",
                        id,
                        decision.failed_assistants.len()
                    );
                    stragglers.extend(decision.failed_assistants);
                }
            }

            if !stragglers.is_empty() {
                return Err(format!(
                    "enforcement incomplete for assistants {:?}; re-run the sweep",
                    stragglers
                )
                .into());
            }

            info!("Sweep completed successfully");
        }
    }

    Ok(())
}
