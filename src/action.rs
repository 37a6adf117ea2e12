use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};

use petshop_scheduling::{api, config, consts, repo, utils};

#[derive(Args, Debug, Clone)]
pub struct RunMigrationsArgs {
    #[arg(short, long)]
    file: String,
}

#[derive(Args, Debug, Clone)]
pub struct PackageUsageArgs {
    #[arg(long)]
    org_id: i64,
    #[arg(long)]
    pet_id: i64,
    #[arg(long)]
    package_id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateSchedulingArgs {
    #[arg(long)]
    org_id: i64,
    #[arg(long)]
    service_id: i64,
    #[arg(long)]
    pet_id: i64,
    /// Day on the shop calendar, YYYY-MM-DD
    #[arg(long, required_unless_present = "at", conflicts_with = "at")]
    date: Option<String>,
    /// RFC 3339 instant, converted to a day with the shop timezone
    #[arg(long)]
    at: Option<String>,
}

/// Day on the shop calendar the scheduling rules are checked against.
fn target_date(date: Option<&str>, at: Option<&str>, tz: Tz) -> anyhow::Result<NaiveDate> {
    match (date, at) {
        (Some(date), _) => Ok(NaiveDate::parse_from_str(date, consts::DATE_INPUT_FORMAT)?),
        (None, Some(at)) => Ok(utils::local_date(
            DateTime::parse_from_rfc3339(at)?.to_utc(),
            tz,
        )),
        (None, None) => Err(anyhow::anyhow!("either --date or --at is required")),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Action {
    RunMigrations(RunMigrationsArgs),
    /// Print the credit usage of a pet's package as JSON
    PackageUsage(PackageUsageArgs),
    /// Check if a service may be booked for a pet on a date
    ValidateScheduling(ValidateSchedulingArgs),
}

/// Operator tools for the appointment engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct AppArgs {
    #[command(subcommand)]
    pub action: Action,
}

async fn org_repo(org_id: i64) -> anyhow::Result<repo::ImplAppRepo> {
    let sqlite_repo = repo::sqlite::SqlxSqliteRepo {
        db_pool: utils::setup_sqlite_db_pool(config::APP_CONFIG.is_prod()).await?,
        org_id,
    };

    Ok(Box::new(sqlite_repo))
}

impl AppArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        match &self.action {
            Action::RunMigrations(RunMigrationsArgs { file }) => {
                let db_pool = utils::setup_sqlite_db_pool(config::APP_CONFIG.is_prod()).await?;

                utils::run_migrations(&db_pool, file).await?;
                log::info!("migration {file} applied");
                Ok(())
            }
            Action::PackageUsage(PackageUsageArgs {
                org_id,
                pet_id,
                package_id,
            }) => {
                let repo = org_repo(*org_id).await?;

                let usage = api::package::get_package_usage(*pet_id, *package_id, &repo)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;

                println!("{}", serde_json::to_string_pretty(&usage)?);
                Ok(())
            }
            Action::ValidateScheduling(ValidateSchedulingArgs {
                org_id,
                service_id,
                pet_id,
                date,
                at,
            }) => {
                let date = target_date(
                    date.as_deref(),
                    at.as_deref(),
                    config::APP_CONFIG.timezone()?,
                )?;
                let repo = org_repo(*org_id).await?;

                let decision =
                    api::scheduling::validate_scheduling(*service_id, *pet_id, date, &repo).await;

                println!("{}", serde_json::to_string_pretty(&decision)?);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_date_from_date() {
        let date = target_date(Some("2024-05-08"), None, chrono_tz::America::Sao_Paulo).unwrap();

        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 8).unwrap());
    }

    #[test]
    fn test_target_date_from_instant_uses_shop_timezone() {
        let at = Some("2024-05-09T01:30:00Z");

        assert_eq!(
            target_date(None, at, chrono_tz::America::Sao_Paulo).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 8).unwrap()
        );
        assert_eq!(
            target_date(None, at, chrono_tz::UTC).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 9).unwrap()
        );
    }

    #[test]
    fn test_target_date_rejects_bad_input() {
        let tz = chrono_tz::America::Sao_Paulo;

        assert!(target_date(Some("08/05/2024"), None, tz).is_err());
        assert!(target_date(None, Some("yesterday"), tz).is_err());
        assert!(target_date(None, None, tz).is_err());
    }
}
