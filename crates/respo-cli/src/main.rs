//! Respo CLI - triage paid research studies on Respondent.io

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;

use respo_core::config::Config;
use respo_core::credentials::Credential;
use respo_core::filter::HideCriteria;
use respo_core::pipeline::{HideOutcome, HidePipeline, HideReport};
use respo_core::rate::NormalizedProject;
use respo_core::vendor::{RespondentClient, VendorApi};
use respo_core::Error;

#[derive(Parser)]
#[command(name = "respo")]
#[command(author, version, about = "Triage paid research studies on Respondent.io", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the stored session credential
    Auth,

    /// List available projects with normalized hourly rates
    #[command(alias = "list")]
    Projects {
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Results per page
        #[arg(long)]
        page_size: Option<u32>,
        /// Sort order (vendor key, e.g. v4Score)
        #[arg(long)]
        sort: Option<String>,
        /// Minimum incentive in dollars
        #[arg(long)]
        min_incentive: Option<u32>,
        /// Maximum incentive in dollars
        #[arg(long)]
        max_incentive: Option<u32>,
        /// Fetch every page instead of one
        #[arg(long)]
        all: bool,
        /// Save the raw project JSON to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Hide a project, or every project falling below a threshold
    Hide {
        /// Project ID to hide
        #[arg(long)]
        id: Option<String>,
        /// Hide projects paying less than this per hour
        #[arg(long)]
        hourly_rate: Option<f64>,
        /// Hide projects with a total incentive below this
        #[arg(long)]
        incentive: Option<f64>,
        /// Hide projects that are not of this research type
        /// (remote, focus-groups, in-person)
        #[arg(long)]
        not_kind: Option<String>,
        /// Show what would be hidden without calling the vendor
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage the stored session credential
    Credentials {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Store a session captured from the browser
    Set {
        /// Cookie as name=value (repeatable)
        #[arg(long = "cookie", value_name = "NAME=VALUE")]
        cookies: Vec<String>,
        /// Authorization header value (e.g. "Bearer <token>")
        #[arg(long)]
        authorization: Option<String>,
        /// Expiry hint (RFC 3339, e.g. 2026-09-01T00:00:00Z)
        #[arg(long)]
        expires_at: Option<String>,
    },
    /// Show the stored credential (redacted)
    Show,
    /// Remove the stored credential
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("respo=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Auth => cmd_auth(cli.quiet).await,

        Commands::Projects {
            page,
            page_size,
            sort,
            min_incentive,
            max_incentive,
            all,
            output,
        } => {
            let overrides = SearchOverrides {
                page_size,
                sort,
                min_incentive,
                max_incentive,
            };
            cmd_projects(page, overrides, all, output, cli.quiet).await
        }

        Commands::Hide {
            id,
            hourly_rate,
            incentive,
            not_kind,
            dry_run,
        } => {
            let criteria = HideCriteria {
                project_id: id,
                min_hourly_rate: hourly_rate,
                min_incentive: incentive,
                not_kind: not_kind
                    .map(|k| k.parse().map_err(|e: String| anyhow!(e)))
                    .transpose()?,
            };
            cmd_hide(criteria, dry_run, cli.quiet).await
        }

        Commands::Credentials { action } => cmd_credentials(action, cli.quiet).await,

        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

struct SearchOverrides {
    page_size: Option<u32>,
    sort: Option<String>,
    min_incentive: Option<u32>,
    max_incentive: Option<u32>,
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Load the stored credential, or explain how to store one
async fn load_credential(config: &Config) -> anyhow::Result<Credential> {
    let store = config.credential_store()?;
    store
        .load()
        .await?
        .ok_or_else(|| anyhow!(Error::Auth("no stored credential".to_string())))
}

/// Build an authenticated client from config + stored credential
async fn build_client(config: &Config) -> anyhow::Result<RespondentClient> {
    let credential = load_credential(config).await?;

    let mut params = config.search.clone();
    params.page_size = params.page_size.max(1);

    let mut builder = RespondentClient::builder()
        .credential(credential)
        .base_url(config.vendor.base_url.clone())
        .params(params)
        .timeout_secs(config.vendor.timeout_secs);
    if !config.vendor.profile_id.is_empty() {
        builder = builder.profile_id(config.vendor.profile_id.clone());
    }
    Ok(builder.build()?)
}

/// Verify the credential and make sure the client carries a profile ID,
/// discovering it from the identity response when unconfigured
async fn verified_client(config: &Config, quiet: bool) -> anyhow::Result<RespondentClient> {
    let client = build_client(config).await?;
    let identity = client.verify().await?;
    debug!(profile_id = %identity.profile_id, "Credential verified");

    if !quiet {
        println!("Authenticated as {} (profile {})", identity.first_name, identity.profile_id);
    }

    if config.vendor.profile_id.is_empty() {
        Ok(client.with_profile_id(identity.profile_id))
    } else {
        Ok(client)
    }
}

async fn cmd_auth(quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = build_client(&config).await?;

    let identity = client.verify().await?;
    if quiet {
        println!("{}", identity.profile_id);
    } else {
        println!("Authentication successful!");
        println!("  Profile ID: {}", identity.profile_id);
        println!("  First Name: {}", identity.first_name);
        if config.vendor.profile_id.is_empty() {
            println!("\nTip: persist the profile ID for faster startup:");
            println!("  respo config set vendor.profile_id {}", identity.profile_id);
        }
    }
    Ok(())
}

async fn cmd_projects(
    page: u32,
    overrides: SearchOverrides,
    all: bool,
    output: Option<PathBuf>,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(size) = overrides.page_size {
        config.search.page_size = size.max(1);
    }
    if let Some(sort) = overrides.sort {
        config.search.sort = sort;
    }
    if let Some(min) = overrides.min_incentive {
        config.search.min_incentive = min;
    }
    if let Some(max) = overrides.max_incentive {
        config.search.max_incentive = max;
    }

    let client = verified_client(&config, quiet).await?;
    let policy = config.filter.range_policy;

    let (projects, total) = if all {
        let pipeline = HidePipeline::new(client, policy);
        pipeline.fetch_all().await?
    } else {
        let fetched = client.list_projects(page).await?;
        let total = fetched.count;
        let projects = fetched
            .results
            .into_iter()
            .map(|p| NormalizedProject::from_project(p, policy))
            .collect();
        (projects, total)
    };

    if projects.is_empty() {
        println!("No projects found.");
    } else {
        for (idx, np) in projects.iter().enumerate() {
            print_project(idx + 1, np, &config.vendor.base_url, quiet);
        }
    }
    if let Some(total) = total {
        println!("\nTotal projects available: {}", total);
    }

    if let Some(path) = output {
        let raw: Vec<_> = projects.iter().map(|np| &np.project).collect();
        let json = serde_json::to_string_pretty(&raw)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !quiet {
            println!("Saved raw project JSON to {}", path.display());
        }
    }

    Ok(())
}

fn print_project(idx: usize, np: &NormalizedProject, base_url: &str, quiet: bool) {
    let p = &np.project;
    if quiet {
        println!("{}\t{}\t${:.2}\t{}", p.id, np.rate, p.incentive, p.name);
        return;
    }

    println!("[{}] {}", idx, p.id);
    match np.rate.hours() {
        Some(hours) => println!(
            "    Rate: {} (${:.2} for {:.1}h)",
            np.rate, p.incentive, hours
        ),
        None => println!("    Rate: {} (${:.2}, duration unknown)", np.rate, p.incentive),
    }
    println!("    Name: {}", p.name);
    if !p.description.is_empty() {
        let description: String = p.description.chars().take(200).collect();
        let ellipsis = if p.description.chars().count() > 200 { "..." } else { "" };
        println!("    Description: {}{}", description, ellipsis);
    }
    println!("    Link: {}", p.view_url(base_url));
    println!();
}

async fn cmd_hide(criteria: HideCriteria, dry_run: bool, quiet: bool) -> anyhow::Result<()> {
    criteria.validate()?;

    let config = Config::load()?;
    let client = verified_client(&config, quiet).await?;
    let pipeline = HidePipeline::new(client, config.filter.range_policy);

    if !quiet {
        println!("Filtering projects with {}...\n", criteria.describe());
    }

    if dry_run {
        let (projects, _) = pipeline.fetch_all().await?;
        let selection = respo_core::filter::select(&projects, &criteria)?;
        if selection.selected.is_empty() {
            println!("Nothing to hide.");
        } else {
            println!("Would hide {} project(s):", selection.selected.len());
            for np in &selection.selected {
                println!(
                    "  {} {} (${:.2}) {}",
                    np.project.id, np.rate, np.project.incentive, np.project.name
                );
            }
        }
        report_malformed_projects(selection.malformed.iter().map(|np| {
            (np.project.id.as_str(), np.project.name.as_str(), np.rate.to_string())
        }));
        return Ok(());
    }

    let report = pipeline.run(&criteria).await?;
    print_report(&report, quiet);

    if !report.all_succeeded() {
        bail!("{} project(s) failed to hide", report.failed_count());
    }
    Ok(())
}

fn print_report(report: &HideReport, quiet: bool) {
    for outcome in &report.outcomes {
        let line = match &outcome.outcome {
            HideOutcome::Hidden => format!(
                "hidden   {} {} (${:.2}) {}",
                outcome.project_id, outcome.rate, outcome.incentive, outcome.name
            ),
            HideOutcome::AlreadyHidden => format!(
                "skipped  {} already hidden",
                outcome.project_id
            ),
            HideOutcome::Failed(e) => {
                let retry = if e.is_retryable() { ", retryable" } else { "" };
                format!("failed   {} {}{}", outcome.project_id, e, retry)
            }
        };
        println!("{}", line);
    }

    report_malformed_projects(
        report
            .malformed
            .iter()
            .map(|m| (m.project_id.as_str(), m.name.as_str(), m.reason.clone())),
    );

    if !quiet {
        println!(
            "\n{} hidden, {} already hidden, {} failed ({} project(s) examined)",
            report.hidden_count(),
            report.already_hidden_count(),
            report.failed_count(),
            report.scanned
        );
    }
}

fn report_malformed_projects<'a>(
    entries: impl Iterator<Item = (&'a str, &'a str, String)>,
) {
    let entries: Vec<_> = entries.collect();
    if entries.is_empty() {
        return;
    }
    println!("\nExcluded from automatic filtering (check manually):");
    for (id, name, reason) in entries {
        println!("  {} {} - {}", id, name, reason);
    }
}

async fn cmd_credentials(action: CredentialAction, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = config.credential_store()?;

    match action {
        CredentialAction::Set {
            cookies,
            authorization,
            expires_at,
        } => {
            let mut cookie_map = BTreeMap::new();
            for pair in cookies {
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| anyhow!("cookie must be NAME=VALUE, got '{}'", pair))?;
                cookie_map.insert(name.to_string(), value.to_string());
            }

            let expires_at = expires_at
                .map(|s| {
                    DateTime::parse_from_rfc3339(&s)
                        .map(|dt| dt.with_timezone(&Utc))
                        .with_context(|| format!("invalid RFC 3339 timestamp: {}", s))
                })
                .transpose()?;

            let credential = Credential {
                cookies: cookie_map,
                authorization,
                expires_at,
            };
            if credential.is_empty() {
                bail!("supply at least one --cookie or an --authorization token");
            }

            store.save(&credential).await?;
            if !quiet {
                println!("Credential stored.");
                println!("Verify it with: respo auth");
            }
        }

        CredentialAction::Show => match store.load().await? {
            None => println!("No credential stored."),
            Some(credential) => {
                println!("Cookies:");
                for (name, value) in &credential.cookies {
                    let preview: String = value.chars().take(8).collect();
                    println!("  {} = {}...", name, preview);
                }
                match credential.redacted_authorization() {
                    Some(auth) => println!("Authorization: {}", auth),
                    None => println!("Authorization: (not set)"),
                }
                match credential.expires_at {
                    Some(at) => {
                        let state = if credential.is_expired(Utc::now()) {
                            " (expired)"
                        } else {
                            ""
                        };
                        println!("Expires: {}{}", at.to_rfc3339(), state);
                    }
                    None => println!("Expires: (unknown)"),
                }
            }
        },

        CredentialAction::Clear => {
            store.clear().await?;
            if !quiet {
                println!("Credential cleared.");
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("{} = {}", key, config.get(&key)?);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}
