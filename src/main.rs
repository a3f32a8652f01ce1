//! CrewDesk CLI
//!
//! Command-line front end for the CrewDesk client:
//! - Log in and out
//! - Resolve app routes and load their data
//! - Preview and create recurring events
//! - Estimate and send SMS broadcasts
//! - Invite volunteers, run the solver, manage billing

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crewdesk::api::{ApiError, PersonStatus, SolutionStatus};
use crewdesk::config::{generate_default_config, LoggingConfig};
use crewdesk::recurrence::{
    create_series, expand, Cadence, DayOfWeek, EndCondition, EventTemplate, NewSeries, PreviewRequest,
    PreviewState, RecurrencePattern, RecurrenceType, WeekdayPosition,
};
use crewdesk::router::Screen;
use crewdesk::views::analytics::format_rate;
use crewdesk::views::billing::format_price;
use crewdesk::views::{
    parse_addresses, parse_csv, send_bulk, AnalyticsRange, AnalyticsReport, BillingState, EventFilter,
    OnboardingWizard, PeopleFilter, SampleDataManager, SolutionsState, WizardStep,
};
use crewdesk::{AppContext, Config, ViewData};

#[derive(Parser)]
#[command(name = "crewdesk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Volunteer scheduling from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend URL (overrides the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file (default: platform config dir, then ./crewdesk.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        email: String,
        /// Password (default: $CREWDESK_PASSWORD, then prompt)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show the logged-in user and organization
    Whoami,

    /// Password reset e-mails
    #[command(subcommand)]
    Password(PasswordCommand),

    /// Resolve a path the way the app router does and load its view
    Route {
        /// Path such as /app/schedule or /accept-invitation?token=...
        path: String,
    },

    /// Recurring events
    #[command(subcommand)]
    Recurring(RecurringCommand),

    /// SMS broadcasts
    #[command(subcommand)]
    Sms(SmsCommand),

    /// Invitations
    #[command(subcommand)]
    Invite(InviteCommand),

    /// Solver solutions
    #[command(subcommand)]
    Solutions(SolutionsCommand),

    /// Plans, subscription and payment portal
    #[command(subcommand)]
    Billing(BillingCommand),

    /// Onboarding wizard
    #[command(subcommand)]
    Onboarding(OnboardingCommand),

    /// Sample people, teams and events
    #[command(subcommand)]
    SampleData(SampleDataCommand),

    /// Admin analytics
    Analytics {
        /// Range: 7d, 30d or 90d
        #[arg(short, long, default_value = "30d")]
        range: String,
    },

    /// Search people or events
    #[command(subcommand)]
    Search(SearchCommand),

    /// Features unlocked by solver runs
    Unlocks,

    /// Translate a key from the locale catalogs
    Translate {
        key: String,
        /// Locale to switch to first (remembered)
        #[arg(short, long)]
        locale: Option<String>,
        /// Placeholder values in name=value form
        #[arg(long = "var")]
        vars: Vec<String>,
    },

    /// Turn debug logging on or off
    Debug {
        /// on or off
        state: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PasswordCommand {
    /// Request a reset e-mail
    Forgot { email: String },
    /// Set a new password from a reset token
    Reset {
        token: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Args)]
struct PatternArgs {
    /// once, daily, weekly, biweekly, monthly or custom
    #[arg(long = "type", default_value = "weekly")]
    kind: String,
    /// Selected days, comma separated (mon,wed,fri)
    #[arg(long, value_delimiter = ',')]
    days: Vec<String>,
    /// Week interval for custom patterns
    #[arg(long)]
    interval: Option<u32>,
    /// Monthly position: first, second, third, fourth, last
    #[arg(long)]
    position: Option<String>,
    /// Monthly weekday paired with --position
    #[arg(long)]
    weekday: Option<String>,
    /// First date (YYYY-MM-DD)
    #[arg(long)]
    start_date: String,
    /// Start time (HH:MM)
    #[arg(long, default_value = "09:00")]
    start_time: String,
    /// Minutes per occurrence
    #[arg(long, default_value_t = 120)]
    duration: u32,
    /// Last date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "count")]
    end_date: Option<String>,
    /// Number of occurrences
    #[arg(long)]
    count: Option<u32>,
}

#[derive(Subcommand)]
enum RecurringCommand {
    /// Ask the backend to expand a pattern
    Preview(PatternArgs),

    /// Create a server-side series from a pattern
    Series {
        title: String,
        #[command(flatten)]
        pattern: PatternArgs,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        team: Option<i64>,
    },

    /// Create one event per occurrence at a fixed cadence
    Create {
        title: String,
        /// Local start (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        start: String,
        /// Minutes per occurrence
        #[arg(long, default_value_t = 120)]
        duration: i64,
        /// once, daily, weekly or monthly
        #[arg(long, default_value = "weekly")]
        cadence: String,
        /// Last date (default: one year after start)
        #[arg(long)]
        until: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        team: Option<i64>,
        #[arg(long)]
        volunteers_needed: Option<u32>,
        /// Print the occurrences without creating them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum SmsCommand {
    /// Segment count and cost estimate
    Estimate {
        message: String,
        #[arg(short, long, default_value_t = 1)]
        recipients: usize,
    },
    /// List people who can receive SMS
    Recipients,
    /// Send a broadcast
    Send {
        message: String,
        /// Recipient ids, comma separated
        #[arg(long, value_delimiter = ',')]
        to: Vec<i64>,
        /// Every eligible recipient, up to the cap
        #[arg(long, conflicts_with = "to")]
        all: bool,
    },
    /// Past broadcasts
    History,
}

#[derive(Subcommand)]
enum InviteCommand {
    /// Invite addresses given inline or in a CSV file
    Send {
        addresses: Vec<String>,
        /// CSV file with an `email` column
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        role: Option<String>,
        /// Validate only
        #[arg(long)]
        dry_run: bool,
    },
    /// List invitations
    List {
        /// Only pending invitations
        #[arg(long)]
        pending: bool,
    },
    Resend { id: i64 },
    Revoke { id: i64 },
}

#[derive(Subcommand)]
enum SolutionsCommand {
    List {
        /// pending, running, completed or failed
        #[arg(long)]
        status: Option<String>,
    },
    /// Run the solver for a date range
    Run {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    Publish { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum BillingCommand {
    /// Plans, current subscription and seat usage
    Status,
    /// Start checkout for a plan and print the URL
    Checkout { plan: String },
    /// Print the payment portal URL
    Portal,
}

#[derive(Subcommand)]
enum OnboardingCommand {
    Status,
    /// Fill in wizard steps and submit as far as the data allows
    Setup {
        #[arg(long)]
        org: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        event_title: Option<String>,
        /// Local start (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        event_start: Option<String>,
        #[arg(long)]
        event_duration: Option<u32>,
        /// Addresses to invite, comma separated
        #[arg(long, value_delimiter = ',')]
        invite: Vec<String>,
        /// Skip the invite step
        #[arg(long)]
        skip_invites: bool,
    },
}

#[derive(Subcommand)]
enum SampleDataCommand {
    Status,
    Generate,
    Clear,
}

#[derive(Subcommand)]
enum SearchCommand {
    People {
        #[arg(default_value = "")]
        text: String,
        #[arg(long)]
        team: Option<i64>,
        /// active, inactive or invited
        #[arg(long)]
        status: Option<String>,
        /// Only people who can receive SMS
        #[arg(long)]
        sms: bool,
    },
    Events {
        #[arg(default_value = "")]
        text: String,
        #[arg(long)]
        team: Option<i64>,
        /// From date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// To date (YYYY-MM-DD), exclusive
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Table,
    Json,
}

impl Format {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            other => bail!("Unknown format '{}' (expected table or json)", other),
        }
    }

    fn emit<T: Serialize>(self, value: &T, table: impl FnOnce(&T)) -> Result<()> {
        match self {
            Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Format::Table => table(value),
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path).with_context(|| format!("loading {:?}", path))?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    let ctx = AppContext::open(config).context("opening local store")?;
    init_logging(
        &ctx.config.logging,
        crewdesk::storage::debug_enabled(ctx.store.as_ref()),
    );
    tracing::debug!(api = %ctx.api.base_url(), "CrewDesk CLI v{}", env!("CARGO_PKG_VERSION"));

    let format = Format::parse(&cli.format)?;
    let result = run(cli.command, &ctx, format).await;

    for toast in ctx.toasts.drain() {
        eprintln!("{} {}", toast.kind.icon(), toast.message);
    }

    if let Err(e) = &result {
        if let Some(ApiError::Unauthorized { .. }) = e.downcast_ref::<ApiError>() {
            eprintln!("Not logged in or session expired. Run `crewdesk login <email>`.");
        }
    }
    result
}

fn init_logging(config: &LoggingConfig, debug: bool) {
    let level = if debug { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("crewdesk={}", level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(command: Commands, ctx: &AppContext, format: Format) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => match std::env::var("CREWDESK_PASSWORD") {
                    Ok(p) => p,
                    Err(_) => prompt("Password: ")?,
                },
            };
            let session = ctx.api.login(&email, &password).await?;
            println!("Logged in as {} ({})", session.user.email, session.org.name);
        }

        Commands::Logout => {
            ctx.api.logout().await?;
            println!("Logged out");
        }

        Commands::Whoami => match ctx.session.current() {
            Some(session) => {
                let user = ctx.api.me().await?;
                println!("{} <{}>", user.name.as_deref().unwrap_or("-"), user.email);
                println!("Organization: {} (#{})", session.org.name, session.org.id);
                if user.is_admin() {
                    println!("Role: admin");
                }
            }
            None => println!("Not logged in"),
        },

        Commands::Password(PasswordCommand::Forgot { email }) => {
            ctx.api.forgot_password(&email).await?;
            println!("If {} has an account, a reset link is on its way", email);
        }

        Commands::Password(PasswordCommand::Reset { token, password }) => {
            let status = ctx.api.validate_reset_token(&token).await?;
            if !status.valid {
                bail!("This reset link is invalid or has expired");
            }
            ctx.api.reset_password(&token, &password).await?;
            println!("Password updated");
        }

        Commands::Route { path } => {
            let (mut router, loader) = ctx.router();
            let state = router.navigate(&path).await;
            println!("{} -> {}", path, state.path);
            println!("Screen: {}", state.screen.id());
            if let Some(view) = state.view {
                println!("View: {}", view.as_str());
                if let Some(data) = loader.data(view) {
                    println!("{}", describe_view(&data));
                }
            }
            if state.screen == Screen::InvalidLink {
                println!("This link is invalid or has expired");
            }
        }

        Commands::Recurring(cmd) => run_recurring(cmd, ctx, format).await?,
        Commands::Sms(cmd) => run_sms(cmd, ctx, format).await?,
        Commands::Invite(cmd) => run_invite(cmd, ctx, format).await?,
        Commands::Solutions(cmd) => run_solutions(cmd, ctx, format).await?,
        Commands::Billing(cmd) => run_billing(cmd, ctx, format).await?,
        Commands::Onboarding(cmd) => run_onboarding(cmd, ctx, format).await?,

        Commands::SampleData(cmd) => {
            let mut manager = SampleDataManager::new();
            match cmd {
                SampleDataCommand::Status => {
                    manager.refresh(&ctx.api).await?;
                }
                SampleDataCommand::Generate => {
                    manager.refresh(&ctx.api).await?;
                    manager.generate(&ctx.api).await?;
                    ctx.toasts.success("Sample data generated");
                }
                SampleDataCommand::Clear => {
                    manager.clear(&ctx.api).await?;
                    ctx.toasts.success("Sample data cleared");
                }
            }
            println!("{}", manager.summary());
        }

        Commands::Analytics { range } => {
            let range: AnalyticsRange = range.parse()?;
            let report = AnalyticsReport::fetch(&ctx.api, range).await?;
            format.emit(&report.summary, |s| {
                println!("Last {} days", range.days());
                println!("  Events:            {}", s.events);
                println!("  Shifts filled:     {}/{} ({})", s.filled_shifts, s.total_shifts, format_rate(report.fill_rate));
                println!("  Active volunteers: {}/{} ({})", s.active_volunteers, s.total_volunteers, format_rate(report.active_ratio));
                println!("  SMS delivered:     {}/{} ({})", s.sms_delivered, s.sms_sent, format_rate(report.sms_delivery_rate));
            })?;
        }

        Commands::Search(SearchCommand::People { text, team, status, sms }) => {
            let people = ctx.api.list_people().await?;
            let filter = PeopleFilter {
                text: Some(text),
                team_id: team,
                status: status.as_deref().map(parse_person_status).transpose()?,
                sms_capable: sms,
            };
            let found = filter.apply(&people);
            format.emit(&found, |found| {
                println!("{:<6} {:<24} {:<28} {}", "ID", "Name", "E-mail", "Phone");
                println!("{}", "-".repeat(72));
                for p in found.iter() {
                    println!(
                        "{:<6} {:<24} {:<28} {}",
                        p.id,
                        p.name,
                        p.email.as_deref().unwrap_or("-"),
                        p.phone.as_deref().unwrap_or("-")
                    );
                }
                println!("{} of {} people", found.len(), people.len());
            })?;
        }

        Commands::Search(SearchCommand::Events { text, team, from, to }) => {
            let events = ctx.api.list_events(None, None).await?;
            let filter = EventFilter {
                text: Some(text),
                team_id: team,
                from: from.as_deref().map(local_midnight).transpose()?,
                to: to.as_deref().map(local_midnight).transpose()?,
            };
            let found = filter.apply(&events);
            format.emit(&found, |found| {
                for e in found.iter() {
                    println!(
                        "{:<6} {}  {}",
                        e.id,
                        e.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        e.title
                    );
                }
                println!("{} of {} events", found.len(), events.len());
            })?;
        }

        Commands::Unlocks => {
            let unlocks = ctx.feature_unlocks();
            println!("Solver runs: {}", unlocks.runs_count()?);
            for status in unlocks.status()? {
                match status.unlocked_on {
                    Some(date) => println!("  ✓ {:<24} unlocked {}", status.feature.label, date),
                    None => println!(
                        "    {:<24} {} more run{}",
                        status.feature.label,
                        status.runs_remaining,
                        if status.runs_remaining == 1 { "" } else { "s" }
                    ),
                }
            }
        }

        Commands::Translate { key, locale, vars } => {
            let mut i18n = ctx.i18n();
            i18n.init().await?;
            if let Some(locale) = locale {
                i18n.set_locale(&locale).await?;
            }
            let pairs: Vec<(&str, &str)> = vars.iter().filter_map(|v| v.split_once('=')).collect();
            println!("{}", i18n.t_with(&key, &pairs));
        }

        Commands::Debug { state } => {
            let enabled = match state.as_str() {
                "on" | "true" | "1" => true,
                "off" | "false" | "0" => false,
                other => bail!("Expected on or off, got '{}'", other),
            };
            ctx.set_debug(enabled)?;
            println!("Debug logging {}", if enabled { "enabled" } else { "disabled" });
        }

        Commands::Config { output } => {
            let config = generate_default_config();
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", config),
            }
        }
    }

    Ok(())
}

// ============================================
// Recurring events
// ============================================

impl PatternArgs {
    fn request(&self) -> Result<PreviewRequest> {
        let kind: RecurrenceType = self.kind.parse().map_err(|e: String| anyhow!(e))?;
        let start_date = parse_date(&self.start_date)?;
        let start_time = NaiveTime::parse_from_str(&self.start_time, "%H:%M")
            .with_context(|| format!("Invalid start time '{}' (expected HH:MM)", self.start_time))?;

        let end = match (&self.end_date, self.count) {
            (Some(date), _) => EndCondition::Date {
                end_date: parse_date(date)?,
            },
            (None, Some(count)) => EndCondition::Count {
                occurrence_count: count,
            },
            (None, None) if kind == RecurrenceType::Once => EndCondition::Count { occurrence_count: 1 },
            (None, None) => EndCondition::Indefinite,
        };

        let mut pattern = RecurrencePattern::new(kind, end);
        for day in &self.days {
            pattern = pattern.day(day.parse::<DayOfWeek>().map_err(|e| anyhow!(e))?);
        }
        if let Some(interval) = self.interval {
            pattern = pattern.interval(interval);
        }
        if let (Some(position), Some(weekday)) = (&self.position, &self.weekday) {
            let position: WeekdayPosition = position.parse().map_err(|e: String| anyhow!(e))?;
            let weekday: DayOfWeek = weekday.parse().map_err(|e: String| anyhow!(e))?;
            pattern = pattern.monthly_weekday(position, weekday);
        } else if self.position.is_some() || self.weekday.is_some() {
            bail!("--position and --weekday must be given together");
        }

        let request = PreviewRequest {
            pattern,
            start_date,
            start_time,
            duration_minutes: self.duration,
        };
        request.validate()?;
        Ok(request)
    }
}

async fn run_recurring(cmd: RecurringCommand, ctx: &AppContext, format: Format) -> Result<()> {
    match cmd {
        RecurringCommand::Preview(args) => {
            let request = args.request()?;
            let controller = ctx.preview_controller();
            controller.refresh_now(&request).await;

            match controller.state() {
                PreviewState::Ready(summary) => format.emit(&summary.occurrences, |occurrences| {
                    for o in occurrences.iter() {
                        let marker = match &o.holiday_label {
                            Some(label) if o.is_holiday_conflict => format!("  ⚠ {}", label),
                            _ => String::new(),
                        };
                        println!(
                            "{:>3}. {}{}",
                            o.sequence,
                            o.start_time.with_timezone(&Local).format("%a %Y-%m-%d %H:%M"),
                            marker
                        );
                    }
                    if summary.remaining() > 0 {
                        println!("     ... and {} more", summary.remaining());
                    }
                    println!("Total: {} occurrences", summary.total);
                    if let Some(warning) = &summary.warning {
                        println!("⚠ {}", warning);
                    }
                })?,
                PreviewState::Invalid(message) | PreviewState::Failed(message) => bail!(message),
                PreviewState::Idle | PreviewState::Loading => bail!("Preview did not complete"),
            }
        }

        RecurringCommand::Series {
            title,
            pattern,
            location,
            team,
        } => {
            let series = NewSeries {
                title,
                location,
                team_id: team,
                schedule: pattern.request()?,
            };
            let created = ctx.api.create_recurring_series(&series).await?;
            ctx.toasts.success(format!(
                "Created series #{} with {} events",
                created.id, created.occurrence_count
            ));
        }

        RecurringCommand::Create {
            title,
            start,
            duration,
            cadence,
            until,
            location,
            team,
            volunteers_needed,
            dry_run,
        } => {
            let cadence: Cadence = cadence.parse().map_err(|e: String| anyhow!(e))?;
            let start = parse_local_datetime(&start)?;
            let until = until
                .as_deref()
                .map(|d| -> Result<DateTime<Local>> {
                    let date = parse_date(d)?;
                    local_from_naive(date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()))
                })
                .transpose()?;
            if duration <= 0 {
                bail!("Duration must be positive");
            }

            let windows = expand(start, Duration::minutes(duration), cadence, until);
            if windows.is_empty() {
                bail!("No occurrences between the start and the end date");
            }

            if dry_run {
                for (i, w) in windows.iter().enumerate() {
                    println!("{:>3}. {} to {}", i + 1, w.start.format("%a %Y-%m-%d %H:%M"), w.end.format("%H:%M"));
                }
                println!("{} occurrences (dry run)", windows.len());
                return Ok(());
            }

            let template = EventTemplate {
                title,
                location,
                description: None,
                team_id: team,
                volunteers_needed,
            };
            let outcome = create_series(&ctx.api, &template, &windows).await;
            for (index, message) in &outcome.failures {
                eprintln!("  occurrence {} failed: {}", index + 1, message);
            }
            if outcome.is_complete() {
                ctx.toasts.success(outcome.summary());
            } else {
                ctx.toasts.warning(outcome.summary());
            }
            if outcome.aborted {
                return Err(ApiError::Unauthorized {
                    redirect: crewdesk::api::LOGIN_PATH.to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}

// ============================================
// SMS
// ============================================

async fn run_sms(cmd: SmsCommand, ctx: &AppContext, format: Format) -> Result<()> {
    match cmd {
        SmsCommand::Estimate { message, recipients } => {
            let segments = crewdesk::views::segment_count(&message);
            let cost = crewdesk::views::broadcast::estimate_cost(segments, recipients, ctx.config.sms.cost_per_segment);
            println!("{} characters, {} segment(s)", message.chars().count(), segments);
            println!("Estimated cost for {} recipient(s): ${:.2}", recipients, cost);
            if recipients > ctx.config.sms.max_recipients {
                println!("⚠ At most {} recipients per broadcast", ctx.config.sms.max_recipients);
            }
        }

        SmsCommand::Recipients => {
            let mut composer = ctx.broadcast_composer();
            composer.load(&ctx.api).await?;
            let eligible: Vec<_> = composer.eligible().cloned().collect();
            format.emit(&eligible, |eligible| {
                for p in eligible.iter() {
                    println!("{:<6} {:<24} {}", p.id, p.name, p.phone.as_deref().unwrap_or("-"));
                }
                println!(
                    "{} of {} people can receive SMS",
                    eligible.len(),
                    composer.recipients().len()
                );
            })?;
        }

        SmsCommand::Send { message, to, all } => {
            let mut composer = ctx.broadcast_composer();
            composer.load(&ctx.api).await?;
            if all {
                composer.select_all_eligible();
            }
            for id in to {
                if let Err(e) = composer.select(id) {
                    ctx.toasts.warning(e.user_message());
                }
            }
            composer.set_message(message);

            println!("{}", composer.counter_label());
            println!("Estimated cost: ${:.2}", composer.estimated_cost());
            let button = composer.send_button();
            if !button.enabled {
                bail!("Cannot send: {}", composer.request().err().map(|e| e.user_message()).unwrap_or(button.label));
            }

            let result = composer.send(&ctx.api).await?;
            ctx.toasts.success(format!("Broadcast #{} sent to {} recipients", result.id, result.recipient_count));
        }

        SmsCommand::History => {
            let history = ctx.api.list_broadcasts().await?;
            format.emit(&history, |history| {
                for b in history.iter() {
                    println!(
                        "{:<6} {}  {}/{} delivered  {}",
                        b.id,
                        b.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        b.delivered_count,
                        b.recipient_count,
                        b.message.chars().take(40).collect::<String>()
                    );
                }
            })?;
        }
    }
    Ok(())
}

// ============================================
// Invitations
// ============================================

async fn run_invite(cmd: InviteCommand, ctx: &AppContext, format: Format) -> Result<()> {
    match cmd {
        InviteCommand::Send {
            addresses,
            file,
            role,
            dry_run,
        } => {
            let list = match file {
                Some(path) => {
                    let reader = std::fs::File::open(&path).with_context(|| format!("opening {:?}", path))?;
                    parse_csv(reader)?
                }
                None => parse_addresses(&addresses.join(" ")),
            };

            for invalid in &list.invalid {
                eprintln!("  skipping invalid address: {}", invalid);
            }
            if list.duplicates > 0 {
                eprintln!("  skipped {} duplicate(s)", list.duplicates);
            }
            if list.valid.is_empty() {
                bail!("No valid addresses to invite");
            }
            if dry_run {
                println!("Would invite {} address(es)", list.valid.len());
                return Ok(());
            }

            let report = send_bulk(&ctx.api, &list.valid, role.as_deref()).await;
            for (email, message) in &report.failed {
                eprintln!("  {} failed: {}", email, message);
            }
            if report.failed.is_empty() {
                ctx.toasts.success(report.summary());
            } else {
                ctx.toasts.warning(report.summary());
            }
        }

        InviteCommand::List { pending } => {
            let invitations = ctx.api.list_invitations().await?;
            let shown: Vec<_> = if pending {
                crewdesk::views::invitations::pending(&invitations).into_iter().cloned().collect()
            } else {
                invitations
            };
            format.emit(&shown, |shown| {
                for i in shown.iter() {
                    println!("{:<6} {:<32} {:?}", i.id, i.email, i.status);
                }
            })?;
        }

        InviteCommand::Resend { id } => {
            let invitation = ctx.api.resend_invitation(id).await?;
            ctx.toasts.success(format!("Invitation resent to {}", invitation.email));
        }

        InviteCommand::Revoke { id } => {
            ctx.api.revoke_invitation(id).await?;
            ctx.toasts.success("Invitation revoked");
        }
    }
    Ok(())
}

// ============================================
// Solutions
// ============================================

async fn run_solutions(cmd: SolutionsCommand, ctx: &AppContext, format: Format) -> Result<()> {
    let mut state = SolutionsState::new();
    match cmd {
        SolutionsCommand::List { status } => {
            state.load(&ctx.api).await?;
            state.set_filter(status.as_deref().map(parse_solution_status).transpose()?);
            let visible: Vec<_> = state.visible().into_iter().cloned().collect();
            format.emit(&visible, |visible| {
                println!("{:<6} {:<10} {:<17} {:>8} {:>8}", "ID", "Status", "Created", "Assigned", "Unfilled");
                for s in visible.iter() {
                    println!(
                        "{:<6} {:<10} {:<17} {:>8} {:>8}",
                        s.id,
                        format!("{:?}", s.status).to_lowercase(),
                        s.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        s.assignment_count,
                        s.unfilled_count
                    );
                }
            })?;
        }

        SolutionsCommand::Run { start, end } => {
            let unlocks = ctx.feature_unlocks();
            let outcome = state
                .run_solver(&ctx.api, &unlocks, parse_date(&start)?, parse_date(&end)?)
                .await?;
            ctx.toasts.success(format!("Solver run #{} started", outcome.solution.id));
            for feature in outcome.newly_unlocked {
                ctx.toasts.info(format!("New feature unlocked: {}", feature.label));
            }
        }

        SolutionsCommand::Publish { id } => {
            state.publish(&ctx.api, id).await?;
            ctx.toasts.success(format!("Solution #{} published", id));
        }

        SolutionsCommand::Delete { id } => {
            state.delete(&ctx.api, id).await?;
            ctx.toasts.success(format!("Solution #{} deleted", id));
        }
    }
    Ok(())
}

// ============================================
// Billing
// ============================================

async fn run_billing(cmd: BillingCommand, ctx: &AppContext, format: Format) -> Result<()> {
    let mut billing = BillingState::default();
    match cmd {
        BillingCommand::Status => {
            billing.load(&ctx.api).await?;
            format.emit(&billing.plans, |plans| {
                let current = billing.current_plan().map(|p| p.id.clone());
                for plan in plans.iter() {
                    let marker = if current.as_deref() == Some(plan.id.as_str()) { "*" } else { " " };
                    println!(
                        "{} {:<12} {:<20} {}",
                        marker,
                        plan.id,
                        plan.name,
                        format_price(plan.price_cents, &plan.interval)
                    );
                }
                if let Some(sub) = &billing.subscription {
                    println!();
                    println!("Subscription: {}", sub.status);
                    if let Some(end) = sub.current_period_end {
                        println!("Renews: {}", end.with_timezone(&Local).format("%Y-%m-%d"));
                    }
                }
                if let Some(usage) = billing.seat_usage() {
                    println!("Seats: {}", usage.label());
                    if usage.is_over_limit() {
                        println!("⚠ Over the plan limit");
                    } else if usage.is_near_limit() {
                        println!("⚠ Close to the plan limit");
                    }
                }
            })?;
        }

        BillingCommand::Checkout { plan } => {
            billing.load(&ctx.api).await?;
            println!("{}", billing.checkout(&ctx.api, &plan).await?);
        }

        BillingCommand::Portal => {
            println!("{}", billing.portal(&ctx.api).await?);
        }
    }
    Ok(())
}

// ============================================
// Onboarding
// ============================================

async fn run_onboarding(cmd: OnboardingCommand, ctx: &AppContext, format: Format) -> Result<()> {
    let mut wizard = OnboardingWizard::resume(&ctx.api).await?;

    match cmd {
        OnboardingCommand::Status => {
            let progress = wizard.state.progress();
            format.emit(&progress, |_| {
                println!("Step: {}", wizard.state.step.as_str());
                println!("Progress: {}%", wizard.state.percent_complete());
            })?;
        }

        OnboardingCommand::Setup {
            org,
            timezone,
            team,
            event_title,
            event_start,
            event_duration,
            invite,
            skip_invites,
        } => {
            let data = &mut wizard.state.data;
            if let Some(org) = org {
                data.org_name = org;
            }
            data.timezone = timezone.or(data.timezone.take());
            if let Some(team) = team {
                data.team_name = team;
            }
            if let Some(title) = event_title {
                data.event_title = title;
            }
            if let Some(start) = event_start {
                data.event_start = Some(parse_local_datetime(&start)?.with_timezone(&Utc));
            }
            if let Some(minutes) = event_duration {
                data.event_duration_minutes = minutes;
            }
            data.invite_emails = invite;

            while !wizard.state.is_complete() {
                let step = wizard.state.step;
                let result = if step == WizardStep::Invite && skip_invites {
                    wizard.skip_invites().await
                } else {
                    wizard.submit().await
                };
                match result {
                    Ok(next) => println!("✓ {} -> {}", step.as_str(), next.as_str()),
                    Err(ApiError::Validation(message)) => {
                        println!("Stopped at {}: {}", step.as_str(), message);
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
                if let Some(report) = wizard.last_invites.take() {
                    println!("  {}", report.summary());
                }
            }
            println!("Progress: {}%", wizard.state.percent_complete());
        }
    }
    Ok(())
}

// ============================================
// Helpers
// ============================================

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD)", s))
}

fn parse_local_datetime(s: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .with_context(|| format!("Invalid time '{}' (expected YYYY-MM-DDTHH:MM)", s))?;
    local_from_naive(naive)
}

fn local_from_naive(naive: NaiveDateTime) -> Result<DateTime<Local>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| anyhow!("{} does not exist in the local time zone", naive))
}

fn local_midnight(s: &str) -> Result<DateTime<Utc>> {
    let date = parse_date(s)?;
    Ok(local_from_naive(date.and_time(NaiveTime::MIN))?.with_timezone(&Utc))
}

fn parse_person_status(s: &str) -> Result<PersonStatus> {
    match s {
        "active" => Ok(PersonStatus::Active),
        "inactive" => Ok(PersonStatus::Inactive),
        "invited" => Ok(PersonStatus::Invited),
        other => bail!("Unknown status '{}'", other),
    }
}

fn parse_solution_status(s: &str) -> Result<SolutionStatus> {
    match s {
        "pending" => Ok(SolutionStatus::Pending),
        "running" => Ok(SolutionStatus::Running),
        "completed" => Ok(SolutionStatus::Completed),
        "failed" => Ok(SolutionStatus::Failed),
        other => bail!("Unknown status '{}'", other),
    }
}

fn describe_view(data: &ViewData) -> String {
    match data {
        ViewData::Dashboard { upcoming, solutions } => format!(
            "{} events this week, {} solutions",
            upcoming.len(),
            solutions.len()
        ),
        ViewData::Schedule(events) => format!("{} events in the next 30 days", events.len()),
        ViewData::Events(events) => format!("{} events", events.len()),
        ViewData::People(people) => format!("{} people", people.len()),
        ViewData::Teams(teams) => format!("{} teams", teams.len()),
        ViewData::Solutions(solutions) => format!("{} solutions", solutions.len()),
        ViewData::Invitations(invitations) => format!("{} invitations", invitations.len()),
        ViewData::Messages { recipients, history } => format!(
            "{} recipients, {} past broadcasts",
            recipients.iter().filter(|p| p.can_receive_sms()).count(),
            history.len()
        ),
        ViewData::Billing { plans, subscription } => {
            format!("{} plans, subscription {}", plans.len(), subscription.status)
        }
        ViewData::Analytics(summary) => format!("{} events in the last 30 days", summary.events),
        ViewData::Onboarding(progress) => format!(
            "Onboarding at {}",
            progress.current_step.as_deref().unwrap_or("start")
        ),
        ViewData::Settings(user) => format!("Signed in as {}", user.email),
    }
}
