use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use veriflow::config::AppConfig;
use veriflow::error::AppError;
use veriflow::telemetry;
use veriflow::verification::{
    await_completion, ApplicantDraft, FinalResult, HttpBackend, IntakeGuard, PollOutcome,
    PollSettings, RunId, TerminalPolicy, VerificationBackend,
};

#[derive(Parser, Debug)]
#[command(
    name = "veriflow",
    about = "Operator tooling for the identity-verification onboarding flow",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate applicant details, create an applicant and a verification run
    Submit(SubmitArgs),
    /// Poll a run until its verification outcome is final, then print it
    Watch(WatchArgs),
    /// Fetch and print the current state of a run without polling
    Show {
        /// Verification run identifier
        run_id: String,
    },
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    /// ISO3 country code
    #[arg(long, default_value = "ROU")]
    country: String,
    #[arg(long, default_value = "")]
    town: String,
    #[arg(long, default_value = "")]
    address: String,
    /// Region or state; two-letter USPS code for US addresses
    #[arg(long, default_value = "")]
    region: String,
    #[arg(long)]
    postcode: Option<String>,
    /// Keep polling for the outcome after the run is created
    #[arg(long)]
    watch: bool,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Verification run identifier
    run_id: String,
    /// Override the configured attempt budget
    #[arg(long)]
    attempts: Option<u32>,
    /// Override the configured interval between polls
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Require a populated sub-result before accepting an approved outcome
    #[arg(long)]
    require_sub_result: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let backend = HttpBackend::new(&config.backend);

    match cli.command {
        Command::Submit(args) => run_submit(args, &config, &backend).await,
        Command::Watch(args) => run_watch(args, &config, &backend).await,
        Command::Show { run_id } => run_show(RunId(run_id), &backend).await,
    }
}

async fn run_submit(
    args: SubmitArgs,
    config: &AppConfig,
    backend: &HttpBackend,
) -> Result<(), AppError> {
    let draft = ApplicantDraft {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        country: args.country,
        town: args.town,
        address: args.address,
        region: args.region,
        postcode: args.postcode,
        us_citizen: None,
    };

    let payload = IntakeGuard::default().payload_from_draft(&draft)?;
    let applicant = backend.create_applicant(&payload).await?;
    let run = backend
        .create_run(&config.backend.workflow_id, &applicant)
        .await?;

    info!(applicant = %applicant.0, run = %run.id.0, "verification run created");
    println!("Run id:    {}", run.id.0);
    println!("SDK token: {}", run.sdk_token);
    println!("Hand the token to the capture widget to continue the flow.");

    if args.watch {
        let watch = WatchArgs {
            run_id: run.id.0,
            attempts: None,
            interval_ms: None,
            require_sub_result: false,
        };
        return run_watch(watch, config, backend).await;
    }

    Ok(())
}

async fn run_watch(
    args: WatchArgs,
    config: &AppConfig,
    backend: &HttpBackend,
) -> Result<(), AppError> {
    let mut settings = PollSettings::from(&config.poll);
    if let Some(attempts) = args.attempts {
        settings.max_attempts = attempts;
    }
    if let Some(interval_ms) = args.interval_ms {
        settings.interval = std::time::Duration::from_millis(interval_ms);
    }
    let policy = if args.require_sub_result {
        TerminalPolicy::new(
            ["approved", "declined", "review", "abandoned", "completed"],
            true,
        )
    } else {
        TerminalPolicy::default()
    };

    let run_id = RunId(args.run_id);
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    println!(
        "Waiting for verification outcome (up to {} polls, {}ms apart)...",
        settings.max_attempts,
        settings.interval.as_millis()
    );

    match await_completion(backend, &run_id, &settings, &policy, &cancel).await {
        PollOutcome::Terminal(record) => {
            let run_record = backend.fetch_run(&run_id).await?;
            let result = FinalResult::build(&run_record, Some(&record), &ApplicantDraft::default());
            render_final(&result);
            Ok(())
        }
        PollOutcome::TimedOut => Err(AppError::PollTimeout),
        PollOutcome::Cancelled => {
            println!("Interrupted; the run keeps processing server-side.");
            Ok(())
        }
    }
}

async fn run_show(run_id: RunId, backend: &HttpBackend) -> Result<(), AppError> {
    let run_record = backend.fetch_run(&run_id).await?;
    // Webhook state may not exist yet; show whatever the run record has.
    let completion = backend.fetch_completion(&run_id).await.ok();
    let result = FinalResult::build(&run_record, completion.as_ref(), &ApplicantDraft::default());
    render_final(&result);
    Ok(())
}

fn render_final(result: &FinalResult) {
    if result.approved() {
        println!("\nYou're approved. Your verification looks good.");
    } else {
        println!("\nFurther verification is needed.");
        if let Some(reason) = &result.error_reason {
            println!("Reason: {reason}");
        }
    }

    println!();
    for (label, value) in result.rows() {
        println!("- {label}: {value}");
    }

    if let Some(url) = &result.dashboard_url {
        println!("- Dashboard: {url}");
    }
}
