use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use utforsk_waitlist::config::AppConfig;
use utforsk_waitlist::error::AppError;
use utforsk_waitlist::waitlist::{
    gateway_from_config, SimulatedGateway, SubmissionResult, SubmissionSnapshot,
    WaitlistController, WaitlistGateway,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Email address to sign up
    #[arg(long)]
    pub(crate) email: String,
    /// Use the simulated backend even when Supabase is configured
    #[arg(long)]
    pub(crate) simulate: bool,
    /// Override the simulated backend delay in milliseconds
    #[arg(long)]
    pub(crate) delay_ms: Option<u64>,
    /// Fire a second submit while the first is in flight
    #[arg(long)]
    pub(crate) double_submit: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        email,
        simulate,
        delay_ms,
        double_submit,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(delay_ms) = delay_ms {
        config.waitlist.demo_delay = Duration::from_millis(delay_ms);
    }

    let gateway: Arc<dyn WaitlistGateway> = if simulate {
        Arc::new(SimulatedGateway::new(config.waitlist.demo_delay))
    } else {
        gateway_from_config(&config.waitlist)?
    };

    println!("Utforsk waitlist demo");
    println!("Backend: {}", gateway.kind().label());

    let controller = WaitlistController::new(gateway);
    controller.on_candidate_change(email);
    print_snapshot("Before submit", &controller.snapshot());

    if double_submit {
        let (first, second) =
            tokio::join!(controller.submit_current(), controller.submit_current());
        print_result("First submit", &first);
        print_result("Second submit", &second);
    } else {
        let result = controller.submit_current().await;
        print_result("Submit", &result);
    }

    print_snapshot("After submit", &controller.snapshot());
    Ok(())
}

fn print_result(label: &str, result: &SubmissionResult) {
    match result {
        SubmissionResult::Succeeded => println!("{label}: succeeded"),
        SubmissionResult::Failed { error, kind } => {
            println!("{label}: failed ({kind:?}) - {error}")
        }
        SubmissionResult::Skipped { reason } => println!("{label}: skipped ({reason:?})"),
    }
}

fn print_snapshot(label: &str, snapshot: &SubmissionSnapshot) {
    println!("\n{label}");
    println!("- phase: {:?}", snapshot.phase);
    println!("- email field: '{}'", snapshot.candidate_email);
    println!("- submitting: {}", snapshot.is_submitting);
    println!("- completed: {}", snapshot.is_completed);
    match &snapshot.last_error {
        Some(error) => println!("- error: {error}"),
        None => println!("- error: none"),
    }
}
