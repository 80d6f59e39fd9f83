//! Job scheduling: two independent interval loops.

use std::path::PathBuf;
use std::time::Duration;

use forgebot_github::GithubClient;
use forgebot_triage::TriageBackend;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::check::run_check_cycle;
use crate::suggest::run_suggest_cycle;

/// Everything the periodic jobs need.
#[derive(Clone)]
pub struct ScheduleContext {
    pub github: GithubClient,
    pub triage: TriageBackend,
    pub repos: Vec<String>,
    pub check_interval: Duration,
    pub suggest_interval: Duration,
    pub ledger_path: PathBuf,
    pub notify: mpsc::Sender<String>,
}

/// Start both periodic jobs as background tasks.
///
/// Each job fires once immediately, then on its interval. A tick that
/// comes due while the process is busy or briefly unavailable is delayed
/// and still runs (`MissedTickBehavior::Delay`) rather than being skipped
/// or compressed into a burst. Failures inside a cycle are logged and
/// reported as a notification; they never stop the schedule, and the two
/// jobs cannot block each other.
pub fn start(ctx: ScheduleContext) {
    info!(
        check_hours = ctx.check_interval.as_secs() / 3600,
        suggest_hours = ctx.suggest_interval.as_secs() / 3600,
        repos = ctx.repos.len(),
        "Starting scheduler"
    );

    let check_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut ticker = interval(check_ctx.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = run_check_cycle(
                &check_ctx.github,
                &check_ctx.triage,
                &check_ctx.repos,
                &check_ctx.ledger_path,
                &check_ctx.notify,
            )
            .await
            {
                error!(error = %e, "Issue check cycle failed");
                let _ = check_ctx
                    .notify
                    .send(format!("Issue check failed: {e}"))
                    .await;
            }
        }
    });

    tokio::spawn(async move {
        let mut ticker = interval(ctx.suggest_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) =
                run_suggest_cycle(&ctx.github, &ctx.triage, &ctx.repos, &ctx.notify).await
            {
                error!(error = %e, "Suggestion cycle failed");
                let _ = ctx.notify.send(format!("Suggestion cycle failed: {e}")).await;
            }
        }
    });
}
