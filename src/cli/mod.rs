//! Command line interface for the release pipeline.

mod args;

pub use args::Args;

use crate::error::Result;
use crate::session::BuildSession;
use crate::tasks;

/// Main CLI entry point: build the session once, then run each requested
/// pipeline in order.
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let session = BuildSession::new(
        args.app_dir,
        args.output_dir,
        args.platform.as_deref(),
        args.target_arch.as_deref(),
    )?;

    tokio::fs::create_dir_all(&session.output_dir).await?;
    log::info!(
        "releasing {} {} for {}-{}",
        session.manifest.product_name,
        session.manifest.version,
        session.platform.label(),
        session.arch.label()
    );

    for task_word in &args.tasks {
        let pipeline = tasks::resolve_pipeline(&session, task_word).await?;
        tasks::run_pipeline(&session, &pipeline).await?;
    }

    Ok(0)
}
