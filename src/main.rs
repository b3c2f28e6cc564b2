use anyhow::Result;
use pomodoro_logger::{
    cli::{parse_args, prepare, run_cli},
    utils::runtime::single_thread_runtime,
};
use tracing::error;

fn main() -> Result<()> {
    let args = parse_args();
    let app_dir = prepare(&args)?;

    single_thread_runtime()?
        .block_on(run_cli(args, app_dir))
        .inspect_err(|e| {
            error!("Error running session {e:?}");
        })?;
    Ok(())
}
