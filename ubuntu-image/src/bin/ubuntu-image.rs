use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ubuntu_image::{version_text, Cli, DefaultSteps, ImageConfig, Validated};

pub fn main() -> Result<(), anyhow::Error> {
    let args = Cli::parse();

    let filter = if args.common.debug {
        "ubuntu_image=debug"
    } else {
        "ubuntu_image=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = match ImageConfig::create(&args)? {
        Validated::Version => {
            println!("{}", version_text());
            return Ok(());
        }
        Validated::Build(config) => config,
    };

    if config.state_machine.cleanup_work_dir() {
        info!("no --workdir given, a temporary working directory will be used");
    }
    let steps = config.planned_steps(&DefaultSteps);
    info!(
        mode = %config.command.kind(),
        resume = config.state_machine.resume,
        "configuration ready, {} steps planned: {}",
        steps.len(),
        steps.join(", ")
    );

    Ok(())
}
