mod cli;

use anyhow::Context;
use clap::Parser;

use rtkernel::config::{self, Settings};
use rtkernel::kernel::patcher::{rt_build_preset, EditOp};
use rtkernel::log_collector::get_global_logs_path;
use rtkernel::{
    AppError, CandidateQuery, Candidates, FullPatch, LogCollector, MinorKernel,
    ResolveOrchestrator, Selection, TerminalSelector,
};

use cli::{Cli, Command, ConfigCommand, DebianArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_path = match &cli.settings {
        Some(path) => path.clone(),
        None => config::get_global_settings_path()?,
    };
    let mut settings = config::load_or_default(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    if cli.debug {
        settings.debug_logging = true;
    }

    // Logging problems never block a run
    match get_global_logs_path().and_then(|dir| LogCollector::new(&dir, settings.log_level())) {
        Ok(collector) => match collector.install() {
            Ok(path) => log::debug!("[Main] Session log: {}", path.display()),
            Err(e) => eprintln!("[Main] WARNING: {}", e),
        },
        Err(e) => eprintln!("[Main] WARNING: LogCollector initialization failed: {}", e),
    }

    log::info!("[Main] rtkernel {} starting: {:?}", rtkernel::VERSION, cli.command);

    run(cli.command, settings)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
}

fn debian_target(settings: &Settings, args: &DebianArgs) -> (String, String) {
    (
        args.codename
            .clone()
            .unwrap_or_else(|| settings.debian_codename.clone()),
        args.arch.clone().unwrap_or_else(|| settings.arch.clone()),
    )
}

fn print_candidates(candidates: &Candidates) {
    for choice in candidates.choices() {
        println!("{}", choice.label);
    }
}

fn report_cancelled() {
    log::info!("[Main] Selection cancelled by user");
    eprintln!("Selection cancelled.");
}

async fn run(command: Command, settings: Settings) -> Result<(), AppError> {
    let orchestrator = ResolveOrchestrator::from_settings(&settings);

    match command {
        Command::Minors => {
            let candidates = orchestrator
                .resolve_candidates(&CandidateQuery::MinorLines)
                .await?;
            print_candidates(&candidates);
        }
        Command::Patches { minor } => {
            let minor: MinorKernel = minor.parse()?;
            let candidates = orchestrator
                .resolve_candidates(&CandidateQuery::Patches(minor))
                .await?;
            print_candidates(&candidates);
        }
        Command::Current => {
            let kernel = orchestrator.catalog().current_system_kernel_version()?;
            println!("{}", kernel);
            println!("line: {} ({})", kernel.minor(), kernel.minor().major_tag());
        }
        Command::Links { patch } => {
            let patch: FullPatch = patch.parse()?;
            print!("{}", orchestrator.build_links(&patch)?);
        }
        Command::Select => {
            let running = orchestrator.catalog().current_system_kernel_version().ok();
            let orchestrator = orchestrator.with_running_kernel(running);
            let mut selector = TerminalSelector::stdio();
            let outcome = orchestrator.select_release(&mut selector).await;
            match selector.settle(outcome?)? {
                Selection::Chosen(release) => print!("{}", release),
                Selection::Cancelled => report_cancelled(),
            }
        }
        Command::DebianPackages(args) => {
            let (codename, arch) = debian_target(&settings, &args);
            let candidates = orchestrator
                .resolve_candidates(&CandidateQuery::DebianPackages { codename, arch })
                .await?;
            print_candidates(&candidates);
        }
        Command::DebianLink { package, debian } => {
            let (codename, arch) = debian_target(&settings, &debian);
            let link = orchestrator
                .catalog()
                .resolve_debian_package(&codename, &arch, &package)
                .await?;
            println!("{}", link);
        }
        Command::DebianSelect(args) => {
            let (codename, arch) = debian_target(&settings, &args);
            let mut selector = TerminalSelector::stdio();
            let outcome = orchestrator
                .select_debian_package(&mut selector, &codename, &arch)
                .await;
            match selector.settle(outcome?)? {
                Selection::Chosen(link) => println!("{}", link),
                Selection::Cancelled => report_cancelled(),
            }
        }
        Command::Config(edit) => run_config(&orchestrator, edit)?,
    }

    Ok(())
}

fn run_config(orchestrator: &ResolveOrchestrator, command: ConfigCommand) -> Result<(), AppError> {
    let (path, changed) = match command {
        ConfigCommand::Replace { path, key, value } => {
            let changed = orchestrator.apply_config_edit(&path, &key, EditOp::Replace(value))?;
            (path, changed)
        }
        ConfigCommand::CommentOut { path, key } => {
            let changed = orchestrator.apply_config_edit(&path, &key, EditOp::CommentOut)?;
            (path, changed)
        }
        ConfigCommand::RtPreset { path } => {
            let changed = orchestrator.apply_config_edits(&path, &rt_build_preset())?;
            (path, changed)
        }
    };

    if changed {
        println!("Updated {}", path.display());
    } else {
        println!("{} already up to date", path.display());
    }
    Ok(())
}
