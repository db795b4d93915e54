//! `isoform` - CLI for the incident safety officer form
//!
//! Every invocation loads the saved form, applies one action, saves and
//! exits.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use isoform::cli::view::render_tab;
use isoform::cli::{
    Cli, Command, ConfigCommand, MaydayCommand, MaydayLogCommand, MedicCommand, ReconCommand,
};
use isoform::controller::{AnalysisTarget, Controller, Intent, Tab};
use isoform::export::PrintableHtml;
use isoform::form::{RowId, SideKey};
use isoform::{init_logging, Config, GeminiProvider};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    if let Command::Config(cmd) = cli.command {
        return handle_config(&config, cmd);
    }

    let mut controller = Controller::from_config(&config)
        .with_context(|| format!("opening {}", config.database_path().display()))?;

    match cli.command {
        Command::Show(cmd) => handle_show(&mut controller, cmd.tab, cmd.json),
        Command::Set(cmd) => {
            controller.set_field(&cmd.path, &cmd.value)?;
            println!("{} = {}", cmd.path, cmd.value);
            Ok(())
        }
        Command::Recon(ReconCommand::Photo { side, file }) => {
            let side = SideKey::from_number(side).context("side must be 1-4")?;
            let raw = read_photo(&file)?;
            controller.attach_recon_photo(side, &raw)?;
            println!("Photo attached to {side}.");
            Ok(())
        }
        Command::Medic(cmd) => handle_medic(&mut controller, &config, cmd).await,
        Command::Mayday(MaydayCommand::Log(cmd)) => handle_mayday_log(&mut controller, cmd),
        Command::Analyze => {
            let provider = GeminiProvider::from_config(&config)?;
            run_analysis(&mut controller, AnalysisTarget::Incident, &provider).await?;
            print!("{}", render_tab(controller.state(), Tab::Recon));
            Ok(())
        }
        Command::Reset(cmd) => confirm_or_hint(&mut controller, Intent::Reset, cmd.yes),
        Command::Export(cmd) => {
            let dir = cmd.dir.unwrap_or_else(|| config.export_dir());
            let path = controller.export(&PrintableHtml, &dir)?;
            println!("Report saved to {}", path.display());
            Ok(())
        }
        Command::Config(_) => Ok(()),
    }
}

fn read_photo(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn handle_show(controller: &mut Controller, tab: Option<Tab>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(controller.state())?);
        return Ok(());
    }

    let tabs: Vec<Tab> = tab.map_or_else(|| Tab::ALL.to_vec(), |t| vec![t]);
    for (i, tab) in tabs.into_iter().enumerate() {
        controller.select_tab(tab);
        if i > 0 {
            println!();
        }
        print!("{}", render_tab(controller.state(), controller.tab()));
    }
    Ok(())
}

/// Without `yes`, describe the action and stop.
fn confirm_or_hint(controller: &mut Controller, intent: Intent, yes: bool) -> Result<()> {
    let pending = controller.request(intent)?;
    if !yes {
        controller.cancel();
        println!("This will {}.", pending.intent);
        println!("Use --yes to confirm.");
        return Ok(());
    }
    let done = controller.confirm(pending.token)?;
    println!("Done: {done}.");
    Ok(())
}

async fn run_analysis(
    controller: &mut Controller,
    target: AnalysisTarget,
    provider: &GeminiProvider,
) -> Result<()> {
    println!("Analyzing {target}...");
    let started = controller
        .run_analysis(target, provider)
        .await
        .with_context(|| format!("analysis of {target} failed; nothing was changed"))?;
    if !started {
        anyhow::bail!("cannot analyze {target}");
    }
    Ok(())
}

async fn handle_medic(controller: &mut Controller, config: &Config, cmd: MedicCommand) -> Result<()> {
    match cmd {
        MedicCommand::Add => {
            let id = controller.add_medic_record()?;
            controller.set_field(&format!("medic.{id}.time"), "now")?;
            println!("Added MEDIC record {id}.");
        }
        MedicCommand::Set { id, field, value } => {
            controller.set_field(&format!("medic.{id}.{field}"), &value)?;
        }
        MedicCommand::Photo { id, file } => {
            let raw = read_photo(&file)?;
            controller.attach_medic_photo(RowId(id), &raw)?;
            println!("Photo attached to MEDIC record {id}.");
        }
        MedicCommand::Delete { id, yes } => {
            confirm_or_hint(controller, Intent::DeleteMedicRecord(RowId(id)), yes)?;
        }
        MedicCommand::Analyze { id } => {
            let provider = GeminiProvider::from_config(config)?;
            run_analysis(controller, AnalysisTarget::Medic(RowId(id)), &provider).await?;
            print!("{}", render_tab(controller.state(), Tab::Medic));
        }
    }
    Ok(())
}

fn handle_mayday_log(controller: &mut Controller, cmd: MaydayLogCommand) -> Result<()> {
    match cmd {
        MaydayLogCommand::Add { event } => {
            let id = controller.add_mayday_log()?;
            controller.set_field(&format!("mayday.log.{id}.time"), "now")?;
            if let Some(event) = event {
                controller.set_field(&format!("mayday.log.{id}.event"), &event)?;
            }
            println!("Added mayday log entry {id}.");
        }
        MaydayLogCommand::Set { id, field, value } => {
            controller.set_field(&format!("mayday.log.{id}.{field}"), &value)?;
        }
        MaydayLogCommand::Delete { id, yes } => {
            confirm_or_hint(controller, Intent::DeleteMaydayLog(RowId(id)), yes)?;
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[AI]");
                println!("  Endpoint:           {}", config.ai.endpoint);
                println!("  Model:              {}", config.ai.model);
                println!(
                    "  API key:            {}",
                    if config.api_key().is_some() { "set" } else { "not set" }
                );
                println!("  Timeout (s):        {}", config.ai.timeout_secs);
                println!("  Max attempts:       {}", config.ai.max_attempts);
                println!();
                println!("[Image]");
                println!("  Max width:          {}", config.image.max_width);
                println!("  JPEG quality:       {}", config.image.jpeg_quality);
                println!();
                println!("[Export]");
                println!("  Output directory:   {}", config.export_dir().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
