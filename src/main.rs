use codebreaker::cli::{Cli, CliInterface, parse_cli};
use codebreaker::config::{Config, OpponentKind, load_config};
use codebreaker::logging::{default_log_path, init_logging};
use codebreaker::openrouter::OpenRouterOracle;
use codebreaker::tui::TuiInterface;
use codebreaker::{
    ExhaustiveGuesser, FallbackGuesser, GameInterface, Guesser, OracleGuesser, game_loop,
    practice_loop,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = parse_cli();

    // The TUI owns the terminal, so its logs always go to a file
    let log_file = if cli.tui {
        cli.log_file.clone().or_else(default_log_path)
    } else {
        cli.log_file.clone()
    };
    if let Err(e) = init_logging(log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut config = load_config(cli.config_path.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;
    cli.apply(&mut config);
    log::info!(
        "starting codebreaker: opponent={:?} seed={:?}",
        config.opponent,
        config.seed
    );

    let mut rng = seeded_rng(config.seed, 0);
    let guesser = build_guesser(&config)?;

    let mut interface: Box<dyn GameInterface> = if cli.tui {
        Box::new(TuiInterface::new().map_err(|e| format!("Failed to initialize TUI: {e}"))?)
    } else {
        Box::new(CliInterface::new(io::stdin().lock()))
    };
    let summaries = match guesser {
        Some(mut guesser) => game_loop(&mut *interface, &mut guesser, &mut rng),
        None => practice_loop(&mut *interface, &mut rng),
    };
    log::info!("session finished after {} games", summaries.len());
    Ok(())
}

fn seeded_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_os_rng(),
    }
}

/// The computer opponent, or `None` for practice.
fn build_guesser(config: &Config) -> Result<Option<Box<dyn Guesser>>, String> {
    let exhaustive = ExhaustiveGuesser::new(seeded_rng(config.seed, 1));
    let guesser: Box<dyn Guesser> = match config.opponent {
        OpponentKind::Practice => return Ok(None),
        OpponentKind::Exhaustive => Box::new(exhaustive),
        OpponentKind::Oracle => match OpenRouterOracle::from_settings(&config.oracle) {
            Ok(oracle) => {
                let guesser = OracleGuesser::new(oracle);
                if config.oracle.fallback {
                    Box::new(FallbackGuesser::new(guesser, exhaustive))
                } else {
                    Box::new(guesser)
                }
            }
            Err(e) if config.oracle.fallback => {
                log::warn!("language model unavailable ({e}), using exhaustive search");
                Box::new(exhaustive)
            }
            Err(e) => return Err(format!("Language model opponent unavailable: {e}")),
        },
    };
    Ok(Some(guesser))
}
