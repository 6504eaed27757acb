use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pxr_agent::SessionConfig;
use pxr_protocol::Validator;
use pxr_raster::{ImageSource, Origin, Quantizer, Rgba};
use pxr_robot::simulator::{run_simulator, SimulatorConfig};
use pxr_robot::template::{pattern, DecodedTemplate};
use pxr_robot::{init_tracing, LogFormat};
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("pixel-robot")
        .version(pxr_robot::VERSION)
        .about("Template-converging client for a shared, rate-limited drawing surface")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Default log filter when RUST_LOG is unset"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Paint a template against a simulated drawing service")
                .arg(
                    Arg::new("template")
                        .long("template")
                        .value_parser(value_parser!(PathBuf))
                        .help("Template image (PNG); a built-in pattern is used when omitted"),
                )
                .arg(
                    Arg::new("pattern-size")
                        .long("pattern-size")
                        .default_value("16")
                        .value_parser(value_parser!(u32))
                        .help("Edge length of the built-in pattern"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Session configuration (TOML)"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("max-ticks")
                        .long("max-ticks")
                        .default_value("100000")
                        .value_parser(value_parser!(u64))
                        .help("Upper bound on scheduler ticks"),
                )
                .arg(
                    Arg::new("left")
                        .long("left")
                        .default_value("8")
                        .value_parser(value_parser!(u32))
                        .help("Template origin column"),
                )
                .arg(
                    Arg::new("top")
                        .long("top")
                        .default_value("8")
                        .value_parser(value_parser!(u32))
                        .help("Template origin row"),
                )
                .arg(
                    Arg::new("board-size")
                        .long("board-size")
                        .default_value("64")
                        .value_parser(value_parser!(u32))
                        .help("Edge length of the simulated board"),
                )
                .arg(
                    Arg::new("cooldown")
                        .long("cooldown")
                        .default_value("180")
                        .value_parser(value_parser!(f64))
                        .help("Seconds the service waits between accepted writes"),
                )
                .arg(
                    Arg::new("captcha-probability")
                        .long("captcha-probability")
                        .default_value("0.02")
                        .value_parser(value_parser!(f64))
                        .help("Chance that a write triggers a captcha"),
                )
                .arg(
                    Arg::new("grief-probability")
                        .long("grief-probability")
                        .default_value("0.001")
                        .value_parser(value_parser!(f64))
                        .help("Chance per tick that another user paints over the template"),
                )
                .arg(
                    Arg::new("keep-running")
                        .long("keep-running")
                        .action(ArgAction::SetTrue)
                        .help("Keep defending the template after it is complete"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("check-frame")
                .about("Run an outbound frame through the whitelist")
                .arg(Arg::new("frame").required(true).help("JSON text of the frame")),
        )
        .subcommand(
            Command::new("classify")
                .about("Print the palette index of a color")
                .arg(Arg::new("r").required(true).value_parser(value_parser!(u8)))
                .arg(Arg::new("g").required(true).value_parser(value_parser!(u8)))
                .arg(Arg::new("b").required(true).value_parser(value_parser!(u8)))
                .arg(
                    Arg::new("a")
                        .default_value("255")
                        .value_parser(value_parser!(u8)),
                ),
        )
}

fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();

    let format = if matches.get_flag("log-json") {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    init_tracing(format, level).context("failed to initialise logging")?;

    match matches.subcommand() {
        Some(("simulate", args)) => simulate(args),
        Some(("check-frame", args)) => check_frame(args),
        Some(("classify", args)) => classify(args),
        _ => bail!("unknown subcommand"),
    }
}

fn simulate(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let session = match args.get_one::<PathBuf>("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<SessionConfig>(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => SessionConfig::default(),
    };

    let config = SimulatorConfig {
        seed: *args.get_one::<u64>("seed").context("missing seed")?,
        max_ticks: *args.get_one::<u64>("max-ticks").context("missing max-ticks")?,
        board_size: *args.get_one::<u32>("board-size").context("missing board-size")?,
        origin: Origin::new(
            *args.get_one::<u32>("left").context("missing left")?,
            *args.get_one::<u32>("top").context("missing top")?,
        ),
        service_cooldown_secs: *args.get_one::<f64>("cooldown").context("missing cooldown")?,
        captcha_probability: probability(args, "captcha-probability")?,
        captcha_solve_ticks: SimulatorConfig::default().captcha_solve_ticks,
        grief_probability: probability(args, "grief-probability")?,
        stop_when_complete: !args.get_flag("keep-running"),
        session,
    };

    let template: Box<dyn ImageSource> = match args.get_one::<PathBuf>("template") {
        Some(path) => Box::new(DecodedTemplate::open(path)?),
        None => {
            let size = *args.get_one::<u32>("pattern-size").context("missing pattern-size")?;
            Box::new(pattern(size, size)?)
        }
    };

    let report = run_simulator(&config, template.as_ref())?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.generate_text());
    }

    Ok(if report.passed() || !config.stop_when_complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn probability(args: &ArgMatches, name: &str) -> anyhow::Result<f64> {
    let value = *args
        .get_one::<f64>(name)
        .with_context(|| format!("missing {name}"))?;
    if !(0.0..=1.0).contains(&value) {
        bail!("{name} must be within 0..=1, got {value}");
    }
    Ok(value)
}

fn check_frame(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let frame = args.get_one::<String>("frame").context("missing frame")?;

    match Validator::default().authorize_text(frame) {
        Ok(authorized) => {
            println!("accepted ({}): {}", authorized.schema(), authorized);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("rejected: {}", err.payload());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn classify(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let channel = |name: &str| -> anyhow::Result<u8> {
        args.get_one::<u8>(name)
            .copied()
            .with_context(|| format!("missing {name}"))
    };
    let sample = Rgba::new(channel("r")?, channel("g")?, channel("b")?, channel("a")?);

    let index = Quantizer::new().classify(sample, true);
    match index.color() {
        Some(rgb) => println!("{index} (#{:02x}{:02x}{:02x})", rgb.r, rgb.g, rgb.b),
        None => println!("{index} (transparent)"),
    }
    Ok(ExitCode::SUCCESS)
}
