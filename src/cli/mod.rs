use std::{
    io::{self, BufRead, Read, Write},
    time::Duration,
};

use anyhow::{anyhow, bail, Context};
use clap::{Arg, ArgMatches, Command};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    core::{PlannerConfig, SlotFiller, TripPlanner},
    extract::extract_required_attractions,
    geo,
    reconcile::Reconciler,
    types::PlanRequest,
};

fn command() -> Command {
    let plan = Command::new("plan")
        .about("Ask the model for an itinerary and print the reconciled JSON")
        .arg(
            Arg::new("request")
                .help("What the traveller asked for, e.g. \"三天东京，想去东京塔\"")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("destination")
                .short('d')
                .long("destination")
                .value_name("CITY")
                .help("Destination; asked for interactively when omitted"),
        )
        .arg(
            Arg::new("days")
                .long("days")
                .value_name("COUNT")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("budget")
                .long("budget")
                .value_name("AMOUNT")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("travelers")
                .long("travelers")
                .value_name("COUNT")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Model id (or set TRIP_AGENT_MODEL)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .help("Endpoint base URL (or set OPENAI_BASE_URL / OPENROUTER_BASE_URL)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64))
                .help("Model call deadline in seconds"),
        );

    let reconcile = Command::new("reconcile")
        .about("Reconcile a saved raw model response offline")
        .arg(
            Arg::new("file")
                .help("File holding the raw response; stdin when omitted")
                .index(1),
        )
        .arg(
            Arg::new("request")
                .short('r')
                .long("request")
                .value_name("TEXT")
                .help("Original traveller text, scanned for must-include attractions"),
        )
        .arg(
            Arg::new("destination")
                .short('d')
                .long("destination")
                .value_name("CITY")
                .default_value(""),
        );

    let extract = Command::new("extract")
        .about("List the attractions a request names")
        .arg(Arg::new("text").required(true).index(1));

    let resolve = Command::new("resolve")
        .about("Look up coordinates for an airport or train station")
        .arg(Arg::new("name").required(true).index(1));

    let command = Command::new("trip-agent")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plan trips with an LLM and salvage its itinerary output")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(plan)
        .subcommand(reconcile)
        .subcommand(extract)
        .subcommand(resolve);

    #[cfg(feature = "relay")]
    let command = command.subcommand(
        Command::new("serve")
            .about("Run the CORS relay")
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .value_name("PORT")
                    .value_parser(clap::value_parser!(u16))
                    .help("Listen port (or set PORT)"),
            ),
    );

    command
}

/// CLI entry point for the trip-agent tool
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let matches = command().get_matches();
    match matches.subcommand() {
        Some(("plan", sub)) => plan(sub).await,
        Some(("reconcile", sub)) => reconcile(sub),
        Some(("extract", sub)) => {
            let text = required_str(sub, "text")?;
            print_json(&extract_required_attractions(text).into_vec())
        }
        Some(("resolve", sub)) => {
            let name = required_str(sub, "name")?;
            match geo::resolve_hub(name) {
                Some(hub) => print_json(hub),
                None => bail!("no airport or station matches {name:?}"),
            }
        }
        #[cfg(feature = "relay")]
        Some(("serve", sub)) => {
            let mut config = crate::relay::RelayConfig::from_env()?;
            if let Some(port) = sub.get_one::<u16>("port") {
                config.port = *port;
            }
            crate::relay::serve(config).await.context("relay server failed")
        }
        _ => Err(anyhow!("unknown subcommand")),
    }
}

async fn plan(matches: &ArgMatches) -> anyhow::Result<()> {
    let text = required_str(matches, "request")?;
    let request = match matches.get_one::<String>("destination") {
        Some(destination) => {
            let mut request = PlanRequest::new(destination.clone(), text);
            request.days = matches.get_one::<u32>("days").copied();
            request.budget = matches.get_one::<f64>("budget").copied();
            request.travelers = matches.get_one::<u32>("travelers").copied();
            request
        }
        None => collect_interactively(text)?,
    };

    let mut config = PlannerConfig::from_env()?;
    if let Some(model) = matches.get_one::<String>("model") {
        config.model = model.clone();
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.base_url = base_url.clone();
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config.timeout = Duration::from_secs(*secs);
    }

    info!(model = %config.model, base_url = %config.base_url, "planning with model");
    let planner = TripPlanner::from_config(config);
    match planner.plan(&request).await {
        Ok(result) => print_json(&result),
        Err(err) => {
            error!(code = err.error_code(), "planning failed: {err}");
            let message = err.user_message();
            Err(anyhow::Error::new(err).context(message))
        }
    }
}

/// Walk the slot filler over stdin until every trip detail is known.
fn collect_interactively(opening: &str) -> anyhow::Result<PlanRequest> {
    let mut filler = SlotFiller::new(opening);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(question) = filler.prompt() {
        eprint!("{question} ");
        io::stderr().flush()?;
        let line = lines
            .next()
            .ok_or_else(|| anyhow!("input ended before all trip details were given"))??;
        if let Err(err) = filler.answer(&line) {
            eprintln!("{err}");
        }
    }
    Ok(filler.into_request()?)
}

fn reconcile(matches: &ArgMatches) -> anyhow::Result<()> {
    let raw = match matches.get_one::<String>("file") {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("reading stdin")?;
            buffer
        }
    };
    let required = matches
        .get_one::<String>("request")
        .map(|text| extract_required_attractions(text))
        .unwrap_or_default();
    let destination = matches
        .get_one::<String>("destination")
        .map(String::as_str)
        .unwrap_or_default();

    let result = Reconciler::new().reconcile(&raw, &required, destination)?;
    print_json(&result)
}

fn required_str<'a>(matches: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{id}>"))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_plan_arguments_parse() {
        let matches = command()
            .try_get_matches_from([
                "trip-agent", "plan", "想去东京塔", "-d", "东京", "--days", "3", "--budget", "8000",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "plan");
        assert_eq!(sub.get_one::<String>("destination").unwrap(), "东京");
        assert_eq!(sub.get_one::<u32>("days"), Some(&3));
        assert_eq!(sub.get_one::<f64>("budget"), Some(&8000.0));
    }

    #[test]
    fn test_reconcile_file_is_optional() {
        let matches = command().try_get_matches_from(["trip-agent", "reconcile"]).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert!(sub.get_one::<String>("file").is_none());
        assert_eq!(sub.get_one::<String>("destination").unwrap(), "");
    }
}
