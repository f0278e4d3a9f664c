//! area-props
//!
//! Read, write and delete typed window properties on a running X server.
//!
//! ```text
//! area-props [--display NAME] [--window ID] get KEY TYPE
//! area-props [--display NAME] [--window ID] set KEY TYPE VALUE...
//! area-props [--display NAME] [--window ID] delete KEY
//! ```
//!
//! TYPE is a property type name such as `utf8`, `u32` or `wm-size-hints`;
//! wrap it in brackets (`[atom]`) for a list.

use anyhow::{Context, Result, bail};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, reload, util::SubscriberInitExt};

use area_props::{
    Config, PropType, PropValue, PropertyBackend, PropertyStore, PropertyValue, TypeSpec, WindowRef, X11Backend,
};

const USAGE: &str = "usage: area-props [--display NAME] [--window ID] (get KEY TYPE | set KEY TYPE VALUE... | delete KEY)";

enum Command {
    Get { key: String, spec: TypeSpec },
    Set { key: String, spec: TypeSpec, values: Vec<String> },
    Delete { key: String },
}

struct Args {
    display: Option<String>,
    window: Option<u32>,
    command: Command,
}

fn parse_id(s: &str) -> Result<u32> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("Invalid window id {:?}", s))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut display = None;
    let mut window = None;
    let mut rest = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--display" | "-d" => display = Some(args.next().context(USAGE)?),
            "--window" | "-w" => {
                let id = args.next().context(USAGE)?;
                window = if id == "root" { None } else { Some(parse_id(&id)?) };
            }
            "--help" | "-h" => bail!(USAGE),
            _ => rest.push(arg),
        }
    }

    let mut rest = rest.into_iter();
    let verb = rest.next().context(USAGE)?;
    let key = rest.next().context(USAGE)?;
    let command = match verb.as_str() {
        "get" => Command::Get {
            key,
            spec: rest.next().context(USAGE)?.parse()?,
        },
        "set" => Command::Set {
            key,
            spec: rest.next().context(USAGE)?.parse()?,
            values: rest.by_ref().collect(),
        },
        "delete" => Command::Delete { key },
        other => bail!("Unknown command {:?}\n{}", other, USAGE),
    };
    if rest.next().is_some() {
        bail!(USAGE);
    }

    Ok(Args {
        display,
        window,
        command,
    })
}

/// Turn command-line text into a value of `prop_type`.
fn parse_value(backend: &impl PropertyBackend, prop_type: PropType, text: &str) -> Result<PropValue> {
    Ok(match prop_type {
        PropType::Utf8 | PropType::Latin1 | PropType::Atom => PropValue::Text(text.to_string()),
        PropType::U32 => PropValue::Cardinal(text.parse().with_context(|| format!("Invalid u32 {:?}", text))?),
        PropType::Window => PropValue::Window(backend.window_handle(parse_id(text)?)?),
        other => bail!("{} properties cannot be written from the command line", other),
    })
}

fn run(args: Args, config: &Config) -> Result<()> {
    let backend = X11Backend::connect(args.display.as_deref(), config)?;
    let target = args.window.map(WindowRef::from_raw).unwrap_or_else(|| backend.root());
    debug!("Target window {}", target);
    let store = PropertyStore::with_config(backend, config);

    match args.command {
        Command::Get { key, spec } => match store.get(target, &key, spec)? {
            Some(value) => println!("{}({}) = {}", key, spec, value),
            None => println!("{}: not found", key),
        },
        Command::Set { key, spec, values } => {
            let mut parsed = values
                .iter()
                .map(|v| parse_value(store.backend(), spec.prop_type(), v))
                .collect::<Result<Vec<_>>>()?;
            let value = if spec.is_list() {
                PropertyValue::List(parsed)
            } else {
                if parsed.len() != 1 {
                    bail!("{} takes exactly one value", spec);
                }
                PropertyValue::Scalar(parsed.remove(0))
            };
            store.set(target, &key, spec, value)?;
            info!("Set {} on window {}", key, target);
        }
        Command::Delete { key } => {
            store.delete(target, &key)?;
            info!("Deleted {} from window {}", key, target);
        }
    }
    Ok(())
}

/// Filter to switch to once the config is loaded; RUST_LOG always wins.
fn config_filter<'a>(env_filter: Option<&str>, config: &'a Config) -> Option<&'a str> {
    match env_filter {
        Some(_) => None,
        None => Some(&config.log_filter),
    }
}

fn main() -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").ok();
    let (filter, filter_handle) = reload::Layer::new(EnvFilter::new(
        env_filter.clone().unwrap_or_else(|| Config::default().log_filter),
    ));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    if let Some(directives) = config_filter(env_filter.as_deref(), &config) {
        filter_handle
            .reload(EnvFilter::new(directives))
            .context("Failed to apply log_filter from config")?;
    }

    let args = parse_args(std::env::args().skip(1))?;
    run(args, &config)
}
