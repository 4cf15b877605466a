//! fetchr-cli: issue one CRUD call through a Fetcher and print the result.
//!
//! Usage:
//!   fetchr-cli read user --origin http://localhost:3000 --param id=42
//!   fetchr-cli create comment --body '{"text":"hi"}' --crumb abc
//!   fetchr-cli config check <file.yaml>

use anyhow::{anyhow, bail, Context as _};
use fetchr_rs::{ClientConfig, Fetcher, Operation, Params, RequestConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Invocation {
    origin: Option<String>,
    path: Option<String>,
    config_file: Option<String>,
    params: Params,
    body: Option<Value>,
    context: Vec<(String, String)>,
    crumb: Option<String>,
    force_post: bool,
    id_param: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "create" => run(Operation::Create, &args[2..]).await,
        "read" => run(Operation::Read, &args[2..]).await,
        "update" => run(Operation::Update, &args[2..]).await,
        "delete" => run(Operation::Delete, &args[2..]).await,
        "config" => cmd_config(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("fetchr-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"fetchr-cli: CRUD calls against a resource API

USAGE:
    fetchr-cli <create|read|update|delete> <resource> [OPTIONS]
    fetchr-cli config check <file.yaml>

OPTIONS:
    --origin <url>          Scheme and host of the API server
    --path <path>           API path (default /api)
    --config <file.yaml>    Load client configuration from YAML
    --param <k=v>           Request parameter; JSON values are parsed (repeatable)
    --body <json>           Body for create/update
    --context <k=v>         Context value sent with the call (repeatable)
    --crumb <token>         Security crumb required by mutations
    --id-param <name>       Parameter naming a single resource instance
    --post                  Send reads as POST

ENVIRONMENT:
    FETCHR_ORIGIN, FETCHR_XHR_PATH, FETCHR_TIMEOUT_MS, FETCHR_MAX_RETRIES
    RUST_LOG                Log filter (default warn)"#
    );
}

fn split_pair(raw: &str) -> anyhow::Result<(String, String)> {
    let (k, v) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got `{raw}`"))?;
    Ok((k.to_string(), v.to_string()))
}

fn parse_args(args: &[String]) -> anyhow::Result<Invocation> {
    let mut inv = Invocation::default();
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .cloned()
                .ok_or_else(|| anyhow!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--origin" => inv.origin = Some(value("--origin")?),
            "--path" => inv.path = Some(value("--path")?),
            "--config" => inv.config_file = Some(value("--config")?),
            "--param" => {
                let (k, v) = split_pair(&value("--param")?)?;
                // Bare words stay strings; anything that parses as JSON is kept typed.
                let parsed = serde_json::from_str(&v).unwrap_or(Value::String(v));
                inv.params.insert(k, parsed);
            }
            "--body" => {
                let raw = value("--body")?;
                inv.body = Some(serde_json::from_str(&raw).context("--body is not valid JSON")?);
            }
            "--context" => inv.context.push(split_pair(&value("--context")?)?),
            "--crumb" => inv.crumb = Some(value("--crumb")?),
            "--id-param" => inv.id_param = Some(value("--id-param")?),
            "--post" => inv.force_post = true,
            other => bail!("unknown option `{other}`"),
        }
    }
    Ok(inv)
}

async fn run(operation: Operation, args: &[String]) -> anyhow::Result<()> {
    let (resource, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("missing resource name"))?;
    let inv = parse_args(rest)?;

    let mut builder = Fetcher::builder();
    if let Some(file) = &inv.config_file {
        builder = builder.config(ClientConfig::from_file(file)?.apply_env());
    }
    if let Some(origin) = inv.origin {
        builder = builder.origin(origin);
    }
    if let Some(path) = inv.path {
        builder = builder.xhr_path(path);
    }
    for (k, v) in inv.context {
        builder = builder.context_value(k, v);
    }
    if let Some(crumb) = inv.crumb {
        builder = builder.crumb(crumb);
    }
    let client = builder.name("fetchr-cli").build()?;

    let mut overrides = RequestConfig::new().force_post_for_read(inv.force_post);
    if let Some(id) = inv.id_param {
        overrides = overrides.id_param(id);
    }

    let result = client
        .execute(resource, operation, inv.params, inv.body, overrides)
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_config(args: &[String]) -> anyhow::Result<()> {
    match args {
        [sub, file] if sub == "check" => {
            let cfg = ClientConfig::from_file(file)?;
            println!("{}", serde_yaml::to_string(&cfg)?);
            Ok(())
        }
        _ => bail!("usage: fetchr-cli config check <file.yaml>"),
    }
}
