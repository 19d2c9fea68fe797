use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use shroud_core::{
    accept_request, accept_response, dispatch_request, dispatch_response, FieldValue, JsonCodec,
    KeyConfig, Package, PlainProfile, Request, Response, SecurityProfile, ShroudError,
    StandardProfile, CREDENTIAL_HEADER, FIELD_VECTORS, TIMESTAMP,
};

#[derive(Parser)]
#[command(
    name = "shroud-demo",
    author,
    version,
    about = "Walk a request/response exchange through the security pipeline"
)]
struct Cli {
    #[arg(long, global = true)]
    debug: bool,
    /// Deployment root key as 64 hex characters; a fixed demo key otherwise.
    #[arg(long, global = true)]
    root_key: Option<String>,
    #[arg(long, global = true, value_enum, default_value = "standard")]
    profile: ProfileArg,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Standard,
    Plain,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a request, accept it server-side, and return a response.
    Roundtrip {
        #[arg(long, default_value = "order:42")]
        payload: String,
        #[arg(long, default_value = "s3cret")]
        password: String,
    },
    /// Flip the clear timestamp vector in flight and watch Phase 1 reject.
    Tamper {
        #[arg(long, default_value = "order:42")]
        payload: String,
    },
    /// Deliver the same package twice and watch the replay gate reject.
    Replay {
        #[arg(long, default_value = "order:42")]
        payload: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let root = parse_root_key(cli.root_key.as_deref())?;
    match cli.profile {
        ProfileArg::Standard => {
            let profile = StandardProfile::with_memory_replay(KeyConfig::from_root(&root));
            run(&profile, cli.command)
        }
        ProfileArg::Plain => {
            let profile = PlainProfile::new(root);
            run(&profile, cli.command)
        }
    }
}

fn run<P: SecurityProfile>(profile: &P, command: Commands) -> Result<()> {
    match command {
        Commands::Roundtrip { payload, password } => roundtrip(profile, &payload, &password),
        Commands::Tamper { payload } => tamper(profile, &payload),
        Commands::Replay { payload } => replay(profile, &payload),
    }
}

fn roundtrip<P: SecurityProfile>(profile: &P, payload: &str, password: &str) -> Result<()> {
    let request = Request::new(payload.as_bytes().to_vec())
        .with_header(CREDENTIAL_HEADER, password)
        .with_header("user", "demo");

    let outbound = dispatch_request(profile, &JsonCodec, request)?;
    info!(
        "client: dispatched package with wire fields [{}]",
        outbound.package.names().collect::<Vec<_>>().join(", ")
    );

    let delivery = accept_request(profile, &JsonCodec, outbound.package)?;
    if !delivery.mac_matches(profile) {
        bail!("transport digest check failed on an untampered package");
    }
    info!(
        "server: accepted request, payload {:?}, credential restored: {}",
        String::from_utf8_lossy(delivery.request().payload()),
        delivery.request().header(CREDENTIAL_HEADER) == Some(password)
    );

    let response_package = dispatch_response(
        profile,
        &JsonCodec,
        Response::new(b"accepted".to_vec()),
        Some(delivery.request()),
    )?;
    let response = accept_response(profile, &JsonCodec, response_package, &outbound.sent)?;
    info!(
        "client: response correlated, payload {:?}",
        String::from_utf8_lossy(response.payload())
    );
    Ok(())
}

fn tamper<P: SecurityProfile>(profile: &P, payload: &str) -> Result<()> {
    let request =
        Request::new(payload.as_bytes().to_vec()).with_header(CREDENTIAL_HEADER, "s3cret");
    let outbound = dispatch_request(profile, &JsonCodec, request)?;

    let tampered = skew_timestamp(profile, outbound.package)?;
    info!("attacker: rewrote the clear timestamp vector in flight");

    match accept_request(profile, &JsonCodec, tampered) {
        Err(ShroudError::Rejected(phase)) => {
            info!("server: rejected at the {phase} gate, nothing delivered");
            Ok(())
        }
        Err(other) => {
            info!("server: dropped the package: {other}");
            Ok(())
        }
        Ok(_) => bail!("tampered package was accepted"),
    }
}

fn replay<P: SecurityProfile>(profile: &P, payload: &str) -> Result<()> {
    let request = Request::new(payload.as_bytes().to_vec());
    let outbound = dispatch_request(profile, &JsonCodec, request)?;

    accept_request(profile, &JsonCodec, outbound.package.clone())
        .context("first delivery should pass")?;
    info!("server: first delivery accepted");

    match accept_request(profile, &JsonCodec, outbound.package) {
        Err(ShroudError::Rejected(phase)) => {
            info!("server: replayed package rejected at the {phase} gate");
            Ok(())
        }
        Err(other) => bail!("unexpected failure on replay: {other}"),
        Ok(_) => {
            // The plain profile carries no replay store; that is the trade
            // the weak pairing makes.
            info!("server: replayed package accepted (profile has no replay store)");
            Ok(())
        }
    }
}

fn skew_timestamp<P: SecurityProfile>(profile: &P, package: Package) -> Result<Package> {
    let mut clear = profile
        .deobfuscate_request_package(package)
        .context("deobfuscate own package")?;
    let mut map = match clear.remove(FIELD_VECTORS) {
        Some(FieldValue::Map(map)) => map,
        _ => bail!("package is missing its vector field"),
    };
    let skewed = map
        .get(TIMESTAMP)
        .and_then(|stamp| stamp.parse::<u128>().ok())
        .map(|stamp| (stamp + 1).to_string())
        .context("package carries no numeric timestamp")?;
    map.insert(TIMESTAMP.to_owned(), skewed);
    clear.insert(FIELD_VECTORS, FieldValue::Map(map));
    Ok(profile.obfuscate_request_package(clear)?)
}

fn parse_root_key(arg: Option<&str>) -> Result<[u8; 32]> {
    match arg {
        Some(hex_key) => {
            let bytes = hex::decode(hex_key).context("root key is not valid hex")?;
            let key: [u8; 32] = bytes
                .try_into()
                .map_err(|_| anyhow::anyhow!("root key must be exactly 32 bytes"))?;
            Ok(key)
        }
        None => Ok(*b"shroud-demo-fixed-root-key-32byt"),
    }
}
