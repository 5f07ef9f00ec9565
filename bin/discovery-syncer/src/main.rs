use anyhow::{bail, Context, Result};
use syncer_api::Instance;
use syncer_apisix::ApisixClient;
use syncer_core::GatewayConfig;
use tracing::{error, info};
use tracing_subscriber::fmt::init as tracing_init;

const USAGE: &str = concat!(
    "usage: discovery-syncer ",
    "[export | instances <upstream> | sync <upstream> <ip:port[=weight]>...]"
);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let config = load_config()?;
    info!("Using gateway admin API at {}{}", config.admin_url, config.prefix);
    let client = ApisixClient::new(config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("export") => {
            let export = client.fetch_admin_api_to_file().await?;
            for kind in &export.skipped {
                error!("Resource kind {} missing from snapshot", kind);
            }
            println!("{}", export.path.display());
        }
        Some("instances") => {
            let name = args.get(1).context(USAGE)?;
            for instance in client.get_service_all_instances(name).await? {
                println!("{}\t{}", instance.node_key(), instance.weight);
            }
        }
        Some("sync") => {
            let name = args.get(1).context(USAGE)?;
            let desired = args[2..]
                .iter()
                .map(|arg| parse_instance(arg))
                .collect::<Result<Vec<_>>>()?;
            let outcome = client.sync_instances(name, None, &desired, &[]).await?;
            info!("Sync of upstream {} finished: {:?}", name, outcome);
            if !outcome.is_applied() {
                println!("{:?}", outcome);
            }
        }
        Some(other) => bail!("unknown command {}\n{}", other, USAGE),
    }

    Ok(())
}

/// Load configuration from `SYNCER_CONFIG` or the environment
fn load_config() -> Result<GatewayConfig> {
    match std::env::var("SYNCER_CONFIG") {
        Ok(path) => GatewayConfig::from_file(&path)
            .with_context(|| format!("failed to load gateway config from {}", path)),
        Err(_) => {
            GatewayConfig::from_env().context("failed to load gateway config from environment")
        }
    }
}

/// Parse `ip:port` or `ip:port=weight`; weight defaults to 1
fn parse_instance(arg: &str) -> Result<Instance> {
    let (key, weight) = match arg.split_once('=') {
        Some((key, weight)) => {
            let weight = weight
                .parse::<f64>()
                .with_context(|| format!("invalid weight in {}", arg))?;
            (key, weight)
        }
        None => (arg, 1.0),
    };
    Instance::from_node_key(key, weight).with_context(|| format!("invalid instance {}", arg))
}
