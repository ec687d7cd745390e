use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info};

use crate::aws::{self, ec2, filters::TagFilter};
use crate::config::{self, ConnectConfig};
use crate::errors::RoostError;
use crate::keys;
use crate::select::{self, Selection};
use crate::ssh::client::{Client, ExecOutput};
use crate::ssh::target::ConnectionTarget;

#[derive(Debug, Parser)]
#[command(name = "roost", about = "Pick a tagged EC2 instance and land a shell on it", long_about = None)]
struct Cli {
    /// Tag filter to match, name=value or a bare tag name, repeatable
    #[arg(short = 't', long = "tags", value_name = "NAME=VALUE")]
    tags: Vec<String>,

    /// Config file (default ~/.roost)
    #[arg(short = 'c', long = "configfile")]
    configfile: Option<PathBuf>,

    /// Config file section to read
    #[arg(short = 's', long = "configsection", default_value = config::DEFAULT_SECTION)]
    configsection: String,

    /// Run one command instead of opening a shell
    #[arg(short = 'e', long = "execute", value_name = "CMD")]
    execute: Option<String>,

    /// Log everything the run does to stderr
    #[arg(long)]
    debug: bool,
}

pub fn config_or_default(configfile: Option<PathBuf>) -> Result<PathBuf, RoostError> {
    match configfile {
        Some(path) => Ok(path),
        None => dirs::home_dir()
            .map(|home| home.join(".roost"))
            .ok_or_else(|| RoostError::Io("could not determine the home directory".to_string())),
    }
}

pub async fn run() -> Result<u8, RoostError> {
    let args = Cli::parse();
    crate::logging::init(args.debug);

    let config_path = config_or_default(args.configfile)?;
    let config = ConnectConfig::read(&config_path, &args.configsection)?;
    debug!(path = %config_path.display(), section = %args.configsection, "config loaded");
    debug!("{config}");

    let filters = args
        .tags
        .iter()
        .map(|raw| TagFilter::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let sdk_config = aws::load_sdk_config(&config).await;
    let ec2_client = ec2::mk_client(&sdk_config);
    let instances = ec2::find_running(&ec2_client, &filters).await?;

    let filter_desc = if args.tags.is_empty() {
        "any filter".to_string()
    } else {
        format!("tag(s) {}", args.tags.join(", "))
    };
    let index = match select::choose_interactive(&instances, config.using_vpn, &filter_desc)? {
        Selection::Abort => {
            info!("selection aborted, filter further");
            return Ok(0);
        }
        Selection::Chosen(index) => index,
    };
    let instance = &instances[index];
    debug!(id = %instance.id, "instance chosen");

    let target = ConnectionTarget::resolve(instance, &config)?;
    let key = keys::load(&config.key_source, &target, &sdk_config).await?;

    let client = Client::connect(&target.host, target.port, &target.user, &key).await?;
    let code = match &args.execute {
        Some(command) => {
            debug!(command = %command, "executing remote command");
            let output = client.execute(command).await?;
            write_exec_output(&output)?;
            output.exit_status
        }
        None => {
            debug!(user = %target.user, host = %target.host, port = target.port, "opening interactive shell");
            client.shell().await?.unwrap_or(0)
        }
    };
    if let Err(err) = client.disconnect().await {
        debug!(error = %err, "disconnect after session end failed");
    }

    Ok((code & 0xff) as u8)
}

fn write_exec_output(output: &ExecOutput) -> Result<(), RoostError> {
    let mut stdout = std::io::stdout();
    stdout.write_all(&output.stdout)?;
    stdout.flush()?;
    let mut stderr = std::io::stderr();
    stderr.write_all(&output.stderr)?;
    stderr.flush()?;
    Ok(())
}
