use clap::{
    Parser,
    Subcommand,
};
use pdpac::{
    platform::Builder as PlatformBuilder,
    Platform,
};
use pdpcore::{
    policy::{
        Policy,
        Request,
    },
    traits::PolicyBackend as _,
};
use pdpdb::{Backend, ConnectorArgs};
use std::time::Instant;

#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[clap(flatten)]
    connector: ConnectorArgs,
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(arg_required_else_help = true)]
    Policy {
        #[command(subcommand)]
        cmd: PolicyCmd,
    },
    /// Loads every stored policy and decides the request
    #[command(arg_required_else_help = true)]
    Enforce {
        subject: String,
        object: String,
        action: String,
    },
}

#[derive(Debug, Subcommand)]
enum PolicyCmd {
    /// Adds a policy directly to the store
    #[command(arg_required_else_help = true)]
    Add {
        subject: String,
        object: String,
        action: String,
    },
    /// Lists every stored policy as JSON
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    stderrlog::new()
        .module(module_path!())
        .module("pdpac")
        .module("pdpdb")
        .module("pdpdb_sqlite")
        .module("pdprbac")
        .verbosity((args.verbose as usize) + 1)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let platform = PlatformBuilder::new()
        .boxed_pd_platform(
            Backend::pd(args.connector.connector_option())
                .await
                .map_err(anyhow::Error::from_boxed)?
        )
        .build()?;

    match args.command {
        Commands::Policy { cmd } => {
            parse_policy(&platform, cmd).await?;
        },
        Commands::Enforce { subject, object, action } => {
            let request = Request::new(subject, object, action);
            let instant = Instant::now();
            let n = platform.reload().await?;
            let elapsed = instant.elapsed();
            println!("Loaded {n} policies in {elapsed:?}");
            let instant = Instant::now();
            let permit = if platform.check(&request).await? {
                "permitted"
            } else {
                "not permitted"
            };
            let elapsed = instant.elapsed();
            println!("{request}: {permit}; enforcement took {elapsed:?}");
        },
    }

    Ok(())
}

async fn parse_policy(
    platform: &Platform,
    arg: PolicyCmd,
) -> anyhow::Result<()> {
    match arg {
        PolicyCmd::Add { subject, object, action } => {
            let policy = Policy::new(subject, object, action);
            policy.validate()?;
            let id = platform.pd_platform().add_policy(&policy).await?;
            println!("policy {policy} stored with id {id}");
            println!("running services must be reloaded for the policy to take effect");
        },
        PolicyCmd::List => {
            let policies = platform.pd_platform().list_policies().await?;
            println!("{}", serde_json::to_string_pretty(&policies)?);
        },
    }
    Ok(())
}
