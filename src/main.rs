use apexdns::config::ServerConfig;
use apexdns::dns::{DNSResourceType, ResponseCode, parse_message};
use apexdns::zone::open_resolver;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Authoritative zone lookup tool over the configured record store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file; APEXDNS_* variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the zone apexes of the configured store
    Zones,
    /// Resolve the authoritative zone for NAME and print its records
    Lookup {
        name: String,
        /// Record type mnemonic or TYPEnnn
        #[arg(short = 't', long = "type", default_value = "A")]
        rtype: DNSResourceType,
    },
    /// Parse a hex-encoded DNS query and print its questions and EDNS data
    Decode { hex: String },
}

fn load_config(path: Option<&PathBuf>) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let mut config = ServerConfig::from_file(path)?;
            config.apply_env()?;
            config
        }
        None => ServerConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    debug!("Starting with {:?}", config);

    match args.command {
        Command::Zones => {
            let resolver = open_resolver(&config).await?;
            let mut apexes: Vec<String> = resolver
                .backend()
                .list_zone_apex_names()
                .await?
                .into_iter()
                .collect();
            apexes.sort();
            for apex in apexes {
                println!("{}", apex);
            }
        }
        Command::Lookup { name, rtype } => {
            let resolver = open_resolver(&config).await?;
            match resolver.lookup(&name, rtype).await {
                Ok(None) => println!("{:?} ({})", ResponseCode::Refused, name),
                Ok(Some(records)) => {
                    for record in records {
                        let rdata = record.encode()?;
                        println!(
                            "{}\t{}\tIN\t{}\t{}\t; rdata {}",
                            record.name,
                            record.ttl,
                            rtype,
                            record.data,
                            hex::encode(rdata)
                        );
                    }
                }
                Err(e) => {
                    error!("Lookup of {} {} failed: {}", name, rtype, e);
                    println!("{:?} ({})", e.response_code(), e);
                }
            }
        }
        Command::Decode { hex: input } => {
            let compact: String = input.split_whitespace().collect();
            let buf = hex::decode(&compact)?;
            match parse_message(&buf) {
                Ok(query) => {
                    for question in &query.questions {
                        println!(
                            "{}\t{:?}\t{}",
                            question.name, question.qclass, question.qtype
                        );
                    }
                    if let Some(opt) = &query.edns {
                        println!(
                            "; EDNS version {}, udp {}, do {}",
                            opt.version,
                            opt.udp_payload_size,
                            opt.do_flag()
                        );
                    }
                }
                Err(e) => println!("{:?} ({})", ResponseCode::FormatError, e),
            }
        }
    }

    Ok(())
}
