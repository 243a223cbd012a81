use clap::{Parser, Subcommand};
use ndisc::config::{self, ChecksumConfig, Config};
use ndisc::protocol::{Message, apply_checksum, calculate_checksum, verify_checksum};
use ndisc::telemetry::init_logging;
use ndisc::{Error, Result};
use std::io::BufRead;
use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ndisc")]
#[command(about = "Decode and encode IPv6 Neighbor Discovery messages")]
struct Cli {
    /// Path to ndisc.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode hex-encoded ICMPv6 messages (one per line on stdin if none given)
    Decode {
        /// Messages as hex, starting at the ICMPv6 type octet
        messages: Vec<String>,

        /// Source address for checksum verification
        #[arg(long, requires = "dst")]
        src: Option<Ipv6Addr>,

        /// Destination address for checksum verification
        #[arg(long, requires = "src")]
        dst: Option<Ipv6Addr>,
    },
    /// Fill in the checksum of a hex-encoded message
    Checksum {
        /// Message as hex, starting at the ICMPv6 type octet
        message: String,

        #[arg(long)]
        src: Ipv6Addr,

        #[arg(long)]
        dst: Ipv6Addr,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate ndisc.toml
    Validate,
    /// Print the effective configuration with defaults filled in
    Show,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config { action } => {
            init_logging(None);
            let config_path = cli.config.unwrap_or_else(|| PathBuf::from("ndisc.toml"));
            match action {
                ConfigAction::Validate => cmd_config_validate(&config_path),
                ConfigAction::Show => cmd_config_show(&config_path),
            }
        }
        Commands::Decode {
            messages,
            src,
            dst,
        } => load_config(cli.config.as_deref()).and_then(|cfg| {
            init_logging(Some(&cfg.log));
            let addresses = match (src, dst) {
                (Some(src), Some(dst)) => Some(ChecksumConfig::new(src, dst)),
                _ => cfg.checksum,
            };
            cmd_decode(&messages, addresses.as_ref())
        }),
        Commands::Checksum { message, src, dst } => {
            load_config(cli.config.as_deref()).and_then(|cfg| {
                init_logging(Some(&cfg.log));
                cmd_checksum(&message, &src, &dst)
            })
        }
    };

    if let Err(e) = result {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let cfg = config::load(path)?;
            let validation = config::validate(&cfg);
            validation.print_diagnostics();
            if validation.has_errors() {
                return Err(Error::Config(format!("{} is invalid", path.display())));
            }
            Ok(cfg)
        }
        None => Ok(Config::default()),
    }
}

fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits).map_err(|e| Error::Hex(format!("{}: {}", input.trim(), e)))
}

fn cmd_decode(messages: &[String], addresses: Option<&ChecksumConfig>) -> Result<()> {
    let inputs: Vec<String> = if messages.is_empty() {
        debug!("reading messages from stdin");
        let mut lines = Vec::new();
        for line in std::io::stdin().lock().lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                lines.push(line.to_string());
            }
        }
        lines
    } else {
        messages.to_vec()
    };

    for input in &inputs {
        let bytes = decode_hex(input)?;
        let message = Message::parse(&bytes)?;
        println!("{}", message);

        if let Some(addrs) = addresses {
            let expected = calculate_checksum(&addrs.source, &addrs.destination, &bytes)?;
            if verify_checksum(&addrs.source, &addrs.destination, &bytes) {
                println!(" checksum 0x{:04x} (correct)", expected);
            } else {
                let found = u16::from_be_bytes([bytes[2], bytes[3]]);
                println!(
                    " checksum 0x{:04x} (incorrect, should be 0x{:04x})",
                    found, expected
                );
            }
        }
    }

    info!(count = inputs.len(), "decoded messages");
    Ok(())
}

fn cmd_checksum(message: &str, src: &Ipv6Addr, dst: &Ipv6Addr) -> Result<()> {
    let mut bytes = decode_hex(message)?;
    // Reject input that is not a well-formed message
    Message::parse(&bytes)?;

    let checksum = apply_checksum(&mut bytes, src, dst)?;
    debug!(checksum, "computed checksum");
    println!("{}", hex::encode(&bytes));
    Ok(())
}

fn cmd_config_validate(config_path: &Path) -> Result<()> {
    println!("[INFO] Validating {}...", config_path.display());

    let cfg = config::load(config_path)?;

    let validation = config::validate(&cfg);
    validation.print_diagnostics();

    if validation.has_errors() {
        Err(Error::Config("validation failed".to_string()))
    } else {
        println!("[INFO] Configuration is valid");
        Ok(())
    }
}

fn cmd_config_show(config_path: &Path) -> Result<()> {
    let cfg = if config_path.exists() {
        config::load(config_path)?
    } else {
        Config::default()
    };
    print!("{}", config::to_toml(&cfg)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex_separators() {
        assert_eq!(decode_hex("85000000").unwrap(), vec![133, 0, 0, 0]);
        assert_eq!(decode_hex("85:00 00:00\n").unwrap(), vec![133, 0, 0, 0]);
    }

    #[test]
    fn test_decode_hex_invalid() {
        assert!(matches!(decode_hex("85zz"), Err(Error::Hex(_))));
        assert!(matches!(decode_hex("850"), Err(Error::Hex(_))));
    }

    #[test]
    fn test_cli_parses_decode() {
        let cli = Cli::parse_from([
            "ndisc", "decode", "85000000", "--src", "fe80::1", "--dst", "ff02::2",
        ]);
        match cli.command {
            Commands::Decode { messages, src, dst } => {
                assert_eq!(messages, vec!["85000000".to_string()]);
                assert_eq!(src, Some("fe80::1".parse().unwrap()));
                assert_eq!(dst, Some("ff02::2".parse().unwrap()));
            }
            _ => panic!("expected decode"),
        }
    }

    #[test]
    fn test_cli_config_path_after_subcommand() {
        let cli = Cli::parse_from(["ndisc", "config", "validate", "-c", "my.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn test_cli_src_requires_dst() {
        let result = Cli::try_parse_from(["ndisc", "decode", "85000000", "--src", "fe80::1"]);
        assert!(result.is_err());
    }
}
