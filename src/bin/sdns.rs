//! A tool for decoding, encoding, and inspecting DNS stamps.
//!
//! Decoded stamps are printed as JSON. The same JSON is accepted when
//! encoding, for instance:
//!
//! ```text
//! $ echo '{"protocol": "DoH", "hostName": "dns.example", "path": "/q"}' \
//!       | sdns encode -
//! ```
use clap::{Parser, Subcommand};
use sdns_stamp::stamp::Stamp;
use std::fs::File;
use std::io::{self, Read};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log debug messages.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print stamps as JSON.
    Decode {
        /// The stamps as `sdns://` URIs.
        #[arg(required = true)]
        stamps: Vec<String>,
    },

    /// Create stamps from their JSON description.
    ///
    /// The file contains either a single stamp or an array of them. Each
    /// stamp is printed as a URI on a line of its own.
    Encode {
        /// The file to read or `-` for standard input.
        file: String,
    },

    /// Print the content of a stamp.
    Inspect {
        /// The stamp as an `sdns://` URI.
        stamp: String,
    },
}

type Error = Box<dyn std::error::Error>;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sdns: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Setup logging.
///
/// The RUST_LOG environment variable overrides the default level, which is
/// `warn` or, with `--verbose`, `debug`.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .without_time()
        .try_init()
        .ok();
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Decode { stamps } => {
            for stamp in stamps {
                let stamp = Stamp::decode(&stamp)?;
                println!("{}", serde_json::to_string_pretty(&stamp)?);
            }
        }
        Command::Encode { file } => {
            for stamp in read_stamps(&file)? {
                println!("{}", stamp.encode()?);
            }
        }
        Command::Inspect { stamp } => {
            print!("{}", inspect(&Stamp::decode(&stamp)?));
        }
    }
    Ok(())
}

/// Reads the JSON description of one or more stamps.
fn read_stamps(path: &str) -> Result<Vec<Stamp>, Error> {
    let mut json = String::new();
    if path == "-" {
        io::stdin().read_to_string(&mut json)?;
    } else {
        File::open(path)?.read_to_string(&mut json)?;
    }
    let value: serde_json::Value = serde_json::from_str(&json)?;
    let res: Vec<Stamp> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    debug!("read {} stamps from {}", res.len(), path);
    Ok(res)
}

/// Returns a listing of the fields of a stamp.
fn inspect(stamp: &Stamp) -> String {
    let mut fields = vec![("protocol", stamp.proto().to_string())];
    if let Some(props) = stamp.props() {
        fields.push(("properties", props.to_string()));
    }
    if let Some(addr) = stamp.addr() {
        fields.push(("addr", addr.into()));
    }
    match stamp {
        Stamp::DnsCrypt(stamp) => {
            fields.push(("pk", stamp.pk_hex()));
            fields.push(("providerName", stamp.provider_name().into()));
        }
        Stamp::Doh(stamp) | Stamp::OdohRelay(stamp) => {
            fields.push(("hash", stamp.hash_hex()));
            fields.push(("hostName", stamp.host_name().into()));
            fields.push(("path", stamp.path().into()));
        }
        Stamp::Dot(stamp) => {
            fields.push(("hash", stamp.hash_hex()));
            fields.push(("hostName", stamp.host_name().into()));
        }
        Stamp::Odoh(stamp) => {
            fields.push(("hostName", stamp.host_name().into()));
            fields.push(("path", stamp.path().into()));
        }
        Stamp::Plain(_) | Stamp::AnonymizedRelay(_) => {}
    }

    let mut res = String::new();
    for (name, value) in fields {
        res.push_str(&format!("{:<13}{}\n", format!("{}:", name), value));
    }
    res
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_args() {
        let args =
            Args::try_parse_from(["sdns", "-v", "decode", "sdns://gQNmb28"])
                .unwrap();
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::Decode { stamps } if stamps.len() == 1
        ));
        assert!(Args::try_parse_from(["sdns", "decode"]).is_err());
    }

    #[test]
    fn inspect_listing() {
        let stamp = Stamp::decode("sdns://AgcAAAAAAAAAAAPwC6QAAA").unwrap();
        assert_eq!(
            inspect(&stamp),
            "protocol:    DoH\n\
             properties:  DNSSEC NOLOG NOFILTER\n\
             addr:        \n\
             hash:        f00ba4\n\
             hostName:    \n\
             path:        \n"
        );

        let stamp = Stamp::decode("sdns://gQNmb28").unwrap();
        assert_eq!(
            inspect(&stamp),
            "protocol:    AnonymizedRelay\naddr:        foo\n"
        );
    }
}
