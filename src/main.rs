//! `ovs-key-dump`: decode a datapath flow key and print its translations.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use ovs_match::{key_to_cfr, key_to_match, DatapathKey, OfpVersion, ParsedKey};

/// Decode a raw datapath flow key and print the packet-in match and classifier record it
/// translates to.
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// OpenFlow version of the packet-in match (1.0 to 1.4)
    #[clap(long = "of-version", default_value = "1.3")]
    of_version: String,

    /// Log translation details
    #[clap(short, long)]
    verbose: bool,

    /// File holding the netlink-encoded flow key
    key: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { LevelFilter::TRACE } else { LevelFilter::INFO })
        .init();

    let version = OfpVersion::of_name(&args.of_version)
        .ok_or_else(|| anyhow!("unsupported OpenFlow version {:?}", args.of_version))?;
    let bytes = fs::read(&args.key)
        .with_context(|| format!("failed to read flow key from {}", args.key.display()))?;

    let pkey = ParsedKey::parse(DatapathKey::new(&bytes));
    println!("{:#?}", pkey);
    println!("{:#?}", key_to_match(&pkey, version));
    let cfr = key_to_cfr(&pkey);
    println!("{:#?}", cfr);
    for chunk in cfr.to_bytes().chunks(16) {
        let line: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}
