use clap::Parser;

const EXAMPLES: &str = "\
Examples:
  pings 192.168.1.1 192.168.1.2 10
  pings ip-list.txt 5

A trailing number is read as the interval in seconds (default 5).
Host files list one host per line; blank lines are ignored.";

/// Live reachability table for a list of hosts
#[derive(Debug, Parser)]
#[command(name = "pings", about, disable_version_flag = true, after_help = EXAMPLES)]
pub struct Cli {
    /// Hosts to ping, or a file with one host per line, optionally followed by the interval
    #[arg(value_name = "HOST|FILE [INTERVAL]", required = true, allow_negative_numbers = true)]
    pub args: Vec<String>,
}
