//! Command-line surface.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "swipam")]
#[command(
    about = "Produce an Ansible inventory from SolarWinds IPAM and keep a cache valid until the next day"
)]
pub struct Cli {
    /// List instances (default)
    #[arg(long)]
    pub list: bool,

    /// Print the cache file name
    #[arg(long)]
    pub get_cache_file: bool,

    /// Print the local cache file name (always served if it exists, delete to update)
    #[arg(long)]
    pub get_local_cache: bool,

    /// Remove the cache before listing (same as touching the configuration file)
    #[arg(long)]
    pub refresh_cache: bool,

    /// Configuration file [default: $SWIPAM_CONFIG or swipam.toml next to the executable]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Replay IPAM rows from a recorded snapshot instead of querying the server
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
}

/// What a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    GetCacheFile,
    GetLocalCache,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn action(&self) -> Action {
        if self.get_cache_file {
            Action::GetCacheFile
        } else if self.get_local_cache {
            Action::GetLocalCache
        } else {
            Action::List
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_action_is_list() {
        let cli = Cli::parse_from(["swipam"]);
        assert_eq!(cli.action(), Action::List);
        let cli = Cli::parse_from(["swipam", "--list", "--refresh-cache"]);
        assert_eq!(cli.action(), Action::List);
        assert!(cli.refresh_cache);
    }

    #[test]
    fn test_get_cache_file() {
        let cli = Cli::parse_from(["swipam", "--get-cache-file", "--config", "/etc/swipam.toml"]);
        assert_eq!(cli.action(), Action::GetCacheFile);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/swipam.toml")));
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["swipam", "--host", "x"]).is_err());
    }
}
