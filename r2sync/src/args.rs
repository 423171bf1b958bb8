use std::path::PathBuf;

use clap::Parser;
use r2sync_local_store::DEFAULT_PERSIST_DIR;

pub const DEFAULT_CONFIG_PATH: &str = "workers/herawalla-email-atelier/wrangler.toml";

/// Sync local miniflare R2 objects to remote.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Only sync keys with this prefix
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// List missing keys without uploading
    #[arg(long)]
    pub dry_run: bool,

    /// Upload all matching keys
    #[arg(long)]
    pub force: bool,

    /// Limit to first N keys (0 means no limit)
    #[arg(long, default_value_t = 0)]
    pub batch: usize,

    /// wrangler.toml holding MEDIA_PUBLIC_BASE_URL and the r2 bucket
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Local wrangler state dir
    #[arg(long, value_name = "DIR", default_value = DEFAULT_PERSIST_DIR)]
    pub persist_to: PathBuf,

    #[arg(long, value_name = "PROGRAM", hide = true)]
    pub npx: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["r2sync"]).unwrap();
        assert_eq!(args.prefix, "");
        assert!(!args.dry_run);
        assert!(!args.force);
        assert_eq!(args.batch, 0);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(args.persist_to, PathBuf::from(".wrangler/state/v3"));
        assert_eq!(args.npx, None);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "r2sync",
            "--prefix",
            "media/",
            "--dry-run",
            "--force",
            "--batch",
            "25",
        ])
        .unwrap();
        assert_eq!(args.prefix, "media/");
        assert!(args.dry_run);
        assert!(args.force);
        assert_eq!(args.batch, 25);
    }

    #[test]
    fn test_negative_batch_is_rejected() {
        assert!(Args::try_parse_from(["r2sync", "--batch", "-1"]).is_err());
    }
}
