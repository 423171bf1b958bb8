use std::io::Write;

use log::info;
use r2sync_config_file::load_sync_config;
use r2sync_remote_client::PublicBucketClient;

use crate::{
    args::Args,
    sync::{sync_objects, SyncError, SyncOptions, SyncReport},
    upload::WranglerUploader,
};

pub mod args;
pub mod sync;
pub mod upload;

/// Runs one sync against the live bucket and `wrangler`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<SyncReport, SyncError> {
    let config = load_sync_config(&args.config).map_err(SyncError::Config)?;
    info!("syncing bucket {} against {}", config.bucket, config.base_url);

    let remote = PublicBucketClient::new(config.base_url.clone());
    let uploader = match &args.npx {
        Some(program) => WranglerUploader::with_program(program.clone(), args.config.clone()),
        None => WranglerUploader::new(args.config.clone()),
    };
    let options = SyncOptions {
        prefix: args.prefix.clone(),
        dry_run: args.dry_run,
        force: args.force,
        batch: args.batch,
        persist_dir: args.persist_to.clone(),
    };

    sync_objects(&options, &config, &remote, &uploader, out)
}
