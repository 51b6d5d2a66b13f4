/*
 * The contents of this file are subject to the terms of the
 * Common Development and Distribution License, Version 1.0 only
 * (the "License").  You may not use this file except in compliance
 * with the License.
 *
 * See the file LICENSE in this distribution for details.
 * A copy of the CDDL is also available via the Internet at
 * http://www.opensource.org/licenses/cddl1.txt
 *
 * When distributing Covered Code, include this CDDL HEADER in each
 * file and include the contents of the LICENSE file from this
 * distribution.
 */

// Yet Another Suno Down Loader
// - main.rs file -

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod agent;
mod definitions;
mod download;
mod ffmpeg;
mod handlers;
mod resolver;
mod scrape;

use definitions::ExtractError;

#[derive(Parser)]
#[clap(version, about = "Yet Another Suno Down Loader", long_about = None)]
struct Args {
    #[clap(
        long = "keep-temp-file",
        short = 'k',
        help = "Keeps the downloaded mp3 file after converting it"
    )]
    keeptempfile: bool,

    #[clap(long, short = 'v', help = "Talks more while the URLs are processed")]
    verbose: bool,

    #[clap(
        long = "audio-format",
        short = 'f',
        help = "Sets the target audio format (default: mp3, or $SUNODL_AUDIO_FORMAT).\nSpecify the file extension here."
    )]
    audioformat: Option<String>,

    #[clap(
        long = "output",
        short = 'o',
        help = "Sets the output file name (only with a single URL)"
    )]
    outputfile: Option<String>,

    #[clap(
        long = "dump-json",
        short = 'j',
        help = "Prints the extracted metadata as JSON instead of downloading"
    )]
    dumpjson: bool,

    #[clap(help = "Sets the input URL(s) to use", required = true)]
    urls: Vec<String>,
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins over --verbose.
    let default_filter = if verbose { "warn,sunodl=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Argument parsing:
    let args = Args::parse();
    init_logging(args.verbose);

    if args.outputfile.is_some() && args.urls.len() > 1 {
        bail!("--output can only be used with a single URL.");
    }

    // The target format could be an argument from the command line
    // or, to make life easier, from the environment variables
    // ("SUNODL_AUDIO_FORMAT") if not specified there.
    let audioformat = args
        .audioformat
        .clone()
        .or_else(|| env::var("SUNODL_AUDIO_FORMAT").ok())
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "mp3".to_string());

    let mut failed = 0;
    for in_url in &args.urls {
        if let Err(e) = process_url(in_url, &args, &audioformat) {
            failed += 1;
            match e.downcast_ref::<ExtractError>() {
                // Expected: the page just doesn't have what we need.
                Some(extract_err) if extract_err.is_expected() => {
                    println!("Skipping {}: {}", in_url, extract_err);
                }
                _ => {
                    warn!(url = %in_url, "processing failed: {:#}", e);
                    println!("Could not process {}: {:#}", in_url, e);
                }
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} URL(s) failed.", failed, args.urls.len()));
    }

    Ok(())
}

fn process_url(in_url: &str, args: &Args, audioformat: &str) -> Result<()> {
    // Find a known handler for <in_url>:
    let handler = match definitions::find_handler(in_url) {
        Some(handler) => handler,
        None => bail!(
            "sunodl could not find a site definition that would satisfy {}",
            in_url
        ),
    };

    let id = handler
        .media_id(in_url)
        .ok_or_else(|| anyhow!("no media ID in {}", in_url))?;

    println!("Fetching from {}.", handler.display_name());
    let page = agent::fetch_page(in_url)?;
    let record = handler.resolve(&page, &id)?;

    if args.dumpjson {
        println!("{}", serde_json::to_string_pretty(&record.to_info_json())?);
        return Ok(());
    }

    if args.verbose {
        println!("Title: {}", record.title);
        if let Some(uploader) = &record.uploader {
            println!("Uploader: {}", uploader);
        }
    }
    debug!(url = %record.media_url, "media URL");

    // Now let's download it:
    let targetfile = match &args.outputfile {
        Some(in_targetfile) => in_targetfile.to_string(),
        None => record.file_name(),
    };

    if args.verbose {
        println!("Starting the download.");
    }
    download::download(&record.media_url, Path::new(&targetfile))?;

    // Convert the file if needed.
    if audioformat == record.ext() {
        println!("\"{}\" successfully downloaded.", &targetfile);
        return Ok(());
    }

    if args.verbose {
        println!("Post-processing.");
    }

    let inpath = Path::new(&targetfile);
    let mut outpathbuf = PathBuf::from(&targetfile);
    outpathbuf.set_extension(audioformat);
    ffmpeg::to_audio(inpath, &outpathbuf)?;

    // Get rid of the evidence.
    if !args.keeptempfile {
        fs::remove_file(&targetfile)?;
    }

    // Success!
    println!(
        "\"{}\" successfully downloaded.",
        outpathbuf.display()
    );

    Ok(())
}
