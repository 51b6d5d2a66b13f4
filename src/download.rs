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
// - download.rs file -

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    fs,
    io::{self, copy, Read},
    path::Path,
};
use tracing::{debug, info};
use url::Url;

use crate::agent::{AgentBase, SunodlAgent};

struct DownloadProgress<'a, R> {
    inner: R,
    progress_bar: &'a ProgressBar,
}

impl<R: Read> Read for DownloadProgress<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map(|n| {
            self.progress_bar.inc(n as u64);
            n
        })
    }
}

pub fn download(url: &Url, filename: &Path) -> Result<()> {
    let agent = SunodlAgent::init(url)?;

    let resp = agent
        .head(url.as_str())
        .set("Referer", url.as_str())
        .call()
        .with_context(|| format!("could not reach {}", url))?;

    // Find the file size:
    let total_size = resp
        .header("Content-Length")
        .unwrap_or("0")
        .parse::<u64>()
        .unwrap_or(0);

    let mut request = agent.get(url.as_str()).set("Referer", url.as_str());

    // Display a progress bar:
    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.green/blue}] {percent}%",
        )?
        .progress_chars("#>-"),
    );

    let mut resumed = false;
    if filename.exists() {
        let size = filename.metadata()?.len();
        if total_size > 0 && size >= total_size {
            info!(file = %filename.display(), "already downloaded, skipping");
            return Ok(());
        }

        // Continue the file:
        debug!(file = %filename.display(), size, "resuming download");
        request = request.set("Range", &format!("bytes={}-", size));
        pb.inc(size);
        resumed = true;
    }

    let resp = request
        .call()
        .with_context(|| format!("could not download {}", url))?;

    // Servers that ignore the range send everything again.
    let append = resumed && resp.status() == 206;
    if resumed && !append {
        debug!("range request ignored, starting over");
        pb.set_position(0);
    }

    let mut source = DownloadProgress {
        progress_bar: &pb,
        inner: resp.into_reader(),
    };

    let mut dest = fs::OpenOptions::new()
        .create(true)
        .append(append)
        .write(true)
        .truncate(!append)
        .open(filename)
        .with_context(|| format!("could not open {}", filename.display()))?;

    let _ = copy(&mut source, &mut dest)?;

    pb.finish_and_clear();

    Ok(())
}
