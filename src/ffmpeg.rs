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
// - ffmpeg.rs file -

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

// The system's ffmpeg does the conversion; none is bundled.
pub fn to_audio(inputfile: &Path, outputfile: &Path) -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(inputfile)
        .arg("-vn") // Skip any video streams.
        .arg("-loglevel")
        .arg("quiet")
        .arg("-y")
        .arg(outputfile)
        .output()
        .context("could not find ffmpeg - no processing is done")?;

    if !output.status.success() {
        bail!(
            "ffmpeg could not convert {} ({})",
            inputfile.display(),
            output.status
        );
    }

    Ok(())
}
