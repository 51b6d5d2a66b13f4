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
// - agent.rs file -

use anyhow::{Context, Result};
use tracing::debug;
use ureq::{Agent, AgentBuilder, Proxy};
use url::Url;

const USER_AGENT: &str = concat!("sunodl/", env!("CARGO_PKG_VERSION"));

pub trait AgentBase {
    fn init(url: &Url) -> Result<Agent>;
}

pub struct SunodlAgent;
impl AgentBase for SunodlAgent {
    // Default agent for sunodl. Sets a proxy or not.
    fn init(url: &Url) -> Result<Agent> {
        let mut builder = AgentBuilder::new().user_agent(USER_AGENT);

        if let Some((host, port)) = env_proxy::for_url(url).host_port() {
            // Use a proxy:
            debug!(%host, port, "using proxy from the environment");
            let proxy = Proxy::new(format!("{}:{}", host, port))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build())
    }
}

// Fetches <url> and returns the whole body.
pub fn fetch_page(url: &str) -> Result<String> {
    let url_p = Url::parse(url)?;
    let agent = SunodlAgent::init(&url_p)?;

    debug!(%url, "fetching page");
    let body = agent
        .get(url)
        .call()
        .with_context(|| format!("could not go to {}", url))?
        .into_string()
        .context("could not read the site source")?;

    Ok(body)
}
