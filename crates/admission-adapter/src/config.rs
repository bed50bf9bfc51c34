use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::net::SocketAddr;

use crate::api::READINESS_PATH;
use crate::webhook::Verdict;

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub webhook_path: String,
    pub max_body_size: usize,
    pub verdict: Verdict,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let webhook_path = webhook_path(matches)?;
        let max_body_size = matches
            .get_one::<String>("max-body-size")
            .expect("This should not happen, there's a default value for max-body-size")
            .parse::<usize>()
            .map_err(|e| anyhow!("error parsing max-body-size: {}", e))?;
        let verdict = matches
            .get_one::<String>("verdict")
            .expect("This should not happen, there's a default value for verdict")
            .parse::<Verdict>()
            .map_err(|e| anyhow!("error parsing arguments: {}", e))?;

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            webhook_path,
            max_body_size,
            verdict,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &clap::ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        matches.get_one::<String>("address").unwrap(),
        matches.get_one::<String>("port").unwrap()
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn webhook_path(matches: &clap::ArgMatches) -> Result<String> {
    let path = matches.get_one::<String>("webhook-path").unwrap().to_owned();
    if !path.starts_with('/') {
        return Err(anyhow!(
            "error parsing arguments: webhook path must start with '/', got {}",
            path
        ));
    }
    if path == READINESS_PATH {
        return Err(anyhow!(
            "error parsing arguments: webhook path {} is reserved",
            path
        ));
    }
    Ok(path)
}
