use clap::builder::PossibleValue;
use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, Command};
use itertools::Itertools;
use lazy_static::lazy_static;

use crate::admission_review::AdmissionCodec;

lazy_static! {
    static ref VERSION_AND_API_VERSIONS: String = {
        let api_versions: String = AdmissionCodec::default()
            .api_versions()
            .sorted()
            .map(|api_version| format!("  - {api_version}"))
            .join("\n");

        format!(
            "{}\n\nSupported AdmissionReview versions:\n{}",
            crate_version!(),
            api_versions,
        )
    };
}

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("ADMISSION_ADAPTER_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("ADMISSION_ADAPTER_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("ADMISSION_ADAPTER_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8080")
            .env("ADMISSION_ADAPTER_PORT")
            .help("Listen on PORT"),
        Arg::new("webhook-path")
            .long("webhook-path")
            .value_name("PATH")
            .default_value("/review")
            .env("ADMISSION_ADAPTER_WEBHOOK_PATH")
            .help("HTTP path receiving the AdmissionReview objects"),
        Arg::new("max-body-size")
            .long("max-body-size")
            .value_name("BYTES")
            .default_value("3145728")
            .env("ADMISSION_ADAPTER_MAX_BODY_SIZE")
            .help("Largest AdmissionReview body accepted, in bytes"),
        Arg::new("verdict")
            .long("verdict")
            .value_name("VERDICT")
            .default_value("allow")
            .env("ADMISSION_ADAPTER_VERDICT")
            .value_parser([PossibleValue::new("allow"), PossibleValue::new("deny")])
            .help("Verdict given to every request by the built-in webhook"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .long_version(VERSION_AND_API_VERSIONS.as_str())
        .args(args)
}
