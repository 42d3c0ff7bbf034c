use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{self, CliResult};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct EnvInfo {
    version: &'static str,
    build_target: &'static str,
    os: &'static str,
    arch: &'static str,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let info = EnvInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_target: option_env!("AEROLINK_BUILD_TARGET").unwrap_or("unknown"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
            );
        }
        _ => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KEY", "VALUE"])
                .add_row(vec!["version", info.version])
                .add_row(vec!["build_target", info.build_target])
                .add_row(vec!["os", info.os])
                .add_row(vec!["arch", info.arch]);
            println!("{table}");
        }
    }

    Ok(exit::SUCCESS)
}
