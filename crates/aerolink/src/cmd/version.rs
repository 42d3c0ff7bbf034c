use crate::cmd::VersionArgs;
use crate::exit::{self, CliResult};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("aerolink {}", env!("CARGO_PKG_VERSION"));
    if args.extended {
        println!(
            "target: {}",
            option_env!("AEROLINK_BUILD_TARGET").unwrap_or("unknown")
        );
        println!("rustc minimum: {}", env!("CARGO_PKG_RUST_VERSION"));
    }
    Ok(exit::SUCCESS)
}
