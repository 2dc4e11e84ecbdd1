use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("headlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: headlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", option_env!("HEADLINK_BUILD_TARGET").unwrap_or("unknown"));
    println!("profile: {}", option_env!("HEADLINK_BUILD_PROFILE").unwrap_or("unknown"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "default_baud: {}",
        headlink_transport::DEFAULT_BAUD_RATE
    );
    println!(
        "default_address: {}",
        headlink_device::DEFAULT_ADDRESS
    );
    println!(
        "message_types: {}",
        headlink_itmp::MessageType::ALL
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(SUCCESS)
}
