use crate::cmd::FamilyArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

#[cfg(target_os = "linux")]
pub fn run(args: FamilyArgs, format: OutputFormat) -> CliResult<i32> {
    use quotanl_transport::{GenericNetlink, NetlinkSocket};

    use crate::exit::{transport_error, SUCCESS};
    use crate::output::print_family;

    let socket = NetlinkSocket::dial().map_err(|err| transport_error("dial failed", err))?;
    let resolved = socket.resolve_family(&args.name);
    if let Err(err) = socket.close() {
        tracing::debug!(%err, "socket close failed");
    }

    let family = resolved.map_err(|err| transport_error("resolve failed", err))?;
    print_family(&family, format);
    Ok(SUCCESS)
}

#[cfg(not(target_os = "linux"))]
pub fn run(_args: FamilyArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::FAILURE,
        "generic netlink requires Linux",
    ))
}
