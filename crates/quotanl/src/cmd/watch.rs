use crate::cmd::WatchArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

#[cfg(target_os = "linux")]
pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    use std::sync::Arc;
    use std::time::SystemTime;

    use quotanl_client::{ClientConfig, QuotaClient};
    use tracing::{debug, warn};

    use crate::cmd::parse_duration;
    use crate::exit::{quota_error, SUCCESS};
    use crate::output::print_notification;

    let timeout = args.timeout.as_deref().map(parse_duration).transpose()?;
    let config = ClientConfig {
        family_name: args.family,
        group_name: args.group,
    };

    let client = QuotaClient::with_config(&config)
        .map_err(|err| quota_error("connect failed", err))?;
    let client = Arc::new(client);
    install_ctrlc_handler(Arc::clone(&client))?;

    let mut printed = 0u64;
    loop {
        if let Some(timeout) = timeout {
            client
                .set_deadline(Some(SystemTime::now() + timeout))
                .map_err(|err| quota_error("set deadline failed", err))?;
        }

        let notification = match client.receive() {
            Ok(n) => n,
            Err(err) if client.is_closed() => {
                debug!(%err, "receive interrupted by close");
                return Ok(SUCCESS);
            }
            Err(err) if err.is_protocol() => {
                warn!(%err, "skipping datagram");
                continue;
            }
            Err(err) => return Err(quota_error("receive failed", err)),
        };

        print_notification(&notification, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    client
        .close()
        .map_err(|err| quota_error("close failed", err))?;
    Ok(SUCCESS)
}

#[cfg(target_os = "linux")]
fn install_ctrlc_handler(
    client: std::sync::Arc<quotanl_client::QuotaClient>,
) -> CliResult<()> {
    use crate::exit::{CliError, INTERNAL};

    ctrlc::set_handler(move || {
        if let Err(err) = client.close() {
            tracing::debug!(%err, "close on interrupt failed");
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(not(target_os = "linux"))]
pub fn run(_args: WatchArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::FAILURE,
        "quota notifications require Linux generic netlink",
    ))
}
