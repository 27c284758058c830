//! Print quota notifications for ten seconds.
//!
//! Run with:
//!   cargo run --example watch-quota
//!
//! Then push a user over a limit on a filesystem mounted with quotas, e.g.
//! `setquota -u $USER 0 0 1 1 /mnt && touch /mnt/a /mnt/b` as root.

#[cfg(target_os = "linux")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::time::{Duration, SystemTime};

    use quotanl::QuotaClient;

    let client = QuotaClient::new()?;
    client.set_deadline(Some(SystemTime::now() + Duration::from_secs(10)))?;
    eprintln!("Waiting for quota notifications");

    loop {
        match client.receive() {
            Ok(n) => println!(
                "{} {} on {}:{}: {}",
                n.quota_type, n.id, n.device_major, n.device_minor, n.warning
            ),
            Err(e) if e.is_timeout() => break,
            Err(e) if e.is_protocol() => eprintln!("Skipping datagram: {e}"),
            Err(e) => return Err(e.into()),
        }
    }

    client.close()?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("quota notifications require Linux");
}
