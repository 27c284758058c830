use quotanl_transport::GenericNetlink;
use tracing::debug;

use crate::error::{QuotaError, Result};

/// Find the id of multicast group `group_name` in family `family_name`.
///
/// The first group with a matching name wins. Group id 0 is never assigned
/// by the kernel, so a match with id 0 counts as not found. Lookup failures
/// from the transport, such as an unregistered family, are returned as
/// [`QuotaError::Transport`]. Nothing is joined here.
pub fn resolve_group<C>(conn: &C, family_name: &str, group_name: &str) -> Result<u32>
where
    C: GenericNetlink + ?Sized,
{
    let family = conn.resolve_family(family_name)?;

    let id = family.group(group_name).map_or(0, |group| group.id);
    if id == 0 {
        return Err(QuotaError::GroupNotFound {
            family: family_name.to_string(),
            group: group_name.to_string(),
        });
    }

    debug!(
        family = family_name,
        family_id = family.id,
        group = group_name,
        group_id = id,
        "resolved multicast group"
    );
    Ok(id)
}
