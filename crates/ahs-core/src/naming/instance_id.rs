use tracing::info;

use crate::error::{CoreError, CoreResult};

/// Length of the conventional `i-` prefix skipped in instance ids.
const INSTANCE_ID_PREFIX_LEN: usize = 2;

/// Appends `length` characters of the instance id (after its `i-` prefix) to `base`.
///
/// When `base` already ends with that suffix it is returned unchanged, so running
/// twice against the same tag never doubles the suffix.
pub fn hostname_with_instance_id(
    base: &str,
    instance_id: &str,
    separator: &str,
    length: usize,
) -> CoreResult<String> {
    info!("computing hostname with truncated instance id");

    let suffix = instance_suffix(instance_id, length)?;
    if base.ends_with(suffix) {
        info!(base, "instance id already found in the input tag, reusing this value");
        return Ok(base.to_string());
    }

    let hostname = format!("{base}{separator}{suffix}");
    info!(hostname = %hostname, "computed unique hostname");
    Ok(hostname)
}

fn instance_suffix(instance_id: &str, length: usize) -> CoreResult<&str> {
    let available = instance_id.len().saturating_sub(INSTANCE_ID_PREFIX_LEN);
    let end = INSTANCE_ID_PREFIX_LEN.saturating_add(length);

    match instance_id.get(INSTANCE_ID_PREFIX_LEN..end) {
        Some(suffix) if length > 0 => Ok(suffix),
        _ => Err(CoreError::InvalidSuffixLength {
            length,
            instance_id: instance_id.to_string(),
            available,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "i-0123456789abcdef0";

    #[test]
    fn appends_truncated_instance_id() {
        assert_eq!(hostname_with_instance_id("web", ID, "-", 5).unwrap(), "web-01234");
        assert_eq!(hostname_with_instance_id("web", ID, ".", 3).unwrap(), "web.012");
        assert_eq!(hostname_with_instance_id("web", ID, "", 2).unwrap(), "web01");
    }

    #[test]
    fn rerun_keeps_existing_suffix() {
        assert_eq!(hostname_with_instance_id("web-01234", ID, "-", 5).unwrap(), "web-01234");
    }

    #[test]
    fn full_usable_length_is_accepted() {
        let hostname = hostname_with_instance_id("web", ID, "-", 17).unwrap();
        assert_eq!(hostname, "web-0123456789abcdef0");
    }

    #[test]
    fn oversized_length_is_a_data_error() {
        let err = hostname_with_instance_id("web", ID, "-", 18).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidSuffixLength {
                length: 18,
                available: 17,
                ..
            }
        ));

        assert!(hostname_with_instance_id("web", "i", "-", 1).is_err());
        assert!(hostname_with_instance_id("web", ID, "-", usize::MAX).is_err());
    }

    #[test]
    fn zero_length_is_rejected() {
        assert!(hostname_with_instance_id("web", ID, "-", 0).is_err());
    }

    #[test]
    fn base_shorter_than_suffix_is_fine() {
        assert_eq!(hostname_with_instance_id("a", ID, "-", 5).unwrap(), "a-01234");
    }
}
