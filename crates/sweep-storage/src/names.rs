//! Resource name validation
//!
//! Names are checked locally so an obviously invalid name never reaches the
//! emulator (which would answer with a generic 400).

use sweep_core::prelude::*;

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 63;

/// Validate a blob container name: 3-63 chars of lowercase letters, digits
/// and single hyphens, starting and ending with a letter or digit.
pub fn validate_container_name(name: &str) -> Result<()> {
    check_length(name)?;

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(Error::invalid_resource_name(
            name,
            "only lowercase letters, digits and hyphens are allowed",
        ));
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(Error::invalid_resource_name(
            name,
            "must start and end with a letter or digit",
        ));
    }

    if name.contains("--") {
        return Err(Error::invalid_resource_name(
            name,
            "consecutive hyphens are not allowed",
        ));
    }

    Ok(())
}

/// Validate a table name: 3-63 alphanumeric chars starting with a letter
pub fn validate_table_name(name: &str) -> Result<()> {
    check_length(name)?;

    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::invalid_resource_name(
            name,
            "only letters and digits are allowed",
        ));
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(Error::invalid_resource_name(name, "must start with a letter"));
    }

    if name.eq_ignore_ascii_case("tables") {
        return Err(Error::invalid_resource_name(name, "reserved table name"));
    }

    Ok(())
}

fn check_length(name: &str) -> Result<()> {
    if (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.len()) {
        Ok(())
    } else {
        Err(Error::invalid_resource_name(
            name,
            format!("must be {}-{} characters long", MIN_NAME_LEN, MAX_NAME_LEN),
        ))
    }
}
