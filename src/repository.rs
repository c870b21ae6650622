//! Repository names
//!
//! Registry repository names are `/`-separated paths of components drawn
//! from a restricted grammar: lowercase alphanumerics with single `.`, `-`
//! or `_` separators, components capped at 30 characters and full names at
//! 256. [`Repository`] enforces the grammar at construction so an invalid
//! name is rejected before any request is built.

use std::fmt;
use std::str::FromStr;

pub const COMPONENT_SEPARATORS: &str = ".-_";
pub const MAX_COMPONENT_LENGTH: usize = 30;
pub const MAX_NAME_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidRepositoryName(String);

/// A validated repository name, e.g. `library/alpine`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    name: String,
}

impl Repository {
    pub fn parse(name: &str) -> Result<Self, InvalidRepositoryName> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name's path components, in order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.name.split('/')
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for Repository {
    type Err = InvalidRepositoryName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_component_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_separator(c: char) -> bool {
    COMPONENT_SEPARATORS.contains(c)
}

fn validate_name(name: &str) -> Result<(), InvalidRepositoryName> {
    if name.is_empty() {
        return Err(InvalidRepositoryName(
            "repository name may not be empty".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(InvalidRepositoryName(format!(
            "repository name may not exceed {} characters",
            MAX_NAME_LENGTH
        )));
    }

    for component in name.split('/') {
        validate_component(component)?;
    }

    Ok(())
}

fn validate_component(component: &str) -> Result<(), InvalidRepositoryName> {
    if component.is_empty() {
        return Err(InvalidRepositoryName(
            "repository name path component may not be empty".to_string(),
        ));
    }

    if component.len() > MAX_COMPONENT_LENGTH {
        return Err(InvalidRepositoryName(format!(
            "repository name path component may not exceed {} characters",
            MAX_COMPONENT_LENGTH
        )));
    }

    // First and last characters may not be separators.
    if !component.starts_with(is_component_char) {
        return Err(InvalidRepositoryName(format!(
            "repository name path component must start with a lowercase \
             alphanumeric character: {:?}",
            component
        )));
    }

    if !component.ends_with(is_component_char) {
        return Err(InvalidRepositoryName(format!(
            "repository name path component must end with a lowercase \
             alphanumeric character: {:?}",
            component
        )));
    }

    if component.chars().any(|c| !is_component_char(c) && !is_separator(c)) {
        return Err(InvalidRepositoryName(format!(
            "repository name path component may only contain lowercase \
             alphanumeric characters and {:?}: {:?}",
            COMPONENT_SEPARATORS, component
        )));
    }

    let mut previous_was_separator = false;
    for c in component.chars() {
        if is_separator(c) {
            if previous_was_separator {
                return Err(InvalidRepositoryName(format!(
                    "repository name path component may not contain more than \
                     one component separator characters ({}) in a row: {:?}",
                    COMPONENT_SEPARATORS, component
                )));
            }
            previous_was_separator = true;
        } else {
            previous_was_separator = false;
        }
    }

    Ok(())
}
