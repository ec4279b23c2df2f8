//! Shirt-size preference recorded on a profile.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tee-shirt size preference. Defaults to `Unspecified` until the attendee
/// says otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShirtSize {
    #[default]
    Unspecified,
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
    Xxxl,
}

impl fmt::Display for ShirtSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShirtSize::Unspecified => "unspecified",
            ShirtSize::Xs => "XS",
            ShirtSize::S => "S",
            ShirtSize::M => "M",
            ShirtSize::L => "L",
            ShirtSize::Xl => "XL",
            ShirtSize::Xxl => "XXL",
            ShirtSize::Xxxl => "XXXL",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unspecified() {
        assert_eq!(ShirtSize::default(), ShirtSize::Unspecified);
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&ShirtSize::Xxl).unwrap(), "\"xxl\"");
    }
}
