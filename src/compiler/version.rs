use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// Long compiler build identifier, e.g. `v0.8.10+commit.fc410830`.
///
/// The build metadata (commit hash) takes part in equality, so two
/// builds of the same release are different versions.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct CompilerVersion(semver::Version);

impl CompilerVersion {
    pub fn version(&self) -> &semver::Version {
        &self.0
    }
}

impl Display for CompilerVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for CompilerVersion {
    type Err = semver::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(semver::Version::from_str(
            s.trim().trim_start_matches('v'),
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ver(s: &str) -> CompilerVersion {
        CompilerVersion::from_str(s).unwrap()
    }

    #[test]
    fn parse() {
        let version = ver("v0.8.10+commit.fc410830");
        assert_eq!(version.version().major, 0);
        assert_eq!(version.version().minor, 8);
        assert_eq!(version.version().patch, 10);
        assert_eq!(version.version().build.as_str(), "commit.fc410830");

        ver("0.4.26+commit.4563c3fc");
        ver("v0.8.11-nightly.2021.11.9+commit.0e0109e2");
        CompilerVersion::from_str("latest").expect_err("not a version");
        CompilerVersion::from_str("").expect_err("empty version");
    }

    #[test]
    fn display_version() {
        for (initial, expected) in [
            ("v0.8.10+commit.fc410830", "v0.8.10+commit.fc410830"),
            ("0.5.9+commit.c68bc34e", "v0.5.9+commit.c68bc34e"),
        ] {
            assert_eq!(ver(initial).to_string(), expected);
        }
    }

    #[test]
    fn commit_is_part_of_identity() {
        assert_ne!(
            ver("v0.8.10+commit.fc410830"),
            ver("v0.8.10+commit.00000000")
        );
        assert_ne!(ver("v0.8.10+commit.fc410830"), ver("v0.8.10"));
        assert!(ver("v0.8.10+commit.fc410830") > ver("v0.8.9+commit.e5eed63a"));
        assert!(ver("v0.8.10+commit.fc410830") > ver("v0.4.26+commit.4563c3fc"));
    }
}
