//! Access descriptors for asset resources.
//!
//! Every resource is created with an [`AccessMode`]. The mode fixes two
//! [`Access`] masks, one for the remote server and one for the local client
//! application:
//!
//! | Mode | Server | Client |
//! |------|--------|--------|
//! | [`AccessMode::Variable`] | Read | Read, Write |
//! | [`AccessMode::Setting`] | Read, Write | Read |
//! | [`AccessMode::Command`] | Execute | Execute |
//!
//! Read and Write are complementary between the two sides; Execute is the
//! same on both.

use core::fmt;
use core::ops::BitOr;

/// A set of access bits over {Read, Write, Execute}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Access(u8);

impl Access {
    /// No access.
    pub const NONE: Self = Self(0);
    /// Read access.
    pub const READ: Self = Self(0b001);
    /// Write access.
    pub const WRITE: Self = Self(0b010);
    /// Execute access.
    pub const EXECUTE: Self = Self(0b100);

    /// Returns `true` if every bit in `other` is set in `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bits.
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Access {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::READ) {
            names.push("read");
        }
        if self.contains(Self::WRITE) {
            names.push("write");
        }
        if self.contains(Self::EXECUTE) {
            names.push("execute");
        }
        if names.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&names.join("|"))
    }
}

/// How a resource may be used, chosen at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Produced by the device, read by the server.
    Variable,
    /// Configured by the server, read by the device.
    Setting,
    /// Executed by the server, handled by the device.
    Command,
}

impl AccessMode {
    /// Returns the server-side access mask.
    #[must_use]
    pub fn server_access(self) -> Access {
        match self {
            Self::Variable => Access::READ,
            Self::Setting => Access::READ | Access::WRITE,
            Self::Command => Access::EXECUTE,
        }
    }

    /// Returns the client-side access mask.
    #[must_use]
    pub fn client_access(self) -> Access {
        match self {
            Self::Variable => Access::READ | Access::WRITE,
            Self::Setting => Access::READ,
            Self::Command => Access::EXECUTE,
        }
    }

    /// Returns the access mask for the given side.
    #[must_use]
    pub fn access_for(self, origin: Origin) -> Access {
        match origin {
            Origin::Server => self.server_access(),
            Origin::Client => self.client_access(),
        }
    }
}

/// The side performing an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The local client application.
    Client,
    /// The remote management server.
    Server,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Server => f.write_str("server"),
        }
    }
}

/// Action reported to a resource handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// The server is about to read the value.
    Read,
    /// The server has written a new value.
    Write,
    /// The server requests command execution.
    Execute,
}

impl Action {
    /// Access bit required for this action.
    #[must_use]
    pub fn required(self) -> Access {
        match self {
            Self::Read => Access::READ,
            Self::Write => Access::WRITE,
            Self::Execute => Access::EXECUTE,
        }
    }
}
