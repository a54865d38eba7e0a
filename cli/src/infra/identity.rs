//! Host identity: effective uid and passwd lookups via `nix`.

use std::path::PathBuf;

use crate::application::ports::HostIdentity;

/// Production `HostIdentity` backed by `geteuid(2)`.
pub struct NixIdentity;

impl HostIdentity for NixIdentity {
    fn effective_uid(&self) -> u32 {
        nix::unistd::geteuid().as_raw()
    }
}

/// Home directory of `user` from the passwd database, if the user exists.
#[must_use]
pub fn home_of(user: &str) -> Option<PathBuf> {
    nix::unistd::User::from_name(user)
        .ok()
        .flatten()
        .map(|u| u.dir)
}
