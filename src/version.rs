mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Returns the main version identifier, e.g. `v1.4`.
pub(crate) fn identifier() -> String {
    let version = build_info::PKG_VERSION;
    let digits = version.strip_suffix(".0").unwrap_or(version);
    format!("v{digits}")
}

/// Returns an RFC 2822 formatted date of the build time in UTC.
pub(crate) fn build_time_utc() -> &'static str {
    build_info::BUILT_TIME_UTC
}

/// Returns the commit hash this was built from, or "unknown" when building
/// outside of a git checkout (e.g. from a source tarball).
pub(crate) fn git_commit_hash() -> &'static str {
    build_info::GIT_COMMIT_HASH.unwrap_or("unknown")
}

fn git_was_dirty() -> bool {
    build_info::GIT_DIRTY == Some(true)
}

/// Returns a string containing all version-related information.
pub(crate) fn full() -> String {
    format!(
        "{} ({}{}), built {}",
        identifier(),
        git_commit_hash(),
        if git_was_dirty() { ", dirty" } else { "" },
        build_time_utc(),
    )
}
