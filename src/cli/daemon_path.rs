use std::path::PathBuf;

/// Path of the daemon binary installed next to `path`.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name("mocotray-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}
