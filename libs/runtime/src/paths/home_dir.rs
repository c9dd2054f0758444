use std::io;
use std::path::PathBuf;

/// Resolve the application home directory into an absolute path.
///
/// - `None` (or an empty string) => `<user home>/<default_subdir>`
/// - `~` / `~/...` => expanded against the user home
/// - relative paths => joined onto the current working directory
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> io::Result<PathBuf> {
    let user_home = || {
        dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "cannot determine user home directory")
        })
    };

    let path = match configured.as_deref().map(str::trim) {
        None | Some("") => user_home()?.join(default_subdir),
        Some("~") => user_home()?,
        Some(p) => {
            if let Some(rest) = p.strip_prefix("~/") {
                user_home()?.join(rest)
            } else {
                let p = PathBuf::from(p);
                if p.is_absolute() {
                    p
                } else {
                    std::env::current_dir()?.join(p)
                }
            }
        }
    };

    if create {
        std::fs::create_dir_all(&path)?;
    }
    Ok(path)
}
