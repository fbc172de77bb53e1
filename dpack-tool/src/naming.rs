use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike, Utc};
use rand::Rng;
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_TEMPLATE: &str = "deploy_%datetime%_%rand%.zip";

/// Expands the output argument into a concrete archive path.
///
/// An existing directory (or a path without a file extension) selects the
/// default timestamped template inside that directory; otherwise the last
/// component is treated as the template. Placeholders like `%datetime%`
/// and `%rand%` are replaced case-insensitively. Parent directories are
/// never created here; a missing parent surfaces later as a hard error
/// when the archive is opened for writing.
pub fn resolve_output_path(output: &str) -> Result<PathBuf> {
    let path = Path::new(output);
    let treat_as_dir = path.is_dir() || path.extension().map(|e| e.is_empty()).unwrap_or(true);

    let (dir, template) = if treat_as_dir {
        (path, DEFAULT_TEMPLATE.to_string())
    } else {
        (
            path.parent().unwrap_or_else(|| Path::new(".")),
            path.file_name()
                .context("invalid output file name")?
                .to_string_lossy()
                .to_string(),
        )
    };

    Ok(dir.join(expand_placeholders(&template)))
}

fn expand_placeholders(template: &str) -> String {
    let now = Utc::now();
    let local = Local::now();
    let fills = [
        ("%datetime%", now.format("%Y-%m-%d_%H-%M-%S").to_string()),
        ("%date%", now.format("%Y-%m-%d").to_string()),
        ("%time%", now.format("%H-%M-%S").to_string()),
        ("%hh%", format!("{:02}", now.hour())),
        ("%mm%", format!("{:02}", now.minute())),
        ("%ss%", format!("{:02}", now.second())),
        ("%dd%", format!("{:02}", now.day())),
        ("%yyyy%", format!("{:04}", now.year())),
        ("%yy%", format!("{:02}", now.year() % 100)),
        ("%ms%", format!("{:03}", now.timestamp_subsec_millis())),
        ("%unix%", now.timestamp().to_string()),
        ("%ww%", now.format("%a").to_string()),
        ("%ltime%", local.format("%Y-%m-%d_%H-%M-%S").to_string()),
        ("%lh%", format!("{:02}", local.hour())),
        ("%ld%", format!("{:02}", local.day())),
        ("%rand%", random_string(5)),
        ("%longrand%", random_string(12)),
        ("%pwd%", current_dir_name()),
    ];

    let mut name = template.to_string();
    for (placeholder, value) in fills {
        name = replace_ignore_case(&name, placeholder, &value);
    }
    name
}

fn current_dir_name() -> String {
    env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "unknown".into())
}

/// Generates a random lowercase alphanumeric string.
fn random_string(len: usize) -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CHARS[rng.random_range(0..CHARS.len())] as char)
        .collect()
}

/// ASCII case-insensitive substring replacement; patterns are ASCII so
/// byte offsets into the lowercased copy stay valid in the original.
fn replace_ignore_case(s: &str, pattern: &str, value: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let needle = pattern.to_ascii_lowercase();
    let mut out = String::with_capacity(s.len());
    let mut rest = 0;

    while let Some(found) = lower[rest..].find(&needle) {
        let at = rest + found;
        out.push_str(&s[rest..at]);
        out.push_str(value);
        rest = at + pattern.len();
    }

    out.push_str(&s[rest..]);
    out
}
