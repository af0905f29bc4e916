//! Public link manifest: one `<public_url>/<entry>` line per served entry.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("No public_url found")]
    MissingPublicUrl,
    #[error("Failed to read served directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write manifest {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Names of the immediate entries of `dir`, in directory-iteration order.
///
/// Subdirectories are listed by name like files; nothing is expanded.
pub async fn list_entries(dir: &Path) -> Result<Vec<String>, ManifestError> {
    let read_dir_err = |source| ManifestError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_err)?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }

    Ok(names)
}

/// Render manifest text for the given entries.
pub fn render_links(public_url: &str, names: &[String]) -> String {
    let base = public_url.trim_end_matches('/');
    names
        .iter()
        .map(|name| format!("{base}/{name}\n"))
        .collect()
}

/// Writes one public link per served entry to `output`, replacing any prior
/// content. Returns the written links.
///
/// Fails with [`ManifestError::MissingPublicUrl`] before touching the
/// filesystem when no public URL has been resolved.
pub async fn write_manifest(
    public_url: Option<&str>,
    serve_dir: &Path,
    output: &Path,
) -> Result<Vec<String>, ManifestError> {
    let public_url = public_url
        .filter(|url| !url.is_empty())
        .ok_or(ManifestError::MissingPublicUrl)?;

    let names = list_entries(serve_dir).await?;
    let contents = render_links(public_url, &names);

    tokio::fs::write(output, &contents)
        .await
        .map_err(|source| ManifestError::Write {
            path: output.to_path_buf(),
            source,
        })?;

    info!(
        "Wrote {} link(s) to {}",
        names.len(),
        output.display()
    );

    let links: Vec<String> = contents.lines().map(str::to_string).collect();
    for link in &links {
        debug!("manifest link: {}", link);
    }

    Ok(links)
}
