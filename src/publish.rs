//! Where rendered artifacts end up: a local directory or an S3 bucket.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::render::Artifact;

/// Writes the artifact into `dir`, creating it if needed, and returns the path.
pub fn write_artifact(dir: &Path, artifact: &Artifact) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.file_name);
    std::fs::write(&path, &artifact.body)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = artifact.body.len(), "Artifact written");
    Ok(path)
}

/// Object key for an artifact under an optional prefix.
pub fn object_key(prefix: Option<&str>, artifact: &Artifact) -> String {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(p) => format!("{p}/{}", artifact.file_name),
        None => artifact.file_name.clone(),
    }
}

/// Uploads the artifact to S3 with its content type and returns the key.
#[tracing::instrument(skip(client, artifact), fields(file = %artifact.file_name))]
pub async fn upload_artifact(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: Option<&str>,
    artifact: &Artifact,
) -> Result<String> {
    let key = object_key(prefix, artifact);

    client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(artifact.body.clone()))
        .content_type(artifact.content_type)
        .send()
        .await?;

    info!(bucket, key = %key, "Artifact uploaded to S3");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn artifact() -> Artifact {
        Artifact {
            file_name: "Full_Results_Form_1_A_Annual_2025.csv".to_string(),
            content_type: "text/csv",
            body: Bytes::from_static(b"Position\n1\n"),
        }
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key(None, &artifact()), "Full_Results_Form_1_A_Annual_2025.csv");
        assert_eq!(
            object_key(Some("/results/2025/"), &artifact()),
            "results/2025/Full_Results_Form_1_A_Annual_2025.csv"
        );
        assert_eq!(object_key(Some(""), &artifact()), "Full_Results_Form_1_A_Annual_2025.csv");
    }

    #[test]
    fn test_write_artifact() {
        let dir = std::env::temp_dir().join("necta_results_publish_test");
        let _ = std::fs::remove_dir_all(&dir);

        let path = write_artifact(&dir, &artifact()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"Position\n1\n");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
