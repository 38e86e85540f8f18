//! Sandbox artifact shared with downstream build steps
//!
//! The artifact is an ES module:
//!
//! ```text
//! export const WORDPRESS_URL = "https://...";
//! export const SANDBOX_ID = "sbx_...";
//! ```

use tracing::debug;

use crate::errors::PressboxError;
use crate::filesys::file::File;

const URL_CONST: &str = "WORDPRESS_URL";
const ID_CONST: &str = "SANDBOX_ID";

/// Values persisted after a one-shot provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxArtifact {
    pub wordpress_url: String,
    pub sandbox_id: Option<String>,
}

impl SandboxArtifact {
    /// Render as an ES module
    pub fn render(&self) -> Result<String, PressboxError> {
        let mut out = format!(
            "export const {} = {};\n",
            URL_CONST,
            serde_json::to_string(&self.wordpress_url)?
        );
        if let Some(id) = &self.sandbox_id {
            out.push_str(&format!(
                "export const {} = {};\n",
                ID_CONST,
                serde_json::to_string(id)?
            ));
        }
        Ok(out)
    }

    /// Parse a rendered artifact. Unknown lines are ignored.
    pub fn parse(contents: &str) -> Result<Self, PressboxError> {
        let mut wordpress_url = None;
        let mut sandbox_id = None;

        for line in contents.lines() {
            let Some(decl) = line.trim().strip_prefix("export const ") else {
                continue;
            };
            let Some((name, value)) = decl.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_end_matches(';').trim();

            match name.trim() {
                URL_CONST => wordpress_url = Some(serde_json::from_str::<String>(value)?),
                ID_CONST => sandbox_id = Some(serde_json::from_str::<String>(value)?),
                _ => {}
            }
        }

        let wordpress_url = wordpress_url.ok_or_else(|| {
            PressboxError::ArtifactError(format!("{} is not declared", URL_CONST))
        })?;

        Ok(Self {
            wordpress_url,
            sandbox_id: sandbox_id.filter(|id| !id.is_empty()),
        })
    }

    /// Write the artifact atomically
    pub async fn write(&self, file: &File) -> Result<(), PressboxError> {
        file.write_atomic(self.render()?.as_bytes()).await?;
        debug!("Wrote sandbox artifact to {}", file.path().display());
        Ok(())
    }

    /// Read the artifact, `None` when the file does not exist
    pub async fn read(file: &File) -> Result<Option<Self>, PressboxError> {
        if !file.exists().await {
            return Ok(None);
        }
        let contents = file.read_string().await?;
        Ok(Some(Self::parse(&contents)?))
    }
}
