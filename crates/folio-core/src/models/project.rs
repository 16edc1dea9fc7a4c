//! Portfolio project records and the create/update form.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{MultipartForm, OperationError};
use crate::utils::contains_ignore_case;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub image: Option<ProjectImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hosted image metadata as stored by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProjectImage {
    pub public_id: String,
    pub url: String,
}

impl Project {
    /// True if any technology tag contains `filter`, ignoring case.
    /// An empty filter matches every project.
    pub fn matches_filter(&self, filter: &str) -> bool {
        if filter.is_empty() {
            return true;
        }
        self.technologies
            .iter()
            .any(|tech| contains_ignore_case(tech, filter))
    }
}

/// An image file to upload with a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk, inferring the MIME type from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime_type = mime_for_extension(path).to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }
}

fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Fields for creating or updating a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub url: String,
    technologies: Vec<String>,
    pub image: Option<ImageUpload>,
    /// Only sent on update. Takes precedence over `image`.
    pub remove_image: bool,
}

impl ProjectForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Prefill a form from an existing project, for editing
    pub fn from_project(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone().unwrap_or_default(),
            url: project.url.clone().unwrap_or_default(),
            technologies: project.technologies.clone(),
            image: None,
            remove_image: false,
        }
    }

    pub fn technologies(&self) -> &[String] {
        &self.technologies
    }

    /// Add a technology tag. Blank and duplicate tags are ignored.
    /// Returns whether the tag was added.
    pub fn add_technology(&mut self, tech: &str) -> bool {
        let tech = tech.trim();
        if tech.is_empty() || self.technologies.iter().any(|t| t == tech) {
            return false;
        }
        self.technologies.push(tech.to_string());
        true
    }

    pub fn remove_technology(&mut self, tech: &str) {
        self.technologies.retain(|t| t != tech);
    }

    pub fn validate(&self) -> Result<(), OperationError> {
        if self.title.trim().is_empty() {
            return Err(OperationError::validation("Title is required"));
        }
        Ok(())
    }

    /// Build the multipart payload. `for_update` adds the `removeImage`
    /// flag when set, in which case no image is attached.
    pub fn to_multipart(&self, for_update: bool) -> MultipartForm {
        let mut form = MultipartForm::new()
            .text("title", &self.title)
            .text("description", &self.description)
            .text("url", &self.url);
        for tech in &self.technologies {
            form = form.text("technologies[]", tech);
        }
        if for_update && self.remove_image {
            form = form.text("removeImage", "true");
        } else if let Some(ref image) = self.image {
            form = form.file("image", image.clone());
        }
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ErrorKind, MultipartPart};

    fn project_with(technologies: &[&str]) -> Project {
        let json = serde_json::json!({
            "_id": "p1",
            "title": "Demo",
            "technologies": technologies,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
        });
        serde_json::from_value(json).expect("project JSON")
    }

    #[test]
    fn test_parse_project_with_image() {
        let json = r#"{"_id":"abc","title":"Site","description":"A site","url":"https://x.dev","technologies":["rust"],"image":{"public_id":"folio/abc","url":"https://cdn/x.png"},"createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-02T10:00:00Z"}"#;
        let project: Project = serde_json::from_str(json).expect("project JSON");
        assert_eq!(project.id, "abc");
        assert_eq!(project.image.as_ref().map(|i| i.public_id.as_str()), Some("folio/abc"));
    }

    #[test]
    fn test_parse_project_minimal() {
        let project = project_with(&[]);
        assert!(project.description.is_none());
        assert!(project.image.is_none());
        assert!(project.technologies.is_empty());
    }

    #[test]
    fn test_matches_filter() {
        let project = project_with(&["Rust", "Go"]);
        assert!(project.matches_filter("go"));
        assert!(project.matches_filter("RU"));
        assert!(project.matches_filter(""));
        assert!(!project.matches_filter("ts"));
        assert!(!project_with(&[]).matches_filter("go"));
    }

    #[test]
    fn test_add_technology_trims_and_dedupes() {
        let mut form = ProjectForm::new("Demo");
        assert!(form.add_technology(" rust "));
        assert!(!form.add_technology("rust"));
        assert!(!form.add_technology("   "));
        assert!(form.add_technology("go"));
        form.remove_technology("rust");
        assert_eq!(form.technologies(), ["go".to_string()]);
    }

    #[test]
    fn test_validate_requires_title() {
        let err = ProjectForm::new("  ").validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
        assert!(ProjectForm::new("Demo").validate().is_ok());
    }

    #[test]
    fn test_multipart_fields() {
        let mut form = ProjectForm::new("Demo");
        form.add_technology("rust");
        form.add_technology("go");
        form.image = Some(ImageUpload {
            file_name: "shot.png".into(),
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        });

        let multipart = form.to_multipart(false);
        let techs: Vec<&str> = multipart.texts("technologies[]").collect();
        assert_eq!(techs, ["rust", "go"]);
        assert!(multipart
            .parts()
            .iter()
            .any(|(name, part)| name == "image" && matches!(part, MultipartPart::File(_))));
        assert_eq!(multipart.texts("removeImage").count(), 0);
    }

    #[test]
    fn test_multipart_remove_image_skips_upload() {
        let mut form = ProjectForm::new("Demo");
        form.remove_image = true;
        form.image = Some(ImageUpload {
            file_name: "shot.png".into(),
            mime_type: "image/png".into(),
            bytes: vec![1],
        });

        let update = form.to_multipart(true);
        assert_eq!(update.texts("removeImage").collect::<Vec<_>>(), ["true"]);
        assert!(!update.parts().iter().any(|(name, _)| name == "image"));

        // The flag has no meaning on create
        let create = form.to_multipart(false);
        assert_eq!(create.texts("removeImage").count(), 0);
        assert!(create.parts().iter().any(|(name, _)| name == "image"));
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for_extension(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_extension(Path::new("a")), "application/octet-stream");
    }
}
