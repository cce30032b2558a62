//! Startup diagnostics
//!
//! Printed before the server starts and by `reclaim check`. Observability
//! only; nothing here affects how requests are served.

use crate::config::Config;
use crate::pages::PageStore;
use crate::routes::ROUTES;
use reclaim_model::{artifact_inventory, ArtifactStatus};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StartupReport {
    pub workdir: PathBuf,
    pub templates_dir: PathBuf,
    pub templates_dir_exists: bool,
    pub templates: Vec<String>,
    pub models_dir: PathBuf,
    pub models_dir_exists: bool,
    pub artifacts: Vec<ArtifactStatus>,
}

impl StartupReport {
    pub fn collect(config: &Config) -> Self {
        let pages = PageStore::new(&config.pages.templates_dir);
        Self {
            workdir: std::env::current_dir()
                .and_then(|p| p.canonicalize())
                .unwrap_or_else(|_| PathBuf::from(".")),
            templates_dir: config.pages.templates_dir.clone(),
            templates_dir_exists: config.pages.templates_dir.is_dir(),
            templates: pages.list_templates(),
            models_dir: config.models.dir.clone(),
            models_dir_exists: config.models.dir.is_dir(),
            artifacts: artifact_inventory(&config.models.dir),
        }
    }

    /// True when every expected artifact file is present.
    pub fn artifacts_complete(&self) -> bool {
        self.artifacts.iter().all(|a| a.exists)
    }
}

impl fmt::Display for StartupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- STARTUP INFO ---")?;
        writeln!(f, "Working dir:      {}", self.workdir.display())?;
        writeln!(
            f,
            "Templates dir:    {} (exists: {})",
            self.templates_dir.display(),
            self.templates_dir_exists
        )?;
        writeln!(f, "Templates found:  {:?}", self.templates)?;
        writeln!(
            f,
            "Models dir:       {} (exists: {})",
            self.models_dir.display(),
            self.models_dir_exists
        )?;
        for artifact in &self.artifacts {
            writeln!(f, "  {:<14} exists: {}", artifact.label, artifact.exists)?;
        }
        writeln!(f, "Registered routes:")?;
        for route in ROUTES {
            writeln!(f, "  {:<6} {}", route.method, route.path)?;
        }
        write!(f, "--- END STARTUP INFO ---")
    }
}
