use std::fmt;
use tracing::info;

/// What happened to one clip.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    Uploaded { clip_id: String, url: String },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipReport {
    pub filename: String,
    pub outcome: ClipOutcome,
}

/// Per-run summary, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    pub clips: Vec<ClipReport>,
}

impl UploadReport {
    pub fn record(&mut self, filename: impl Into<String>, outcome: ClipOutcome) {
        self.clips.push(ClipReport {
            filename: filename.into(),
            outcome,
        });
    }

    pub fn total(&self) -> usize {
        self.clips.len()
    }

    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, ClipOutcome::Uploaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ClipOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ClipOutcome::Failed { .. }))
    }

    /// A run only counts as successful if it uploaded something.
    pub fn is_success(&self) -> bool {
        self.uploaded() > 0
    }

    pub fn log_summary(&self) {
        info!(
            total = self.total(),
            uploaded = self.uploaded(),
            skipped = self.skipped(),
            failed = self.failed(),
            "Upload completed"
        );
    }

    fn count(&self, pred: impl Fn(&ClipOutcome) -> bool) -> usize {
        self.clips.iter().filter(|c| pred(&c.outcome)).count()
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  - Total files: {}", self.total())?;
        writeln!(f, "  - Uploaded: {}", self.uploaded())?;
        writeln!(f, "  - Skipped: {}", self.skipped())?;
        writeln!(f, "  - Failed: {}", self.failed())?;
        for clip in &self.clips {
            match &clip.outcome {
                ClipOutcome::Uploaded { .. } => {}
                ClipOutcome::Skipped { reason } => {
                    writeln!(f, "  skipped {}: {}", clip.filename, reason)?
                }
                ClipOutcome::Failed { error } => {
                    writeln!(f, "  failed  {}: {}", clip.filename, error)?
                }
            }
        }
        Ok(())
    }
}
