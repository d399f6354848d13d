// ============================================================
// Layer 3 - Run Mode Types
// ============================================================
// Two small value types decided once at process start and then
// threaded explicitly through the launcher:
//
//   ResumeMode      - start fresh, continue from the newest
//                     checkpoint, or continue from a given epoch
//   DeviceSelection - which accelerator indices this run may use
//
// Device selection is passed to device construction directly;
// nothing here writes to the process environment.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

// ─── ResumeMode ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeMode {
    /// Ignore any existing checkpoints and start at epoch 1
    #[default]
    Fresh,

    /// Continue from whatever `latest.json` points to
    ResumeFromLatest,

    /// Continue from the checkpoint written at the given epoch
    ResumeFromCheckpoint(usize),
}

impl ResumeMode {
    /// Build the mode from the two CLI switches.
    /// An explicit epoch wins over the bare `--resume` flag.
    pub fn from_flags(resume: bool, resume_from: Option<usize>) -> Self {
        match (resume, resume_from) {
            (_, Some(epoch)) => ResumeMode::ResumeFromCheckpoint(epoch),
            (true, None)     => ResumeMode::ResumeFromLatest,
            (false, None)    => ResumeMode::Fresh,
        }
    }

    pub fn is_resume(&self) -> bool {
        !matches!(self, ResumeMode::Fresh)
    }
}

impl fmt::Display for ResumeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumeMode::Fresh                       => write!(f, "fresh"),
            ResumeMode::ResumeFromLatest            => write!(f, "resume from latest"),
            ResumeMode::ResumeFromCheckpoint(epoch) => write!(f, "resume from epoch {epoch}"),
        }
    }
}

// ─── DeviceSelection ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceSelection {
    /// Let the backend pick its default device
    #[default]
    Default,

    /// Restrict the run to these device indices, in the given order.
    /// The first index is the primary training device.
    Indices(Vec<usize>),
}

impl DeviceSelection {
    /// The device index tensors should be allocated on, if any.
    pub fn primary(&self) -> Option<usize> {
        match self {
            DeviceSelection::Default         => None,
            DeviceSelection::Indices(indices) => indices.first().copied(),
        }
    }

    pub fn indices(&self) -> &[usize] {
        match self {
            DeviceSelection::Default         => &[],
            DeviceSelection::Indices(indices) => indices,
        }
    }
}

/// Parses the `--device` value, e.g. `"1,2"` or `" 0 , 3 "`.
impl FromStr for DeviceSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(DeviceSelection::Default);
        }

        let mut indices = Vec::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            if part.is_empty() {
                bail!("empty entry in device list '{s}'");
            }
            let index: usize = part
                .parse()
                .with_context(|| format!("invalid device index '{part}' in '{s}'"))?;
            if indices.contains(&index) {
                bail!("device index {index} listed twice in '{s}'");
            }
            indices.push(index);
        }
        Ok(DeviceSelection::Indices(indices))
    }
}

/// Renders back to the comma-separated form the user typed.
impl fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelection::Default => write!(f, "default"),
            DeviceSelection::Indices(indices) => {
                let parts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}
