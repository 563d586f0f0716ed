//! Fixture utilities for the deterministic replay harness.
//!
//! This module discovers replay fixtures on disk, parses their frames and
//! optional expectations, and drives them through a [`SessionManager`]. A
//! fixture frame is either a raw detector frame or a synthetic pose built
//! from target knee/back angles, so sessions can be scripted without
//! recorded landmark data.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{round2, FrameReport};
use crate::error::ErrorCode;
use crate::managers::SessionManager;
use crate::pose::{NamedLandmarks, Point2, PoseFrame};

/// Default location for replay fixtures.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const HIP: Point2 = Point2::new(0.5, 0.5);
const THIGH_LENGTH: f64 = 0.2;
const SHIN_LENGTH: f64 = 0.2;
const TORSO_LENGTH: f64 = 0.3;

/// Pose described by the angles it should produce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntheticPose {
    pub knee_angle: f64,
    #[serde(default = "default_back_angle")]
    pub back_angle: f64,
}

fn default_back_angle() -> f64 {
    30.0
}

impl SyntheticPose {
    /// Left-side landmarks whose knee and back angles match this pose
    ///
    /// The thigh hangs straight down from the hip; the shin and torso are
    /// rotated away from vertical-up by the requested angles.
    pub fn to_frame(&self) -> PoseFrame {
        let knee = Point2::new(HIP.x, HIP.y + THIGH_LENGTH);
        let knee_rad = self.knee_angle.to_radians();
        let ankle = Point2::new(
            knee.x + SHIN_LENGTH * knee_rad.sin(),
            knee.y - SHIN_LENGTH * knee_rad.cos(),
        );
        let back_rad = self.back_angle.to_radians();
        let shoulder = Point2::new(
            HIP.x + TORSO_LENGTH * back_rad.sin(),
            HIP.y - TORSO_LENGTH * back_rad.cos(),
        );

        PoseFrame::Named(NamedLandmarks {
            left_shoulder: Some(shoulder),
            left_hip: Some(HIP),
            left_knee: Some(knee),
            left_ankle: Some(ankle),
        })
    }
}

/// Shorthand for `SyntheticPose { knee_angle, back_angle }.to_frame()`
pub fn synthetic_frame(knee_angle: f64, back_angle: f64) -> PoseFrame {
    SyntheticPose {
        knee_angle,
        back_angle,
    }
    .to_frame()
}

/// One frame entry in a fixture file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureFrame {
    Synthetic { synthetic: SyntheticPose },
    Pose(PoseFrame),
}

impl FixtureFrame {
    pub fn to_pose_frame(&self) -> PoseFrame {
        match self {
            FixtureFrame::Synthetic { synthetic } => synthetic.to_frame(),
            FixtureFrame::Pose(frame) => frame.clone(),
        }
    }
}

/// Replay fixture schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFixture {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub frames: Vec<FixtureFrame>,
    #[serde(default)]
    pub expect: Option<ReplayExpectations>,
}

/// Per-frame replay result, printed one JSON line per frame by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayOutcome {
    Report(FrameReport),
    Rejected {
        frame: usize,
        error: String,
        code: i32,
    },
}

/// Final-state expectations checked after a replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayExpectations {
    pub final_reps: u32,
    #[serde(default)]
    pub baseline_angle: Option<f64>,
    #[serde(default)]
    pub rejected_frames: Vec<usize>,
}

impl ReplayExpectations {
    pub fn verify(&self, outcomes: &[ReplayOutcome]) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        let last_report = outcomes.iter().rev().find_map(|outcome| match outcome {
            ReplayOutcome::Report(report) => Some(report),
            ReplayOutcome::Rejected { .. } => None,
        });
        let final_reps = last_report.map(|report| report.reps).unwrap_or(0);
        if final_reps != self.final_reps {
            failures.push(format!(
                "final_reps: expected {}, got {}",
                self.final_reps, final_reps
            ));
        }

        if let Some(expected) = self.baseline_angle {
            match last_report.and_then(|report| report.avg_angle) {
                Some(actual) if (actual - round2(expected)).abs() < 0.011 => {}
                actual => failures.push(format!(
                    "baseline_angle: expected {expected}, got {actual:?}"
                )),
            }
        }

        let rejected: Vec<usize> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ReplayOutcome::Rejected { frame, .. } => Some(*frame),
                ReplayOutcome::Report(_) => None,
            })
            .collect();
        if rejected != self.rejected_frames {
            failures.push(format!(
                "rejected_frames: expected {:?}, got {:?}",
                self.rejected_frames, rejected
            ));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing a replay with its expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<String>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "failures": self.failures })
    }
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List fixture names (JSON file stems), sorted.
    pub fn discover(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        if !self.root.exists() {
            return Ok(names);
        }

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Load a fixture by name or path.
    pub fn load(&self, fixture: &str) -> Result<ReplayFixture> {
        let path = self.resolve_fixture_path(fixture)?;
        load_fixture(&path)
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.exists() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.json"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Read and parse a fixture file.
pub fn load_fixture(path: &Path) -> Result<ReplayFixture> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading fixture {}", path.display()))?;
    let mut fixture: ReplayFixture =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    if fixture.name.is_empty() {
        fixture.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
    }
    Ok(fixture)
}

/// Feeds fixture frames through a session manager in order.
pub struct FixtureReplayer<'a> {
    manager: &'a SessionManager,
}

impl<'a> FixtureReplayer<'a> {
    pub fn new(manager: &'a SessionManager) -> Self {
        Self { manager }
    }

    pub fn run(&self, session_id: &str, fixture: &ReplayFixture) -> Vec<ReplayOutcome> {
        fixture
            .frames
            .iter()
            .enumerate()
            .map(|(idx, frame)| {
                match self.manager.process_frame(session_id, &frame.to_pose_frame()) {
                    Ok(report) => ReplayOutcome::Report(report),
                    Err(err) => ReplayOutcome::Rejected {
                        frame: idx,
                        error: err.message(),
                        code: err.code(),
                    },
                }
            })
            .collect()
    }
}
