//! Shared test utilities for dice rolling
//!
//! Provides a scripted die source so engine and batch tests can assert
//! exact faces, tie-breaks included, instead of sampling ranges.

use std::collections::VecDeque;

use super::DieSource;

/// Replays a fixed list of faces in order
#[derive(Debug, Default)]
pub struct ScriptedSource {
    faces: VecDeque<u32>,
    calls: usize,
}

impl ScriptedSource {
    pub fn new(faces: &[u32]) -> Self {
        Self {
            faces: faces.iter().copied().collect(),
            calls: 0,
        }
    }

    /// Number of dice drawn so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Faces not yet drawn
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DieSource for ScriptedSource {
    fn roll_die(&mut self, faces: u32) -> u32 {
        self.calls += 1;
        let face = self
            .faces
            .pop_front()
            .expect("ScriptedSource ran out of faces");
        assert!(
            (1..=faces).contains(&face),
            "scripted face {} is not on a d{}",
            face,
            faces
        );
        face
    }
}
