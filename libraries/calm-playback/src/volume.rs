//! Volume mixing
//!
//! Per-sound levels, per-sound mute, and a master channel. Levels are linear
//! (0.0 - 1.0) because the platform applies them as-is. A recorded level
//! outlives playback so a restarted sound comes back where the user left it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Volume table for every sound plus the master channel
#[derive(Debug, Clone)]
pub struct VolumeMix {
    /// Last user-set level per sound
    levels: HashMap<String, f32>,

    /// Individually muted sounds (level preserved)
    muted: HashSet<String>,

    /// Level for sounds never adjusted
    default_level: f32,

    /// Master level
    master: f32,

    /// Master mute (every level preserved)
    master_muted: bool,
}

impl VolumeMix {
    /// Create a mix
    ///
    /// # Arguments
    /// * `default_level` - Level for sounds without a recorded volume
    /// * `master` - Initial master level
    pub fn new(default_level: f32, master: f32) -> Self {
        Self {
            levels: HashMap::new(),
            muted: HashSet::new(),
            default_level: default_level.clamp(0.0, 1.0),
            master: master.clamp(0.0, 1.0),
            master_muted: false,
        }
    }

    /// Record a sound's level (0.0 - 1.0)
    pub fn set_level(&mut self, name: &str, level: f32) {
        self.levels.insert(name.to_string(), level.clamp(0.0, 1.0));
    }

    /// Recorded level, or the default
    pub fn level(&self, name: &str) -> f32 {
        self.levels.get(name).copied().unwrap_or(self.default_level)
    }

    /// Recorded level, if the user ever set one
    pub fn recorded(&self, name: &str) -> Option<f32> {
        self.levels.get(name).copied()
    }

    /// Mute or unmute one sound
    ///
    /// Returns true if the state changed.
    pub fn set_muted(&mut self, name: &str, muted: bool) -> bool {
        if muted {
            self.muted.insert(name.to_string())
        } else {
            self.muted.remove(name)
        }
    }

    /// Check if a sound is muted individually
    pub fn is_muted(&self, name: &str) -> bool {
        self.muted.contains(name)
    }

    /// Set master level (0.0 - 1.0)
    pub fn set_master(&mut self, level: f32) {
        self.master = level.clamp(0.0, 1.0);
    }

    /// Get master level
    pub fn master(&self) -> f32 {
        self.master
    }

    /// Toggle master mute, returning the new state
    pub fn toggle_master_mute(&mut self) -> bool {
        self.master_muted = !self.master_muted;
        self.master_muted
    }

    /// Check master mute
    pub fn is_master_muted(&self) -> bool {
        self.master_muted
    }

    /// Level the platform handle should be set to
    ///
    /// Returns 0.0 if the sound or the master is muted, otherwise
    /// `level * master`.
    pub fn effective(&self, name: &str) -> f32 {
        if self.master_muted || self.is_muted(name) {
            0.0
        } else {
            (self.level(name) * self.master).clamp(0.0, 1.0)
        }
    }

    /// Levels for the given names, falling back to the default
    pub fn levels_for<'a>(&self, names: impl Iterator<Item = &'a str>) -> BTreeMap<String, f32> {
        names.map(|n| (n.to_string(), self.level(n))).collect()
    }

    /// Muted names, sorted
    pub fn muted_names(&self) -> Vec<String> {
        self.muted.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }
}

impl Default for VolumeMix {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_sound_uses_default() {
        let mix = VolumeMix::new(1.0, 1.0);
        assert_eq!(mix.level("Ocean"), 1.0);
        assert_eq!(mix.recorded("Ocean"), None);
        assert_eq!(mix.effective("Ocean"), 1.0);
    }

    #[test]
    fn set_level_clamps() {
        let mut mix = VolumeMix::default();
        mix.set_level("Ocean", 0.3);
        assert_eq!(mix.level("Ocean"), 0.3);

        mix.set_level("Ocean", 1.5);
        assert_eq!(mix.level("Ocean"), 1.0);

        mix.set_level("Ocean", -1.0);
        assert_eq!(mix.level("Ocean"), 0.0);
    }

    #[test]
    fn mute_preserves_level() {
        let mut mix = VolumeMix::default();
        mix.set_level("Rain 01", 0.6);

        assert!(mix.set_muted("Rain 01", true));
        assert!(!mix.set_muted("Rain 01", true));
        assert_eq!(mix.effective("Rain 01"), 0.0);
        assert_eq!(mix.level("Rain 01"), 0.6);

        assert!(mix.set_muted("Rain 01", false));
        assert_eq!(mix.effective("Rain 01"), 0.6);
    }

    #[test]
    fn master_scales_every_sound() {
        let mut mix = VolumeMix::default();
        mix.set_level("Ocean", 0.5);
        mix.set_master(0.5);

        assert!((mix.effective("Ocean") - 0.25).abs() < f32::EPSILON);
        assert!((mix.effective("Fan") - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn master_mute_silences_without_forgetting() {
        let mut mix = VolumeMix::default();
        mix.set_level("Ocean", 0.8);
        mix.set_master(0.9);

        assert!(mix.toggle_master_mute());
        assert_eq!(mix.effective("Ocean"), 0.0);
        assert_eq!(mix.master(), 0.9);

        assert!(!mix.toggle_master_mute());
        assert!((mix.effective("Ocean") - 0.72).abs() < 0.001);
    }

    #[test]
    fn levels_for_fills_defaults() {
        let mut mix = VolumeMix::new(0.5, 1.0);
        mix.set_level("Ocean", 0.2);
        let levels = mix.levels_for(["Ocean", "Fan"].into_iter());
        assert_eq!(levels["Ocean"], 0.2);
        assert_eq!(levels["Fan"], 0.5);
    }

    #[test]
    fn muted_names_are_sorted() {
        let mut mix = VolumeMix::default();
        mix.set_muted("Wind", true);
        mix.set_muted("Fan", true);
        assert_eq!(mix.muted_names(), vec!["Fan", "Wind"]);
    }
}
