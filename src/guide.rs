//! Coaching guide lookup
//!
//! Maps a workout name to a canned coaching tip through an ordered table of
//! keyword entries. The first entry whose keyword occurs in the name wins.

use rand::seq::SliceRandom;
use rand::Rng;

/// Tip returned when no keyword matches
pub const FALLBACK_TIP: &str = "Listen to your body and don't overdo it.";

/// One row of the guide table
#[derive(Debug, Clone)]
pub struct GuideEntry {
    /// Lowercase keyword matched against the workout name
    pub keyword: String,
    pub tips: Vec<String>,
}

/// Ordered keyword → tips table
#[derive(Debug, Clone)]
pub struct GuideBook {
    entries: Vec<GuideEntry>,
}

impl Default for GuideBook {
    fn default() -> Self {
        Self::new()
            .with_entry(
                "interval",
                &[
                    "Keep your heart rate close to its ceiling during each rep.",
                    "Respect the rest intervals exactly to get the full effect.",
                    "Hold your form together all the way through the final set.",
                ],
            )
            .with_entry(
                "tempo",
                &[
                    "Holding an even pace is the whole point of this session.",
                    "Adjust speed so your breathing never gets ragged.",
                    "Treat it like rehearsing a section of race day.",
                ],
            )
            .with_entry(
                "strength",
                &[
                    "Clean technique prevents injury and drives results.",
                    "Move slowly and feel the target muscles working.",
                    "Keep rest between sets to one or two minutes.",
                ],
            )
            .with_entry(
                "recovery jog",
                &[
                    "Stay at a pace where you could chat with a partner.",
                    "Listen to your body and let tight muscles loosen up.",
                    "Forget about time and distance; keep it comfortable.",
                ],
            )
            .with_entry(
                "rest",
                &[
                    "Seven to eight hours of sleep is the best recovery there is.",
                    "A short walk or light stretching helps circulation.",
                    "Put training out of your mind and relax.",
                ],
            )
            .with_entry(
                "stretch",
                &[
                    "Hold each stretch for at least 15 seconds.",
                    "Keep breathing and exhale slowly into the stretch.",
                    "Dynamic before training, static after training.",
                ],
            )
            .with_entry(
                "core",
                &[
                    "Brace your abs and keep your lower back from rounding.",
                    "Go slowly and focus on the contraction.",
                    "A strong core is where every movement starts.",
                ],
            )
    }
}

impl GuideBook {
    /// Empty table; every lookup returns the fallback
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry. Later entries only match when earlier ones do not.
    pub fn with_entry(mut self, keyword: &str, tips: &[&str]) -> Self {
        self.entries.push(GuideEntry {
            keyword: keyword.to_lowercase(),
            tips: tips.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    pub fn entries(&self) -> &[GuideEntry] {
        &self.entries
    }

    /// First entry whose keyword is contained in the workout name
    pub fn matching_entry(&self, workout_name: &str) -> Option<&GuideEntry> {
        let name = workout_name.to_lowercase();
        self.entries.iter().find(|e| name.contains(&e.keyword))
    }

    /// Pick a tip for the workout, falling back to the generic tip
    pub fn tip_for<R: Rng + ?Sized>(&self, workout_name: &str, rng: &mut R) -> String {
        self.matching_entry(workout_name)
            .and_then(|entry| entry.tips.choose(rng))
            .cloned()
            .unwrap_or_else(|| FALLBACK_TIP.to_string())
    }
}
