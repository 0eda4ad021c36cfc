//! Maps recognized speech onto built-in commands or registered devices.

use crate::registry::DeviceRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::*;

/// Minimum similarity for a device to be considered named by an utterance
pub const MATCH_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCommand {
    PowerOff,
    Reboot,
    IpAddress,
    Terminate,
}

impl BuiltinCommand {
    fn from_phrase(text: &str) -> Option<Self> {
        match text {
            "power off" => Some(BuiltinCommand::PowerOff),
            "reboot" => Some(BuiltinCommand::Reboot),
            "ip address" => Some(BuiltinCommand::IpAddress),
            "terminate" => Some(BuiltinCommand::Terminate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    On,
    Off,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::On => "on",
            Action::Off => "off",
        }
    }

    /// Split a trailing on/off suffix from the text.
    /// " of" is accepted as off since recognition often drops the last f.
    pub fn split_suffix(text: &str) -> Option<(&str, Action)> {
        if let Some(name) = text.strip_suffix(" on") {
            Some((name, Action::On))
        } else if let Some(name) = text.strip_suffix(" off") {
            Some((name, Action::Off))
        } else {
            text.strip_suffix(" of").map(|name| (name, Action::Off))
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchReason {
    /// Utterance doesn't end in on/off so it isn't meant for a device
    NoActionSuffix,
    /// Device syntax was present but there are no devices to match against
    NoDevices,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Builtin(BuiltinCommand),
    Device { device_id: String, action: Action },
    NoMatch(NoMatchReason),
    /// Closest device scored below [`MATCH_THRESHOLD`]
    Ambiguous { best_candidate_id: String, best_score: f64 },
}

impl MatchOutcome {
    /// Whether the utterance was phrased as a device command
    pub fn is_device_syntax(&self) -> bool {
        match self {
            MatchOutcome::Device { .. } | MatchOutcome::Ambiguous { .. } => true,
            MatchOutcome::NoMatch(reason) => *reason == NoMatchReason::NoDevices,
            MatchOutcome::Builtin(_) => false,
        }
    }
}

/// Similarity of two strings in `[0, 1]`.
///
/// Computed as `2 * LCS / (len(a) + len(b))` where LCS is the length of the
/// longest common subsequence of characters. The ratio is symmetric, 1.0 for
/// identical strings (including two empty strings) and 0.0 when no character
/// is shared.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * longest_common_subsequence(&a, &b) as f64 / total as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    // single row dynamic programming table
    let mut row = vec![0usize; b.len() + 1];
    for a_char in a {
        let mut diagonal = 0;
        for (j, b_char) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if a_char == b_char {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

pub struct UtteranceMatcher<'a> {
    registry: &'a DeviceRegistry,
}

impl<'a> UtteranceMatcher<'a> {
    pub fn new(registry: &'a DeviceRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, text: &str) -> MatchOutcome {
        let text = text.to_lowercase();

        if let Some(command) = BuiltinCommand::from_phrase(&text) {
            return MatchOutcome::Builtin(command);
        }

        let Some((name, action)) = Action::split_suffix(&text) else {
            return MatchOutcome::NoMatch(NoMatchReason::NoActionSuffix);
        };

        let mut best: Option<(&str, f64)> = None;
        for (device, hotword) in self.registry.with_hotwords() {
            let score = similarity_ratio(name, hotword);
            debug!("Device {} hotword {:?} scored {:.3}", device.id(), hotword, score);
            // strictly greater keeps the first device on ties
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((device.id(), score));
            }
        }

        match best {
            None => MatchOutcome::NoMatch(NoMatchReason::NoDevices),
            Some((device_id, score)) if score >= MATCH_THRESHOLD => MatchOutcome::Device {
                device_id: device_id.to_owned(),
                action,
            },
            Some((device_id, score)) => {
                info!(
                    "Most similar device {} scored {:.3} for {:?} which is below threshold",
                    device_id, score, name
                );
                MatchOutcome::Ambiguous {
                    best_candidate_id: device_id.to_owned(),
                    best_score: score,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Device;
    use approx::assert_relative_eq;

    fn registry(entries: &[(&str, Option<&str>)]) -> DeviceRegistry {
        DeviceRegistry::new(
            entries
                .iter()
                .map(|(id, hotword)| Device::new(id, *hotword).unwrap())
                .collect(),
        )
    }

    #[test]
    fn ratio_of_identical_strings_is_one() {
        assert_relative_eq!(similarity_ratio("lamp", "lamp"), 1.0);
        assert_relative_eq!(similarity_ratio("", ""), 1.0);
    }

    #[test]
    fn ratio_of_disjoint_strings_is_zero() {
        assert_relative_eq!(similarity_ratio("abc", "xyz"), 0.0);
        assert_relative_eq!(similarity_ratio("", "fan"), 0.0);
    }

    #[test]
    fn ratio_is_symmetric() {
        let pairs = [
            ("turn the lamp", "lamp"),
            ("kitchen light", "kitchen lights"),
            ("fan", "van"),
            ("abcbdab", "bdcaba"),
        ];
        for (a, b) in pairs {
            assert_relative_eq!(similarity_ratio(a, b), similarity_ratio(b, a));
        }
    }

    #[test]
    fn ratio_uses_subsequence_not_substring() {
        // lcs of "abcbdab" and "bdcaba" is 4
        assert_relative_eq!(similarity_ratio("abcbdab", "bdcaba"), 8.0 / 13.0);
        assert_relative_eq!(similarity_ratio("turn the lamp", "lamp"), 8.0 / 17.0);
        assert_relative_eq!(similarity_ratio("turn the lamp", "lap"), 6.0 / 16.0);
    }

    #[test]
    fn builtin_phrases_ignore_case_and_registry() {
        let devices = registry(&[("power", Some("power"))]);
        let empty = DeviceRegistry::default();
        let cases = [
            ("power off", BuiltinCommand::PowerOff),
            ("Power Off", BuiltinCommand::PowerOff),
            ("REBOOT", BuiltinCommand::Reboot),
            ("IP address", BuiltinCommand::IpAddress),
            ("terminate", BuiltinCommand::Terminate),
        ];
        for registry in [&devices, &empty] {
            let matcher = UtteranceMatcher::new(registry);
            for (text, command) in cases {
                assert_eq!(matcher.resolve(text), MatchOutcome::Builtin(command));
            }
        }
    }

    #[test]
    fn text_without_suffix_is_no_match() {
        let devices = registry(&[("lamp1", Some("lamp"))]);
        let matcher = UtteranceMatcher::new(&devices);
        for text in ["lamp", "lamp online", "what time is it", "on", "lampon", ""] {
            assert_eq!(
                matcher.resolve(text),
                MatchOutcome::NoMatch(NoMatchReason::NoActionSuffix)
            );
        }
    }

    #[test]
    fn suffixes_select_action() {
        assert_eq!(Action::split_suffix("lamp on"), Some(("lamp", Action::On)));
        assert_eq!(Action::split_suffix("lamp off"), Some(("lamp", Action::Off)));
        assert_eq!(Action::split_suffix("lamp of"), Some(("lamp", Action::Off)));
        assert_eq!(Action::split_suffix(" on"), Some(("", Action::On)));
        assert_eq!(Action::split_suffix("lamp"), None);
    }

    #[test]
    fn exact_hotword_resolves_device() {
        let devices = registry(&[("fan", Some("fan")), ("lamp1", Some("lamp"))]);
        let matcher = UtteranceMatcher::new(&devices);
        assert_eq!(
            matcher.resolve("Fan OFF"),
            MatchOutcome::Device {
                device_id: String::from("fan"),
                action: Action::Off
            }
        );
        assert_eq!(
            matcher.resolve("lamp of"),
            MatchOutcome::Device {
                device_id: String::from("lamp1"),
                action: Action::Off
            }
        );
        assert_eq!(
            matcher.resolve("lamps on"),
            MatchOutcome::Device {
                device_id: String::from("lamp1"),
                action: Action::On
            }
        );
    }

    #[test]
    fn closer_hotword_wins() {
        let devices = registry(&[("lamp2", Some("lap")), ("lamp1", Some("lamp"))]);
        let matcher = UtteranceMatcher::new(&devices);
        match matcher.resolve("turn the lamp on") {
            MatchOutcome::Ambiguous {
                best_candidate_id,
                best_score,
            } => {
                assert_eq!(best_candidate_id, "lamp1");
                assert_relative_eq!(best_score, 8.0 / 17.0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(
            matcher.resolve("the lamp on"),
            MatchOutcome::Device {
                device_id: String::from("lamp1"),
                action: Action::On
            }
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        // lcs 3 over 10 characters scores exactly 0.6
        assert_eq!(similarity_ratio("abc", "abcxyzw"), MATCH_THRESHOLD);
        let devices = registry(&[("dev", Some("abcxyzw"))]);
        let matcher = UtteranceMatcher::new(&devices);
        assert_eq!(
            matcher.resolve("abc on"),
            MatchOutcome::Device {
                device_id: String::from("dev"),
                action: Action::On
            }
        );
    }

    #[test]
    fn just_below_threshold_is_ambiguous() {
        // lcs 3 over 11 characters
        let devices = registry(&[("dev", Some("abcxyzwq"))]);
        let matcher = UtteranceMatcher::new(&devices);
        match matcher.resolve("abc on") {
            MatchOutcome::Ambiguous {
                best_candidate_id,
                best_score,
            } => {
                assert_eq!(best_candidate_id, "dev");
                assert!(best_score < MATCH_THRESHOLD);
                assert_relative_eq!(best_score, 6.0 / 11.0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn ties_resolve_to_first_registered() {
        let devices = registry(&[("first", Some("fan")), ("second", Some("fan"))]);
        let matcher = UtteranceMatcher::new(&devices);
        assert_eq!(
            matcher.resolve("fan on"),
            MatchOutcome::Device {
                device_id: String::from("first"),
                action: Action::On
            }
        );

        let devices = registry(&[("van", Some("van")), ("pan", Some("pan"))]);
        let matcher = UtteranceMatcher::new(&devices);
        assert_eq!(
            matcher.resolve("fan off"),
            MatchOutcome::Device {
                device_id: String::from("van"),
                action: Action::Off
            }
        );
    }

    #[test]
    fn devices_without_hotword_are_skipped() {
        let devices = registry(&[("boiler", None)]);
        let matcher = UtteranceMatcher::new(&devices);
        assert_eq!(
            matcher.resolve("boiler on"),
            MatchOutcome::NoMatch(NoMatchReason::NoDevices)
        );
    }

    #[test]
    fn empty_registry_never_matches_devices() {
        let empty = DeviceRegistry::default();
        let matcher = UtteranceMatcher::new(&empty);
        let outcome = matcher.resolve("fan on");
        assert_eq!(outcome, MatchOutcome::NoMatch(NoMatchReason::NoDevices));
        assert!(outcome.is_device_syntax());
        assert_eq!(
            matcher.resolve("reboot"),
            MatchOutcome::Builtin(BuiltinCommand::Reboot)
        );
    }

    #[test]
    fn empty_candidate_still_scores() {
        let devices = registry(&[("fan", Some("fan"))]);
        let matcher = UtteranceMatcher::new(&devices);
        assert_eq!(
            matcher.resolve(" on"),
            MatchOutcome::Ambiguous {
                best_candidate_id: String::from("fan"),
                best_score: 0.0
            }
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        let devices = registry(&[("lamp1", Some("lamp")), ("fan", Some("fan"))]);
        let matcher = UtteranceMatcher::new(&devices);
        for text in ["lamp on", "xyzzy off", "reboot", "hello"] {
            assert_eq!(matcher.resolve(text), matcher.resolve(text));
        }
    }
}
