use std::fmt;

use serde::Serialize;

/// The fixed, ordered set of emotion categories.
///
/// Declaration order is the category order everywhere: score vectors,
/// count maps, and serialized snapshots all follow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
}

impl Emotion {
    pub const COUNT: usize = 7;

    /// All categories in declaration order.
    pub const ALL: [Emotion; Emotion::COUNT] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Surprise,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Neutral => "Neutral",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
        }
    }

    /// Position within [`Emotion::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Emotion> {
        Emotion::ALL.get(index).copied()
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_all_has_count_entries() {
        assert_eq!(Emotion::ALL.len(), Emotion::COUNT);
    }

    #[test]
    fn test_index_matches_position_in_all() {
        for (i, emotion) in Emotion::ALL.iter().enumerate() {
            assert_eq!(emotion.index(), i);
        }
    }

    #[rstest]
    #[case(0, Emotion::Angry)]
    #[case(3, Emotion::Happy)]
    #[case(6, Emotion::Surprise)]
    fn test_from_index_round_trips(#[case] index: usize, #[case] expected: Emotion) {
        assert_eq!(Emotion::from_index(index), Some(expected));
    }

    #[test]
    fn test_from_index_out_of_range() {
        assert_eq!(Emotion::from_index(Emotion::COUNT), None);
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(Emotion::Happy.to_string(), "Happy");
        assert_eq!(Emotion::Surprise.to_string(), "Surprise");
    }

    #[test]
    fn test_serializes_as_label_string() {
        let json = serde_json::to_string(&Emotion::Disgust).unwrap();
        assert_eq!(json, "\"Disgust\"");
    }
}
