//! Week-by-week baby development guide.

use serde::Serialize;

pub struct DevelopmentStage {
    pub first_week: u8,
    pub last_week: u8,
    pub summary: &'static str,
    pub highlights: [&'static str; 3],
}

pub static STAGES: [DevelopmentStage; 7] = [
    DevelopmentStage {
        first_week: 1,
        last_week: 4,
        summary: "Your baby is beginning to form foundational structures. Early cells are organizing rapidly.",
        highlights: [
            "Implantation and early placental support are underway",
            "Major growth signals start in the embryo",
            "Focus on folic acid, rest, and hydration",
        ],
    },
    DevelopmentStage {
        first_week: 5,
        last_week: 8,
        summary: "Core organs begin forming quickly. This is a high-growth stage for early development.",
        highlights: [
            "Heart activity starts and strengthens",
            "Neural tube and brain structures keep developing",
            "Regular prenatal vitamins are especially important",
        ],
    },
    DevelopmentStage {
        first_week: 9,
        last_week: 13,
        summary: "Your baby transitions into the fetal stage with clearer body features and steady growth.",
        highlights: [
            "Face and limb features become more defined",
            "Movement begins, though usually not felt yet",
            "First trimester care and nutrition remain key",
        ],
    },
    DevelopmentStage {
        first_week: 14,
        last_week: 20,
        summary: "Growth accelerates and your baby becomes more active. Senses start maturing.",
        highlights: [
            "Bones and muscles are strengthening",
            "Hearing pathways begin developing",
            "Some mothers start feeling baby movements",
        ],
    },
    DevelopmentStage {
        first_week: 21,
        last_week: 27,
        summary: "Your baby continues steady growth and development every day.",
        highlights: [
            "Sleep and wake cycles become more defined",
            "Lungs and brain continue to mature",
            "Maintain hydration, rest, and regular checkups",
        ],
    },
    DevelopmentStage {
        first_week: 28,
        last_week: 34,
        summary: "Your baby is gaining weight and preparing for life outside the womb.",
        highlights: [
            "Body fat increases to help temperature control",
            "Brain connections grow rapidly",
            "Practice movement tracking and attend scheduled visits",
        ],
    },
    DevelopmentStage {
        first_week: 35,
        last_week: 40,
        summary: "Final growth and maturation phase. Your baby is preparing for delivery.",
        highlights: [
            "Lungs reach near-full readiness",
            "Positioning for birth typically occurs",
            "Stay alert for labor signs and keep hospital plan ready",
        ],
    },
];

#[derive(Debug, Serialize)]
pub struct DevelopmentInfo {
    pub week: u8,
    pub summary: &'static str,
    pub highlights: Vec<&'static str>,
}

/// Parses a week path segment. Non-numeric input means week 1; numbers
/// are floored and clamped to 1..=40.
pub fn parse_week(raw: &str) -> u8 {
    match raw.trim().parse::<f64>() {
        Ok(week) if week.is_finite() => week.floor().clamp(1.0, 40.0) as u8,
        _ => 1,
    }
}

pub fn development_for_week(week: u8) -> DevelopmentInfo {
    let week = week.clamp(1, 40);
    let stage = STAGES
        .iter()
        .find(|stage| (stage.first_week..=stage.last_week).contains(&week))
        .unwrap_or(&STAGES[0]);

    DevelopmentInfo {
        week,
        summary: stage.summary,
        highlights: stage.highlights.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_week() {
        assert_eq!(parse_week("12"), 12);
        assert_eq!(parse_week("0"), 1);
        assert_eq!(parse_week("99"), 40);
        assert_eq!(parse_week("-3"), 1);
        assert_eq!(parse_week("abc"), 1);
        assert_eq!(parse_week("20.9"), 20);
    }

    #[test]
    fn test_stage_boundaries() {
        assert!(development_for_week(4).summary.starts_with("Your baby is beginning"));
        assert!(development_for_week(5).summary.starts_with("Core organs"));
        assert!(development_for_week(13).summary.starts_with("Your baby transitions"));
        assert!(development_for_week(40).summary.starts_with("Final growth"));
        assert_eq!(development_for_week(30).highlights.len(), 3);
    }

    #[test]
    fn test_stages_cover_every_week() {
        for week in 1..=40u8 {
            assert_eq!(
                STAGES.iter().filter(|s| (s.first_week..=s.last_week).contains(&week)).count(),
                1,
                "week {} should belong to exactly one stage",
                week
            );
        }
    }
}
