//! What visiting each category of location is like.
//!
//! Preference scoring, coherence rules, and the condition model all need
//! the same facts about a category: which travel purposes it serves, its
//! natural pace, how physically demanding it is, and what kind of
//! experience it offers. They all read them from [`profile_of`].

use waypath_types::{Category, Pace, Purpose};

/// Broad kind of experience a visit offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExperienceKind {
    /// Looking at things: museums, sights, viewpoints.
    Static,
    /// Moving and doing: shows, arcades, hikes.
    Dynamic,
    /// Browsing among people: markets, malls.
    Social,
    /// Eating and drinking.
    Culinary,
    /// Sitting down and recovering.
    Relaxing,
}

/// Facts about visiting one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperienceProfile {
    /// Travel purposes the category serves.
    pub purposes: &'static [Purpose],
    /// Natural pace of a visit.
    pub pace: Pace,
    /// Physical demand from 0.0 (sitting) to 1.0 (strenuous).
    pub intensity: f64,
    /// Kind of experience.
    pub kind: ExperienceKind,
}

/// The experience profile of `category`.
pub const fn profile_of(category: Category) -> ExperienceProfile {
    match category {
        Category::Attraction => ExperienceProfile {
            purposes: &[
                Purpose::Culture,
                Purpose::Leisure,
                Purpose::Adventure,
                Purpose::Photography,
            ],
            pace: Pace::Slow,
            intensity: 0.6,
            kind: ExperienceKind::Static,
        },
        Category::Dining => ExperienceProfile {
            purposes: &[Purpose::Food, Purpose::Leisure],
            pace: Pace::Slow,
            intensity: 0.1,
            kind: ExperienceKind::Culinary,
        },
        Category::Shopping => ExperienceProfile {
            purposes: &[Purpose::Shopping, Purpose::Leisure],
            pace: Pace::Medium,
            intensity: 0.4,
            kind: ExperienceKind::Social,
        },
        Category::Entertainment => ExperienceProfile {
            purposes: &[Purpose::Leisure, Purpose::Adventure, Purpose::Nightlife],
            pace: Pace::Fast,
            intensity: 0.7,
            kind: ExperienceKind::Dynamic,
        },
        Category::TransportHub => ExperienceProfile {
            purposes: &[Purpose::Rest],
            pace: Pace::Medium,
            intensity: 0.2,
            kind: ExperienceKind::Relaxing,
        },
        Category::Other => ExperienceProfile {
            purposes: &[Purpose::Leisure, Purpose::Rest],
            pace: Pace::Medium,
            intensity: 0.3,
            kind: ExperienceKind::Relaxing,
        },
    }
}

/// How well an experience of kind `next` follows one of kind `previous`,
/// from -1.0 (jarring or repetitive) to 1.0 (a natural next step).
pub const fn flow_between(previous: ExperienceKind, next: ExperienceKind) -> f64 {
    use ExperienceKind::{Culinary, Dynamic, Relaxing, Social, Static};
    match (previous, next) {
        (Static, Static) => -0.2,
        (Dynamic, Dynamic) => -0.4,
        (Culinary, Culinary) => -0.6,
        (Relaxing, Relaxing) => -0.1,
        (Social, Social) => -0.2,
        (Static, Dynamic) | (Dynamic, Relaxing) => 0.3,
        (Dynamic, Static) | (Social, Culinary) | (Static, Culinary) => 0.2,
        (Relaxing, Static | Dynamic) | (Culinary, Static | Social) => 0.25,
        _ => 0.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repetition_flows_worse_than_variety() {
        let same = flow_between(ExperienceKind::Static, ExperienceKind::Static);
        let varied = flow_between(ExperienceKind::Static, ExperienceKind::Dynamic);
        assert!(same < varied);
        assert!(flow_between(ExperienceKind::Dynamic, ExperienceKind::Dynamic) < same);
    }

    #[test]
    fn dining_serves_food() {
        assert!(profile_of(Category::Dining).purposes.contains(&Purpose::Food));
        assert_eq!(profile_of(Category::Dining).kind, ExperienceKind::Culinary);
    }

    #[test]
    fn entertainment_is_fast_and_demanding() {
        let p = profile_of(Category::Entertainment);
        assert_eq!(p.pace, Pace::Fast);
        assert!(p.intensity > profile_of(Category::Dining).intensity);
    }
}
