//! Starter catalog offered on first run.

use crate::error::Result;
use crate::store::CatalogStore;
use crate::types::{Category, NewStretch, Priority};

struct StarterStretch {
    name: &'static str,
    priority: Priority,
    category: Category,
    description: &'static str,
}

const STARTER_STRETCHES: &[StarterStretch] = &[
    StarterStretch {
        name: "Deep Squat Hold",
        priority: Priority::High,
        category: Category::Hips,
        description: "Sink into a deep squat with heels down and chest up. Hold for 60 seconds, using a doorframe for balance if needed.",
    },
    StarterStretch {
        name: "90/90 Hip Switch",
        priority: Priority::High,
        category: Category::Hips,
        description: "Sit with both knees bent at 90 degrees, one in front and one to the side. Rotate the knees to switch sides slowly, 10 times.",
    },
    StarterStretch {
        name: "Dead Bug",
        priority: Priority::Low,
        category: Category::Core,
        description: "Lie on your back with arms and knees up. Lower the opposite arm and leg while keeping the lower back flat. 10 per side.",
    },
    StarterStretch {
        name: "Ankle Circles",
        priority: Priority::Low,
        category: Category::FeetAnkles,
        description: "Lift one foot and draw slow circles with the ankle, 10 in each direction, then switch feet.",
    },
    StarterStretch {
        name: "Standing Calf Stretch",
        priority: Priority::Low,
        category: Category::FeetAnkles,
        description: "Hands on a wall, step one leg back with the heel pressed down and lean in. Hold 30 seconds per side.",
    },
    StarterStretch {
        name: "Cat Cow",
        priority: Priority::High,
        category: Category::SpineShoulders,
        description: "On hands and knees, alternate arching and rounding the spine with the breath for 10 slow cycles.",
    },
    StarterStretch {
        name: "Wall Angels",
        priority: Priority::Low,
        category: Category::SpineShoulders,
        description: "Stand with your back against a wall and slide the arms up and down while keeping contact with the wall. 10 reps.",
    },
    StarterStretch {
        name: "Hip Hinge Reach",
        priority: Priority::Low,
        category: Category::Functional,
        description: "Hinge at the hips with a flat back and reach toward the floor, then stand tall. 10 controlled reps.",
    },
    StarterStretch {
        name: "World's Greatest Stretch",
        priority: Priority::High,
        category: Category::Mobility,
        description: "From a lunge, place the same-side hand down, rotate the other arm to the ceiling, then switch. 5 per side.",
    },
    StarterStretch {
        name: "Seated Forward Fold",
        priority: Priority::Low,
        category: Category::Flexibility,
        description: "Sit with legs straight and fold forward from the hips, reaching for the toes. Hold for 45 seconds.",
    },
    StarterStretch {
        name: "Neck Release",
        priority: Priority::Low,
        category: Category::General,
        description: "Tilt one ear toward the shoulder and hold for 20 seconds, then switch sides. Keep the shoulders relaxed.",
    },
];

/// The built-in starter stretches.
pub fn starter_stretches() -> Vec<NewStretch> {
    STARTER_STRETCHES
        .iter()
        .map(|s| NewStretch::new(s.name, s.priority, s.category, s.description))
        .collect()
}

/// Add the starter stretches if the catalog is empty.
///
/// Returns how many stretches were added.
pub fn seed_starter_catalog<S: CatalogStore + ?Sized>(store: &S) -> Result<usize> {
    if !store.list()?.is_empty() {
        tracing::info!("Catalog already has stretches, skipping starter seed");
        return Ok(0);
    }

    let stretches = starter_stretches();
    for stretch in &stretches {
        store.add(stretch)?;
    }

    tracing::info!(count = stretches.len(), "Seeded starter catalog");
    Ok(stretches.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;
    use std::collections::HashSet;

    #[test]
    fn test_starter_stretches_are_valid_and_unique() {
        let stretches = starter_stretches();
        let names: HashSet<&str> = stretches.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), stretches.len());
        for stretch in &stretches {
            assert!(stretch.validate().is_ok(), "{} is invalid", stretch.name);
        }
    }

    #[test]
    fn test_starter_catalog_covers_every_category() {
        let stretches = starter_stretches();
        for category in Category::ALL {
            assert!(
                stretches.iter().any(|s| s.category == category),
                "no starter stretch for {}",
                category
            );
        }
    }

    #[test]
    fn test_seed_only_when_empty() {
        let store = JsonStore::in_memory();
        let added = seed_starter_catalog(&store).unwrap();
        assert_eq!(added, STARTER_STRETCHES.len());
        assert_eq!(seed_starter_catalog(&store).unwrap(), 0);
        assert_eq!(store.list().unwrap().len(), added);
    }
}
