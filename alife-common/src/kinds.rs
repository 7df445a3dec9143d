use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an agent eats: food items from the grid, or other agents.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    Herbivore,
    Carnivore,
}

/// Sensing modality. Determines how many cells away an agent can detect a target.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SenseType {
    Feel,
    Sight,
    Smell,
}

impl SenseType {
    /// Bugs feel, other herbivores see, carnivores smell.
    pub fn select(species: Species, diet: Diet) -> Self {
        if species == Species::Bug {
            return SenseType::Feel;
        }
        match diet {
            Diet::Herbivore => SenseType::Sight,
            Diet::Carnivore => SenseType::Smell,
        }
    }

    pub fn range(self) -> i32 {
        match self {
            SenseType::Feel => 1,
            SenseType::Sight => 2,
            SenseType::Smell => 4,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodKind {
    Grass,
    Flower,
    Leaf,
    Plankton,
    Mushroom,
    Berry,
}

impl FoodKind {
    pub const ALL: [FoodKind; 6] = [
        FoodKind::Grass,
        FoodKind::Flower,
        FoodKind::Leaf,
        FoodKind::Plankton,
        FoodKind::Mushroom,
        FoodKind::Berry,
    ];

    /// Energy granted to a herbivore eating this food. Berries are net-negative.
    pub fn nutrition(self) -> i32 {
        match self {
            FoodKind::Grass => 3,
            FoodKind::Flower => 5,
            FoodKind::Leaf => 2,
            FoodKind::Plankton => 2,
            FoodKind::Mushroom => 4,
            FoodKind::Berry => -3,
        }
    }
}

impl fmt::Display for FoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Rock,
    Tree,
}

impl fmt::Display for ObstacleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Entry of an agent's "consumes" set.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consumable {
    Food(FoodKind),
    Prey(Species),
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Bear,
    Bird,
    Bug,
    Cow,
    Fish,
    Fox,
    Lion,
    Mouse,
    Pig,
    Rabbit,
    Whale,
}

impl Species {
    pub const ALL: [Species; 11] = [
        Species::Bear,
        Species::Bird,
        Species::Bug,
        Species::Cow,
        Species::Fish,
        Species::Fox,
        Species::Lion,
        Species::Mouse,
        Species::Pig,
        Species::Rabbit,
        Species::Whale,
    ];

    pub fn diet(self) -> Diet {
        match self {
            Species::Bear | Species::Bird | Species::Fox | Species::Lion | Species::Whale => {
                Diet::Carnivore
            }
            Species::Bug
            | Species::Cow
            | Species::Fish
            | Species::Mouse
            | Species::Pig
            | Species::Rabbit => Diet::Herbivore,
        }
    }

    /// Default consumes set given to newly created agents of this species.
    pub fn default_consumes(self) -> Vec<Consumable> {
        use Consumable::{Food, Prey};
        use FoodKind::*;
        match self {
            Species::Bear => vec![
                Prey(Species::Fish),
                Prey(Species::Rabbit),
                Prey(Species::Mouse),
                Prey(Species::Pig),
            ],
            Species::Bird => vec![Prey(Species::Bug)],
            Species::Bug => vec![Food(Leaf), Food(Grass), Food(Flower)],
            Species::Cow => vec![Food(Grass), Food(Mushroom), Food(Berry)],
            Species::Fish => vec![Food(Plankton)],
            Species::Fox => vec![Prey(Species::Rabbit)],
            Species::Lion => vec![
                Prey(Species::Cow),
                Prey(Species::Pig),
                Prey(Species::Rabbit),
            ],
            Species::Mouse => vec![Food(Grass), Food(Leaf), Food(Berry)],
            Species::Pig => vec![Food(Grass), Food(Mushroom), Food(Leaf), Food(Flower)],
            Species::Rabbit => vec![Food(Grass), Food(Flower), Food(Mushroom), Food(Berry)],
            Species::Whale => vec![Prey(Species::Fish)],
        }
    }

    /// Human-facing name, as shown in rosters.
    pub fn display_name(self) -> &'static str {
        match self {
            Species::Bear => "Bear",
            Species::Bird => "Bird",
            Species::Bug => "Bug",
            Species::Cow => "Cow",
            Species::Fish => "Fish",
            Species::Fox => "Fox",
            Species::Lion => "Lion",
            Species::Mouse => "Mouse",
            Species::Pig => "Pig",
            Species::Rabbit => "Rabbit",
            Species::Whale => "Killer Whale",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Species {
    type Err = anyhow::Error;

    /// Case-insensitive; accepts both "Whale" and "Killer Whale".
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Species::ALL
            .iter()
            .copied()
            .find(|species| {
                species.display_name().eq_ignore_ascii_case(wanted)
                    || format!("{:?}", species).eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| anyhow::anyhow!("Unknown species '{}'", wanted))
    }
}
