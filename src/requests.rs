//! Agent add/modify requests, validated before they reach the world.

use alife_common::{AgentSpec, Position, Species};
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddAgentRequest {
    pub species: Species,
    pub name: String,
    pub energy: i32,
    /// `None` places the agent on a random vacant cell.
    pub position: Option<Position>,
}

impl AddAgentRequest {
    pub fn new(species: Species, name: impl Into<String>, energy: i32) -> Self {
        Self { species, name: name.into(), energy, position: None }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Builds a request from raw form fields.
    pub fn parse(species: &str, name: &str, energy: &str) -> EngineResult<Self> {
        let species = species
            .parse::<Species>()
            .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
        Ok(Self::new(species, parse_name(name)?, parse_energy(energy)?))
    }

    pub fn from_spec(spec: &AgentSpec) -> EngineResult<Self> {
        let species = spec
            .species
            .parse::<Species>()
            .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
        let request = Self::new(species, parse_name(&spec.name)?, spec.energy);
        match (spec.x, spec.y) {
            (Some(x), Some(y)) => Ok(request.at(Position::new(x, y))),
            (None, None) => Ok(request),
            _ => Err(EngineError::InvalidRequest(format!(
                "agent '{}' needs both x and y, or neither",
                spec.name
            ))),
        }
    }
}

/// `Species:Name:Energy` or `Species:Name:Energy:x:y`.
impl FromStr for AddAgentRequest {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [species, name, energy] => Self::parse(species, name, energy),
            [species, name, energy, x, y] => {
                let x = parse_coordinate(x)?;
                let y = parse_coordinate(y)?;
                Ok(Self::parse(species, name, energy)?.at(Position::new(x, y)))
            }
            _ => Err(EngineError::InvalidRequest(format!(
                "expected Species:Name:Energy[:x:y], got '{}'",
                s
            ))),
        }
    }
}

/// Renames and/or re-energises every agent called `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyAgentRequest {
    pub name: String,
    pub new_name: String,
    pub new_energy: i32,
}

impl ModifyAgentRequest {
    pub fn parse(name: &str, new_name: &str, new_energy: &str) -> EngineResult<Self> {
        Ok(Self {
            name: parse_name(name)?,
            new_name: parse_name(new_name)?,
            new_energy: parse_energy(new_energy)?,
        })
    }
}

/// `Name:NewName:Energy`.
impl FromStr for ModifyAgentRequest {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [name, new_name, energy] => Self::parse(name, new_name, energy),
            _ => Err(EngineError::InvalidRequest(format!(
                "expected Name:NewName:Energy, got '{}'",
                s
            ))),
        }
    }
}

fn parse_name(name: &str) -> EngineResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidRequest("name must not be blank".to_string()));
    }
    Ok(name.to_string())
}

fn parse_energy(energy: &str) -> EngineResult<i32> {
    energy
        .trim()
        .parse::<i32>()
        .map_err(|_| EngineError::InvalidRequest(format!("energy '{}' is not a whole number", energy.trim())))
}

fn parse_coordinate(value: &str) -> EngineResult<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| EngineError::InvalidRequest(format!("coordinate '{}' is not a whole number", value.trim())))
}
