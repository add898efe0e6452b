//! Mode transitions as an explicit table.
//!
//! The lamp has no "set mode" call; a mode is reached by pressing its two
//! buttons in a sequence that depends on where it currently is. The table
//! maps `(current mode, goal)` to that button sequence and is checked for
//! completeness over the known modes when it is built.

use std::collections::HashMap;
use std::fmt;

use inio_traits::{Button, Mode};

use crate::error::InioError;

/// What the caller wants the lamp to end up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goal {
    LightOn,
    LightOff,
    Connected,
    Disconnected,
}

impl Goal {
    pub const ALL: [Goal; 4] = [
        Goal::LightOn,
        Goal::LightOff,
        Goal::Connected,
        Goal::Disconnected,
    ];
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Goal::LightOn => "light-on",
            Goal::LightOff => "light-off",
            Goal::Connected => "connected",
            Goal::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct TransitionTable {
    entries: HashMap<(Mode, Goal), Vec<Button>>,
}

impl TransitionTable {
    /// The press sequences the Inio firmware expects.
    pub fn standard() -> Self {
        use Button::{Connect, Manual};
        use Mode::{Connected, Off, Scenario, Static};

        let mut entries = HashMap::new();
        for mode in [Connected, Scenario, Static] {
            entries.insert((mode.clone(), Goal::LightOn), vec![]);
            entries.insert((mode.clone(), Goal::LightOff), vec![Manual]);
            entries.insert((mode, Goal::Disconnected), vec![Manual]);
        }
        entries.insert((Off, Goal::LightOn), vec![Manual, Connect]);
        entries.insert((Off, Goal::LightOff), vec![]);
        entries.insert((Off, Goal::Disconnected), vec![]);

        entries.insert((Off, Goal::Connected), vec![Connect, Manual, Connect]);
        entries.insert((Connected, Goal::Connected), vec![]);
        entries.insert((Scenario, Goal::Connected), vec![Connect]);
        entries.insert((Static, Goal::Connected), vec![Connect]);

        Self { entries }
    }

    /// Build a table from explicit entries, rejecting any gap.
    pub fn from_entries<I>(entries: I) -> Result<Self, InioError>
    where
        I: IntoIterator<Item = ((Mode, Goal), Vec<Button>)>,
    {
        let table = Self {
            entries: entries.into_iter().collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Every known mode must have a sequence for every goal.
    pub fn validate(&self) -> Result<(), InioError> {
        for mode in Mode::KNOWN {
            for goal in Goal::ALL {
                if !self.entries.contains_key(&(mode.clone(), goal)) {
                    return Err(InioError::Config(format!(
                        "transition table has no entry for {goal} from {mode}"
                    )));
                }
            }
        }
        if let Some((mode, _)) = self.entries.keys().find(|(m, _)| matches!(m, Mode::Unknown(_))) {
            return Err(InioError::Config(format!(
                "transition table has an entry for unknown mode {mode}"
            )));
        }
        Ok(())
    }

    /// Buttons to press, in order, to reach `goal` from `mode`.
    pub fn presses(&self, mode: &Mode, goal: Goal) -> Result<&[Button], InioError> {
        if let Mode::Unknown(raw) = mode {
            return Err(InioError::UnknownMode(raw.clone()));
        }
        self.entries
            .get(&(mode.clone(), goal))
            .map(Vec::as_slice)
            .ok_or_else(|| InioError::UnknownMode(mode.to_string()))
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_complete() {
        TransitionTable::standard().validate().unwrap();
    }

    #[test]
    fn gap_is_reported() {
        let mut entries = TransitionTable::standard().entries;
        entries.remove(&(Mode::Scenario, Goal::LightOff));
        let err = TransitionTable::from_entries(entries).unwrap_err();
        assert!(err.to_string().contains("light-off from"), "{err}");
    }

    #[test]
    fn unknown_mode_has_no_sequence() {
        let table = TransitionTable::standard();
        for goal in Goal::ALL {
            assert_eq!(
                table.presses(&Mode::Unknown("PARTY".into()), goal),
                Err(InioError::UnknownMode("PARTY".into()))
            );
        }
    }
}
