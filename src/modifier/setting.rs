use super::{Draft, Reduction, Scope};
use crate::numerics::Real;
use crate::problem::Problem;
use crate::settings::{SettingKind, SolverSettings};
use log::*;

/// Move settings to the values of target settings, typically the solver
/// defaults.
///
/// Entries are matched by position in their list and must have the same name.
#[derive(Debug, Clone, Default)]
pub struct SettingReduction {
    target: Option<SolverSettings>,
}

impl SettingReduction {
    pub const NAME: &'static str = "setting";

    pub fn new(target: Option<SolverSettings>) -> Self {
        Self { target }
    }
}

impl<N: Real> Reduction<N> for SettingReduction {
    type Unit = (SettingKind, usize);

    fn prepare(
        &mut self,
        _: &Problem<N>,
        settings: &SolverSettings,
        _: &Scope<N>,
    ) -> Vec<(SettingKind, usize)> {
        SettingKind::ALL
            .into_iter()
            .flat_map(|kind| (0..settings.len(kind)).map(move |i| (kind, i)))
            .collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, _: &Scope<N>, (kind, index): Self::Unit) -> bool {
        let Some(target) = &self.target else {
            return false;
        };
        match (draft.settings.get(kind, index), target.get(kind, index)) {
            (Some((name, value)), Some((target_name, target_value))) => {
                name == target_name && value != target_value
            }
            _ => false,
        }
    }

    fn apply(&self, draft: &mut Draft<N>, _: &Scope<N>, (kind, index): Self::Unit) {
        if let Some((name, value)) = self.target.as_ref().and_then(|t| t.get(kind, index)) {
            if !draft.settings.set(index, value) {
                trace!("setting {name} has no {kind:?} entry {index} to overwrite");
            }
        }
    }
}
