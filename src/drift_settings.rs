use bevy::prelude::*;

use crate::game_logic::DrivingModel;

/// Player-facing choice of handling model, carried across restarts.
#[derive(Resource, Clone, Default)]
pub struct DriftSettings {
    pub model: DrivingModel,
}

impl DriftSettings {
    /// Switch to the other driving model and return it.
    pub fn toggle(&mut self) -> DrivingModel {
        self.model = self.model.other();
        self.model
    }

    /// Helper for displaying the current mode in UI.
    pub fn mode_label(&self) -> &str {
        self.model.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_between_models() {
        let mut settings = DriftSettings::default();
        assert_eq!(settings.model, DrivingModel::KinematicGrip);
        assert_eq!(settings.toggle(), DrivingModel::ForceImpulse);
        assert_eq!(settings.mode_label(), "Arcade");
        assert_eq!(settings.toggle(), DrivingModel::KinematicGrip);
        assert_eq!(settings.mode_label(), "Grip");
    }
}
