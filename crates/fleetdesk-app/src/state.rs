// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{EntityConfiguration, FormMode, FormState};

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenState {
    pub mode: FormMode,
    pub form: FormState,
    epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCommand {
    OpenNew,
    OpenEdit,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeEvent {
    ModeChanged(FormMode),
    FormReset,
    TransitionRejected { from: FormMode, to: FormMode },
}

impl ScreenState {
    pub fn new(config: &EntityConfiguration) -> Self {
        Self {
            mode: FormMode::None,
            form: FormState::new(config),
            epoch: 0,
        }
    }

    /// Bumped on every accepted transition. Work started under an older
    /// epoch must not be applied to the form.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    pub fn dispatch(
        &mut self,
        config: &EntityConfiguration,
        command: ModeCommand,
    ) -> Vec<ModeEvent> {
        let target = match command {
            ModeCommand::OpenNew => FormMode::New,
            ModeCommand::OpenEdit => FormMode::Edit,
            ModeCommand::Close => FormMode::None,
        };

        if self.mode.is_open() && target.is_open() && self.mode != target {
            log::debug!(
                "rejecting {} -> {} transition for {}",
                self.mode.as_str(),
                target.as_str(),
                config.entity_name
            );
            return vec![ModeEvent::TransitionRejected {
                from: self.mode,
                to: target,
            }];
        }

        self.mode = target;
        self.epoch = self.epoch.wrapping_add(1);
        self.form.reset(config);
        vec![ModeEvent::ModeChanged(target), ModeEvent::FormReset]
    }
}
