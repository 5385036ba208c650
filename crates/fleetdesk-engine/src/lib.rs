// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod employee;
mod error;
pub mod options;
pub mod save;
mod screen;
pub mod search;
mod strategy;

pub use error::*;
pub use options::{OptionWarning, Resolution, resolve};
pub use save::{SaveOutcome, SaveRequest};
pub use screen::*;
pub use search::RemoteSearchController;
pub use strategy::*;
