// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod catalog;
pub mod forms;
pub mod ids;
pub mod model;
pub mod rules;
pub mod search;
pub mod state;

pub use forms::*;
pub use ids::*;
pub use model::*;
pub use rules::Rule;
pub use state::*;
