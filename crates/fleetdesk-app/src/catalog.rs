// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;

use crate::EntityConfiguration;

const BUILTIN: [(&str, &str); 4] = [
    ("clientes", include_str!("../entities/clientes.toml")),
    ("productos", include_str!("../entities/productos.toml")),
    ("proveedores", include_str!("../entities/proveedores.toml")),
    ("empleados", include_str!("../entities/empleados.toml")),
];

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(name, _)| *name)
}

pub fn builtin() -> Result<Vec<EntityConfiguration>> {
    BUILTIN
        .iter()
        .map(|(name, raw)| EntityConfiguration::from_toml_str(raw, &format!("builtin:{name}")))
        .collect()
}

/// Loads every `*.toml` entity file in `dir`, sorted by file name.
pub fn load_dir(dir: &Path) -> Result<Vec<EntityConfiguration>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read entities directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("list entities directory {}", dir.display()))?
            .path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read entity file {}", path.display()))?;
            EntityConfiguration::from_toml_str(&raw, &path.display().to_string())
        })
        .collect()
}

/// Built-in entities followed by the ones in `extra_dir`; a file entity
/// replaces a built-in of the same name.
pub fn load_all(extra_dir: Option<&Path>) -> Result<Vec<EntityConfiguration>> {
    let mut configs = builtin()?;
    let Some(dir) = extra_dir else {
        return Ok(configs);
    };

    for config in load_dir(dir)? {
        match configs
            .iter_mut()
            .find(|existing| existing.entity_name == config.entity_name)
        {
            Some(existing) => {
                log::info!("entity {} overridden by {}", config.entity_name, dir.display());
                *existing = config;
            }
            None => configs.push(config),
        }
    }
    Ok(configs)
}

pub fn by_name<'a>(
    configs: &'a [EntityConfiguration],
    name: &str,
) -> Result<&'a EntityConfiguration> {
    configs
        .iter()
        .find(|config| config.entity_name == name)
        .ok_or_else(|| {
            let known: Vec<&str> = configs
                .iter()
                .map(|config| config.entity_name.as_str())
                .collect();
            anyhow!(
                "unknown entity {name:?} -- choose one of: {}",
                known.join(", ")
            )
        })
}
