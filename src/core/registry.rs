// * Static module registry.
// * Built once at startup, immutable afterwards, and shared read-only behind Arc.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ConfigError;
use super::module::ExtractorModule;
use super::schema::Field;

/// Service tier a module belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

struct RegistryEntry {
    tier: Tier,
    module: Arc<dyn ExtractorModule>,
}

pub struct ModuleRegistry {
    entries: Vec<RegistryEntry>,
    pro_enabled: bool,
}

impl ModuleRegistry {
    pub fn builder() -> ModuleRegistryBuilder {
        ModuleRegistryBuilder::default()
    }

    /// Every built-in module, with the Pro tier switched on or off
    pub fn builtin(pro_enabled: bool) -> Result<Self, ConfigError> {
        let mut builder = Self::builder().pro_enabled(pro_enabled);
        for (tier, module) in crate::modules::builtin_modules() {
            builder = builder.register(tier, module);
        }
        builder.build()
    }

    /// Free-tier registry from an explicit module list
    pub fn from_modules(modules: Vec<Arc<dyn ExtractorModule>>) -> Result<Self, ConfigError> {
        modules
            .into_iter()
            .fold(Self::builder(), |builder, module| builder.register(Tier::Free, module))
            .build()
    }

    /// True when a Pro request would actually get Pro modules
    pub fn pro_available(&self) -> bool {
        self.pro_enabled && self.entries.iter().any(|e| e.tier == Tier::Pro)
    }

    /// Modules active for `tier`, in registration order.
    ///
    /// Pro is Free plus Pro; without available Pro modules it degrades to Free.
    pub fn active_modules(&self, tier: Tier) -> Vec<Arc<dyn ExtractorModule>> {
        let include_pro = match tier {
            Tier::Free => false,
            Tier::Pro if self.pro_available() => true,
            Tier::Pro => {
                info!("Pro tier requested but not available, running free modules");
                false
            }
        };

        self.entries
            .iter()
            .filter(|entry| entry.tier == Tier::Free || include_pro)
            .map(|entry| Arc::clone(&entry.module))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ExtractorModule>> {
        self.entries
            .iter()
            .find(|entry| entry.module.name() == name)
            .map(|entry| Arc::clone(&entry.module))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.module.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Default)]
pub struct ModuleRegistryBuilder {
    entries: Vec<RegistryEntry>,
    pro_enabled: bool,
}

impl ModuleRegistryBuilder {
    pub fn register(mut self, tier: Tier, module: Arc<dyn ExtractorModule>) -> Self {
        self.entries.push(RegistryEntry { tier, module });
        self
    }

    pub fn pro_enabled(mut self, enabled: bool) -> Self {
        self.pro_enabled = enabled;
        self
    }

    /// Validates names and freezes the registry
    pub fn build(self) -> Result<ModuleRegistry, ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            let name = entry.module.name();
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateModule(name.to_string()));
            }
            if entry.module.declares_field() && Field::from_name(name).is_none() {
                return Err(ConfigError::UnknownField(name.to_string()));
            }
            debug!(module = name, tier = ?entry.tier, deps = ?entry.module.dependencies(), "Module registered");
        }

        let free = self.entries.iter().filter(|e| e.tier == Tier::Free).count();
        info!(
            modules = self.entries.len(),
            free,
            pro = self.entries.len() - free,
            pro_enabled = self.pro_enabled,
            "Module registry initialized"
        );

        Ok(ModuleRegistry {
            entries: self.entries,
            pro_enabled: self.pro_enabled,
        })
    }
}
