// Profile documents and the resolved, immutable bot configuration
use super::control::ScreenRect;
use super::error::ConfigError;
use super::match_image::{MatchConfig, RegionManager, RegionSpec, Template};
use super::types::UiState;
use crate::capture::{FrameSource, MonitorIndex};
use crate::input::Action;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One template → state → action row as written in a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSpec {
    /// File name under the variant's asset directory
    pub template: String,
    pub state: String,
    /// 1 is the highest priority
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl BindingSpec {
    pub fn new(template: &str, state: impl ToString, priority: u32) -> Self {
        Self {
            template: template.to_string(),
            state: state.to_string(),
            priority,
            threshold: None,
            region: None,
            action: None,
        }
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn region(mut self, region: RegionSpec) -> Self {
        self.region = Some(region);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }
}

/// A variant's state table. Built-in tables and `--profile` files share this format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub tick_interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_threshold: Option<f32>,
    pub bindings: Vec<BindingSpec>,
}

impl ProfileSpec {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::ProfileParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Operator choices that sit outside the profile.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub monitor: MonitorIndex,
    /// Overrides the profile's tick interval
    pub tick_interval: Option<Duration>,
    /// Directory holding templates for this variant
    pub asset_dir: PathBuf,
    pub failsafe: Option<ScreenRect>,
}

/// A loaded template bound to its state and optional action.
#[derive(Debug, Clone)]
pub struct Binding<S> {
    pub template: Template,
    pub state: S,
    pub priority: u32,
    pub action: Option<Action>,
}

impl<S> Binding<S> {
    pub fn new(template: Template, state: S, priority: u32, action: Option<Action>) -> Self {
        Self {
            template,
            state,
            priority,
            action,
        }
    }
}

/// Fully validated configuration. Only obtainable through `load`, `load_from`
/// or `from_bindings`, so holding one means every template decoded and fits.
#[derive(Debug, Clone)]
pub struct BotConfig<S> {
    variant: String,
    monitor: MonitorIndex,
    tick_interval: Duration,
    failsafe: Option<ScreenRect>,
    bindings: Vec<Binding<S>>,
}

impl<S: UiState> BotConfig<S> {
    /// Validate already-loaded bindings and order them by priority.
    /// Equal priorities keep their declared order.
    pub fn from_bindings(
        variant: &str,
        monitor: MonitorIndex,
        tick_interval: Duration,
        failsafe: Option<ScreenRect>,
        mut bindings: Vec<Binding<S>>,
        screen: (u32, u32),
    ) -> Result<Self, ConfigError> {
        if tick_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if bindings.is_empty() {
            return Err(ConfigError::NoBindings {
                variant: variant.to_string(),
            });
        }
        for binding in &bindings {
            let threshold = binding.template.threshold;
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(ConfigError::InvalidThreshold {
                    name: binding.template.name.clone(),
                    threshold,
                });
            }
            binding.template.check_fits(screen)?;
        }
        bindings.sort_by_key(|b| b.priority);

        Ok(Self {
            variant: variant.to_string(),
            monitor,
            tick_interval,
            failsafe,
            bindings,
        })
    }

    /// Resolve a profile against a screen of size `screen`.
    pub fn load(
        variant: &str,
        profile: &ProfileSpec,
        settings: &RunSettings,
        screen: (u32, u32),
        match_config: &MatchConfig,
    ) -> Result<Self, ConfigError> {
        let tick_interval = settings
            .tick_interval
            .unwrap_or(Duration::from_millis(profile.tick_interval_ms));
        let default_threshold = profile
            .default_threshold
            .unwrap_or(match_config.default_threshold);
        let regions = RegionManager::new(screen.0, screen.1);

        let mut bindings = Vec::with_capacity(profile.bindings.len());
        for spec in &profile.bindings {
            let state: S = spec.state.parse().map_err(|_| ConfigError::UnknownState {
                state: spec.state.clone(),
                variant: variant.to_string(),
            })?;
            let threshold = spec.threshold.unwrap_or(default_threshold);
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(ConfigError::InvalidThreshold {
                    name: spec.template.clone(),
                    threshold,
                });
            }
            let region = spec
                .region
                .as_ref()
                .map(|r| r.resolve(&regions))
                .transpose()?;
            let template = Template::load(
                &settings.asset_dir.join(&spec.template),
                region,
                threshold,
                match_config.patch_search_margin,
                screen,
            )?;
            log::debug!(
                "📋 Binding p{} {} -> {} (threshold {:.2})",
                spec.priority,
                template.name,
                state,
                threshold
            );
            bindings.push(Binding::new(template, state, spec.priority, spec.action.clone()));
        }

        Self::from_bindings(
            variant,
            settings.monitor,
            tick_interval,
            settings.failsafe,
            bindings,
            screen,
        )
    }

    /// Same as `load`, sizing templates against the monitor `frames` reports.
    /// An unattached monitor is a configuration error.
    pub fn load_from<F: FrameSource>(
        frames: &F,
        variant: &str,
        profile: &ProfileSpec,
        settings: &RunSettings,
        match_config: &MatchConfig,
    ) -> Result<Self, ConfigError> {
        let screen = frames.dimensions(settings.monitor)?;
        log::info!(
            "🖥️ Monitor {} is {}x{}",
            settings.monitor,
            screen.0,
            screen.1
        );
        Self::load(variant, profile, settings, screen, match_config)
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn monitor(&self) -> MonitorIndex {
        self.monitor
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn failsafe(&self) -> Option<ScreenRect> {
        self.failsafe
    }

    /// Bindings in resolution order
    pub fn bindings(&self) -> &[Binding<S>] {
        &self.bindings
    }
}
