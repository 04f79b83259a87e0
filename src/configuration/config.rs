//! Configuration types for run files.
//!
//! A run file has one `params` section with global options and any number of
//! named population sections, in file order (see [`super::loader`] for the
//! on-disk formats). Keys are case-insensitive.
//!
//! - [`ParamsConfig`]  – run length, output cadence, engine choices
//! - [`SectionConfig`] – sampling law for one population of stars
//! - [`RunConfig`]     – both, resolved against the defaults of a [`RunMode`]
//!
//! Lookup order for every key: the section itself, then `[DEFAULT]`, then the
//! built-in default for the run mode. A key with none of these is an error.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::loader::{RawConfig, RawSection};

pub const PARAMS_SECTION: &str = "params";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid INI: {0}")]
    Ini(String),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("entries must belong to a named section")]
    KeyOutsideSection,
    #[error("missing section [{0}]")]
    MissingSection(String),
    #[error("missing key `{key}` in section [{section}]")]
    MissingKey { section: String, key: String },
    #[error("invalid value `{value}` for `{key}` in section [{section}]: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Which driver the configuration is for; the two have different defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Periodic snapshot archive plus binary diagnostics
    Archive,
    /// Per-star orbital element and Cartesian time series
    Series,
}

/// Gravity solver
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityConfig {
    #[serde(rename = "basic")] // direct N^2 summation
    Basic,

    #[serde(rename = "tree")] // Barnes–Hut octree in a fixed open box
    Tree,
}

/// Time integrator
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorConfig {
    #[serde(rename = "verlet")] // velocity Verlet, two force evaluations per step
    Verlet,

    #[serde(rename = "leapfrog")] // drift-kick-drift, one force evaluation per step
    Leapfrog,
}

/// Collision detection
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionConfig {
    #[serde(rename = "none")]
    None,

    #[serde(rename = "direct")] // overlap at the end of each step
    Direct,

    #[serde(rename = "line")] // closest approach along each step's path
    Line,
}

macro_rules! keyword_enum {
    ($ty:ident { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(format!(
                        "unknown value `{other}`, expected one of: {}",
                        [$($text),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $variant { return f.write_str($text); })+
                Ok(())
            }
        }
    };
}

keyword_enum!(GravityConfig { "basic" => GravityConfig::Basic, "tree" => GravityConfig::Tree });
keyword_enum!(IntegratorConfig { "verlet" => IntegratorConfig::Verlet, "leapfrog" => IntegratorConfig::Leapfrog });
keyword_enum!(CollisionConfig {
    "none" => CollisionConfig::None,
    "direct" => CollisionConfig::Direct,
    "line" => CollisionConfig::Line,
});

/// Global run parameters (`[params]`)
#[derive(Debug, Clone, PartialEq)]
pub struct ParamsConfig {
    pub name: String,      // output name prefix
    pub p_run: f64,        // run length in orbits at a = 1
    pub p_out: f64,        // archive: snapshot interval in units of π; series: samples per orbit
    pub p_save: usize,     // series: samples between table flushes
    pub keep_bins: bool,   // skip binary pruning
    pub rt: f64,           // disruption radius of the central object
    pub coll: CollisionConfig,
    pub buffer: f64,       // oversampling factor for populations
    pub gravity: GravityConfig,
    pub integrator: IntegratorConfig,
    pub dt: f64,           // 0 -> engine default
    pub seed: Option<u64>, // None -> entropy
    pub prune_max_rounds: Option<usize>, // None -> unbounded
}

/// How a population's orbital planes are drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrientationConfig {
    /// inc uniform in [0, i_max] degrees, Ω = ω = 0
    Inclined { i_max: f64 },
    /// small random tilts of an aligned disk, spread `ang` degrees
    Disk { ang: f64 },
}

/// One population of stars
#[derive(Debug, Clone, PartialEq)]
pub struct SectionConfig {
    pub name: String,
    pub n: usize,   // stars kept after pruning
    pub e: f64,     // eccentricity
    pub m: f64,     // stellar mass
    pub a_min: f64, // semimajor axis bounds
    pub a_max: f64,
    pub p: f64,     // power-law index of dN/da
    pub orientation: OrientationConfig,
}

impl SectionConfig {
    /// Stars generated before pruning: `N * buffer`, truncated
    pub fn generated(&self, buffer: f64) -> usize {
        (self.n as f64 * buffer) as usize
    }
}

/// Top-level run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub mode: RunMode,
    pub params: ParamsConfig,
    pub sections: Vec<SectionConfig>,
}

/// Built-in default for `key` in `mode`
fn builtin_default(mode: RunMode, key: &str) -> Option<&'static str> {
    let value = match (key, mode) {
        ("pout", RunMode::Archive) => "0.2",
        ("pout", RunMode::Series) => "10",
        ("p", RunMode::Archive) => "2",
        ("p", RunMode::Series) => "1",
        ("name", _) => "archive",
        ("n", _) => "100",
        ("e", _) => "0.7",
        ("gravity", _) => "basic",
        ("integrator", _) => "verlet",
        ("dt", _) => "0",
        ("buffer", _) => "1.",
        ("keep_bins", _) => "False",
        ("a_min", _) => "1.",
        ("a_max", _) => "2.",
        ("i_max", _) => "5.",
        ("ang", _) => "2.",
        ("m", _) => "5e-5",
        ("rt", _) => "1.0e-4",
        ("coll", _) => "line",
        ("prun", _) => "500",
        ("psave", _) => "50",
        _ => return None,
    };
    Some(value)
}

/// Typed lookups over one section with the fallback chain applied
struct Lookup<'a> {
    mode: RunMode,
    raw: &'a RawConfig,
    section: &'a RawSection,
}

impl<'a> Lookup<'a> {
    fn explicit(&self, key: &str) -> Option<&'a str> {
        self.section
            .entries
            .get(key)
            .or_else(|| self.raw.defaults.get(key))
            .map(String::as_str)
    }

    fn get(&self, key: &str) -> Result<&'a str, ConfigError> {
        self.explicit(key)
            .or_else(|| builtin_default(self.mode, key))
            .ok_or_else(|| ConfigError::MissingKey {
                section: self.section.name.clone(),
                key: key.to_string(),
            })
    }

    fn invalid(&self, key: &str, value: &str, reason: impl fmt::Display) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section.name.clone(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.get(key)?;
        value.trim().parse().map_err(|e| self.invalid(key, value, e))
    }

    /// Integer that may be written as a float (`1000.`)
    fn count(&self, key: &str) -> Result<usize, ConfigError> {
        let value = self.get(key)?;
        let x: f64 = value.trim().parse().map_err(|e| self.invalid(key, value, e))?;
        if x < 0.0 || x.fract() != 0.0 || !x.is_finite() {
            return Err(self.invalid(key, value, "expected a non-negative integer"));
        }
        Ok(x as usize)
    }

    fn boolean(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.get(key)?;
        match value.trim().to_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(self.invalid(key, value, "expected a boolean")),
        }
    }

    /// Optional key with no built-in default
    fn optional<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.explicit(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|e| self.invalid(key, value, e)),
        }
    }

    fn positive(&self, key: &str) -> Result<f64, ConfigError> {
        let x: f64 = self.parse(key)?;
        if x > 0.0 && x.is_finite() {
            Ok(x)
        } else {
            Err(self.invalid(key, &x.to_string(), "must be positive"))
        }
    }

    fn non_negative(&self, key: &str) -> Result<f64, ConfigError> {
        let x: f64 = self.parse(key)?;
        if x >= 0.0 && x.is_finite() {
            Ok(x)
        } else {
            Err(self.invalid(key, &x.to_string(), "must not be negative"))
        }
    }
}

impl ParamsConfig {
    fn resolve(lookup: &Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            name: lookup.get("name")?.trim().to_string(),
            p_run: lookup.positive("prun")?,
            p_out: lookup.positive("pout")?,
            p_save: lookup.count("psave")?.max(1),
            keep_bins: lookup.boolean("keep_bins")?,
            rt: lookup.non_negative("rt")?,
            coll: lookup.parse("coll")?,
            buffer: lookup.positive("buffer")?,
            gravity: lookup.parse("gravity")?,
            integrator: lookup.parse("integrator")?,
            dt: lookup.non_negative("dt")?,
            seed: lookup.optional("seed")?,
            prune_max_rounds: lookup.optional::<usize>("prune_max_rounds")?.filter(|&r| r > 0),
        })
    }
}

impl SectionConfig {
    fn resolve(lookup: &Lookup<'_>) -> Result<Self, ConfigError> {
        let a_min = lookup.positive("a_min")?;
        let a_max = lookup.positive("a_max")?;
        if a_max < a_min {
            return Err(lookup.invalid("a_max", &a_max.to_string(), "must not be below a_min"));
        }

        let e: f64 = lookup.non_negative("e")?;
        if e >= 1.0 {
            return Err(lookup.invalid("e", &e.to_string(), "orbits must be bound (e < 1)"));
        }

        // An explicit `ang` selects the disk law, an explicit `i_max` the
        // uniform-inclination law; otherwise the mode decides.
        let orientation = match (lookup.explicit("ang"), lookup.explicit("i_max"), lookup.mode) {
            (Some(_), _, _) | (None, None, RunMode::Series) => OrientationConfig::Disk {
                ang: lookup.non_negative("ang")?,
            },
            _ => OrientationConfig::Inclined {
                i_max: lookup.non_negative("i_max")?,
            },
        };

        Ok(Self {
            name: lookup.section.name.clone(),
            n: lookup.count("n")?,
            e,
            m: lookup.non_negative("m")?,
            a_min,
            a_max,
            p: lookup.parse("p")?,
            orientation,
        })
    }
}

impl RunConfig {
    /// Resolve a raw configuration against the defaults of `mode`
    pub fn from_raw(raw: &RawConfig, mode: RunMode) -> Result<Self, ConfigError> {
        let params_section = raw
            .section(PARAMS_SECTION)
            .ok_or_else(|| ConfigError::MissingSection(PARAMS_SECTION.to_string()))?;
        let params = ParamsConfig::resolve(&Lookup {
            mode,
            raw,
            section: params_section,
        })?;

        let sections = raw
            .sections
            .iter()
            .filter(|s| s.name != PARAMS_SECTION)
            .map(|section| SectionConfig::resolve(&Lookup { mode, raw, section }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { mode, params, sections })
    }

    /// Load and resolve a configuration file
    pub fn load(path: &Path, mode: RunMode) -> Result<Self, ConfigError> {
        Self::from_raw(&RawConfig::load(path)?, mode)
    }

    pub fn from_ini_str(text: &str, mode: RunMode) -> Result<Self, ConfigError> {
        Self::from_raw(&RawConfig::from_ini_str(text)?, mode)
    }

    pub fn from_yaml_str(text: &str, mode: RunMode) -> Result<Self, ConfigError> {
        Self::from_raw(&RawConfig::from_yaml_str(text)?, mode)
    }
}
