//! Parametric EQ band collection.
//!
//! Bands keep insertion order. Seed bands are created with the store and can
//! never be removed; user bands get fresh ids that are never reused.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::error::{FxError, Result};

pub const FREQ_RANGE: (f64, f64) = (20.0, 20_000.0);
pub const GAIN_RANGE: (f64, f64) = (-24.0, 24.0);
pub const Q_RANGE: (f64, f64) = (0.1, 10.0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    Peaking,
    LowShelf,
    HighShelf,
}

impl FromStr for FilterType {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "peaking" | "peak" => Ok(FilterType::Peaking),
            "lowshelf" => Ok(FilterType::LowShelf),
            "highshelf" => Ok(FilterType::HighShelf),
            other => Err(FxError::Validation(format!(
                "Unknown filter type `{other}` (expected peaking, lowshelf or highshelf)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EqBand {
    id: String,
    pub freq: f64,
    pub gain: f64,
    pub q: f64,
    pub kind: FilterType,
    pub enabled: bool,
    pub editable: bool,
    pub removable: bool,
    pub name: String,
}

impl EqBand {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this band changes the signal enough to be worth sending.
    pub fn is_active(&self) -> bool {
        self.enabled
            && (self.gain != 0.0
                || (self.kind == FilterType::LowShelf && self.gain < 0.0)
                || (self.kind == FilterType::HighShelf && self.gain < 0.0))
    }

    pub fn to_wire(&self) -> WireBand {
        WireBand {
            freq: self.freq,
            gain: self.gain,
            q: self.q,
            kind: self.kind,
        }
    }

    fn seed(id: &str, name: &str, freq: f64, q: f64, kind: FilterType) -> Self {
        Self {
            id: id.into(),
            freq,
            gain: 0.0,
            q,
            kind,
            enabled: true,
            editable: true,
            removable: false,
            name: name.into(),
        }
    }
}

/// The four fields the service understands for one band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireBand {
    pub freq: f64,
    pub gain: f64,
    pub q: f64,
    #[serde(rename = "type")]
    pub kind: FilterType,
}

/// Partial update for a band. Numeric fields are clamped to their ranges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BandPatch {
    pub freq: Option<f64>,
    pub gain: Option<f64>,
    pub q: Option<f64>,
    pub kind: Option<FilterType>,
    pub enabled: Option<bool>,
    pub name: Option<String>,
}

impl BandPatch {
    pub fn gain(gain: f64) -> Self {
        Self {
            gain: Some(gain),
            ..Self::default()
        }
    }

    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EqBandStore {
    bands: Vec<EqBand>,
    next_id: u64,
    revision: u64,
}

impl Default for EqBandStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EqBandStore {
    /// Store holding the three seed bands.
    pub fn new() -> Self {
        Self {
            bands: vec![
                EqBand::seed("lowcut", "Low Cut", 100.0, 0.7, FilterType::LowShelf),
                EqBand::seed("clarity", "Clarity", 2500.0, 1.0, FilterType::Peaking),
                EqBand::seed("presence", "Presence", 5000.0, 0.7, FilterType::HighShelf),
            ],
            next_id: 1,
            revision: 0,
        }
    }

    pub fn bands(&self) -> &[EqBand] {
        &self.bands
    }

    pub fn get(&self, id: &str) -> Option<&EqBand> {
        self.bands.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Bumped on every effective mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_band(&mut self) -> &EqBand {
        let custom = self.bands.iter().filter(|b| b.removable).count();
        let id = self.fresh_id();
        self.bands.push(EqBand {
            id,
            freq: 1000.0,
            gain: 0.0,
            q: 1.0,
            kind: FilterType::Peaking,
            enabled: true,
            editable: true,
            removable: true,
            name: format!("Custom Band {}", custom + 1),
        });
        self.revision += 1;
        let band = &self.bands[self.bands.len() - 1];
        debug!(id = %band.id, "eq band added");
        band
    }

    /// Removes a removable band. Unknown ids and seed bands are ignored.
    pub fn remove_band(&mut self, id: &str) -> bool {
        let Some(idx) = self.bands.iter().position(|b| b.id == id && b.removable) else {
            return false;
        };
        self.bands.remove(idx);
        self.revision += 1;
        debug!(id, "eq band removed");
        true
    }

    /// Merges `patch` into the band with `id`. Unknown ids are ignored.
    /// Bands that are not editable only accept `enabled` changes.
    pub fn update_band(&mut self, id: &str, patch: BandPatch) -> bool {
        let Some(band) = self.bands.iter_mut().find(|b| b.id == id) else {
            return false;
        };

        if let Some(enabled) = patch.enabled {
            band.enabled = enabled;
        }
        if band.editable {
            if let Some(freq) = finite(patch.freq) {
                band.freq = freq.clamp(FREQ_RANGE.0, FREQ_RANGE.1);
            }
            if let Some(gain) = finite(patch.gain) {
                band.gain = gain.clamp(GAIN_RANGE.0, GAIN_RANGE.1);
            }
            if let Some(q) = finite(patch.q) {
                band.q = q.clamp(Q_RANGE.0, Q_RANGE.1);
            }
            if let Some(kind) = patch.kind {
                band.kind = kind;
            }
            if let Some(name) = patch.name {
                band.name = name;
            }
        }
        self.revision += 1;
        true
    }

    /// Wire form of every band that would audibly change the signal.
    pub fn active_wire_bands(&self) -> Vec<WireBand> {
        self.bands
            .iter()
            .filter(|b| b.is_active())
            .map(EqBand::to_wire)
            .collect()
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = format!("band-{}", self.next_id);
            self.next_id += 1;
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_three_fixed_seed_bands() {
        let store = EqBandStore::new();
        let ids: Vec<_> = store.bands().iter().map(|b| b.id()).collect();
        assert_eq!(ids, ["lowcut", "clarity", "presence"]);
        assert!(store.bands().iter().all(|b| !b.removable && b.editable));
    }

    #[test]
    fn add_band_uses_defaults_and_counts_custom_bands() {
        let mut store = EqBandStore::new();
        let first = store.add_band().clone();
        assert_eq!(first.name, "Custom Band 1");
        assert_eq!(first.freq, 1000.0);
        assert_eq!(first.q, 1.0);
        assert_eq!(first.kind, FilterType::Peaking);
        assert!(first.enabled && first.removable);

        let second = store.add_band().clone();
        assert_eq!(second.name, "Custom Band 2");
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut store = EqBandStore::new();
        let a = store.add_band().id().to_string();
        assert!(store.remove_band(&a));
        let b = store.add_band().id().to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn remove_never_touches_seed_bands() {
        let mut store = EqBandStore::new();
        for id in ["lowcut", "clarity", "presence"] {
            assert!(!store.remove_band(id));
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut store = EqBandStore::new();
        let before = store.clone();
        assert!(!store.remove_band("nope"));
        assert_eq!(store, before);
    }

    #[test]
    fn update_unknown_id_leaves_collection_unchanged() {
        let mut store = EqBandStore::new();
        store.add_band();
        let before = store.clone();
        assert!(!store.update_band("missing", BandPatch::gain(6.0)));
        assert_eq!(store, before);
    }

    #[test]
    fn update_clamps_numeric_fields() {
        let mut store = EqBandStore::new();
        store.update_band(
            "clarity",
            BandPatch {
                freq: Some(50_000.0),
                gain: Some(-99.0),
                q: Some(0.0),
                ..BandPatch::default()
            },
        );
        let b = store.get("clarity").unwrap();
        assert_eq!(b.freq, FREQ_RANGE.1);
        assert_eq!(b.gain, GAIN_RANGE.0);
        assert_eq!(b.q, Q_RANGE.0);
    }

    #[test]
    fn update_ignores_non_finite_numbers() {
        let mut store = EqBandStore::new();
        store.update_band("clarity", BandPatch::gain(f64::NAN));
        assert_eq!(store.get("clarity").unwrap().gain, 0.0);
    }

    #[test]
    fn non_editable_band_only_toggles() {
        let mut store = EqBandStore::new();
        store.bands[0].editable = false;
        store.update_band(
            "lowcut",
            BandPatch {
                gain: Some(-6.0),
                enabled: Some(false),
                ..BandPatch::default()
            },
        );
        let b = store.get("lowcut").unwrap();
        assert_eq!(b.gain, 0.0);
        assert!(!b.enabled);
    }

    #[test]
    fn zero_gain_bands_are_never_active() {
        let mut store = EqBandStore::new();
        store.add_band();
        assert!(store.bands().iter().all(|b| !b.is_active()));
        assert!(store.active_wire_bands().is_empty());
    }

    #[test]
    fn disabled_band_is_inactive_even_with_gain() {
        let mut store = EqBandStore::new();
        store.update_band("clarity", BandPatch::gain(3.0));
        store.update_band("clarity", BandPatch::enabled(false));
        assert!(store.active_wire_bands().is_empty());
    }

    #[test]
    fn revision_moves_only_on_effective_change() {
        let mut store = EqBandStore::new();
        let r0 = store.revision();
        store.update_band("missing", BandPatch::gain(1.0));
        store.remove_band("lowcut");
        assert_eq!(store.revision(), r0);
        store.add_band();
        assert!(store.revision() > r0);
    }

    #[test]
    fn filter_type_parses_wire_names() {
        assert_eq!("lowshelf".parse::<FilterType>().unwrap(), FilterType::LowShelf);
        assert_eq!("HighShelf".parse::<FilterType>().unwrap(), FilterType::HighShelf);
        assert!("bandpass".parse::<FilterType>().is_err());
    }
}
