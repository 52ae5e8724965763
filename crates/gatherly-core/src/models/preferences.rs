use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPreference {
    pub latitude: String,
    pub longitude: String,
    pub name: String,
}

impl LocationPreference {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            name: name.into(),
        }
    }

    /// Locations are identified by their coordinates, never by name.
    pub fn same_coordinates(&self, other: &LocationPreference) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

/// A user's recommendation preferences.
///
/// `categories` behaves as a set and `locations` holds at most one entry per
/// (latitude, longitude) pair. Keys the client does not know about are kept
/// in `extra` so a full-mapping write never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub categories: Vec<i64>,
    #[serde(default)]
    pub locations: Vec<LocationPreference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Preferences {
    /// Decode a server payload; `null` means the user has no preferences yet.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let mut prefs: Preferences = serde_json::from_value(value)?;
        prefs.normalize();
        Ok(prefs)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.locations.is_empty() && self.extra.is_empty()
    }

    pub fn has_category(&self, category_id: i64) -> bool {
        self.categories.contains(&category_id)
    }

    /// Returns false when the category was already present.
    pub fn add_category(&mut self, category_id: i64) -> bool {
        if self.has_category(category_id) {
            return false;
        }
        self.categories.push(category_id);
        true
    }

    pub fn remove_category(&mut self, category_id: i64) -> bool {
        let before = self.categories.len();
        self.categories.retain(|&id| id != category_id);
        self.categories.len() != before
    }

    pub fn has_location(&self, location: &LocationPreference) -> bool {
        self.locations.iter().any(|l| l.same_coordinates(location))
    }

    /// Returns false when a location with the same coordinates exists.
    pub fn add_location(&mut self, location: LocationPreference) -> bool {
        if self.has_location(&location) {
            return false;
        }
        self.locations.push(location);
        true
    }

    /// Remove every location with the given name, returning how many went.
    pub fn remove_locations_named(&mut self, name: &str) -> usize {
        let before = self.locations.len();
        self.locations.retain(|l| l.name != name);
        before - self.locations.len()
    }

    /// Copy of this mapping with `key` replaced by `value`.
    ///
    /// Goes through the JSON form so recognized keys are validated and
    /// unrecognized keys land in `extra`.
    pub fn with_value(&self, key: &str, value: Value) -> Result<Self, serde_json::Error> {
        let mut map = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert(key.to_string(), value);
        Self::from_value(Value::Object(map))
    }

    /// Restore the set invariants, keeping the first occurrence.
    fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.categories.len());
        self.categories.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });

        let mut kept: Vec<LocationPreference> = Vec::with_capacity(self.locations.len());
        for location in self.locations.drain(..) {
            if !kept.iter().any(|l| l.same_coordinates(&location)) {
                kept.push(location);
            }
        }
        self.locations = kept;
    }
}
