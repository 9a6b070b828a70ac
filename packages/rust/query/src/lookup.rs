//! Lookup tables resolving user-facing parameter values into API query codes.
//!
//! These are explicit immutable structures handed to the query builder, not
//! process-wide globals. Unknown keys fail fast with a config error so a
//! malformed request is never sent upstream.

use healthpull_shared::{HealthPullError, Result};

/// Hierarchy level of the org units to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Country,
    Regions,
    Districts,
    Fosas,
}

impl Level {
    /// Canonical display name, used in output file names.
    pub fn name(self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::Regions => "Regions",
            Self::Districts => "Districts",
            Self::Fosas => "FOSAs",
        }
    }
}

impl std::str::FromStr for Level {
    type Err = HealthPullError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "country" => Ok(Self::Country),
            "regions" => Ok(Self::Regions),
            "districts" => Ok(Self::Districts),
            "fosas" => Ok(Self::Fosas),
            _ => Err(HealthPullError::config(format!(
                "unknown level '{s}': expected Country, Regions, Districts, or FOSAs"
            ))),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// LevelTable
// ---------------------------------------------------------------------------

/// Maps hierarchy levels to the registry's org-unit-type identifiers.
#[derive(Debug, Clone)]
pub struct LevelTable {
    entries: Vec<(Level, u32)>,
}

impl LevelTable {
    /// The type identifiers used by the polio-outbreaks org-unit registry.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                (Level::Country, 5),
                (Level::Regions, 6),
                (Level::Districts, 7),
                (Level::Fosas, 8),
            ],
        }
    }

    /// Resolve a level to its org-unit-type id.
    pub fn org_unit_type_id(&self, level: Level) -> Result<u32> {
        self.entries
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, id)| *id)
            .ok_or_else(|| {
                HealthPullError::config(format!("no org-unit-type id configured for level {level}"))
            })
    }
}

// ---------------------------------------------------------------------------
// CountryTable
// ---------------------------------------------------------------------------

/// Maps country names to the parent org-unit identifier under which that
/// country's units are registered.
#[derive(Debug, Clone)]
pub struct CountryTable {
    entries: Vec<(&'static str, u64)>,
}

impl CountryTable {
    /// The 46 countries known to the upstream registry.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                ("Algeria", 29688),
                ("Angola", 29691),
                ("Benin", 29694),
                ("Botswana", 29697),
                ("Burkina Faso", 29700),
                ("Burundi", 29703),
                ("Cabo Verde", 29706),
                ("Cameroon", 29709),
                ("Central African Republic", 29712),
                ("Chad", 29715),
                ("Comoros", 29718),
                ("Congo", 29721),
                ("Cote d'Ivoire", 29724),
                ("Democratic Republic of the Congo", 29727),
                ("Equatorial Guinea", 29730),
                ("Eritrea", 29733),
                ("Eswatini", 29736),
                ("Ethiopia", 29739),
                ("Gabon", 29742),
                ("Gambia", 29745),
                ("Ghana", 29748),
                ("Guinea", 29751),
                ("Guinea-Bissau", 29754),
                ("Kenya", 29757),
                ("Lesotho", 29760),
                ("Liberia", 29763),
                ("Madagascar", 29766),
                ("Malawi", 29769),
                ("Mali", 29772),
                ("Mauritania", 29775),
                ("Mauritius", 29778),
                ("Mozambique", 29781),
                ("Namibia", 29784),
                ("Niger", 29787),
                ("Nigeria", 29790),
                ("Rwanda", 29793),
                ("Sao Tome and Principe", 29796),
                ("Senegal", 29799),
                ("Sierra Leone", 29802),
                ("South Africa", 29805),
                ("South Sudan", 29808),
                ("Togo", 29811),
                ("Uganda", 29814),
                ("United Republic of Tanzania", 29817),
                ("Zambia", 29820),
                ("Zimbabwe", 29823),
            ],
        }
    }

    /// Number of registered countries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a country name (case-insensitive) to its canonical name and
    /// parent org-unit id.
    pub fn resolve(&self, name: &str) -> Result<(&'static str, u64)> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(n, id)| (*n, *id))
            .ok_or_else(|| {
                HealthPullError::config(format!(
                    "unknown country '{name}': not in the {}-country registry",
                    self.entries.len()
                ))
            })
    }
}

/// The full set of lookup tables handed to the query builder.
#[derive(Debug, Clone)]
pub struct LookupTables {
    pub countries: CountryTable,
    pub levels: LevelTable,
}

impl LookupTables {
    /// Builtin tables matching the upstream registry.
    pub fn builtin() -> Self {
        Self {
            countries: CountryTable::builtin(),
            levels: LevelTable::builtin(),
        }
    }
}
