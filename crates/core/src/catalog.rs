//! Lookup catalogs.
//!
//! Catalogs are small reference tables (ethnicities, nationalities, sectors, subsectors and
//! establishments) used to populate the dropdowns of the enrollment form. Entries are read from the
//! backend, or loaded from a YAML seed file when provisioning a fresh installation.
//!
//! Seed files are parsed strictly: unknown keys are rejected and the failing path is reported.
//!
//! ```yaml
//! etnias:
//!   - nombre: Mapuche
//! sectores:
//!   - nombre: Verde
//!     codigo: VERDE
//!     color: "#10B981"
//! ```

use crate::validation::validate_hex_color;
use crate::{PercapitaError, PercapitaResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogKind {
    Etnia,
    Nacionalidad,
    Sector,
    Subsector,
    Establecimiento,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 5] = [
        CatalogKind::Etnia,
        CatalogKind::Nacionalidad,
        CatalogKind::Sector,
        CatalogKind::Subsector,
        CatalogKind::Establecimiento,
    ];

    /// Value of the `tipo` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Etnia => "ETNIA",
            CatalogKind::Nacionalidad => "NACIONALIDAD",
            CatalogKind::Sector => "SECTOR",
            CatalogKind::Subsector => "SUBSECTOR",
            CatalogKind::Establecimiento => "ESTABLECIMIENTO",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = PercapitaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        CatalogKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| PercapitaError::InvalidInput(format!("unknown catalog type '{s}'")))
    }
}

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub tipo: CatalogKind,
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    /// `#RRGGBB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "default_active")]
    pub activo: bool,
    #[serde(default)]
    pub orden: u32,
}

fn default_active() -> bool {
    true
}

/// Active entries of one kind, in dropdown order (`orden`, then `nombre`).
pub fn dropdown_options(items: &[CatalogItem], kind: CatalogKind) -> Vec<&CatalogItem> {
    let mut options: Vec<&CatalogItem> = items
        .iter()
        .filter(|item| item.tipo == kind && item.activo)
        .collect();
    options.sort_by(|a, b| a.orden.cmp(&b.orden).then_with(|| a.nombre.cmp(&b.nombre)));
    options
}

/// Catalog entries loaded from a seed file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogSeed {
    items: Vec<CatalogItem>,
}

impl CatalogSeed {
    /// Parse a seed document from YAML text.
    ///
    /// Entries without an explicit `orden` are numbered by their position within their list,
    /// starting at 1.
    ///
    /// # Errors
    ///
    /// Returns `PercapitaError` if:
    /// - the YAML does not match the seed schema, or has unknown keys
    ///   ([`PercapitaError::CatalogSchema`]),
    /// - a name is blank or a colour is not `#RRGGBB` ([`PercapitaError::InvalidInput`]),
    /// - the same `(tipo, nombre)` appears twice ([`PercapitaError::DuplicateCatalogEntry`]).
    pub fn parse(yaml_text: &str) -> PercapitaResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, SeedWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(PercapitaError::CatalogSchema {
                    path,
                    message: source.to_string(),
                });
            }
        };

        let mut items = Vec::new();
        let mut seen = HashSet::new();

        for (kind, entries) in wire.into_lists() {
            for (position, entry) in entries.into_iter().enumerate() {
                let nombre = entry.nombre.trim().to_string();
                if nombre.is_empty() {
                    return Err(PercapitaError::InvalidInput(format!(
                        "{kind} entry {} has a blank name",
                        position + 1
                    )));
                }
                if let Some(color) = &entry.color {
                    validate_hex_color(color)?;
                }
                if !seen.insert((kind, nombre.to_lowercase())) {
                    return Err(PercapitaError::DuplicateCatalogEntry { kind, name: nombre });
                }

                items.push(CatalogItem {
                    id: None,
                    tipo: kind,
                    nombre,
                    codigo: entry.codigo.filter(|c| !c.trim().is_empty()),
                    color: entry.color.map(|c| c.to_ascii_uppercase()),
                    activo: entry.activo.unwrap_or(true),
                    orden: entry.orden.unwrap_or(position as u32 + 1),
                });
            }
        }

        Ok(Self { items })
    }

    /// Read and parse a seed file.
    pub fn load(path: &Path) -> PercapitaResult<Self> {
        let text = std::fs::read_to_string(path).map_err(PercapitaError::FileRead)?;
        Self::parse(&text)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, kind: CatalogKind) -> usize {
        self.items.iter().filter(|item| item.tipo == kind).count()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedWire {
    #[serde(default)]
    etnias: Vec<SeedEntryWire>,
    #[serde(default)]
    nacionalidades: Vec<SeedEntryWire>,
    #[serde(default)]
    sectores: Vec<SeedEntryWire>,
    #[serde(default)]
    subsectores: Vec<SeedEntryWire>,
    #[serde(default)]
    establecimientos: Vec<SeedEntryWire>,
}

impl SeedWire {
    fn into_lists(self) -> [(CatalogKind, Vec<SeedEntryWire>); 5] {
        [
            (CatalogKind::Etnia, self.etnias),
            (CatalogKind::Nacionalidad, self.nacionalidades),
            (CatalogKind::Sector, self.sectores),
            (CatalogKind::Subsector, self.subsectores),
            (CatalogKind::Establecimiento, self.establecimientos),
        ]
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedEntryWire {
    nombre: String,
    #[serde(default)]
    codigo: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    activo: Option<bool>,
    #[serde(default)]
    orden: Option<u32>,
}
