//! Définitions de CRS au format PROJ.4 (`+proj=utm +zone=39 ...`)

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ReprojectError, Result};
use crate::utm::UtmZone;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Projection reconnue dans une définition
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Coordonnées géographiques (longitude, latitude en degrés)
    LongLat,
    /// UTM sur WGS84
    Utm(UtmZone),
    /// Projection non gérée nativement (nom `+proj=`), transmise telle quelle à PROJ
    Other(String),
}

/// Définition immuable d'un système de coordonnées
#[derive(Debug, Clone, PartialEq)]
pub struct CrsDefinition {
    /// Identifiant (ex: "EPSG:32639")
    pub identifier: String,
    /// Chaîne de définition d'origine
    pub definition: String,
    /// Projection interprétée
    pub projection: Projection,
}

/// Ellipsoïdes/datums acceptés par le backend natif
const NATIVE_DATUMS: &[&str] = &["WGS84"];

fn param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+([A-Za-z_0-9]+)(?:=(\S+))?").expect("valid regex"))
}

impl CrsDefinition {
    /// Parse une définition PROJ.4
    pub fn parse(identifier: &str, definition: &str) -> Result<Self> {
        let params: HashMap<&str, Option<&str>> = param_regex()
            .captures_iter(definition)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str();
                Some((key, caps.get(2).map(|m| m.as_str())))
            })
            .collect();

        let proj = params
            .get("proj")
            .copied()
            .flatten()
            .ok_or_else(|| ReprojectError::invalid_definition(identifier, "missing +proj"))?;

        let native_datum = ["ellps", "datum"]
            .iter()
            .filter_map(|k| params.get(k).copied().flatten())
            .all(|v| NATIVE_DATUMS.contains(&v));

        let projection = match proj {
            "longlat" | "latlong" | "lonlat" | "latlon" if native_datum => Projection::LongLat,
            "utm" if native_datum => {
                let zone = params.get("zone").copied().flatten().ok_or_else(|| {
                    ReprojectError::invalid_definition(identifier, "utm without +zone")
                })?;
                let zone: u8 = zone.parse().map_err(|_| {
                    ReprojectError::invalid_definition(identifier, format!("invalid zone '{}'", zone))
                })?;
                let south = params.contains_key("south");
                let zone = UtmZone::new(zone, south).ok_or_else(|| {
                    ReprojectError::invalid_definition(identifier, format!("zone {} out of 1..=60", zone))
                })?;
                Projection::Utm(zone)
            }
            other => Projection::Other(other.to_string()),
        };

        Ok(Self {
            identifier: identifier.to_string(),
            definition: definition.to_string(),
            projection,
        })
    }

    /// Le backend natif sait-il traiter cette définition ?
    pub fn is_native(&self) -> bool {
        !matches!(self.projection, Projection::Other(_))
    }
}
