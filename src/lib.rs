// =============================================================================
// CARTORUST — Moteur déclaratif de cartographie d'attributs
// =============================================================================
//
// Cartorust adapte des données externes (payloads en CamelCase, noms de
// champs d'une API tierce...) aux conventions internes d'une application,
// et retour, sans code de traduction écrit à la main champ par champ.
//
// Un type DÉCLARE ses règles une fois :
//   map("Attr")                          → identité
//   map_pair("FirstName", "first_name")  → renommage aller/retour
//   map_with("Email", fn(v))             → transformation de valeur
//   map_with("Attr", fn(k, v))           → renommage + transformation calculés
//   map_set(["A1", "A2"], fn)            → même règle pour plusieurs clés
//
// Chaque instance RÉSOUT son record brut contre ces règles :
//   original / mapped / unmapped / accesseurs par clé cible
//
// Architecture :
//   core/     → le moteur pur (registre, règles, résolution)
//
// =============================================================================

pub mod core;

pub use crate::core::cartograph::{AccessError, Attr, Cartograph, Cartographed};
pub use crate::core::record::Record;
pub use crate::core::registry::{Registry, SharedRegistry};
pub use crate::core::rule::{Declaration, Keys};
pub use crate::core::transform::{Reverse, Transform};
pub use crate::core::validate::DeclarationError;
pub use crate::core::value::Value;
