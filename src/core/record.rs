// =============================================================================
// RECORD — L'enregistrement brut clé → valeur
// =============================================================================
//
// Un Record est PLAT : des clés de premier niveau associées à des valeurs.
// Pas de chemins imbriqués ("a.b.c") : une règle ne porte que sur une clé
// de premier niveau. Une valeur peut, elle, être un objet (`Value::Object`),
// traité d'un bloc.
//
// Trois records par instance résolue :
//   original  → tel que fourni à la construction
//   mapped    → après application des règles aller
//   unmapped  → après application des règles retour
//
// =============================================================================

use std::collections::HashMap;
use std::fmt::{Debug, Display};

use super::value::Value;

/// Un enregistrement plat. L'ordre des clés n'a pas de sens.
pub type Record<K, V> = HashMap<K, V>;

/// Construit un record à partir d'un objet JSON (`{"Key": value, ...}`).
///
/// Le document doit être un objet : un tableau ou un scalaire au premier
/// niveau est refusé.
pub fn record_from_json(json: &str) -> anyhow::Result<Record<String, Value>> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    match raw {
        serde_json::Value::Object(map) => {
            let mut record = Record::with_capacity(map.len());
            for (key, value) in map {
                record.insert(key, serde_json::from_value(value)?);
            }
            Ok(record)
        }
        other => anyhow::bail!("un record JSON doit être un objet, reçu : {}", other),
    }
}

/// Affiche un record de manière lisible et stable (clés triées).
pub fn display_record<K: Debug, V: Display>(record: &Record<K, V>) -> String {
    let mut entries: Vec<(String, &V)> = record
        .iter()
        .map(|(k, v)| (format!("{:?}", k), v))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::from("{");
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!(" {}: {}", key, value));
    }
    if !entries.is_empty() {
        out.push(' ');
    }
    out.push('}');
    out
}
