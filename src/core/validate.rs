// =============================================================================
// VALIDATE — Vérification des déclarations avant toute insertion
// =============================================================================
//
// Une déclaration est vérifiée AVANT d'être compilée et insérée dans le
// registre. Si elle est invalide, le registre reste exactement dans l'état
// où il était (tout ou rien, par appel à `declare`).
//
// Combinaisons interdites :
//   - fn(k, v) avec une clé cible explicite (Pair) : la fonction décide seule
//     de la clé, une cible explicite serait contradictoire
//   - fn(k, v) avec un sens retour demandé : sans clé cible connue, impossible
//     d'indexer la règle retour
//   - un ensemble de clés vide
//
// Une fonction d'arité > 2 n'est pas représentable : `Transform` n'a que des
// variantes à un ou deux arguments.
//
// =============================================================================

use std::fmt::Debug;

use thiserror::Error;

use super::rule::{Declaration, Keys};

/// Erreur levée par `Registry::declare` (InvalidDeclaration).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("invalid declaration: key-value transform on {from} cannot also name a target key ({to})")]
    KeyValueWithTarget { from: String, to: String },

    #[error("invalid declaration: key-value transform on {key} cannot have a reverse mapping")]
    KeyValueWithReverse { key: String },

    #[error("invalid declaration: empty key set")]
    EmptyKeySet,
}

/// Vérifie qu'une déclaration peut être compilée.
pub fn validate_declaration<K: Debug, V>(decl: &Declaration<K, V>) -> Result<(), DeclarationError> {
    if let Keys::Set(keys) = &decl.keys {
        if keys.is_empty() {
            return Err(DeclarationError::EmptyKeySet);
        }
    }

    if !decl.transform.is_key_value() {
        return Ok(());
    }

    match &decl.keys {
        Keys::Pair(from, to) => Err(DeclarationError::KeyValueWithTarget {
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }),
        Keys::Single(key) if decl.reverse.is_requested() => {
            Err(DeclarationError::KeyValueWithReverse { key: format!("{:?}", key) })
        }
        Keys::Set(keys) if decl.reverse.is_requested() => {
            Err(DeclarationError::KeyValueWithReverse { key: format!("{:?}", keys) })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::{Reverse, Transform};

    type Decl = Declaration<&'static str, i64>;

    fn kv() -> Transform<&'static str, i64> {
        Transform::key_value(|k: &&'static str, v: &i64| (*k, v + 1))
    }

    #[test]
    fn test_valid_forms() {
        assert!(validate_declaration(&Decl::single("a")).is_ok());
        assert!(validate_declaration(&Decl::single("a").with_transform(kv())).is_ok());
        assert!(validate_declaration(&Decl::pair("a", "b")).is_ok());
        assert!(validate_declaration(&Decl::set(["a", "b"]).with_transform(kv())).is_ok());
        assert!(validate_declaration(
            &Decl::pair("a", "b")
                .with_transform(Transform::value(|v: &i64| v + 1))
                .with_reverse(Reverse::distinct(|v: &i64| v - 1))
        )
        .is_ok());
    }

    #[test]
    fn test_key_value_with_target_is_rejected() {
        let err = validate_declaration(&Decl::pair("a", "b").with_transform(kv())).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::KeyValueWithTarget {
                from: "\"a\"".into(),
                to: "\"b\"".into()
            }
        );
    }

    #[test]
    fn test_key_value_with_reverse_is_rejected() {
        let err = validate_declaration(
            &Decl::single("a").with_transform(kv()).with_reverse(Reverse::Shared),
        )
        .unwrap_err();
        assert!(matches!(err, DeclarationError::KeyValueWithReverse { .. }));
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let err = validate_declaration(&Decl::set(Vec::new())).unwrap_err();
        assert_eq!(err, DeclarationError::EmptyKeySet);
        assert_eq!(err.to_string(), "invalid declaration: empty key set");
    }
}
