// =============================================================================
// TRANSFORM — Les fonctions qui réécrivent une valeur (ou une clé + valeur)
// =============================================================================
//
// Une déclaration de mapping peut porter une fonction de transformation. Il en
// existe deux sortes, qui ne font PAS la même chose :
//
//   - Transformation de VALEUR :      v        →  v'
//     La clé cible est fixée par la déclaration (elle-même ou un renommage).
//
//   - Transformation CLÉ + VALEUR :   (k, v)   →  (k', v')
//     La fonction calcule elle-même la clé cible. Elle renomme ET transforme
//     en une seule déclaration.
//
// Sans fonction, c'est l'IDENTITÉ : v → v.
//
// Les deux sortes sont des variantes explicites de `Transform`, le choix est
// fait à la déclaration et jamais en inspectant la fonction.
//
// Le sens retour (reverse) est exprimé lui aussi explicitement par `Reverse` :
// pas de retour, retour avec la même fonction, ou retour avec une fonction
// distincte.
//
// Toutes les fonctions sont faillibles (`anyhow::Result`) : une erreur levée
// par une transformation remonte telle quelle à l'appelant de la résolution.
//
// =============================================================================

use std::fmt;
use std::sync::Arc;

/// Fonction valeur → valeur.
pub type ValueFn<V> = Arc<dyn Fn(&V) -> anyhow::Result<V> + Send + Sync>;

/// Fonction (clé, valeur) → (clé, valeur).
pub type KeyValueFn<K, V> = Arc<dyn Fn(&K, &V) -> anyhow::Result<(K, V)> + Send + Sync>;

/// Transformation appliquée dans le sens aller (source → cible).
pub enum Transform<K, V> {
    /// v → v
    Identity,
    /// v → f(v), la clé est fixée par la déclaration
    Value(ValueFn<V>),
    /// (k, v) → f(k, v), la fonction choisit la clé
    KeyValue(KeyValueFn<K, V>),
}

impl<K, V> Transform<K, V> {
    /// Transformation de valeur infaillible.
    pub fn value<F>(f: F) -> Self
    where
        F: Fn(&V) -> V + Send + Sync + 'static,
    {
        Transform::Value(Arc::new(move |v: &V| -> anyhow::Result<V> { Ok(f(v)) }))
    }

    /// Transformation de valeur pouvant échouer.
    pub fn try_value<F>(f: F) -> Self
    where
        F: Fn(&V) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Transform::Value(Arc::new(f))
    }

    /// Transformation clé + valeur infaillible.
    pub fn key_value<F>(f: F) -> Self
    where
        F: Fn(&K, &V) -> (K, V) + Send + Sync + 'static,
    {
        Transform::KeyValue(Arc::new(move |k: &K, v: &V| -> anyhow::Result<(K, V)> {
            Ok(f(k, v))
        }))
    }

    /// Transformation clé + valeur pouvant échouer.
    pub fn try_key_value<F>(f: F) -> Self
    where
        F: Fn(&K, &V) -> anyhow::Result<(K, V)> + Send + Sync + 'static,
    {
        Transform::KeyValue(Arc::new(f))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }

    pub fn is_key_value(&self) -> bool {
        matches!(self, Transform::KeyValue(_))
    }
}

impl<K, V: Clone> Transform<K, V> {
    /// Applique une transformation qui n'est PAS clé + valeur.
    ///
    /// Retourne `None` pour une variante `KeyValue` : c'est à l'appelant de
    /// fournir la clé dans ce cas (voir `resolve`).
    pub(crate) fn apply_value(&self, value: &V) -> Option<anyhow::Result<V>> {
        match self {
            Transform::Identity => Some(Ok(value.clone())),
            Transform::Value(f) => Some(f(value)),
            Transform::KeyValue(_) => None,
        }
    }
}

// Clone à la main : un `derive` exigerait K: Clone + V: Clone pour cloner des Arc.
impl<K, V> Clone for Transform<K, V> {
    fn clone(&self) -> Self {
        match self {
            Transform::Identity => Transform::Identity,
            Transform::Value(f) => Transform::Value(Arc::clone(f)),
            Transform::KeyValue(f) => Transform::KeyValue(Arc::clone(f)),
        }
    }
}

impl<K, V> fmt::Debug for Transform<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl<K, V> fmt::Display for Transform<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity => write!(f, "identity"),
            Transform::Value(_) => write!(f, "fn(v)"),
            Transform::KeyValue(_) => write!(f, "fn(k, v)"),
        }
    }
}

/// Ce que la déclaration demande pour le sens retour (cible → source).
pub enum Reverse<V> {
    /// Pas de demande explicite : la règle par défaut s'applique
    /// (renommage pur ou clé identique → retour installé, sinon aller simple).
    Default,
    /// Aller simple, même quand un retour serait possible.
    None,
    /// Le retour réutilise la transformation aller.
    Shared,
    /// Le retour utilise sa propre transformation.
    Distinct(ValueFn<V>),
}

impl<V> Reverse<V> {
    pub fn distinct<F>(f: F) -> Self
    where
        F: Fn(&V) -> V + Send + Sync + 'static,
    {
        Reverse::Distinct(Arc::new(move |v: &V| -> anyhow::Result<V> { Ok(f(v)) }))
    }

    pub fn try_distinct<F>(f: F) -> Self
    where
        F: Fn(&V) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Reverse::Distinct(Arc::new(f))
    }

    /// Vrai si la déclaration demande explicitement un retour.
    pub fn is_requested(&self) -> bool {
        matches!(self, Reverse::Shared | Reverse::Distinct(_))
    }
}

impl<V> Clone for Reverse<V> {
    fn clone(&self) -> Self {
        match self {
            Reverse::Default => Reverse::Default,
            Reverse::None => Reverse::None,
            Reverse::Shared => Reverse::Shared,
            Reverse::Distinct(f) => Reverse::Distinct(Arc::clone(f)),
        }
    }
}

impl<V> fmt::Debug for Reverse<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reverse::Default => write!(f, "Default"),
            Reverse::None => write!(f, "None"),
            Reverse::Shared => write!(f, "Shared"),
            Reverse::Distinct(_) => write!(f, "Distinct(fn(v))"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_returns_value() {
        let t: Transform<String, i64> = Transform::Identity;
        assert_eq!(t.apply_value(&7).unwrap().unwrap(), 7);
    }

    #[test]
    fn test_value_transform() {
        let t: Transform<String, i64> = Transform::value(|v| v + 1);
        assert_eq!(t.apply_value(&1).unwrap().unwrap(), 2);
        assert!(!t.is_key_value());
    }

    #[test]
    fn test_key_value_transform_is_not_applied_as_value() {
        let t: Transform<String, i64> = Transform::key_value(|k: &String, v: &i64| (k.to_uppercase(), *v));
        assert!(t.is_key_value());
        assert!(t.apply_value(&1).is_none());
    }

    #[test]
    fn test_failing_transform_propagates() {
        let t: Transform<String, i64> = Transform::try_value(|_| anyhow::bail!("boom"));
        let err = t.apply_value(&1).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_display() {
        let t: Transform<String, i64> = Transform::value(|v| *v);
        assert_eq!(t.to_string(), "fn(v)");
        assert_eq!(Transform::<String, i64>::Identity.to_string(), "identity");
    }

    #[test]
    fn test_reverse_requested() {
        assert!(Reverse::<i64>::Shared.is_requested());
        assert!(Reverse::<i64>::distinct(|v| *v).is_requested());
        assert!(!Reverse::<i64>::Default.is_requested());
        assert!(!Reverse::<i64>::None.is_requested());
    }
}
