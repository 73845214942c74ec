// =============================================================================
// CARTOGRAPH — Les vues résolues d'une instance
// =============================================================================
//
// Un Cartograph est ce que reçoit une instance à sa construction :
//
//   original()   le record brut, tel quel
//   mapped()     la vue aller
//   unmapped()   la vue retour (vide si le type n'a aucune règle retour)
//   get(key)     l'accesseur d'une clé cible déclarée
//
// Tout est calculé UNE fois, à la construction, puis figé. Si une
// transformation échoue, aucun Cartograph n'est créé : la construction
// échoue en bloc.
//
// ACCESSEURS : au lieu de méthodes générées à la volée, une table
// clé cible → Attr. `Attr::Absent` (clé source absente du record) n'est PAS
// une erreur et ne se confond pas avec une vraie valeur vide ou nulle.
// Demander une clé qu'aucune règle ne cible, en revanche, est une erreur
// d'utilisation (`AccessError::Undeclared`).
//
// Le trait `Cartographed` relie un type hôte à son registre partagé.
//
// =============================================================================

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::Record;
use super::registry::{Registry, SharedRegistry};
use super::resolve::{resolve, Resolution};

/// Résultat d'un accesseur : la valeur résolue, ou l'absence de la clé source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum Attr<V> {
    Present(V),
    Absent,
}

impl<V> Attr<V> {
    pub fn is_present(&self) -> bool {
        matches!(self, Attr::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Attr::Absent)
    }

    pub fn as_ref(&self) -> Attr<&V> {
        match self {
            Attr::Present(v) => Attr::Present(v),
            Attr::Absent => Attr::Absent,
        }
    }

    pub fn into_option(self) -> Option<V> {
        match self {
            Attr::Present(v) => Some(v),
            Attr::Absent => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Attr<U> {
        match self {
            Attr::Present(v) => Attr::Present(f(v)),
            Attr::Absent => Attr::Absent,
        }
    }
}

impl<V> From<Option<V>> for Attr<V> {
    fn from(opt: Option<V>) -> Self {
        match opt {
            Some(v) => Attr::Present(v),
            None => Attr::Absent,
        }
    }
}

/// Erreur d'utilisation d'un accesseur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("no mapping rule targets {key}")]
    Undeclared { key: String },
}

/// Les vues résolues d'une instance, immuables.
#[derive(Debug, Clone, PartialEq)]
pub struct Cartograph<K: Eq + Hash, V> {
    original: Record<K, V>,
    mapped: Record<K, V>,
    unmapped: Record<K, V>,
    accessors: HashMap<K, Attr<V>>,
}

impl<K, V> Cartograph<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Résout `original` contre `registry`.
    ///
    /// L'erreur d'une transformation est renvoyée sans être enveloppée.
    pub fn new(registry: &Registry<K, V>, original: Record<K, V>) -> anyhow::Result<Self> {
        let Resolution {
            mapped,
            unmapped,
            accessors,
        } = resolve(registry, &original)?;

        Ok(Cartograph {
            original,
            mapped,
            unmapped,
            accessors,
        })
    }

    pub fn original(&self) -> &Record<K, V> {
        &self.original
    }

    pub fn mapped(&self) -> &Record<K, V> {
        &self.mapped
    }

    pub fn unmapped(&self) -> &Record<K, V> {
        &self.unmapped
    }

    /// Accesseur d'une clé cible.
    pub fn get(&self, key: &K) -> Result<Attr<&V>, AccessError> {
        self.accessors
            .get(key)
            .map(Attr::as_ref)
            .ok_or_else(|| AccessError::Undeclared {
                key: format!("{:?}", key),
            })
    }

    /// Vrai si une règle cible `key` (présente ou absente dans ce record).
    pub fn is_declared(&self, key: &K) -> bool {
        self.accessors.contains_key(key)
    }

    pub fn accessors(&self) -> impl Iterator<Item = (&K, Attr<&V>)> + '_ {
        self.accessors.iter().map(|(k, a)| (k, a.as_ref()))
    }
}

/// Un type hôte dont les instances sont construites à partir d'un record brut.
///
/// Le type fournit son registre (en général un `static SharedRegistry`) et
/// la façon de s'envelopper autour des vues résolues.
pub trait Cartographed: Sized {
    type Key: Eq + Hash + Clone + Debug + 'static;
    type Value: Clone + 'static;

    fn registry() -> &'static SharedRegistry<Self::Key, Self::Value>;

    fn from_cartograph(cartograph: Cartograph<Self::Key, Self::Value>) -> Self;

    fn cartograph(&self) -> &Cartograph<Self::Key, Self::Value>;

    /// Construit une instance ; échoue en bloc si une transformation échoue.
    fn build(original: Record<Self::Key, Self::Value>) -> anyhow::Result<Self> {
        let cartograph = Self::registry().resolve(original)?;
        Ok(Self::from_cartograph(cartograph))
    }

    fn original_attributes(&self) -> &Record<Self::Key, Self::Value> {
        self.cartograph().original()
    }

    fn mapped_attributes(&self) -> &Record<Self::Key, Self::Value> {
        self.cartograph().mapped()
    }

    fn unmapped_attributes(&self) -> &Record<Self::Key, Self::Value> {
        self.cartograph().unmapped()
    }

    fn attribute(&self, key: &Self::Key) -> Result<Attr<&Self::Value>, AccessError> {
        self.cartograph().get(key)
    }
}
