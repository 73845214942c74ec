// =============================================================================
// RULE — Déclarations et règles compilées
// =============================================================================
//
// Une DÉCLARATION est ce que l'utilisateur écrit :
//
//   Single("Attr")               + transformation ?     → une règle
//   Pair("Attr", "attr")         + transformation(s) ?  → une règle (+ retour ?)
//   Set(["A1", "A2"])            + transformation ?     → une règle par clé
//
// Une RÈGLE (MappingRule) est ce que le moteur exécute :
//
//   source_key --transform--> target_key
//
// Pour une transformation clé + valeur, `target_key` est `None` : c'est la
// fonction qui calcule la clé au moment de la résolution.
//
// La compilation Déclaration → Règles est PURE : elle ne touche à aucun
// registre. Le registre valide d'abord, compile ensuite, puis insère tout d'un
// coup. Une déclaration invalide ne laisse donc aucune trace.
//
// POLITIQUE DU SENS RETOUR (Reverse::Default) :
//   - pas de transformation                 → retour identité
//   - Pair avec from == to + fn(v)          → retour avec la même fn(v)
//   - Pair avec from != to + fn(v)          → aller simple
//   - Single / Set + fn(v)                  → aller simple
//   - fn(k, v)                              → aller simple (clé inconnue)
//
// =============================================================================

use std::fmt;

use super::transform::{Reverse, Transform};

/// Les clés nommées par une déclaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keys<K> {
    /// `declare(key)` : source = cible
    Single(K),
    /// `declare(from, to)` : renommage
    Pair(K, K),
    /// `declare([k1, k2, ...])` : une règle par clé, même transformation
    Set(Vec<K>),
}

/// Une déclaration complète, telle que reçue par `Registry::declare`.
#[derive(Debug, Clone)]
pub struct Declaration<K, V> {
    pub keys: Keys<K>,
    pub transform: Transform<K, V>,
    pub reverse: Reverse<V>,
}

impl<K, V> Declaration<K, V> {
    pub fn new(keys: Keys<K>) -> Self {
        Declaration {
            keys,
            transform: Transform::Identity,
            reverse: Reverse::Default,
        }
    }

    pub fn single(key: K) -> Self {
        Self::new(Keys::Single(key))
    }

    pub fn pair(from: K, to: K) -> Self {
        Self::new(Keys::Pair(from, to))
    }

    pub fn set(keys: impl IntoIterator<Item = K>) -> Self {
        Self::new(Keys::Set(keys.into_iter().collect()))
    }

    pub fn with_transform(mut self, transform: Transform<K, V>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_reverse(mut self, reverse: Reverse<V>) -> Self {
        self.reverse = reverse;
        self
    }
}

/// Règle aller : une clé source, une clé cible (si connue), une transformation.
#[derive(Debug, Clone)]
pub struct MappingRule<K, V> {
    pub source_key: K,
    /// `None` pour une transformation clé + valeur.
    pub target_key: Option<K>,
    pub transform: Transform<K, V>,
}

/// Règle retour : lit `target_key` dans l'enregistrement, écrit `source_key`.
///
/// La transformation retour est toujours une transformation de valeur
/// (ou l'identité).
#[derive(Debug, Clone)]
pub struct ReverseRule<K, V> {
    pub target_key: K,
    pub source_key: K,
    pub transform: Transform<K, V>,
}

/// Résultat de la compilation d'une déclaration.
#[derive(Debug, Clone)]
pub struct Compiled<K, V> {
    pub forward: Vec<MappingRule<K, V>>,
    pub reverse: Vec<ReverseRule<K, V>>,
}

impl<K: Clone + PartialEq, V> Declaration<K, V> {
    /// Compile la déclaration en règles aller et retour.
    ///
    /// Suppose une déclaration déjà validée (voir `validate_declaration`) :
    /// les combinaisons interdites ne sont pas revérifiées ici.
    pub fn compile(&self) -> Compiled<K, V> {
        let mut compiled = Compiled {
            forward: Vec::new(),
            reverse: Vec::new(),
        };

        match &self.keys {
            Keys::Single(key) => self.compile_one(key, None, &mut compiled),
            Keys::Pair(from, to) => self.compile_one(from, Some(to), &mut compiled),
            Keys::Set(keys) => {
                for key in keys {
                    self.compile_one(key, None, &mut compiled);
                }
            }
        }

        compiled
    }

    fn compile_one(&self, source: &K, explicit_target: Option<&K>, out: &mut Compiled<K, V>) {
        let target_key = match self.transform {
            Transform::KeyValue(_) => None,
            _ => Some(explicit_target.unwrap_or(source).clone()),
        };

        if let Some(target) = &target_key {
            if let Some(transform) = self.reverse_transform(source, explicit_target) {
                out.reverse.push(ReverseRule {
                    target_key: target.clone(),
                    source_key: source.clone(),
                    transform,
                });
            }
        }

        out.forward.push(MappingRule {
            source_key: source.clone(),
            target_key,
            transform: self.transform.clone(),
        });
    }

    /// La transformation du sens retour, ou `None` pour un aller simple.
    fn reverse_transform(&self, source: &K, explicit_target: Option<&K>) -> Option<Transform<K, V>> {
        if self.transform.is_key_value() {
            return None;
        }

        match &self.reverse {
            Reverse::None => None,
            Reverse::Shared => Some(self.transform.clone()),
            Reverse::Distinct(f) => Some(Transform::Value(f.clone())),
            Reverse::Default => match (&self.transform, explicit_target) {
                (Transform::Identity, _) => Some(Transform::Identity),
                (Transform::Value(_), Some(to)) if to == source => Some(self.transform.clone()),
                _ => None,
            },
        }
    }
}

impl<K: fmt::Debug, V> fmt::Display for MappingRule<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target_key {
            Some(target) => write!(f, "{:?} -> {:?} [{}]", self.source_key, target, self.transform),
            None => write!(f, "{:?} -> ? [{}]", self.source_key, self.transform),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Display for ReverseRule<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} <- {:?} [{}]", self.source_key, self.target_key, self.transform)
    }
}
