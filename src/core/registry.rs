// =============================================================================
// REGISTRY — La table des règles déclarées pour un type
// =============================================================================
//
// Un Registry rassemble toutes les règles déclarées contre un type :
//
//   forward  : source_key → MappingRule   (sens aller)
//   reverse  : target_key → ReverseRule   (sens retour, optionnel)
//
// Les deux tables gardent l'ordre de déclaration. Redéclarer une clé remplace
// la règle existante EN PLACE (la dernière déclaration gagne, mais garde la
// position de la première). La résolution applique les règles dans cet ordre,
// ce qui rend le résultat déterministe même quand deux règles écrivent la
// même clé cible.
//
// SURFACE DE DÉCLARATION :
//
//   map(key)                              identité, aller et retour
//   map_with(key, t)                      fn(v) ou fn(k, v), aller simple
//   map_pair(from, to)                    renommage pur, aller et retour
//   map_pair_with(from, to, t)            fn(v), aller simple (retour si from == to)
//   map_pair_shared(from, to, t)          fn(v) réutilisée dans les deux sens
//   map_two_way(from, to, t, rev)         fn(v) aller, fn(v) retour
//   map_set([k1, k2, ...], t)             une règle par clé
//
// Toutes passent par `declare(Declaration)`, qui valide puis insère.
//
// SharedRegistry est la version "par type" : un registre statique, créé au
// premier appel à `declare`, lu par toutes les instances du type. Une
// résolution travaille sur un instantané (`Arc`) : aucun verrou n'est tenu
// pendant que les transformations tournent.
//
// =============================================================================

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::cartograph::Cartograph;
use super::record::Record;
use super::rule::{Declaration, Keys, MappingRule, ReverseRule};
use super::transform::{Reverse, Transform};
use super::validate::{validate_declaration, DeclarationError};

/// Les règles aller et retour d'un type.
#[derive(Clone)]
pub struct Registry<K, V> {
    forward: IndexMap<K, MappingRule<K, V>>,
    reverse: IndexMap<K, ReverseRule<K, V>>,
}

impl<K, V> Default for Registry<K, V> {
    fn default() -> Self {
        Registry {
            forward: IndexMap::new(),
            reverse: IndexMap::new(),
        }
    }
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Crée un registre vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Valide, compile et insère une déclaration.
    ///
    /// Tout ou rien : si la déclaration est refusée, aucune table n'est touchée.
    pub fn declare(&mut self, decl: Declaration<K, V>) -> Result<&mut Self, DeclarationError> {
        if let Err(err) = validate_declaration(&decl) {
            tracing::warn!(keys = ?decl.keys, error = %err, "declaration rejected");
            return Err(err);
        }

        let compiled = decl.compile();
        tracing::debug!(
            keys = ?decl.keys,
            transform = %decl.transform,
            forward = compiled.forward.len(),
            reverse = compiled.reverse.len(),
            "declaration compiled"
        );

        for rule in compiled.forward {
            self.forward.insert(rule.source_key.clone(), rule);
        }
        for rule in compiled.reverse {
            self.reverse.insert(rule.target_key.clone(), rule);
        }
        Ok(self)
    }

    /// `declare(key)` : identité, réversible.
    pub fn map(&mut self, key: K) -> Result<&mut Self, DeclarationError> {
        self.declare(Declaration::single(key))
    }

    /// `declare(key, fn)` : fn(v) transforme la valeur, fn(k, v) calcule
    /// aussi la clé cible.
    pub fn map_with(&mut self, key: K, transform: Transform<K, V>) -> Result<&mut Self, DeclarationError> {
        self.declare(Declaration::single(key).with_transform(transform))
    }

    /// `declare(from, to)` : renommage pur dans les deux sens.
    pub fn map_pair(&mut self, from: K, to: K) -> Result<&mut Self, DeclarationError> {
        self.declare(Declaration::pair(from, to))
    }

    /// `declare(from, to, fn)` : aller simple, sauf si `from == to` où la
    /// même fonction sert au retour. Une fn(k, v) est refusée.
    pub fn map_pair_with(
        &mut self,
        from: K,
        to: K,
        transform: Transform<K, V>,
    ) -> Result<&mut Self, DeclarationError> {
        self.declare(Declaration::pair(from, to).with_transform(transform))
    }

    /// `declare(from, to, fn)` avec la même fonction dans les deux sens.
    pub fn map_pair_shared(
        &mut self,
        from: K,
        to: K,
        transform: Transform<K, V>,
    ) -> Result<&mut Self, DeclarationError> {
        self.declare(
            Declaration::pair(from, to)
                .with_transform(transform)
                .with_reverse(Reverse::Shared),
        )
    }

    /// `declare(from, to, fwd, rev)` : deux fonctions indépendantes.
    ///
    /// Pour un retour qui peut échouer, passer par `declare` avec
    /// `Reverse::try_distinct`.
    pub fn map_two_way<F>(
        &mut self,
        from: K,
        to: K,
        forward: Transform<K, V>,
        reverse: F,
    ) -> Result<&mut Self, DeclarationError>
    where
        F: Fn(&V) -> V + Send + Sync + 'static,
    {
        self.declare(
            Declaration::pair(from, to)
                .with_transform(forward)
                .with_reverse(Reverse::distinct(reverse)),
        )
    }

    /// `declare([k1, k2, ...], fn?)` : une règle par clé.
    pub fn map_set(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        transform: Transform<K, V>,
    ) -> Result<&mut Self, DeclarationError> {
        self.declare(Declaration::new(Keys::Set(keys.into_iter().collect())).with_transform(transform))
    }

    pub fn forward_rule(&self, source_key: &K) -> Option<&MappingRule<K, V>> {
        self.forward.get(source_key)
    }

    pub fn reverse_rule(&self, target_key: &K) -> Option<&ReverseRule<K, V>> {
        self.reverse.get(target_key)
    }

    /// Règles aller, dans l'ordre de déclaration.
    pub fn forward_rules(&self) -> impl Iterator<Item = &MappingRule<K, V>> + '_ {
        self.forward.values()
    }

    /// Règles retour, dans l'ordre de déclaration.
    pub fn reverse_rules(&self) -> impl Iterator<Item = &ReverseRule<K, V>> + '_ {
        self.reverse.values()
    }

    /// Clés cibles connues à la déclaration (hors fn(k, v)), sans doublon.
    pub fn target_keys(&self) -> Vec<&K> {
        let mut keys: Vec<&K> = Vec::new();
        for target in self.forward.values().filter_map(|r| r.target_key.as_ref()) {
            if !keys.contains(&target) {
                keys.push(target);
            }
        }
        keys
    }

    pub fn has_reverse_rules(&self) -> bool {
        !self.reverse.is_empty()
    }

    /// Nombre de règles aller
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.reverse.is_empty()
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Résout un record brut contre ce registre (voir `Cartograph::new`).
    pub fn resolve(&self, original: Record<K, V>) -> anyhow::Result<Cartograph<K, V>> {
        Cartograph::new(self, original)
    }
}

impl<K: Debug, V> fmt::Display for Registry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "registry = {{")?;

        writeln!(f, "  forward")?;
        for rule in self.forward.values() {
            writeln!(f, "    {}", rule)?;
        }

        if !self.reverse.is_empty() {
            writeln!(f, "  reverse")?;
            for rule in self.reverse.values() {
                writeln!(f, "    {}", rule)?;
            }
        }

        write!(f, "}}")
    }
}

impl<K: Debug, V> fmt::Debug for Registry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("forward", &self.forward.keys().collect::<Vec<_>>())
            .field("reverse", &self.reverse.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// SHARED REGISTRY — Un registre par type, partagé par toutes ses instances
// =============================================================================

/// Registre de niveau type, utilisable dans un `static`.
///
/// Le `Registry` interne n'existe qu'à partir de la première déclaration.
/// Une déclaration prend le verrou en écriture et copie le registre si une
/// résolution en cours en tient encore un instantané. Une lecture ne garde le
/// verrou que le temps de cloner l'`Arc` : une transformation peut donc
/// construire une autre instance du même type, ou déclarer, sans interblocage.
pub struct SharedRegistry<K, V> {
    inner: RwLock<Option<Arc<Registry<K, V>>>>,
}

impl<K, V> SharedRegistry<K, V> {
    pub const fn new() -> Self {
        SharedRegistry {
            inner: parking_lot::const_rwlock(None),
        }
    }

    /// Instantané du registre courant, `None` avant la première déclaration.
    pub fn snapshot(&self) -> Option<Arc<Registry<K, V>>> {
        self.inner.read().clone()
    }

    /// Vrai dès qu'une déclaration a réussi ou échoué sur ce registre.
    pub fn is_initialized(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Oublie toutes les règles ; la prochaine déclaration recrée le registre.
    pub fn reset(&self) {
        *self.inner.write() = None;
    }
}

impl<K, V> Default for SharedRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SharedRegistry<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Déclare contre le registre du type, en le créant si besoin.
    pub fn declare(&self, decl: Declaration<K, V>) -> Result<(), DeclarationError> {
        let mut guard = self.inner.write();
        let registry = Arc::make_mut(guard.get_or_insert_with(|| Arc::new(Registry::new())));
        registry.declare(decl).map(|_| ())
    }

    /// Plusieurs déclarations d'un coup, sous un seul verrou.
    ///
    /// S'arrête à la première erreur ; les déclarations précédentes restent.
    pub fn declare_with<F>(&self, declare: F) -> Result<(), DeclarationError>
    where
        F: FnOnce(&mut Registry<K, V>) -> Result<(), DeclarationError>,
    {
        let mut guard = self.inner.write();
        declare(Arc::make_mut(guard.get_or_insert_with(|| Arc::new(Registry::new()))))
    }

    /// Lit le registre courant (vide s'il n'y a encore eu aucune déclaration).
    ///
    /// `f` reçoit un instantané : le verrou est déjà relâché quand il tourne.
    pub fn read<R>(&self, f: impl FnOnce(&Registry<K, V>) -> R) -> R {
        match self.snapshot() {
            Some(registry) => f(&*registry),
            None => f(&Registry::new()),
        }
    }

    pub fn resolve(&self, original: Record<K, V>) -> anyhow::Result<Cartograph<K, V>> {
        self.read(|registry| Cartograph::new(registry, original))
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn lower() -> Transform<&'static str, String> {
        Transform::value(|v: &String| v.to_lowercase())
    }

    #[test]
    fn test_declare_forms() {
        let mut r: Registry<&str, String> = Registry::new();
        r.map("A")
            .unwrap()
            .map_pair("B", "b")
            .unwrap()
            .map_pair_with("C", "c", lower())
            .unwrap()
            .map_set(["D1", "D2"], lower())
            .unwrap();

        assert_eq!(r.len(), 5);
        assert_eq!(r.forward_rule(&"B").unwrap().target_key, Some("b"));
        assert!(r.reverse_rule(&"b").is_some());
        assert!(r.reverse_rule(&"c").is_none());
        assert!(r.reverse_rule(&"A").is_some());
        assert_eq!(r.target_keys(), vec![&"A", &"b", &"c", &"D1", &"D2"]);
    }

    #[test]
    fn test_redeclare_overwrites_in_place() {
        let mut r: Registry<&str, String> = Registry::new();
        r.map_pair("A", "a").unwrap();
        r.map("B").unwrap();
        r.map_pair_with("A", "x", lower()).unwrap();

        let sources: Vec<_> = r.forward_rules().map(|rule| rule.source_key).collect();
        assert_eq!(sources, vec!["A", "B"]);
        assert_eq!(r.forward_rule(&"A").unwrap().target_key, Some("x"));
        // l'ancienne règle retour "a" → "A" reste : elle est indexée par "a"
        assert!(r.reverse_rule(&"a").is_some());
    }

    #[test]
    fn test_map_two_way_takes_a_plain_closure() {
        let mut r: Registry<&str, String> = Registry::new();
        r.map_two_way("A", "a", lower(), |v: &String| v.to_uppercase())
            .unwrap();

        let c = r.resolve(Record::from([("a", "value".to_string())])).unwrap();
        assert_eq!(c.unmapped().get(&"A"), Some(&"VALUE".to_string()));
    }

    #[test]
    fn test_rejected_declaration_leaves_registry_untouched() {
        let mut r: Registry<&str, i64> = Registry::new();
        r.map("keep").unwrap();

        let kv = Transform::key_value(|k: &&'static str, v: &i64| (*k, v + 1));
        let err = r.map_pair_with("a", "b", kv).unwrap_err();
        assert!(matches!(err, DeclarationError::KeyValueWithTarget { .. }));

        let err = r.map_set(Vec::new(), Transform::Identity).unwrap_err();
        assert_eq!(err, DeclarationError::EmptyKeySet);

        assert_eq!(r.len(), 1);
        assert!(r.forward_rule(&"a").is_none());
        assert!(r.reverse_rule(&"b").is_none());
    }

    #[test]
    fn test_clear() {
        let mut r: Registry<&str, String> = Registry::new();
        r.map_pair("A", "a").unwrap();
        assert!(r.has_reverse_rules());
        r.clear();
        assert!(r.is_empty());
    }

    #[test]
    fn test_display() {
        let mut r: Registry<&str, String> = Registry::new();
        r.map_pair("A", "a").unwrap().map_with("B", lower()).unwrap();
        let out = r.to_string();
        assert!(out.contains("\"A\" -> \"a\" [identity]"));
        assert!(out.contains("\"B\" -> \"B\" [fn(v)]"));
        assert!(out.contains("\"A\" <- \"a\" [identity]"));
    }

    #[test]
    fn test_shared_registry_is_lazy() {
        let shared: SharedRegistry<&str, String> = SharedRegistry::new();
        assert!(!shared.is_initialized());
        assert_eq!(shared.read(|r| r.len()), 0);

        shared.declare(Declaration::pair("A", "a")).unwrap();
        assert!(shared.is_initialized());
        assert_eq!(shared.read(|r| r.len()), 1);

        shared.reset();
        assert!(!shared.is_initialized());
        assert!(shared.snapshot().is_none());
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_declarations() {
        let shared: SharedRegistry<&str, String> = SharedRegistry::new();
        shared.declare(Declaration::pair("A", "a")).unwrap();
        let before = shared.snapshot().unwrap();

        shared.declare(Declaration::pair("B", "b")).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(shared.read(|r| r.len()), 2);
    }

    #[test]
    fn test_transform_can_reenter_its_own_registry() {
        static RULES: SharedRegistry<&'static str, String> = SharedRegistry::new();

        RULES
            .declare(Declaration::single("A").with_transform(Transform::value(|v: &String| {
                RULES.declare(Declaration::pair("B", "b")).expect("déclaration valide");
                let inner = RULES
                    .resolve(Record::from([("b", v.clone())]))
                    .expect("résolution imbriquée");
                inner.unmapped()[&"B"].to_uppercase()
            })))
            .unwrap();

        let c = RULES.resolve(Record::from([("A", "x".to_string())])).unwrap();
        assert_eq!(c.mapped().get(&"A"), Some(&"X".to_string()));
        assert_eq!(RULES.read(|r| r.len()), 2);
    }

    #[test]
    fn test_shared_registry_declare_with() {
        let shared: SharedRegistry<&str, String> = SharedRegistry::new();
        shared
            .declare_with(|r| {
                r.map("A")?.map_pair("B", "b")?;
                Ok(())
            })
            .unwrap();
        assert_eq!(shared.read(|r| r.len()), 2);
    }
}
