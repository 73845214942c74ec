// =============================================================================
// RESOLVE — Application des règles à un record brut
// =============================================================================
//
// Deux directions, calculées sur le MÊME record brut :
//
//   forward (aller)   : on lit le record comme étant dans la forme "source"
//                       et on produit la forme "cible" (mapped)
//
//   reverse (retour)  : on lit le record comme étant DÉJÀ dans la forme
//                       "cible" et on retrouve la forme "source" (unmapped)
//
// ALGORITHME (aller) :
//   Pour chaque règle, dans l'ordre de déclaration :
//     si source_key ∈ record :
//       fn(v)    → mapped[target_key] = fn(record[source_key])
//       fn(k, v) → (k', v') = fn(source_key, record[source_key])
//                  mapped[k'] = v'
//
// Le retour est symétrique, avec la table reverse.
//
// Une clé du record sans règle disparaît des deux vues. Une clé déclarée mais
// absente du record ne produit rien, sans erreur. Seule une transformation
// qui échoue arrête la résolution : son erreur remonte telle quelle.
//
// La résolution est une fonction PURE de (registre, record) : mêmes entrées,
// mêmes sorties, aucun effet de bord.
//
// =============================================================================

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::cartograph::Attr;
use super::record::Record;
use super::registry::Registry;
use super::transform::Transform;

/// Les trois sorties d'une résolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<K: Eq + Hash, V> {
    pub mapped: Record<K, V>,
    pub unmapped: Record<K, V>,
    /// Clé cible → valeur résolue ou absente.
    pub accessors: HashMap<K, Attr<V>>,
}

/// Résultat interne de l'aller : le record produit et les clés calculées
/// par des fn(k, v).
struct Forward<K, V> {
    mapped: Record<K, V>,
    computed_keys: Vec<K>,
}

fn apply_forward<K, V>(registry: &Registry<K, V>, raw: &Record<K, V>) -> anyhow::Result<Forward<K, V>>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    let mut out = Forward {
        mapped: Record::new(),
        computed_keys: Vec::new(),
    };

    for rule in registry.forward_rules() {
        let Some(value) = raw.get(&rule.source_key) else {
            continue;
        };

        match (&rule.transform, &rule.target_key) {
            (Transform::KeyValue(f), _) => {
                let (key, value) = f(&rule.source_key, value)?;
                tracing::trace!(from = ?rule.source_key, to = ?key, "forward rule applied");
                out.computed_keys.push(key.clone());
                out.mapped.insert(key, value);
            }
            (transform, Some(target)) => {
                if let Some(value) = transform.apply_value(value) {
                    tracing::trace!(from = ?rule.source_key, to = ?target, "forward rule applied");
                    out.mapped.insert(target.clone(), value?);
                }
            }
            // une règle fn(v) a toujours une cible, voir Declaration::compile
            (_, None) => {}
        }
    }

    Ok(out)
}

/// Vue aller : renomme et transforme les clés du record qui ont une règle.
pub fn forward<K, V>(registry: &Registry<K, V>, raw: &Record<K, V>) -> anyhow::Result<Record<K, V>>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    Ok(apply_forward(registry, raw)?.mapped)
}

/// Vue retour : traite le record comme déjà "mappé" et retrouve les clés source.
pub fn reverse<K, V>(registry: &Registry<K, V>, raw: &Record<K, V>) -> anyhow::Result<Record<K, V>>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    let mut unmapped = Record::new();

    for rule in registry.reverse_rules() {
        let Some(value) = raw.get(&rule.target_key) else {
            continue;
        };
        if let Some(value) = rule.transform.apply_value(value) {
            tracing::trace!(from = ?rule.target_key, to = ?rule.source_key, "reverse rule applied");
            unmapped.insert(rule.source_key.clone(), value?);
        }
    }

    Ok(unmapped)
}

/// Calcule mapped, unmapped et les accesseurs, en une seule passe par direction.
///
/// Les accesseurs sont dérivés de `mapped` : une clé cible déclarée vaut
/// `Present` si `mapped` la contient, `Absent` sinon. Les clés produites par
/// des fn(k, v) n'existent que si la clé source était présente.
pub fn resolve<K, V>(registry: &Registry<K, V>, raw: &Record<K, V>) -> anyhow::Result<Resolution<K, V>>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    let Forward { mapped, computed_keys } = apply_forward(registry, raw)?;
    let unmapped = reverse(registry, raw)?;

    let mut accessors = HashMap::new();
    for key in registry.target_keys().into_iter().chain(computed_keys.iter()) {
        let attr = match mapped.get(key) {
            Some(value) => Attr::Present(value.clone()),
            None => Attr::Absent,
        };
        accessors.insert(key.clone(), attr);
    }

    tracing::debug!(
        raw = raw.len(),
        mapped = mapped.len(),
        unmapped = unmapped.len(),
        accessors = accessors.len(),
        "record resolved"
    );

    Ok(Resolution {
        mapped,
        unmapped,
        accessors,
    })
}
