// =============================================================================
// CORE — Le moteur de cartographie d'attributs
// =============================================================================
//
// Ce module regroupe toute la logique du moteur :
// pas d'I/O, pas de réseau, pas de fichier — des déclarations, des règles
// et des records.
//
// Architecture :
//   value       → les valeurs dynamiques prêtes à l'emploi (String, Int, List...)
//   record      → l'enregistrement plat clé → valeur
//   transform   → les fonctions fn(v) et fn(k, v), et l'intention retour
//   rule        → déclarations et règles compilées
//   validate    → le refus des déclarations contradictoires
//   registry    → la table des règles d'un type (+ version partagée)
//   resolve     → l'application des règles : mapped, unmapped, accesseurs
//   cartograph  → les vues figées d'une instance, le trait du type hôte
//
// =============================================================================

pub mod value;
pub mod record;
pub mod transform;
pub mod rule;
pub mod validate;
pub mod registry;
pub mod resolve;
pub mod cartograph;
