// =============================================================================
// VALUE — Les valeurs dynamiques portées par les enregistrements
// =============================================================================
//
// Le moteur est générique sur le type des valeurs (`Registry<K, V>`), mais la
// plupart des données externes arrivent sous forme "dynamique" : un payload
// JSON, une ligne de CSV, une réponse d'API dont les clés sont en CamelCase.
//
// `Value` est le type de valeur prêt à l'emploi pour ces cas-là. Il couvre
// les types de base (String, Int, Float, Bool), les listes, les objets et
// l'absence de valeur (Null). Il se (dé)sérialise de façon transparente avec
// serde.
//
// Un objet est une valeur OPAQUE pour le moteur : aucune règle ne descend
// dedans, il est renommé ou transformé d'un bloc comme n'importe quelle
// autre valeur.
//
// ATTENTION : `Value::Null` est une vraie valeur ("la clé est là, elle vaut
// null"). Ce n'est PAS l'absence de clé, qui est portée par `Attr::Absent`.
//
// =============================================================================

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Le "type" d'une valeur, utile pour les messages d'erreur des transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// Chaîne de caractères
    String,
    /// Entier signé 64 bits
    Integer,
    /// Flottant 64 bits
    Float,
    /// Booléen
    Boolean,
    /// Liste de valeurs
    List,
    /// Objet clé → valeur
    Object,
    /// Valeur nulle explicite
    Null,
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::String => write!(f, "String"),
            BaseType::Integer => write!(f, "Int"),
            BaseType::Float => write!(f, "Float"),
            BaseType::Boolean => write!(f, "Bool"),
            BaseType::List => write!(f, "List"),
            BaseType::Object => write!(f, "Object"),
            BaseType::Null => write!(f, "Null"),
        }
    }
}

/// Une valeur concrète dans un enregistrement.
///
/// L'ordre des variantes compte pour la désérialisation `untagged` :
/// un entier JSON doit devenir `Integer`, pas `Float`. Un entier JSON
/// au-delà de `i64::MAX` ne tient pas dans `Integer` et devient `Float`,
/// avec la perte de précision qui va avec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null explicite (la clé est présente)
    Null,
    /// Valeur booléenne
    Boolean(bool),
    /// Valeur entière
    Integer(i64),
    /// Valeur flottante
    Float(f64),
    /// Valeur chaîne
    String(String),
    /// Liste ordonnée
    List(Vec<Value>),
    /// Objet imbriqué, dans l'ordre du document
    Object(IndexMap<String, Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(fields) => {
                write!(f, "{{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {:?}: {}", key, value)?;
                }
                if !fields.is_empty() {
                    write!(f, " ")?;
                }
                write!(f, "}}")
            }
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl Value {
    /// Retourne le BaseType correspondant à cette valeur
    pub fn get_type(&self) -> BaseType {
        match self {
            Value::String(_) => BaseType::String,
            Value::Integer(_) => BaseType::Integer,
            Value::Float(_) => BaseType::Float,
            Value::Boolean(_) => BaseType::Boolean,
            Value::List(_) => BaseType::List,
            Value::Object(_) => BaseType::Object,
            Value::Null => BaseType::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Minuscules. Les valeurs non textuelles sont renvoyées telles quelles,
    /// listes et objets sont traités élément par élément (les clés d'un
    /// objet ne changent pas).
    pub fn downcase(&self) -> Value {
        match self {
            Value::String(s) => Value::String(s.to_lowercase()),
            Value::List(items) => Value::List(items.iter().map(Value::downcase).collect()),
            Value::Object(fields) => Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.downcase())).collect(),
            ),
            other => other.clone(),
        }
    }

    /// Majuscules, symétrique de `downcase`.
    pub fn upcase(&self) -> Value {
        match self {
            Value::String(s) => Value::String(s.to_uppercase()),
            Value::List(items) => Value::List(items.iter().map(Value::upcase).collect()),
            Value::Object(fields) => Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.upcase())).collect(),
            ),
            other => other.clone(),
        }
    }

    /// Découpe une chaîne en liste de caractères ("Va" → ["V", "a"]).
    ///
    /// Toute autre valeur est renvoyée telle quelle : une règle aller et une
    /// règle retour sur la même clé lisent le même record brut, chacune doit
    /// laisser passer la forme qu'elle ne sait pas traiter.
    pub fn split_chars(&self) -> Value {
        match self {
            Value::String(s) => Value::List(s.chars().map(|c| Value::String(c.to_string())).collect()),
            other => other.clone(),
        }
    }

    /// Inverse de `split_chars` : concatène une liste de chaînes.
    ///
    /// Une valeur qui n'est pas une liste de String est renvoyée telle quelle.
    pub fn join(&self) -> Value {
        match self {
            Value::List(items) => {
                let mut out = String::new();
                for item in items {
                    match item {
                        Value::String(s) => out.push_str(s),
                        _ => return self.clone(),
                    }
                }
                Value::String(out)
            }
            other => other.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::from("hello").get_type(), BaseType::String);
        assert_eq!(Value::Integer(42).get_type(), BaseType::Integer);
        assert_eq!(Value::Null.get_type(), BaseType::Null);
    }

    #[test]
    fn test_case_helpers() {
        assert_eq!(Value::from("VaLue").downcase(), Value::from("value"));
        assert_eq!(Value::from("value").upcase(), Value::from("VALUE"));
        assert_eq!(Value::Integer(3).downcase(), Value::Integer(3));
        assert_eq!(
            Value::from(vec!["A", "b"]).downcase(),
            Value::from(vec!["a", "b"])
        );
    }

    #[test]
    fn test_split_and_join() {
        let list = Value::from("Va").split_chars();
        assert_eq!(list, Value::from(vec!["V", "a"]));
        assert_eq!(list.join(), Value::from("Va"));
    }

    #[test]
    fn test_split_and_join_pass_other_shapes_through() {
        assert_eq!(Value::from("Va").join(), Value::from("Va"));
        assert_eq!(Value::from(vec!["V", "a"]).split_chars(), Value::from(vec!["V", "a"]));
        assert_eq!(Value::Integer(1).join(), Value::Integer(1));

        let mixed = Value::List(vec![Value::from("a"), Value::Integer(1)]);
        assert_eq!(mixed.join(), mixed);
    }

    #[test]
    fn test_json_object_value() {
        let v: Value = serde_json::from_str(r#"{"City": "London", "Zip": 1}"#).unwrap();
        assert_eq!(v.get_type(), BaseType::Object);
        let Value::Object(fields) = &v else {
            panic!("objet attendu, reçu {}", v);
        };
        assert_eq!(fields["City"], Value::from("London"));
        assert_eq!(fields["Zip"], Value::Integer(1));
        assert_eq!(v.to_string(), r#"{ "City": "London", "Zip": 1 }"#);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"City":"London","Zip":1}"#);
    }

    #[test]
    fn test_integer_beyond_i64_becomes_float() {
        let v: Value = serde_json::from_str("9223372036854775807").unwrap();
        assert_eq!(v, Value::Integer(i64::MAX));

        let v: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(v.get_type(), BaseType::Float);
    }

    #[test]
    fn test_json_untagged() {
        let v: Value = serde_json::from_str(r#"[1, 2.5, "x", true, null]"#).unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::Integer(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Boolean(true),
                Value::Null,
            ])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(vec!["V", "a"]).to_string(), "[\"V\", \"a\"]");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
